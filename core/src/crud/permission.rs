use crate::error::Result;
use crate::model::permission::{PermissionKind, PermissionView};

use crate::schema;
use async_trait::async_trait;
use diesel::{delete, insert_into, prelude::*};
use diesel_async::RunQueryDsl;
use tracing::debug;

use super::{PermissionStore, PgDb};

#[async_trait]
impl<'a> PermissionStore for PgDb<'a> {
    async fn merge_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name_val: &str,
    ) -> Result<PermissionView> {
        use schema::permission_views::dsl::*;
        let created = insert_into(permission_views)
            .values((
                permission_name.eq(kind),
                view_menu_name.eq(view_menu_name_val),
            ))
            .on_conflict((permission_name, view_menu_name))
            .do_nothing()
            .execute(&mut self.con)
            .await?;
        if created > 0 {
            debug!("Created permission {kind}:{view_menu_name_val}");
        }
        Ok(permission_views
            .filter(
                permission_name
                    .eq(kind)
                    .and(view_menu_name.eq(view_menu_name_val)),
            )
            .select(PermissionView::as_select())
            .get_result(&mut self.con)
            .await?)
    }

    async fn find_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name_val: &str,
    ) -> Result<Option<PermissionView>> {
        use schema::permission_views::dsl::*;
        Ok(permission_views
            .filter(
                permission_name
                    .eq(kind)
                    .and(view_menu_name.eq(view_menu_name_val)),
            )
            .select(PermissionView::as_select())
            .get_result(&mut self.con)
            .await
            .optional()?)
    }

    async fn delete_perm(
        &mut self,
        kind: PermissionKind,
        view_menu_name_val: &str,
    ) -> Result<usize> {
        use schema::permission_views::dsl::*;
        let removed = delete(
            permission_views.filter(
                permission_name
                    .eq(kind)
                    .and(view_menu_name.eq(view_menu_name_val)),
            ),
        )
        .execute(&mut self.con)
        .await?;
        if removed > 0 {
            debug!("Removed permission {kind}:{view_menu_name_val}");
        }
        Ok(removed)
    }
}
