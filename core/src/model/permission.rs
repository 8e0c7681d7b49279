use std::fmt;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::permission_views;

/// The capabilities granted on a permission string
#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, diesel_derive_enum::DbEnum,
)]
#[ExistingTypePath = "crate::schema::sql_types::PermissionKind"]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    DatasourceAccess,
    SchemaAccess,
    MetricAccess,
}

impl PermissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::DatasourceAccess => "datasource_access",
            PermissionKind::SchemaAccess => "schema_access",
            PermissionKind::MetricAccess => "metric_access",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named capability on a resource, e.g. `datasource_access` on
/// `[db1].[sales](id:...)`. Created on first reference and reused afterwards.
#[derive(
    Serialize, Deserialize, Queryable, Selectable, Identifiable, Debug, PartialEq, Eq, Clone,
)]
#[diesel(table_name = permission_views)]
pub struct PermissionView {
    pub id: Uuid,
    pub permission_name: PermissionKind,
    pub view_menu_name: String,
}

impl fmt::Display for PermissionView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.permission_name, self.view_menu_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_stored_values() {
        assert_eq!(
            "\"metric_access\"",
            serde_json::to_string(&PermissionKind::MetricAccess).unwrap()
        );
        let perm = PermissionView {
            id: Uuid::new_v4(),
            permission_name: PermissionKind::SchemaAccess,
            view_menu_name: "[db1].[public]".to_string(),
        };
        assert_eq!("schema_access:[db1].[public]", perm.to_string());
    }
}
