use actix_web::http::header;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqla::crud::{DatasourceStore, PgDb};
use sqla::model::column::NewTableColumn;
use sqla::model::database::{DatabaseListing, NewDatabase};
use sqla::model::metric::NewSqlMetric;
use sqla::model::table::{NewSqlaTable, TableEdit, TableSearch};
use sqla::resolve::postgres::{check_backend, PostgresResolver};
use sqla::views::{COLUMN_VIEW, METRIC_VIEW, TABLE_VIEW};
use sqla::workflow;
use tracing::info;
use uuid::Uuid;

use crate::admin::utils::load_table_detail;
use crate::error::Result;
use crate::DbPool;

#[get("/databaseview/list")]
pub(crate) async fn list_databases(pool: web::Data<DbPool>) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let listing: Vec<DatabaseListing> = db
        .list_databases()
        .await?
        .iter()
        .map(DatabaseListing::from)
        .collect();
    Ok(HttpResponse::Ok().json(listing))
}

#[post("/databaseview/add")]
pub(crate) async fn add_database(
    pool: web::Data<DbPool>,
    form: web::Json<NewDatabase>,
) -> Result<impl Responder> {
    check_backend(&form.connection_uri)?;
    let mut db = PgDb::try_from_pool(&pool).await?;
    let database = db.create_database(&form).await?;
    info!("Added database connection {}", database.database_name);
    Ok(HttpResponse::Created().json(DatabaseListing::from(&database)))
}

#[get("/tablemodelview/_info")]
pub(crate) async fn table_info() -> impl Responder {
    HttpResponse::Ok().json(TABLE_VIEW)
}

#[get("/tablemodelview/list")]
pub(crate) async fn list_tables(
    pool: web::Data<DbPool>,
    search: web::Query<TableSearch>,
) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let tables = db.list_tables(&search).await?;
    Ok(HttpResponse::Ok().json(tables))
}

#[get("/tablemodelview/show/{id}")]
pub(crate) async fn show_table(pool: web::Data<DbPool>, id: web::Path<Uuid>) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let detail = load_table_detail(&mut db, &id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[post("/tablemodelview/add")]
pub(crate) async fn add_table(
    pool: web::Data<DbPool>,
    form: web::Json<NewSqlaTable>,
) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let registration =
        workflow::register_datasource(&mut db, &PostgresResolver, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(registration))
}

#[post("/tablemodelview/edit/{id}")]
pub(crate) async fn edit_table(
    pool: web::Data<DbPool>,
    id: web::Path<Uuid>,
    form: web::Json<TableEdit>,
) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let update =
        workflow::update_datasource(&mut db, &PostgresResolver, &id, form.into_inner()).await?;
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, update.redirect.clone()))
        .json(update))
}

#[delete("/tablemodelview/delete/{id}")]
pub(crate) async fn delete_table(pool: web::Data<DbPool>, id: web::Path<Uuid>) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let revoked = workflow::delete_datasource(&mut db, &id).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": *id, "revoked_permissions": revoked })))
}

#[get("/tablecolumninlineview/_info")]
pub(crate) async fn column_info() -> impl Responder {
    HttpResponse::Ok().json(COLUMN_VIEW)
}

#[post("/tablecolumninlineview/add")]
pub(crate) async fn add_column(
    pool: web::Data<DbPool>,
    form: web::Json<NewTableColumn>,
) -> Result<impl Responder> {
    form.validate()?;
    let mut db = PgDb::try_from_pool(&pool).await?;
    db.get_table(&form.table_id).await?;
    let column = db.create_column(&form).await?;
    Ok(HttpResponse::Created().json(column))
}

#[post("/tablecolumninlineview/edit/{id}")]
pub(crate) async fn edit_column(
    pool: web::Data<DbPool>,
    id: web::Path<Uuid>,
    form: web::Json<NewTableColumn>,
) -> Result<impl Responder> {
    form.validate()?;
    let mut db = PgDb::try_from_pool(&pool).await?;
    db.get_column(&id).await?;
    let column = db.update_column(&id, &form).await?;
    Ok(HttpResponse::Ok().json(column))
}

#[get("/sqlmetricinlineview/_info")]
pub(crate) async fn metric_info() -> impl Responder {
    HttpResponse::Ok().json(METRIC_VIEW)
}

#[post("/sqlmetricinlineview/add")]
pub(crate) async fn add_metric(
    pool: web::Data<DbPool>,
    form: web::Json<NewSqlMetric>,
) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let saved = workflow::create_metric(&mut db, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(saved))
}

#[post("/sqlmetricinlineview/edit/{id}")]
pub(crate) async fn edit_metric(
    pool: web::Data<DbPool>,
    id: web::Path<Uuid>,
    form: web::Json<NewSqlMetric>,
) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let saved = workflow::update_metric(&mut db, &id, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(saved))
}

#[delete("/sqlmetricinlineview/delete/{id}")]
pub(crate) async fn delete_metric(pool: web::Data<DbPool>, id: web::Path<Uuid>) -> Result<impl Responder> {
    let mut db = PgDb::try_from_pool(&pool).await?;
    let revoked = workflow::delete_metric(&mut db, &id).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": *id, "revoked_permissions": revoked })))
}
