use actix_web::{web, App, HttpServer};

use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

use sqla::conf::EnvConfigSettings;
use sqla::crud::{run_migrations, PgDb};
use tracing::info;

mod admin;
mod error;

type DbPool = Pool<AsyncPgConnection>;

pub async fn run() -> std::io::Result<()> {
    let env_config = EnvConfigSettings::init();
    run_migrations(&env_config.db_url);

    let diesel_config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&env_config.db_url);
    let pool = Pool::builder()
        .build(diesel_config)
        .await
        .expect("pool failed to start");

    if let Some(default_database) = &env_config.default_database {
        info!(
            "Attempting to register default database {}",
            default_database.database_name
        );
        let mut db = PgDb::try_from_pool(&pool)
            .await
            .expect("Could not get connection from pool");
        admin::utils::register_default_database(&mut db, default_database)
            .await
            .expect("Failed to register default database");
    }

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .service(admin::route::list_databases)
            .service(admin::route::add_database)
            .service(admin::route::table_info)
            .service(admin::route::list_tables)
            .service(admin::route::show_table)
            .service(admin::route::add_table)
            .service(admin::route::edit_table)
            .service(admin::route::delete_table)
            .service(admin::route::column_info)
            .service(admin::route::add_column)
            .service(admin::route::edit_column)
            .service(admin::route::metric_info)
            .service(admin::route::add_metric)
            .service(admin::route::edit_metric)
            .service(admin::route::delete_metric)
    })
    .bind((env_config.rest_url, env_config.rest_port))?
    .run()
    .await
}
