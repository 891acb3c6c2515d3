use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use common::env_config::Config;
use db::{PgStore, Store};
use subtrack::cors;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // get info
    let logger_enabled = config.console_logging_enabled;
    let is_production = config.is_production();
    let cookie_secure = config.cookie_secure();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if logger_enabled {
        logger::setup(&config.log_file).expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    log::info!(
        "Starting {} server on {}:{}",
        config.environment,
        config.server_host,
        config.server_port
    );

    HttpServer::new(move || {
        let session = &config_data.session_config;
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .wrap(logger::middleware(logger_enabled)) // 4th
            .wrap(extractor::middleware()) // 3rd
            .wrap(cors::middleware(&origin)) // 2nd
            .wrap(api_auth::session_middleware(
                cookie_secure,
                session.secret.as_bytes(),
                session.ttl_days,
            )) // 1st
            .configure(subtrack::routes)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
