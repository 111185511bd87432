use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use ecofinds::auth::TokenKeys;
use ecofinds::config::Config;
use ecofinds::db::MongoStore;
use ecofinds::routes;
use ecofinds::state::AppState;
use ecofinds::upload::{CloudinaryHost, DisabledImageHost, ImageHost};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let store = MongoStore::connect(&config.database_url, &config.database_name)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let images: Arc<dyn ImageHost> = match config.cloudinary.clone() {
        Some(cloudinary) => Arc::new(CloudinaryHost::new(cloudinary)),
        None => Arc::new(DisabledImageHost),
    };

    let keys = TokenKeys::new(&config.jwt_secret, config.token_ttl_hours);
    let state = web::Data::new(AppState::new(
        Arc::new(store),
        keys.clone(),
        images,
        config.max_upload_bytes,
    ));

    let max_upload_bytes = config.max_upload_bytes;
    log::info!("Listening on {}", config.bind_address);
    HttpServer::new(move || {
        let keys = keys.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, keys, max_upload_bytes))
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
