use actix_web::web;

use crate::auth::TokenKeys;
use crate::error::AppError;
use crate::middleware::AuthMiddleware;

pub mod auth;
pub mod orders;
pub mod products;

/// Room left for text fields next to an image in a buffered product form.
const FORM_FIELDS_LIMIT: usize = 64 * 1024;
const JSON_LIMIT: usize = 256 * 1024;

/// Mounts the REST surface under `/api`. Every route passes through
/// [`AuthMiddleware`]; handlers taking an `AuthUser` are the protected ones.
pub fn configure(cfg: &mut web::ServiceConfig, keys: TokenKeys, max_upload_bytes: usize) {
    let json_config = web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into());
    let payload_config = web::PayloadConfig::new(max_upload_bytes.saturating_add(FORM_FIELDS_LIMIT));

    cfg.service(
        web::scope("/api")
            .app_data(json_config)
            .app_data(payload_config)
            .wrap(AuthMiddleware::new(keys))
            .route("/auth/register", web::post().to(auth::register))
            .route("/auth/login", web::post().to(auth::login))
            .route("/auth/me", web::get().to(auth::me))
            .route("/products", web::get().to(products::list))
            .route("/products", web::post().to(products::create))
            .route("/products/upload", web::post().to(products::upload))
            .route("/products/mine", web::get().to(products::mine))
            .route("/products/{id}", web::get().to(products::get))
            .route("/products/{id}", web::put().to(products::update))
            .route("/products/{id}", web::delete().to(products::delete))
            .route("/orders", web::post().to(orders::create))
            .route("/orders", web::get().to(orders::list)),
    );
}
