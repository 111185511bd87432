use std::sync::Arc;

use crate::auth::{AccountService, TokenKeys};
use crate::catalog::CatalogService;
use crate::orders::OrderService;
use crate::store::{OrderRepository, ProductRepository, UserRepository};
use crate::upload::ImageHost;

/// Shared by every worker; handlers reach it through `web::Data<AppState>`.
pub struct AppState {
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub images: Arc<dyn ImageHost>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, keys: TokenKeys, images: Arc<dyn ImageHost>, max_upload_bytes: usize) -> Self
    where
        S: UserRepository + ProductRepository + OrderRepository + 'static,
    {
        AppState {
            accounts: AccountService::new(store.clone(), keys),
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::new(store.clone(), store),
            images,
            max_upload_bytes,
        }
    }
}
