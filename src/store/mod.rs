//! Repository seams over the record store.
//!
//! Handlers only see these traits. [`crate::db::MongoStore`] backs them in
//! production and [`memory::MemoryStore`] in tests and local runs.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Order, Product, User};

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("duplicate key: {0}")]
    Duplicate(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert(&self, user: &User) -> StoreResult<()>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Product>>;

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Product>>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>>;

    /// Products whose id is in `ids`, in no particular order.
    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<Product>>;

    async fn insert(&self, product: &Product) -> StoreResult<()>;

    /// Replaces the stored record with the same id. Returns false if it vanished.
    async fn replace(&self, product: &Product) -> StoreResult<bool>;

    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> StoreResult<()>;

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>>;
}
