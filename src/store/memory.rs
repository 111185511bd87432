use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{OrderRepository, ProductRepository, StoreError, StoreResult, UserRepository};
use crate::models::{Order, Product, User};

/// Process-local store. Each collection sits behind its own mutex, which gives
/// the same single-record atomicity the document store offers.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    products: Mutex<Vec<Product>>,
    orders: Mutex<Vec<Order>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-operation cannot leave a half-written record behind.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(lock(&self.users).iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(lock(&self.users).iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut users = lock(&self.users);
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(user.email.clone()));
        }
        users.push(user.clone());
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(lock(&self.products).clone())
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Product>> {
        Ok(lock(&self.products)
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(lock(&self.products).iter().find(|p| p.id == id).cloned())
    }

    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        Ok(lock(&self.products)
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        let mut products = lock(&self.products);
        if products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Duplicate(product.id.clone()));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn replace(&self, product: &Product) -> StoreResult<bool> {
        let mut products = lock(&self.products);
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut products = lock(&self.products);
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert(&self, order: &Order) -> StoreResult<()> {
        lock(&self.orders).push(order.clone());
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        Ok(lock(&self.orders)
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.into(),
            username: id.into(),
            email: email.into(),
            password: "hash".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryStore::new();
        UserRepository::insert(&store, &user("u1", "a@x.io")).await.unwrap();
        let err = UserRepository::insert(&store, &user("u2", "a@x.io")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.find_by_email("a@x.io").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_reports_missing_records() {
        let store = MemoryStore::new();
        assert!(!ProductRepository::delete(&store, "nope").await.unwrap());
    }
}
