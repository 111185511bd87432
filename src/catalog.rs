use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::store::ProductRepository;

/// Listings CRUD. Only a listing's owner may change or remove it.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        CatalogService { products }
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.products.list().await?)
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Product>> {
        Ok(self.products.list_by_owner(owner_id).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }

    pub async fn create(&self, owner_id: &str, fields: NewProduct) -> Result<Product> {
        let price = fields.validate()?;
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: fields.title.trim().to_string(),
            description: fields.description.trim().to_string(),
            category: fields.category.trim().to_string(),
            price,
            image: fields.image.filter(|url| !url.is_empty()),
            created_at: now,
            updated_at: now,
        };

        self.products.insert(&product).await?;
        log::info!("User {owner_id} listed product {}", product.id);
        Ok(product)
    }

    pub async fn update(&self, id: &str, owner_id: &str, patch: ProductPatch) -> Result<Product> {
        let mut product = self.owned(id, owner_id).await?;
        patch.apply(&mut product);
        product.updated_at = Utc::now();

        if !self.products.replace(&product).await? {
            return Err(AppError::not_found("Product"));
        }
        Ok(product)
    }

    pub async fn delete(&self, id: &str, owner_id: &str) -> Result<()> {
        self.owned(id, owner_id).await?;
        if !self.products.delete(id).await? {
            return Err(AppError::not_found("Product"));
        }
        log::info!("User {owner_id} deleted product {id}");
        Ok(())
    }

    async fn owned(&self, id: &str, owner_id: &str) -> Result<Product> {
        let product = self.get_by_id(id).await?;
        if product.owner_id != owner_id {
            log::warn!("User {owner_id} attempted to modify product {id} owned by {}", product.owner_id);
            return Err(AppError::NotAuthorized);
        }
        Ok(product)
    }
}
