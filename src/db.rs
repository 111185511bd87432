use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Cursor, IndexModel};
use serde::de::DeserializeOwned;

use crate::models::{Order, Product, User};
use crate::store::{OrderRepository, ProductRepository, StoreError, StoreResult, UserRepository};

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed repositories, one collection per record type.
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<User>,
    products: Collection<Product>,
    orders: Collection<Order>,
}

impl MongoStore {
    pub async fn connect(database_url: &str, database_name: &str) -> StoreResult<Self> {
        let client_options = ClientOptions::parse(database_url).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(database_name);

        let store = MongoStore {
            users: db.collection("users"),
            products: db.collection("products"),
            orders: db.collection("orders"),
        };
        store.ensure_indexes().await?;

        log::info!("Connected to MongoDB database {database_name}");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(unique_email, None).await?;

        let by_owner = IndexModel::builder().keys(doc! { "ownerId": 1 }).build();
        self.products.create_index(by_owner, None).await?;

        let by_user = IndexModel::builder().keys(doc! { "userId": 1 }).build();
        self.orders.create_index(by_user, None).await?;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

async fn collect<T>(mut cursor: Cursor<T>) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut records = vec![];
    while let Some(result) = cursor.next().await {
        records.push(result?);
    }
    Ok(records)
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert(&self, user: &User) -> StoreResult<()> {
        match self.users.insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(user.email.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ProductRepository for MongoStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        collect(self.products.find(doc! {}, None).await?).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Product>> {
        collect(self.products.find(doc! { "ownerId": owner_id }, None).await?).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<Product>> {
        let filter = doc! { "_id": { "$in": ids } };
        collect(self.products.find(filter, None).await?).await
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        match self.products.insert_one(product, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(product.id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, product: &Product) -> StoreResult<bool> {
        let result = self
            .products
            .replace_one(doc! { "_id": &product.id }, product, None)
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = self.products.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }
}

#[async_trait]
impl OrderRepository for MongoStore {
    async fn insert(&self, order: &Order) -> StoreResult<()> {
        self.orders.insert_one(order, None).await?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        collect(self.orders.find(doc! { "userId": user_id }, None).await?).await
    }
}
