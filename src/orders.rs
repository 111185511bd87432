use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    LineItem, LineItemInput, Order, PopulatedLineItem, PopulatedOrder, ProductSummary,
};
use crate::store::{OrderRepository, ProductRepository};

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>, products: Arc<dyn ProductRepository>) -> Self {
        OrderService { orders, products }
    }

    /// Stores the submitted line items as given. Prices are the buyer's cart
    /// snapshot and are not checked against the catalog.
    pub async fn create(&self, user_id: &str, items: Vec<LineItemInput>) -> Result<Order> {
        if items.is_empty() {
            return Err(AppError::Validation("order must contain at least one item".to_string()));
        }
        let items = items
            .into_iter()
            .map(LineItem::try_from)
            .collect::<Result<Vec<_>>>()?;

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            items,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(&order).await?;
        log::info!("User {user_id} placed order {} with {} items", order.id, order.items.len());

        Ok(order)
    }

    /// The user's orders, newest first, with product title and price resolved.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PopulatedOrder>> {
        let mut orders = self.orders.list_by_user(user_id).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut ids: Vec<String> = orders
            .iter()
            .flat_map(|order| order.items.iter().map(|item| item.product_id.clone()))
            .collect();
        ids.sort();
        ids.dedup();

        let products: HashMap<String, ProductSummary> = self
            .products
            .find_many(&ids)
            .await?
            .iter()
            .map(|product| (product.id.clone(), ProductSummary::from(product)))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| PopulatedOrder {
                items: order
                    .items
                    .into_iter()
                    .map(|item| PopulatedLineItem {
                        product: products.get(&item.product_id).cloned(),
                        qty: item.qty,
                        price: item.price,
                    })
                    .collect(),
                id: order.id,
                user_id: order.user_id,
                created_at: order.created_at,
                updated_at: order.updated_at,
            })
            .collect())
    }
}
