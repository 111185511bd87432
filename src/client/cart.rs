//! Session-scoped shopping cart.
//!
//! [`CartStore`] is owned by whoever drives the session and lent to the views
//! that change it. Views that only display the cart call
//! [`CartStore::subscribe`] and receive a fresh immutable [`CartSnapshot`]
//! after every mutation.

use tokio::sync::watch;

use crate::models::Product;

/// A product as it looked when it was added. Prices are never refreshed, so
/// the total stays stable if the listing changes mid-session.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    pub product_id: String,
    pub title: String,
    pub price: f64,
    pub image: Option<String>,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartSnapshot {
    pub entries: Vec<CartEntry>,
    pub total_price: f64,
    /// Sum of quantities, shown on the cart badge.
    pub count: u64,
}

pub struct CartStore {
    entries: Vec<CartEntry>,
    updates: watch::Sender<CartSnapshot>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    pub fn new() -> Self {
        let (updates, _) = watch::channel(CartSnapshot::default());
        CartStore {
            entries: Vec::new(),
            updates,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.updates.subscribe()
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_to_cart(&mut self, product: &Product) {
        match self.entries.iter_mut().find(|e| e.product_id == product.id) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(1),
            None => self.entries.push(CartEntry {
                product_id: product.id.clone(),
                title: product.title.clone(),
                price: product.price,
                image: product.image.clone(),
                quantity: 1,
            }),
        }
        self.publish();
    }

    /// Zero or a negative quantity removes the entry. Unknown ids are ignored.
    /// There is no upper bound.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product_id == product_id) {
            entry.quantity = quantity.unsigned_abs();
            self.publish();
        }
    }

    pub fn remove_from_cart(&mut self, product_id: &str) {
        let before = self.entries.len();
        self.entries.retain(|e| e.product_id != product_id);
        if self.entries.len() != before {
            self.publish();
        }
    }

    pub fn clear_cart(&mut self) {
        self.entries.clear();
        self.publish();
    }

    pub fn total_price(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.price * e.quantity as f64)
            .sum()
    }

    /// Saturates at `u64::MAX`.
    pub fn cart_count(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |count, e| count.saturating_add(e.quantity))
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            entries: self.entries.clone(),
            total_price: self.total_price(),
            count: self.cart_count(),
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}
