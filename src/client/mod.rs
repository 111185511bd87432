//! Client-side pieces of the marketplace: the session cart, checkout, catalog
//! browsing and the REST wrapper they talk through.

pub mod api;
pub mod browse;
pub mod cart;
pub mod checkout;

pub use api::{ApiClient, ApiError, OrderItemRequest, OrdersApi};
pub use browse::{ProductFilter, SortMode};
pub use cart::{CartEntry, CartSnapshot, CartStore};
pub use checkout::{checkout, CheckoutOutcome};
