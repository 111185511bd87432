use std::time::Duration;

use super::api::{OrderItemRequest, OrdersApi};
use super::cart::CartStore;
use crate::models::{Order, UserProfile};

/// How long the success message stays up before the cart view closes.
pub const CLOSE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Placed(Order),
    LoginRequired,
    EmptyCart,
    Failed,
}

impl CheckoutOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            CheckoutOutcome::Placed(_) => "Order placed successfully!",
            CheckoutOutcome::LoginRequired => "Please login to checkout",
            CheckoutOutcome::EmptyCart => "Your cart is empty",
            CheckoutOutcome::Failed => "Failed to place order. Please try again.",
        }
    }

    /// Only a placed order closes the cart view, after [`CLOSE_DELAY`].
    pub fn close_after(&self) -> Option<Duration> {
        matches!(self, CheckoutOutcome::Placed(_)).then_some(CLOSE_DELAY)
    }
}

/// One checkout line per cart entry, carrying the price seen at add time.
pub fn order_items(cart: &CartStore) -> Vec<OrderItemRequest> {
    cart.entries()
        .iter()
        .map(|entry| OrderItemRequest {
            product_id: entry.product_id.clone(),
            quantity: entry.quantity,
            price: entry.price,
        })
        .collect()
}

/// Turns the cart into an order. The cart is cleared only once the server has
/// accepted the order; every other outcome leaves it as it was.
pub async fn checkout<A>(cart: &mut CartStore, user: Option<&UserProfile>, api: &A) -> CheckoutOutcome
where
    A: OrdersApi + ?Sized,
{
    if user.is_none() {
        return CheckoutOutcome::LoginRequired;
    }
    if cart.is_empty() {
        return CheckoutOutcome::EmptyCart;
    }

    match api.create_order(order_items(cart)).await {
        Ok(order) => {
            cart.clear_cart();
            CheckoutOutcome::Placed(order)
        }
        Err(e) => {
            log::error!("Checkout error: {e}");
            CheckoutOutcome::Failed
        }
    }
}
