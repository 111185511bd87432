use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::OrderInput;
use crate::state::AppState;

/// The order always belongs to the caller; any user id in the body is ignored.
pub async fn create(state: web::Data<AppState>, user: AuthUser, input: web::Json<OrderInput>) -> Result<HttpResponse> {
    let order = state.orders.create(&user.id, input.into_inner().items).await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn list(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
    let orders = state.orders.list_for_user(&user.id).await?;
    Ok(HttpResponse::Ok().json(orders))
}
