use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{SignInInput, SignUpInput};
use crate::state::AppState;

pub async fn register(state: web::Data<AppState>, input: web::Json<SignUpInput>) -> Result<HttpResponse> {
    let response = state.accounts.register(input.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

pub async fn login(state: web::Data<AppState>, input: web::Json<SignInInput>) -> Result<HttpResponse> {
    let response = state.accounts.login(input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn me(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
    let profile = state.accounts.profile(&user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}
