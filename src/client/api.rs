//! Typed wrapper over the REST surface.
//!
//! The client keeps the signed-in session. Any 401 from the server clears it
//! and comes back as [`ApiError::SessionExpired`], which callers treat as
//! "go to the login view".

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::models::{AuthResponse, NewProduct, Order, PopulatedOrder, Product, ProductPatch, UserProfile};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("server responded {status}: {message}")]
    Server { status: StatusCode, message: String },
}

#[derive(Debug, Clone)]
struct Session {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct UploadedImage {
    url: String,
}

/// A checkout line as sent to `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u64,
    pub price: f64,
}

/// The one call checkout needs, kept separate so it can be swapped out.
#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn create_order(&self, items: Vec<OrderItemRequest>) -> Result<Order, ApiError>;
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: RwLock<Option<Session>>,
}

impl ApiClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.read_session().as_ref().map(|s| s.user.clone())
    }

    pub fn logout(&self) {
        *self.write_session() = None;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let response: AuthResponse = self.send(request).await?;
        Ok(self.start_session(response))
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let request = self
            .http
            .post(self.url("/auth/register"))
            .json(&json!({ "username": username, "email": email, "password": password }));
        let response: AuthResponse = self.send(request).await?;
        Ok(self.start_session(response))
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.send(self.http.get(self.url("/products"))).await
    }

    pub async fn my_products(&self) -> Result<Vec<Product>, ApiError> {
        self.send(self.http.get(self.url("/products/mine"))).await
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, ApiError> {
        self.send(self.http.get(self.url(&format!("/products/{id}")))).await
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        self.send(self.http.post(self.url("/products")).json(product)).await
    }

    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<Product, ApiError> {
        self.send(self.http.put(self.url(&format!("/products/{id}"))).json(patch))
            .await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send(self.http.delete(self.url(&format!("/products/{id}"))))
            .await?;
        Ok(())
    }

    /// Uploads an image on its own and returns the hosted URL.
    pub async fn upload_image(&self, filename: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("image", part);
        let uploaded: UploadedImage = self
            .send(self.http.post(self.url("/products/upload")).multipart(form))
            .await?;
        Ok(uploaded.url)
    }

    pub async fn list_orders(&self) -> Result<Vec<PopulatedOrder>, ApiError> {
        self.send(self.http.get(self.url("/orders"))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn start_session(&self, response: AuthResponse) -> UserProfile {
        let user = response.user.clone();
        *self.write_session() = Some(Session {
            token: response.token,
            user: response.user,
        });
        user
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let token = self.read_session().as_ref().map(|s| s.token.clone());
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            log::warn!("Server rejected credentials, clearing session");
            self.logout();
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(ApiError::Server { status, message });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl OrdersApi for ApiClient {
    async fn create_order(&self, items: Vec<OrderItemRequest>) -> Result<Order, ApiError> {
        let request = self
            .http
            .post(self.url("/orders"))
            .json(&json!({ "items": items }));
        self.send(request).await
    }
}
