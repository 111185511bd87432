use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};

use ecofinds::auth::TokenKeys;
use ecofinds::error::Result;
use ecofinds::routes;
use ecofinds::state::AppState;
use ecofinds::store::memory::MemoryStore;
use ecofinds::upload::{ImageHost, ImageUpload};

const BOUNDARY: &str = "ecofinds-test-boundary";

struct StubHost;

#[async_trait]
impl ImageHost for StubHost {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        Ok(format!("https://img.example/{}", image.filename))
    }
}

macro_rules! spawn_app {
    () => {{
        let keys = TokenKeys::new("integration-secret", 1);
        let max_upload_bytes = 1024 * 1024;
        let state = web::Data::new(AppState::new(
            Arc::new(MemoryStore::new()),
            keys.clone(),
            Arc::new(StubHost),
            max_upload_bytes,
        ));
        test::init_service(
            App::new()
                .app_data(state)
                .configure(move |cfg| routes::configure(cfg, keys, max_upload_bytes)),
        )
        .await
    }};
}

/// Registers a user and evaluates to `(token, user_id)`.
macro_rules! register {
    ($app:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": $name,
                "email": format!("{}@example.com", $name),
                "password": "secret-pass",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        (
            body["token"].as_str().unwrap().to_string(),
            body["_id"].as_str().unwrap().to_string(),
        )
    }};
}

macro_rules! create_lamp {
    ($app:expr, $token:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/products")
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json(json!({
                "title": "Vintage Lamp",
                "description": "Brass desk lamp",
                "category": "Home",
                "price": "19.99",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body
    }};
}

fn multipart_body(text: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_type() -> (&'static str, String) {
    ("Content-Type", format!("multipart/form-data; boundary={BOUNDARY}"))
}

#[actix_web::test]
async fn register_login_and_profile() {
    let app = spawn_app!();
    let (_, user_id) = register!(app, "ana");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ana@example.com", "password": "secret-pass" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["_id"], user_id.as_str());
    assert_eq!(body["username"], "ana");
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["email"], "ana@example.com");
    assert!(body.get("password").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "ana@example.com", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app!();
    register!(app, "ana");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "ana2", "email": "ana@example.com", "password": "secret-pass" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn listing_is_public_but_writes_need_a_token() {
    let app = spawn_app!();

    let req = test::TestRequest::get().uri("/api/products").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({ "title": "x", "description": "y", "category": "z", "price": 1 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/orders").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn expired_token_can_still_browse() {
    let app = spawn_app!();
    let (token, _) = register!(app, "ana");
    let lamp = create_lamp!(app, token);
    let expired = TokenKeys::new("integration-secret", -2).issue("ana").unwrap();
    let bearer = ("Authorization", format!("Bearer {expired}"));

    let req = test::TestRequest::get()
        .uri("/api/products")
        .insert_header(bearer.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{}", lamp["_id"].as_str().unwrap()))
        .insert_header(bearer.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/orders")
        .insert_header(bearer)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid token");
}

#[actix_web::test]
async fn create_parses_string_price_and_forces_owner() {
    let app = spawn_app!();
    let (token, user_id) = register!(app, "ana");

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "Vintage Lamp",
            "description": "Brass desk lamp",
            "category": "Home",
            "price": "19.99",
            "ownerId": "somebody-else",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = test::read_body_json(resp).await;
    assert_eq!(product["price"], json!(19.99));
    assert_eq!(product["ownerId"], user_id.as_str());

    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{}", product["_id"].as_str().unwrap()))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["title"], "Vintage Lamp");

    let req = test::TestRequest::get()
        .uri("/api/products/mine")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn rejects_malformed_products() {
    let app = spawn_app!();
    let (token, _) = register!(app, "ana");

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "title": "Lamp", "description": "d", "category": "c", "price": "cheap" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "title": "Lamp", "price": 3 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "description is required");
}

#[actix_web::test]
async fn only_the_owner_may_modify() {
    let app = spawn_app!();
    let (owner, _) = register!(app, "ana");
    let (intruder, _) = register!(app, "ben");
    let product = create_lamp!(app, owner);
    let uri = format!("/api/products/{}", product["_id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(("Authorization", format!("Bearer {intruder}")))
        .set_json(json!({ "price": 1, "title": "Stolen" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", format!("Bearer {intruder}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get().uri(&uri).to_request();
    let stored: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stored, product);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(("Authorization", format!("Bearer {owner}")))
        .set_json(json!({ "price": "15" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["price"], json!(15.0));
    assert_eq!(updated["title"], "Vintage Lamp");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(("Authorization", format!("Bearer {owner}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn orders_belong_to_the_caller_and_resolve_products() {
    let app = spawn_app!();
    let (seller, _) = register!(app, "sam");
    let (buyer, buyer_id) = register!(app, "ana");
    let (other, _) = register!(app, "ben");
    let product = create_lamp!(app, seller);
    let product_id = product["_id"].as_str().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(("Authorization", format!("Bearer {buyer}")))
        .set_json(json!({
            "userId": "somebody-else",
            "items": [{ "productId": product_id, "quantity": 2, "price": 19.99 }],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = test::read_body_json(resp).await;
    assert_eq!(order["userId"], buyer_id.as_str());
    assert_eq!(order["items"][0]["qty"], 2);

    let req = test::TestRequest::get()
        .uri("/api/orders")
        .insert_header(("Authorization", format!("Bearer {buyer}")))
        .to_request();
    let orders: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["items"][0]["productId"]["title"], "Vintage Lamp");
    assert_eq!(orders[0]["items"][0]["productId"]["price"], json!(19.99));

    let req = test::TestRequest::get()
        .uri("/api/orders")
        .insert_header(("Authorization", format!("Bearer {other}")))
        .to_request();
    let orders: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(orders, json!([]));

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(("Authorization", format!("Bearer {buyer}")))
        .set_json(json!({ "items": [{ "productId": product_id, "qty": 0 }] }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn multipart_create_uploads_the_image() {
    let app = spawn_app!();
    let (token, _) = register!(app, "ana");

    let body = multipart_body(
        &[("title", "Old Books"), ("description", "Box of novels"), ("category", "Books"), ("price", "300")],
        Some(("books.jpg", "image/jpeg", &b"\xff\xd8\xff\xe0jpeg"[..])),
    );
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .insert_header(multipart_type())
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = test::read_body_json(resp).await;
    assert_eq!(product["image"], "https://img.example/books.jpg");
    assert_eq!(product["price"], json!(300.0));
}

#[actix_web::test]
async fn upload_endpoint_validates_files() {
    let app = spawn_app!();
    let (token, _) = register!(app, "ana");

    let req = test::TestRequest::post()
        .uri("/api/products/upload")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .insert_header(multipart_type())
        .set_payload(multipart_body(&[], Some(("chair.png", "image/png", &b"\x89PNG"[..]))))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["url"], "https://img.example/chair.png");

    let req = test::TestRequest::post()
        .uri("/api/products/upload")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .insert_header(multipart_type())
        .set_payload(multipart_body(&[], Some(("notes.txt", "text/plain", &b"hello"[..]))))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/products/upload")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .insert_header(multipart_type())
        .set_payload(multipart_body(&[("caption", "no file")], None))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
