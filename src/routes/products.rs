use actix_multipart::{Field, Multipart};
use actix_web::{web, Either, HttpResponse};
use futures::stream::StreamExt;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{price, NewProduct, ProductPatch};
use crate::state::AppState;
use crate::upload::ImageUpload;

const TEXT_FIELD_LIMIT: usize = 64 * 1024;

pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.catalog.list().await?))
}

pub async fn mine(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.catalog.list_for_owner(&user.id).await?))
}

pub async fn get(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.catalog.get_by_id(&id).await?))
}

/// Accepts either a JSON body or a multipart form whose optional `image` file
/// is forwarded to the image host before the listing is stored.
pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: Either<web::Json<NewProduct>, Multipart>,
) -> Result<HttpResponse> {
    let fields = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => {
            let (mut fields, file) = read_product_form(form, state.max_upload_bytes).await?;
            if let Some(file) = file {
                file.validate(state.max_upload_bytes)?;
                fields.image = Some(state.images.upload(file).await?);
            }
            fields
        }
    };

    let product = state.catalog.create(&user.id, fields).await?;
    Ok(HttpResponse::Created().json(product))
}

pub async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<String>,
    patch: web::Json<ProductPatch>,
) -> Result<HttpResponse> {
    let product = state.catalog.update(&id, &user.id, patch.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn delete(state: web::Data<AppState>, user: AuthUser, id: web::Path<String>) -> Result<HttpResponse> {
    state.catalog.delete(&id, &user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Deleted" })))
}

/// Forwards a single `image` file to the image host and returns its URL.
pub async fn upload(
    state: web::Data<AppState>,
    _user: AuthUser,
    mut form: Multipart,
) -> Result<HttpResponse> {
    let mut upload = None;
    while let Some(field) = form.next().await {
        let field = field.map_err(|e| AppError::Validation(e.to_string()))?;
        if field.content_disposition().get_name() == Some("image") && upload.is_none() {
            upload = Some(read_file(field, state.max_upload_bytes).await?);
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("No image file provided".to_string()))?;
    upload.validate(state.max_upload_bytes)?;
    let url = state.images.upload(upload).await?;
    Ok(HttpResponse::Ok().json(json!({ "url": url })))
}

async fn read_product_form(mut form: Multipart, max_file_bytes: usize) -> Result<(NewProduct, Option<ImageUpload>)> {
    let mut fields = NewProduct::default();
    let mut file = None;

    while let Some(field) = form.next().await {
        let field = field.map_err(|e| AppError::Validation(e.to_string()))?;
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();

        if disposition.get_filename().is_some() {
            if name == "image" && file.is_none() {
                file = Some(read_file(field, max_file_bytes).await?);
            }
            continue;
        }

        let value = read_text(field).await?;
        match name.as_str() {
            "title" => fields.title = value,
            "description" => fields.description = value,
            "category" => fields.category = value,
            "price" => {
                fields.price = Some(price::parse(&value).ok_or_else(|| {
                    AppError::Validation("price must be a non-negative number".to_string())
                })?)
            }
            "image" if !value.is_empty() => fields.image = Some(value),
            _ => {}
        }
    }

    Ok((fields, file))
}

async fn read_chunks(mut field: Field, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::Validation(e.to_string()))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::Validation(format!("field exceeds the {limit} byte limit")));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_text(field: Field) -> Result<String> {
    let bytes = read_chunks(field, TEXT_FIELD_LIMIT).await?;
    String::from_utf8(bytes).map_err(|_| AppError::Validation("form fields must be UTF-8".to_string()))
}

async fn read_file(field: Field, limit: usize) -> Result<ImageUpload> {
    let filename = field
        .content_disposition()
        .get_filename()
        .unwrap_or_default()
        .to_string();
    let content_type = field
        .content_type()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_default();
    let bytes = read_chunks(field, limit).await?;

    Ok(ImageUpload {
        filename,
        content_type,
        bytes,
    })
}
