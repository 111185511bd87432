//! Image uploads, proxied to Cloudinary.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;
use crate::error::{AppError, Result};

pub const ALLOWED_FORMATS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const TRANSFORMATION: &str = "c_limit,h_600,w_800";

/// A file received from the client, held in memory until it is forwarded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn validate(&self, max_bytes: usize) -> Result<()> {
        if !self.content_type.starts_with("image/") {
            return Err(AppError::Validation("Only image files are allowed!".to_string()));
        }
        let format = self.format();
        if !ALLOWED_FORMATS.contains(&format.as_str()) {
            return Err(AppError::Validation(format!("unsupported image format: {format}")));
        }
        if self.bytes.is_empty() {
            return Err(AppError::Validation("image file is empty".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "image exceeds the {max_bytes} byte limit"
            )));
        }
        Ok(())
    }

    /// Format from the filename extension, falling back to the mime subtype.
    fn format(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_else(|| self.content_type.trim_start_matches("image/"))
            .to_lowercase()
    }

    fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }
}

/// Third-party image hosting. Returns the public URL of the stored image.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String>;
}

/// Used when no image host credentials are configured.
pub struct DisabledImageHost;

#[async_trait]
impl ImageHost for DisabledImageHost {
    async fn upload(&self, _image: ImageUpload) -> Result<String> {
        Err(AppError::ImageHostUnavailable)
    }
}

pub struct CloudinaryHost {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        CloudinaryHost {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }
}

/// Cloudinary request signature: SHA-1 over the signed parameters sorted by
/// name and joined as a query string, followed by the API secret.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed = [
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
            ("transformation", TRANSFORMATION),
        ];
        let signature = sign(&signed, &self.config.api_secret);
        let file = image.data_uri();

        let mut form: Vec<(&str, &str)> = signed.to_vec();
        form.push(("file", file.as_str()));
        form.push(("api_key", self.config.api_key.as_str()));
        form.push(("signature", signature.as_str()));

        let response = self
            .client
            .post(self.endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::ImageHost(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Cloudinary upload failed with {status}: {body}");
            return Err(AppError::ImageHost(format!("image host responded {status}")));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageHost(e.to_string()))?;
        log::info!("Uploaded {} to {}", image.filename, uploaded.secure_url);
        Ok(uploaded.secure_url)
    }
}
