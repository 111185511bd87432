use std::env;
use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_UPLOAD_FOLDER: &str = "ecofinds-products";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// Tokens may live at most a year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Credentials for the hosted image service.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub bind_address: String,
    pub token_ttl_hours: i64,
    pub max_upload_bytes: usize,
    /// `None` disables the upload endpoint.
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    /// Reads the process environment, after `.env` has been loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                log::info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let cloudinary = match (
            lookup("CLOUDINARY_CLOUD_NAME"),
            lookup("CLOUDINARY_API_KEY"),
            lookup("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                folder: or_default("UPLOAD_FOLDER", DEFAULT_UPLOAD_FOLDER),
            }),
            _ => {
                log::warn!("Cloudinary credentials not set, image uploads are disabled");
                None
            }
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_name: or_default("DATABASE_NAME", "ecofinds"),
            jwt_secret: required("JWT_SECRET")?,
            bind_address: or_default("BIND_ADDRESS", "127.0.0.1:5000"),
            token_ttl_hours: token_ttl(&or_default("TOKEN_TTL_HOURS", "24"))?,
            max_upload_bytes: parse(
                "MAX_UPLOAD_BYTES",
                &or_default("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string()),
            )?,
            cloudinary,
        })
    }
}

fn token_ttl(raw: &str) -> Result<i64, ConfigError> {
    let hours: i64 = parse("TOKEN_TTL_HOURS", raw)?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::Invalid {
            key: "TOKEN_TTL_HOURS",
            reason: format!("must be between 1 and {MAX_TOKEN_TTL_HOURS} hours, got {hours}"),
        });
    }
    Ok(hours)
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
