//! Accounts: registration, login and bearer tokens.

use std::sync::Arc;

use argon2::{self, Config as ArgonConfig};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{AuthResponse, Claims, SignInInput, SignUpInput, User, UserProfile};
use crate::store::{StoreError, UserRepository};

const MIN_PASSWORD_LEN: usize = 6;

/// HS256 signing and verification with a shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        TokenKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("token expiry overflow".to_string()))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to encode token: {e}")))
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<String> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.sub)
            .map_err(|_| AppError::Unauthenticated("Invalid token".to_string()))
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    argon2::hash_encoded(password.as_bytes(), &salt, &ArgonConfig::default())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    keys: TokenKeys,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, keys: TokenKeys) -> Self {
        AccountService { users, keys }
    }

    pub async fn register(&self, input: SignUpInput) -> Result<AuthResponse> {
        let username = input.username.trim();
        let email = input.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("a valid email is required".to_string()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email,
            password: hash_password(&input.password)?,
            created_at: Utc::now(),
        };

        match self.users.insert(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        log::info!("Registered user {}", user.id);

        self.respond(&user)
    }

    pub async fn login(&self, input: SignInInput) -> Result<AuthResponse> {
        let email = input.email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        if !verify_password(&user.password, &input.password) {
            return Err(AppError::invalid_credentials());
        }

        self.respond(&user)
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| AppError::not_found("User"))
    }

    fn respond(&self, user: &User) -> Result<AuthResponse> {
        Ok(AuthResponse {
            token: self.keys.issue(&user.id)?,
            user: UserProfile::from(user),
        })
    }
}
