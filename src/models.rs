use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a [`User`], without the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,  // expiration as UTC timestamp
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(flatten)]
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when listing a new product. Any owner supplied by the
/// client is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "price::deserialize_option")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NewProduct {
    /// Checks required fields and returns the parsed price.
    pub fn validate(&self) -> Result<f64> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{name} is required")));
            }
        }
        match self.price {
            Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
            Some(_) => Err(AppError::Validation("price must be a non-negative number".to_string())),
            None => Err(AppError::Validation("price is required".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "price::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductPatch {
    pub fn apply(self, product: &mut Product) {
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OrderInput {
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(default)]
    pub product_id: String,
    #[serde(alias = "quantity", default = "default_qty")]
    pub qty: i64,
    #[serde(default)]
    pub price: Option<f64>,
}

fn default_qty() -> i64 {
    1
}

impl TryFrom<LineItemInput> for LineItem {
    type Error = AppError;

    fn try_from(input: LineItemInput) -> Result<Self> {
        if input.product_id.trim().is_empty() {
            return Err(AppError::Validation("productId is required".to_string()));
        }
        let qty = u32::try_from(input.qty)
            .ok()
            .filter(|qty| *qty >= 1)
            .ok_or_else(|| AppError::Validation("quantity must be a positive integer".to_string()))?;

        Ok(LineItem {
            product_id: input.product_id,
            qty,
            price: input.price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub price: f64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        ProductSummary {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
        }
    }
}

/// Line item with its product reference resolved for display. The product is
/// `null` when the listing has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedLineItem {
    #[serde(rename = "productId")]
    pub product: Option<ProductSummary>,
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedOrder {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub items: Vec<PopulatedLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Prices arrive either as JSON numbers or as numeric strings from HTML forms.
pub mod price {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn parse(raw: &str) -> Option<f64> {
        let value: f64 = raw.trim().parse().ok()?;
        check(value)
    }

    fn check(value: f64) -> Option<f64> {
        (value.is_finite() && value >= 0.0).then_some(value)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        let value = match raw {
            None => return Ok(None),
            Some(Raw::Number(value)) => check(value),
            Some(Raw::Text(text)) => parse(&text),
        };
        value
            .map(Some)
            .ok_or_else(|| de::Error::custom("price must be a non-negative number"))
    }
}
