//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    #[serde(with = "sizes")]
    pub sizes: Vec<i32>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable product attributes, used for both create and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    #[serde(with = "sizes")]
    pub sizes: Vec<i32>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if self.price.is_sign_negative() { return Err(ProductError::NegativePrice); }
        if self.stock < 0 { return Err(ProductError::NegativeStock); }
        Ok(())
    }

    pub fn into_product(self, id: String, now: DateTime<Utc>) -> Product {
        Product {
            id, name: self.name, brand: self.brand, category: self.category, description: self.description,
            price: self.price, stock: self.stock, sizes: self.sizes, colors: self.colors, images: self.images,
            created_at: now, updated_at: now,
        }
    }
}

impl Product {
    /// Replace every editable attribute, keeping identity and creation time.
    pub fn apply(&mut self, input: ProductInput) {
        let ProductInput { name, brand, category, description, price, stock, sizes, colors, images } = input;
        self.name = name; self.brand = brand; self.category = category; self.description = description;
        self.price = price; self.stock = stock; self.sizes = sizes; self.colors = colors; self.images = images;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.category.as_deref().map_or(true, |c| product.category == c)
            && self.brand.as_deref().map_or(true, |b| product.brand == b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum ProductError { MissingName, NegativePrice, NegativeStock }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "product name is required"),
            Self::NegativePrice => write!(f, "product price must not be negative"),
            Self::NegativeStock => write!(f, "product stock must not be negative"),
        }
    }
}

/// Sizes travel as decimal strings on the wire; plain numbers are accepted too.
mod sizes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sizes: &[i32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(sizes.iter().map(|size| size.to_string()))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(i32),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i32>, D::Error> {
        Vec::<Size>::deserialize(deserializer)?
            .into_iter()
            .map(|size| match size {
                Size::Number(n) => Ok(n),
                Size::Text(s) => s.trim().parse().map_err(|_| de::Error::custom(format!("invalid size format: {s}"))),
            })
            .collect()
    }
}
