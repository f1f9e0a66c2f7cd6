//! Product rows.

use chrono::{DateTime, Utc};

use retro_shop_core::{Cents, CurrencyCode, ProductId, Sku};

/// A row of `products`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    /// Optional SKU, unique when present.
    pub sku: Option<Sku>,
    pub name: String,
    pub description: Option<String>,
    /// Current list price.
    pub price_cents: Cents,
    pub currency: CurrencyCode,
    /// Units on hand (never negative).
    pub stock_quantity: i32,
    /// Inactive products stay in the table but drop out of listings and search.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: Option<Sku>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Cents,
    pub currency: CurrencyCode,
    pub stock_quantity: i32,
    pub is_active: bool,
}
