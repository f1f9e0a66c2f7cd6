//! Cart and cart item rows.

use chrono::{DateTime, Utc};

use retro_shop_core::{CartId, CartItemId, CartStatus, Cents, ProductId, Quantity, UserId};

/// A row of `carts`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    /// Owner. Deleting the user deletes the cart.
    pub user_id: UserId,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `cart_items`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Product price captured when the item was added.
    pub unit_price_cents: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for adding an item to a cart.
#[derive(Debug, Clone, Copy)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Snapshot of the product price; the caller reads it from the product.
    pub unit_price_cents: Cents,
}
