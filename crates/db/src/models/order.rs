//! Order and order item rows.

use chrono::{DateTime, Utc};

use retro_shop_core::{
    Cents, MoneyError, OrderId, OrderItemId, OrderStatus, OrderTotals, ProductId, Quantity, UserId,
};

/// A row of `orders`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Owner. A user with orders cannot be deleted.
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal_cents: Cents,
    pub tax_cents: Cents,
    pub shipping_cents: Cents,
    pub total_cents: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The stored monetary breakdown.
    #[must_use]
    pub const fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal_cents,
            tax: self.tax_cents,
            shipping: self.shipping_cents,
        }
    }

    /// Whether `total_cents` equals `subtotal + tax + shipping`.
    #[must_use]
    pub fn total_is_consistent(&self) -> bool {
        self.totals().total() == Ok(self.total_cents)
    }
}

/// A row of `order_items`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price_cents: Cents,
    /// `unit_price_cents * quantity` at order time.
    pub line_total_cents: Cents,
    pub created_at: DateTime<Utc>,
}

/// Parameters for inserting an order.
///
/// The subtotal starts at zero and is filled in by
/// [`recompute_totals`](crate::orders::recompute_totals) once items exist.
#[derive(Debug, Clone, Copy)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub tax_cents: Cents,
    pub shipping_cents: Cents,
}

/// Parameters for adding an item to an order.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price_cents: Cents,
}

impl NewOrderItem {
    /// `unit_price_cents * quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the line total does not fit.
    pub const fn line_total(&self) -> Result<Cents, MoneyError> {
        self.unit_price_cents.checked_mul(self.quantity)
    }
}
