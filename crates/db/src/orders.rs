//! Order repository.
//!
//! `total_cents = subtotal_cents + tax_cents + shipping_cents` is not a
//! database constraint. Every write here preserves it: [`create`] starts with
//! an empty subtotal and [`recompute_totals`] rebuilds subtotal and total from
//! the line items in a single statement.

use sqlx::PgExecutor;
use tracing::{debug, instrument};

use retro_shop_core::{Cents, OrderId, OrderTotals, UserId};

use crate::error::{RepositoryError, WriteKind};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem};

macro_rules! order_columns {
    () => {
        "id, user_id, status, subtotal_cents, tax_cents, shipping_cents, total_cents, \
         created_at, updated_at"
    };
}

macro_rules! order_item_columns {
    () => {
        "id, order_id, product_id, quantity, unit_price_cents, line_total_cents, created_at"
    };
}

/// Insert an order with no items.
///
/// # Errors
///
/// Returns `RepositoryError::MissingReference` if the user does not exist.
/// Returns `RepositoryError::DataCorruption` if tax plus shipping overflows.
#[instrument(skip(executor, new), fields(user_id = %new.user_id, status = %new.status))]
pub async fn create<'e, E>(executor: E, new: &NewOrder) -> Result<Order, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let totals = OrderTotals {
        subtotal: Cents::ZERO,
        tax: new.tax_cents,
        shipping: new.shipping_cents,
    };
    let total = totals
        .total()
        .map_err(|e| RepositoryError::DataCorruption(format!("order total: {e}")))?;

    let order = sqlx::query_as::<_, Order>(concat!(
        "INSERT INTO orders ",
        "(user_id, status, subtotal_cents, tax_cents, shipping_cents, total_cents) ",
        "VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
        order_columns!()
    ))
    .bind(new.user_id)
    .bind(new.status)
    .bind(totals.subtotal)
    .bind(totals.tax)
    .bind(totals.shipping)
    .bind(total)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, WriteKind::Insert))?;

    debug!(id = %order.id, "Inserted order");
    Ok(order)
}

/// Get an order by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id<'e, E>(executor: E, id: OrderId) -> Result<Option<Order>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let order = sqlx::query_as::<_, Order>(concat!(
        "SELECT ",
        order_columns!(),
        " FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(order)
}

/// List a user's orders, newest first.
///
/// Served by `orders_user_id_created_at_idx`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<Order>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let orders = sqlx::query_as::<_, Order>(concat!(
        "SELECT ",
        order_columns!(),
        " FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(orders)
}

/// Add a line to an order. The line total is computed here.
///
/// The order's subtotal and total are not touched; call
/// [`recompute_totals`] after the last item.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the product is already on the order.
/// Returns `RepositoryError::MissingReference` if the order or product does
/// not exist.
/// Returns `RepositoryError::DataCorruption` if the line total overflows.
#[instrument(skip(executor, item), fields(product_id = %item.product_id, quantity = %item.quantity))]
pub async fn add_item<'e, E>(
    executor: E,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<OrderItem, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let line_total = item
        .line_total()
        .map_err(|e| RepositoryError::DataCorruption(format!("line total: {e}")))?;

    let row = sqlx::query_as::<_, OrderItem>(concat!(
        "INSERT INTO order_items ",
        "(order_id, product_id, quantity, unit_price_cents, line_total_cents) ",
        "VALUES ($1, $2, $3, $4, $5) RETURNING ",
        order_item_columns!()
    ))
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(line_total)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, WriteKind::Insert))?;

    debug!(id = %row.id, line_total = %line_total, "Inserted order item");
    Ok(row)
}

/// List an order's items in insertion order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn items<'e, E>(executor: E, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, OrderItem>(concat!(
        "SELECT ",
        order_item_columns!(),
        " FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Rebuild an order's subtotal and total from its items.
///
/// Sets `subtotal_cents` to the sum of `line_total_cents` (zero with no
/// items) and `total_cents` to `subtotal + tax + shipping`, in one aggregate
/// `UPDATE`.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no such order exists.
/// Returns `RepositoryError::Database` if the sum overflows the column.
#[instrument(skip(executor))]
pub async fn recompute_totals<'e, E>(executor: E, id: OrderId) -> Result<Order, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let order = sqlx::query_as::<_, Order>(concat!(
        "UPDATE orders o SET ",
        "subtotal_cents = s.subtotal, ",
        "total_cents = s.subtotal + o.tax_cents + o.shipping_cents ",
        "FROM (",
        "SELECT COALESCE(SUM(line_total_cents), 0)::INTEGER AS subtotal ",
        "FROM order_items WHERE order_id = $1",
        ") s ",
        "WHERE o.id = $1 ",
        "RETURNING o.id, o.user_id, o.status, o.subtotal_cents, o.tax_cents, ",
        "o.shipping_cents, o.total_cents, o.created_at, o.updated_at"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, WriteKind::Update))?
    .ok_or(RepositoryError::NotFound)?;

    debug!(subtotal = %order.subtotal_cents, total = %order.total_cents, "Recomputed order totals");
    Ok(order)
}

/// Delete an order and, by cascade, its items.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no such order exists.
#[instrument(skip(executor))]
pub async fn delete<'e, E>(executor: E, id: OrderId) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_write(e, WriteKind::Delete))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
