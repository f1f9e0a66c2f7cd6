//! Cart repository.
//!
//! A user holds at most one cart per status (`carts_user_id_status_key`), and
//! a cart holds at most one row per product
//! (`cart_items_cart_id_product_id_key`).

use sqlx::PgExecutor;
use tracing::{debug, instrument};

use retro_shop_core::{CartId, CartStatus, UserId};

use crate::error::{RepositoryError, WriteKind};
use crate::models::{Cart, CartItem, NewCartItem};

macro_rules! cart_columns {
    () => {
        "id, user_id, status, created_at, updated_at"
    };
}

macro_rules! cart_item_columns {
    () => {
        "id, cart_id, product_id, quantity, unit_price_cents, created_at, updated_at"
    };
}

/// Create a cart for a user.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user already has a cart with
/// this status.
/// Returns `RepositoryError::MissingReference` if the user does not exist.
#[instrument(skip(executor))]
pub async fn create<'e, E>(
    executor: E,
    user_id: UserId,
    status: CartStatus,
) -> Result<Cart, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let cart = sqlx::query_as::<_, Cart>(concat!(
        "INSERT INTO carts (user_id, status) VALUES ($1, $2) RETURNING ",
        cart_columns!()
    ))
    .bind(user_id)
    .bind(status)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, WriteKind::Insert))?;

    debug!(id = %cart.id, "Inserted cart");
    Ok(cart)
}

/// Get a cart by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id<'e, E>(executor: E, id: CartId) -> Result<Option<Cart>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let cart = sqlx::query_as::<_, Cart>(concat!(
        "SELECT ",
        cart_columns!(),
        " FROM carts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(cart)
}

/// Get a user's cart with the given status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_user<'e, E>(
    executor: E,
    user_id: UserId,
    status: CartStatus,
) -> Result<Option<Cart>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let cart = sqlx::query_as::<_, Cart>(concat!(
        "SELECT ",
        cart_columns!(),
        " FROM carts WHERE user_id = $1 AND status = $2"
    ))
    .bind(user_id)
    .bind(status)
    .fetch_optional(executor)
    .await?;

    Ok(cart)
}

/// List all of a user's carts.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_user<'e, E>(executor: E, user_id: UserId) -> Result<Vec<Cart>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let carts = sqlx::query_as::<_, Cart>(concat!(
        "SELECT ",
        cart_columns!(),
        " FROM carts WHERE user_id = $1 ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(carts)
}

/// Add a product to a cart at the given snapshot price.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the product is already in the cart.
/// Returns `RepositoryError::MissingReference` if the cart or product does
/// not exist.
#[instrument(skip(executor, item), fields(product_id = %item.product_id, quantity = %item.quantity))]
pub async fn add_item<'e, E>(
    executor: E,
    cart_id: CartId,
    item: &NewCartItem,
) -> Result<CartItem, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, CartItem>(concat!(
        "INSERT INTO cart_items (cart_id, product_id, quantity, unit_price_cents) ",
        "VALUES ($1, $2, $3, $4) RETURNING ",
        cart_item_columns!()
    ))
    .bind(cart_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, WriteKind::Insert))?;

    debug!(id = %row.id, "Inserted cart item");
    Ok(row)
}

/// List a cart's items in insertion order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn items<'e, E>(executor: E, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CartItem>(concat!(
        "SELECT ",
        cart_item_columns!(),
        " FROM cart_items WHERE cart_id = $1 ORDER BY id"
    ))
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Delete a cart and, by cascade, its items.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no such cart exists.
#[instrument(skip(executor))]
pub async fn delete<'e, E>(executor: E, id: CartId) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM carts WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_write(e, WriteKind::Delete))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
