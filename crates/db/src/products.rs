//! Product repository.

use sqlx::PgExecutor;
use tracing::{debug, instrument};

use retro_shop_core::{ProductId, Sku};

use crate::error::{RepositoryError, WriteKind};
use crate::models::{NewProduct, Product};

macro_rules! product_columns {
    () => {
        "id, sku, name, description, price_cents, currency, stock_quantity, is_active, \
         created_at, updated_at"
    };
}

/// The document expression behind `products_search_idx`. Must stay
/// byte-for-byte identical to the index definition.
macro_rules! search_document {
    () => {
        "to_tsvector('english', name || ' ' || coalesce(description, ''))"
    };
}

/// Insert a product.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the SKU is already taken.
/// Returns `RepositoryError::ConstraintViolation` if a `CHECK` fails.
#[instrument(skip(executor, new), fields(sku = ?new.sku.as_ref().map(Sku::as_str)))]
pub async fn create<'e, E>(executor: E, new: &NewProduct) -> Result<Product, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(concat!(
        "INSERT INTO products ",
        "(sku, name, description, price_cents, currency, stock_quantity, is_active) ",
        "VALUES ($1, $2, $3, $4, $5, $6, $7) ",
        "RETURNING ",
        product_columns!()
    ))
    .bind(new.sku.as_ref())
    .bind(&new.name)
    .bind(new.description.as_deref())
    .bind(new.price_cents)
    .bind(&new.currency)
    .bind(new.stock_quantity)
    .bind(new.is_active)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, WriteKind::Insert))?;

    debug!(id = %product.id, "Inserted product");
    Ok(product)
}

/// Get a product by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id<'e, E>(executor: E, id: ProductId) -> Result<Option<Product>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// Get a product by SKU.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_sku<'e, E>(executor: E, sku: &Sku) -> Result<Option<Product>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products WHERE sku = $1"
    ))
    .bind(sku)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// List active products by name.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_active<'e, E>(executor: E) -> Result<Vec<Product>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let products = sqlx::query_as::<_, Product>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products WHERE is_active ORDER BY name, id"
    ))
    .fetch_all(executor)
    .await?;

    Ok(products)
}

/// Full-text search over active products' name and description.
///
/// Uses `plainto_tsquery`, so the input is treated as plain words rather than
/// query syntax. Results are ordered by rank, best match first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
#[instrument(skip(executor))]
pub async fn search<'e, E>(
    executor: E,
    query: &str,
    limit: i64,
) -> Result<Vec<Product>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let products = sqlx::query_as::<_, Product>(concat!(
        "SELECT ",
        product_columns!(),
        " FROM products",
        " WHERE is_active AND ",
        search_document!(),
        " @@ plainto_tsquery('english', $1)",
        " ORDER BY ts_rank(",
        search_document!(),
        ", plainto_tsquery('english', $1)) DESC, id",
        " LIMIT $2"
    ))
    .bind(query)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    debug!(results = products.len(), "Product search");
    Ok(products)
}

/// Delete a product.
///
/// # Errors
///
/// Returns `RepositoryError::Restricted` while any cart or order item
/// references the product.
/// Returns `RepositoryError::NotFound` if no such product exists.
#[instrument(skip(executor))]
pub async fn delete<'e, E>(executor: E, id: ProductId) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_write(e, WriteKind::Delete))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
