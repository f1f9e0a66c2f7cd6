//! Fixture seeding.
//!
//! Fixtures are a YAML document listing users, products, carts and orders.
//! Carts and orders point at users by email and at products by SKU; item
//! prices are never listed because every item snapshots the product's price
//! at insert time.
//!
//! Seeding runs in one transaction in foreign-key order: users, products,
//! carts with their items, orders with their items, then one aggregate total
//! recomputation per order. If any fixture user already exists nothing is
//! written and the report says so; the seeder never deletes rows.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use retro_shop_core::{
    CartStatus, Cents, CurrencyCode, Email, OrderStatus, OrderTotals, Quantity, Sku, UserId,
    UserRole,
};

use crate::error::RepositoryError;
use crate::models::{NewCartItem, NewOrder, NewOrderItem, NewProduct, NewUser, Product};
use crate::{carts, orders, products, users};

/// The fixture set shipped with the crate.
const DEFAULT_FIXTURES: &str = include_str!("../seeds/fixtures.yaml");

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read fixtures: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse fixtures: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{} fixture validation errors found", .0.len())]
    Invalid(Vec<String>),

    #[error("fixture references unknown {0}")]
    UnknownReference(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A complete fixture document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureSet {
    #[serde(default)]
    pub users: Vec<UserFixture>,
    #[serde(default)]
    pub products: Vec<ProductFixture>,
    #[serde(default)]
    pub carts: Vec<CartFixture>,
    #[serde(default)]
    pub orders: Vec<OrderFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserFixture {
    pub email: Email,
    pub password_hash: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFixture {
    pub sku: Sku,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: Cents,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartFixture {
    /// Owner's email.
    pub user: Email,
    #[serde(default)]
    pub status: CartStatus,
    #[serde(default)]
    pub items: Vec<ItemFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFixture {
    /// Owner's email.
    pub user: Email,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub tax_cents: Cents,
    #[serde(default)]
    pub shipping_cents: Cents,
    pub items: Vec<ItemFixture>,
}

/// One cart or order line.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemFixture {
    pub sku: Sku,
    pub quantity: Quantity,
}

const fn default_true() -> bool {
    true
}

impl FixtureSet {
    /// Parse a fixture document.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` on malformed YAML or invalid field values.
    pub fn from_yaml(content: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read and parse a fixture file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Io` if the file cannot be read and
    /// `SeedError::Parse` if it is not a valid fixture document.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_yaml(&content)
    }

    /// The fixture set embedded from `crates/db/seeds/fixtures.yaml`.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the embedded file is malformed.
    pub fn embedded() -> Result<Self, SeedError> {
        Self::from_yaml(DEFAULT_FIXTURES)
    }
}

/// Rows inserted by a seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub products: usize,
    pub carts: usize,
    pub cart_items: usize,
    pub orders: usize,
    pub order_items: usize,
    /// Set when the run was skipped because this fixture user already exists.
    pub skipped_existing: Option<Email>,
}

impl SeedReport {
    /// Whether anything was written.
    #[must_use]
    pub const fn was_skipped(&self) -> bool {
        self.skipped_existing.is_some()
    }
}

/// Check a fixture set for problems the database would reject, plus
/// dangling references.
///
/// Returns every problem found; an empty list means the set is loadable.
#[must_use]
pub fn validate_fixtures(fixtures: &FixtureSet) -> Vec<String> {
    let mut errors = Vec::new();

    let mut emails = HashSet::new();
    for user in &fixtures.users {
        if !emails.insert(&user.email) {
            errors.push(format!("Duplicate user email: {}", user.email));
        }
    }

    let mut prices: HashMap<&Sku, Cents> = HashMap::new();
    for product in &fixtures.products {
        if prices.insert(&product.sku, product.price_cents).is_some() {
            errors.push(format!("Duplicate product SKU: {}", product.sku));
        }
        if product.name.trim().is_empty() {
            errors.push(format!("Empty name for product: {}", product.sku));
        }
        if product.stock_quantity < 0 {
            errors.push(format!(
                "Negative stock quantity {} for product: {}",
                product.stock_quantity, product.sku
            ));
        }
    }

    let mut cart_keys = HashSet::new();
    for (i, cart) in fixtures.carts.iter().enumerate() {
        let label = format!("cart #{i} ({}, {})", cart.user, cart.status);
        if !emails.contains(&cart.user) {
            errors.push(format!("Unknown user {} for {label}", cart.user));
        }
        if !cart_keys.insert((&cart.user, cart.status)) {
            errors.push(format!("Duplicate {} cart for user {}", cart.status, cart.user));
        }
        check_items(&cart.items, &prices, &label, &mut errors);
    }

    for (i, order) in fixtures.orders.iter().enumerate() {
        let label = format!("order #{i} ({}, {})", order.user, order.status);
        if !emails.contains(&order.user) {
            errors.push(format!("Unknown user {} for {label}", order.user));
        }
        if order.items.is_empty() {
            errors.push(format!("No items provided for {label}"));
        }
        let line_totals = check_items(&order.items, &prices, &label, &mut errors);
        let total = OrderTotals::from_line_totals(line_totals, order.tax_cents, order.shipping_cents)
            .and_then(|totals| totals.total());
        if let Err(e) = total {
            errors.push(format!("Total for {label}: {e}"));
        }
    }

    errors
}

/// Validate item lines and return the line totals that could be computed.
fn check_items(
    items: &[ItemFixture],
    prices: &HashMap<&Sku, Cents>,
    label: &str,
    errors: &mut Vec<String>,
) -> Vec<Cents> {
    let mut seen = HashSet::new();
    let mut line_totals = Vec::with_capacity(items.len());

    for item in items {
        if !seen.insert(&item.sku) {
            errors.push(format!("Duplicate SKU {} in {label}", item.sku));
        }
        match prices.get(&item.sku) {
            Some(price) => match price.checked_mul(item.quantity) {
                Ok(line) => line_totals.push(line),
                Err(e) => errors.push(format!("Line {} in {label}: {e}", item.sku)),
            },
            None => errors.push(format!("Unknown SKU {} in {label}", item.sku)),
        }
    }

    line_totals
}

/// Validate and load a fixture set.
///
/// # Errors
///
/// Returns `SeedError::Invalid` if validation fails, or a database error if
/// any insert fails. On error the transaction is rolled back and nothing is
/// written.
#[instrument(skip(pool, fixtures), fields(
    users = fixtures.users.len(),
    products = fixtures.products.len(),
    carts = fixtures.carts.len(),
    orders = fixtures.orders.len(),
))]
pub async fn seed(pool: &PgPool, fixtures: &FixtureSet) -> Result<SeedReport, SeedError> {
    let errors = validate_fixtures(fixtures);
    if !errors.is_empty() {
        return Err(SeedError::Invalid(errors));
    }

    let mut tx = pool.begin().await?;
    crate::disable_timeouts_local(&mut tx).await?;

    for fixture in &fixtures.users {
        if users::get_by_email(&mut *tx, &fixture.email).await?.is_some() {
            warn!(email = %fixture.email, "Fixture user already exists, skipping seed");
            return Ok(SeedReport {
                skipped_existing: Some(fixture.email.clone()),
                ..SeedReport::default()
            });
        }
    }

    let mut report = SeedReport::default();

    let mut user_ids: HashMap<&Email, UserId> = HashMap::new();
    for fixture in &fixtures.users {
        let user = users::create(
            &mut *tx,
            &NewUser {
                email: fixture.email.clone(),
                password_hash: fixture.password_hash.clone(),
                full_name: fixture.full_name.clone(),
                role: fixture.role,
                is_active: fixture.is_active,
            },
        )
        .await?;
        user_ids.insert(&fixture.email, user.id);
        report.users += 1;
    }

    let mut catalog: HashMap<&Sku, Product> = HashMap::new();
    for fixture in &fixtures.products {
        let product = products::create(
            &mut *tx,
            &NewProduct {
                sku: Some(fixture.sku.clone()),
                name: fixture.name.clone(),
                description: fixture.description.clone(),
                price_cents: fixture.price_cents,
                currency: fixture.currency.clone(),
                stock_quantity: fixture.stock_quantity,
                is_active: fixture.is_active,
            },
        )
        .await?;
        catalog.insert(&fixture.sku, product);
        report.products += 1;
    }

    for fixture in &fixtures.carts {
        let user_id = lookup_user(&user_ids, &fixture.user)?;
        let cart = carts::create(&mut *tx, user_id, fixture.status).await?;
        report.carts += 1;

        for item in &fixture.items {
            let product = lookup_product(&catalog, &item.sku)?;
            carts::add_item(
                &mut *tx,
                cart.id,
                &NewCartItem {
                    product_id: product.id,
                    quantity: item.quantity,
                    unit_price_cents: product.price_cents,
                },
            )
            .await?;
            report.cart_items += 1;
        }
    }

    for fixture in &fixtures.orders {
        let user_id = lookup_user(&user_ids, &fixture.user)?;
        let order = orders::create(
            &mut *tx,
            &NewOrder {
                user_id,
                status: fixture.status,
                tax_cents: fixture.tax_cents,
                shipping_cents: fixture.shipping_cents,
            },
        )
        .await?;
        report.orders += 1;

        for item in &fixture.items {
            let product = lookup_product(&catalog, &item.sku)?;
            orders::add_item(
                &mut *tx,
                order.id,
                &NewOrderItem {
                    product_id: product.id,
                    quantity: item.quantity,
                    unit_price_cents: product.price_cents,
                },
            )
            .await?;
            report.order_items += 1;
        }

        orders::recompute_totals(&mut *tx, order.id).await?;
    }

    tx.commit().await?;

    info!(
        users = report.users,
        products = report.products,
        carts = report.carts,
        cart_items = report.cart_items,
        orders = report.orders,
        order_items = report.order_items,
        "Seeding complete"
    );
    Ok(report)
}

fn lookup_user(ids: &HashMap<&Email, UserId>, email: &Email) -> Result<UserId, SeedError> {
    ids.get(email)
        .copied()
        .ok_or_else(|| SeedError::UnknownReference(format!("user {email}")))
}

fn lookup_product<'a>(
    catalog: &'a HashMap<&Sku, Product>,
    sku: &Sku,
) -> Result<&'a Product, SeedError> {
    catalog
        .get(sku)
        .ok_or_else(|| SeedError::UnknownReference(format!("product {sku}")))
}
