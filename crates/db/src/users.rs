//! User repository.
//!
//! Deleting a user cascades to their carts but is refused while they own
//! orders.

use sqlx::PgExecutor;
use tracing::{debug, instrument};

use retro_shop_core::{Email, UserId, UserRole};

use crate::error::{RepositoryError, WriteKind};
use crate::models::{NewUser, User};

macro_rules! user_columns {
    () => {
        "id, email, password_hash, full_name, role, is_active, created_at, updated_at"
    };
}

/// Insert a user.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email already exists.
/// Returns `RepositoryError::Database` for other database errors.
#[instrument(skip(executor, new), fields(email = %new.email, role = %new.role))]
pub async fn create<'e, E>(executor: E, new: &NewUser) -> Result<User, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(concat!(
        "INSERT INTO users (email, password_hash, full_name, role, is_active) ",
        "VALUES ($1, $2, $3, $4, $5) ",
        "RETURNING ",
        user_columns!()
    ))
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.full_name.as_deref())
    .bind(new.role)
    .bind(new.is_active)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_write(e, WriteKind::Insert))?;

    debug!(id = %user.id, "Inserted user");
    Ok(user)
}

/// Get a user by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_id<'e, E>(executor: E, id: UserId) -> Result<Option<User>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(concat!(
        "SELECT ",
        user_columns!(),
        " FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Get a user by email address.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_email<'e, E>(executor: E, email: &Email) -> Result<Option<User>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(concat!(
        "SELECT ",
        user_columns!(),
        " FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// List users with the given role, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_by_role<'e, E>(executor: E, role: UserRole) -> Result<Vec<User>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let users = sqlx::query_as::<_, User>(concat!(
        "SELECT ",
        user_columns!(),
        " FROM users WHERE role = $1 ORDER BY id"
    ))
    .bind(role)
    .fetch_all(executor)
    .await?;

    Ok(users)
}

/// Delete a user and, by cascade, their carts.
///
/// # Errors
///
/// Returns `RepositoryError::Restricted` if the user still has orders.
/// Returns `RepositoryError::NotFound` if no such user exists.
#[instrument(skip(executor))]
pub async fn delete<'e, E>(executor: E, id: UserId) -> Result<(), RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| RepositoryError::from_write(e, WriteKind::Delete))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    debug!("Deleted user");
    Ok(())
}
