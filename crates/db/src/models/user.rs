//! User rows.

use chrono::{DateTime, Utc};

use retro_shop_core::{Email, UserId, UserRole};

/// A row of `users`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email (unique).
    pub email: Email,
    /// Stored credential. Seed rows hold placeholders, not real hashes.
    pub password_hash: String,
    /// Display name.
    pub full_name: Option<String>,
    pub role: UserRole,
    /// Whether the account may be used.
    pub is_active: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Parameters for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}
