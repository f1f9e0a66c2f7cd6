//! Retro Shop Core - Shared domain types.
//!
//! This crate provides the types used across the Retro Shop workspace:
//! - `db` - Migrations, repositories, seeding and integrity checks
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. The
//! optional `postgres` feature adds `sqlx` encoding so the same types can be
//! bound to queries and decoded from rows.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, SKUs, money, quantities and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
