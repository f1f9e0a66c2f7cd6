//! Core types for Retro Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

/// Map a string-backed enum onto a `TEXT` column.
///
/// The type must provide `as_str()` and `FromStr`. Values are constrained by a
/// `CHECK` in the schema rather than a Postgres enum type.
macro_rules! impl_text_sqlx {
    ($name:ident) => {
        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<Self>()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::core::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

pub mod email;
pub mod id;
pub mod money;
pub mod quantity;
pub mod sku;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Cents, CurrencyCode, MoneyError, OrderTotals};
pub use quantity::{Quantity, QuantityError};
pub use sku::{Sku, SkuError};
pub use status::{CartStatus, OrderStatus, ParseStatusError, UserRole};
