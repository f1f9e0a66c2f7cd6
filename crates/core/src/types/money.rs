//! Cents-based money.
//!
//! Every monetary column in the schema (`price_cents`, `unit_price_cents`,
//! `line_total_cents`, `subtotal_cents`, `tax_cents`, `shipping_cents`,
//! `total_cents`) is a non-negative `INTEGER` in the smallest currency unit.
//! [`Cents`] mirrors that column type: it cannot hold a negative value and all
//! arithmetic is checked.

use core::fmt;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::quantity::Quantity;

/// Errors produced by money construction and arithmetic.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative: {0}")]
    Negative(i64),
    /// The result does not fit in an `INTEGER` column.
    #[error("amount overflows a 32-bit cents column")]
    Overflow,
    /// The currency code is not three uppercase letters.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

/// A non-negative amount in cents.
///
/// ```
/// use retro_shop_core::{Cents, Quantity};
///
/// let unit = Cents::new(1299).unwrap();
/// let line = unit.checked_mul(Quantity::new(2).unwrap()).unwrap();
/// assert_eq!(line.as_i32(), 2598);
///
/// assert!(Cents::new(-1).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub struct Cents(i32);

impl Cents {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create an amount, rejecting negative values.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `cents < 0`.
    pub const fn new(cents: i32) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Negative(cents as i64));
        }
        Ok(Self(cents))
    }

    /// Get the underlying cents value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Add two amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the sum exceeds `i32::MAX`.
    pub const fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        match self.0.checked_add(other.0) {
            Some(sum) => Ok(Self(sum)),
            None => Err(MoneyError::Overflow),
        }
    }

    /// Multiply a unit price by a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product exceeds `i32::MAX`.
    pub const fn checked_mul(self, quantity: Quantity) -> Result<Self, MoneyError> {
        match self.0.checked_mul(quantity.as_i32()) {
            Some(product) => Ok(Self(product)),
            None => Err(MoneyError::Overflow),
        }
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl TryFrom<i32> for Cents {
    type Error = MoneyError;

    fn try_from(cents: i32) -> Result<Self, Self::Error> {
        Self::new(cents)
    }
}

impl From<Cents> for i32 {
    fn from(cents: Cents) -> Self {
        cents.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Cents {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Cents {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let cents = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(cents)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Cents {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// A three-letter currency code, as stored in `products.currency`.
///
/// Parsing requires three uppercase ASCII letters (the ISO 4217 shape). The
/// column itself only checks `char_length = 3`, so values read back from the
/// database are taken as-is.
///
/// ```
/// use retro_shop_core::CurrencyCode;
///
/// let yen: CurrencyCode = "JPY".parse().unwrap();
/// assert_eq!(yen.as_str(), "JPY");
/// assert_eq!(CurrencyCode::default(), CurrencyCode::USD);
/// assert!("usd".parse::<CurrencyCode>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(Cow<'static, str>);

impl CurrencyCode {
    pub const USD: Self = Self(Cow::Borrowed("USD"));
    pub const EUR: Self = Self(Cow::Borrowed("EUR"));
    pub const GBP: Self = Self(Cow::Borrowed("GBP"));

    /// Parse a currency code.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidCurrency`] unless `s` is exactly three
    /// uppercase ASCII letters.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(Cow::Owned(s.to_owned())))
        } else {
            Err(MoneyError::InvalidCurrency(s.to_owned()))
        }
    }

    /// The code as stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::USD
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MoneyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0.into_owned()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CurrencyCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CurrencyCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Any code the column check admits must load, known to us or not
        Ok(Self(Cow::Owned(s)))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CurrencyCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// The monetary breakdown of an order.
///
/// The database does not enforce `total = subtotal + tax + shipping`; code
/// that writes orders derives the total from this type instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of all line totals.
    pub subtotal: Cents,
    /// Tax charged on the order.
    pub tax: Cents,
    /// Shipping charged on the order.
    pub shipping: Cents,
}

impl OrderTotals {
    /// Build totals by summing line totals.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the subtotal does not fit.
    pub fn from_line_totals<I>(lines: I, tax: Cents, shipping: Cents) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Cents>,
    {
        let subtotal = lines
            .into_iter()
            .try_fold(Cents::ZERO, Cents::checked_add)?;
        Ok(Self {
            subtotal,
            tax,
            shipping,
        })
    }

    /// `subtotal + tax + shipping`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the total does not fit.
    pub fn total(&self) -> Result<Cents, MoneyError> {
        self.subtotal.checked_add(self.tax)?.checked_add(self.shipping)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cents(n: i32) -> Cents {
        Cents::new(n).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Cents::new(-5), Err(MoneyError::Negative(-5)));
        assert_eq!(Cents::new(0), Ok(Cents::ZERO));
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(cents(i32::MAX).checked_add(cents(1)), Err(MoneyError::Overflow));
        assert_eq!(cents(100).checked_add(cents(99)), Ok(cents(199)));
    }

    #[test]
    fn test_checked_mul_by_quantity() {
        let qty = Quantity::new(3).unwrap();
        assert_eq!(cents(1599).checked_mul(qty), Ok(cents(4797)));
        assert_eq!(cents(i32::MAX).checked_mul(qty), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_display() {
        assert_eq!(cents(1299).to_string(), "12.99");
        assert_eq!(cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Cents>("-1").is_err());
        assert_eq!(serde_json::from_str::<Cents>("2499").unwrap(), cents(2499));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("EUR".parse::<CurrencyCode>(), Ok(CurrencyCode::EUR));
        assert_eq!(CurrencyCode::parse("JPY").unwrap().as_str(), "JPY");
        assert_eq!(CurrencyCode::default(), CurrencyCode::USD);
    }

    #[test]
    fn test_currency_rejects_malformed() {
        for bad in ["usd", "US", "USDX", "", "U1D", "ÄÖÜ"] {
            assert_eq!(
                CurrencyCode::parse(bad),
                Err(MoneyError::InvalidCurrency(bad.to_owned())),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_currency_serde() {
        let code: CurrencyCode = serde_json::from_str("\"CHF\"").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"CHF\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"chf\"").is_err());
    }

    #[test]
    fn test_order_totals() {
        let totals =
            OrderTotals::from_line_totals([cents(1299), cents(2499)], cents(300), cents(500))
                .unwrap();
        assert_eq!(totals.subtotal, cents(3798));
        assert_eq!(totals.total(), Ok(cents(4598)));
    }

    #[test]
    fn test_order_totals_without_lines() {
        let totals = OrderTotals::from_line_totals(Vec::new(), Cents::ZERO, cents(450)).unwrap();
        assert_eq!(totals.subtotal, Cents::ZERO);
        assert_eq!(totals.total(), Ok(cents(450)));
    }

    #[test]
    fn test_order_totals_overflow() {
        let totals = OrderTotals {
            subtotal: cents(i32::MAX),
            tax: cents(1),
            shipping: Cents::ZERO,
        };
        assert_eq!(totals.total(), Err(MoneyError::Overflow));
    }
}
