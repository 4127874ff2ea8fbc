//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)` and travel over JSON as strings
//! (e.g. `"18500.00"`), so no precision is lost in the browser.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit in `NUMERIC(10, 2)`.
    #[error("price must be below {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative amount in the store currency, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero pesos.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rounding to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for negative amounts and
    /// [`PriceError::TooLarge`] when the amount overflows the column.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let mut rounded = amount.round_dp(2);
        rounded.rescale(2);
        let max = max_exclusive();
        if rounded >= max {
            return Err(PriceError::TooLarge { max });
        }
        Ok(Self(rounded))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity, failing if the result leaves the column range.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] when the product does not fit and
    /// [`PriceError::Negative`] for negative quantities.
    pub fn checked_mul(self, quantity: i32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::TooLarge {
                max: max_exclusive(),
            })
            .and_then(Self::new)
    }

    /// Add two prices, failing if the sum leaves the column range.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::TooLarge`] when the sum does not fit.
    pub fn checked_add(self, rhs: Self) -> Result<Self, PriceError> {
        Self::new(self.0 + rhs.0)
    }

    /// Average of `total` over `parts`, rounded to cents. Zero for zero parts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] when the average is negative or does not fit.
    pub fn average_of(total: Decimal, parts: i64) -> Result<Self, PriceError> {
        if parts <= 0 {
            return Ok(Self::ZERO);
        }
        Self::new(total / Decimal::from(parts))
    }
}

/// `NUMERIC(10, 2)` tops out at 99 999 999.99.
fn max_exclusive() -> Decimal {
    Decimal::from(100_000_000_i64)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize<'de>>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// ISO 4217 code of the currency the store sells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Argentine peso.
    #[default]
    ARS,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_new_rounds_to_cents() {
        let price = Price::new(dec("10.005")).unwrap();
        assert_eq!(price.to_string(), "10.00");
        let price = Price::new(dec("10.015")).unwrap();
        assert_eq!(price.to_string(), "10.02");
    }

    #[test]
    fn test_serializes_with_two_decimals() {
        let price = Price::new(dec("18500")).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"18500.00\"");
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Price::new(dec("-0.01")), Err(PriceError::Negative));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_new_rejects_overflow() {
        assert!(Price::new(dec("99999999.99")).is_ok());
        assert!(matches!(
            Price::new(dec("100000000")),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Price::new(dec("18500")).unwrap().checked_mul(2).unwrap();
        let b = Price::new(dec("12900")).unwrap().checked_mul(1).unwrap();
        assert_eq!(a.checked_add(b).unwrap().to_string(), "49900.00");
    }

    #[test]
    fn test_checked_mul_rejects_out_of_range_total() {
        let price = Price::new(dec("1000")).unwrap();
        assert!(matches!(
            price.checked_mul(1_000_000),
            Err(PriceError::TooLarge { .. })
        ));
        assert!(price.checked_mul(99_999).is_ok());
    }

    #[test]
    fn test_checked_add_rejects_out_of_range_sum() {
        let big = Price::new(dec("60000000")).unwrap();
        assert!(big.checked_add(big).is_err());
    }

    #[test]
    fn test_average_of() {
        assert_eq!(Price::average_of(dec("100"), 3).unwrap().to_string(), "33.33");
        assert_eq!(Price::average_of(dec("100"), 0).unwrap(), Price::ZERO);
        // Lifetime totals may exceed a single price; their average may not.
        assert_eq!(
            Price::average_of(dec("150000000"), 2).unwrap().to_string(),
            "75000000.00"
        );
    }

    #[test]
    fn test_serde_accepts_string_and_number() {
        let from_str: Price = serde_json::from_str("\"24300.50\"").unwrap();
        let from_num: Price = serde_json::from_str("24300.5").unwrap();
        assert_eq!(from_str, from_num);
        assert!(serde_json::from_str::<Price>("\"-1\"").is_err());
    }
}
