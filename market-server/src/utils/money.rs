//! Money helpers
//!
//! Domain code works in `Decimal` currency units rounded to 2 decimal
//! places. The store keeps INTEGER minor units so conditional updates
//! compare exact integers.

use rust_decimal::prelude::*;
use thiserror::Error;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed quantity per order line
pub const MAX_QUANTITY: i64 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("{0} is not a whole number of cents")]
    FractionalCents(Decimal),

    #[error("{0} is out of range")]
    OutOfRange(Decimal),

    #[error("amount must be positive, got {0}")]
    NotPositive(Decimal),
}

/// Round to 2 dp, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert currency units to cents; rejects sub-cent precision
pub fn to_cents(value: Decimal) -> Result<i64, MoneyError> {
    if round_money(value) != value {
        return Err(MoneyError::FractionalCents(value));
    }
    (value * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or(MoneyError::OutOfRange(value))
}

/// Convert cents back to currency units
#[inline]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Like [`to_cents`], but the amount must also be > 0
pub fn positive_cents(value: Decimal) -> Result<i64, MoneyError> {
    let cents = to_cents(value)?;
    if cents <= 0 {
        return Err(MoneyError::NotPositive(value));
    }
    Ok(cents)
}

/// Stored weights are whole grams
#[inline]
pub fn grams_to_kg(grams: i64) -> Decimal {
    Decimal::new(grams, 3)
}

/// `unit_price × quantity`, rounded
pub fn line_total(unit_price: Decimal, quantity: i64) -> Decimal {
    round_money(unit_price * Decimal::from(quantity))
}

/// `part / whole × amount`, rounded. `whole` must be > 0.
pub fn prorate(amount: Decimal, part: i64, whole: i64) -> Decimal {
    if whole <= 0 {
        return Decimal::ZERO;
    }
    if part == whole {
        return amount;
    }
    round_money(amount * Decimal::from(part) / Decimal::from(whole))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(round_money(dec("0.005")), dec("0.01"));
        assert_eq!(round_money(dec("0.004")), dec("0.00"));
        assert_eq!(round_money(dec("-0.005")), dec("-0.01"));
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(dec("100")).unwrap(), 10_000);
        assert_eq!(to_cents(dec("85.5")).unwrap(), 8_550);
        assert_eq!(from_cents(1_505), dec("15.05"));
        assert_eq!(
            to_cents(dec("0.001")),
            Err(MoneyError::FractionalCents(dec("0.001")))
        );
    }

    #[test]
    fn test_positive_cents() {
        assert!(positive_cents(dec("0.01")).is_ok());
        assert!(matches!(
            positive_cents(Decimal::ZERO),
            Err(MoneyError::NotPositive(_))
        ));
        assert!(matches!(
            positive_cents(dec("-3")),
            Err(MoneyError::NotPositive(_))
        ));
    }

    #[test]
    fn test_accumulation_precision() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += dec("0.01");
        }
        assert_eq!(total, dec("10"));
        assert_eq!(to_cents(total).unwrap(), 1_000);
    }

    #[test]
    fn test_prorate() {
        assert_eq!(prorate(dec("200"), 1, 2), dec("100"));
        assert_eq!(prorate(dec("90"), 1, 3), dec("30"));
        assert_eq!(prorate(dec("10"), 1, 3), dec("3.33"));
        assert_eq!(prorate(dec("10"), 3, 3), dec("10"));
    }

    #[test]
    fn test_line_total_and_weight() {
        assert_eq!(line_total(dec("10.99"), 3), dec("32.97"));
        assert_eq!(grams_to_kg(1_250), dec("1.25"));
    }
}
