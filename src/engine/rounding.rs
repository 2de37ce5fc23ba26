//! Turning a caller's [`Number`] into the exact operand the engine formats.
//!
//! Both input paths end up as a `BigDecimal`: doubles through their shortest
//! round-trip string, so `0.1_f64` and the decimal `0.1` format identically.
//! Rounding happens here, once, before any rule is selected.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::ToPrimitive;

use crate::Operand;
use crate::engine::substitution::floor;
use crate::error::FormatError;
use crate::number::Number;

/// Fraction digits kept when a request does not say otherwise.
pub(crate) const DEFAULT_MAX_FRACTION_DIGITS: u32 = 3;

/// Rounding policy for one format call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RoundingPolicy {
    pub mode: Option<RoundingMode>,
    pub max_fraction_digits: u32,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self { mode: None, max_fraction_digits: DEFAULT_MAX_FRACTION_DIGITS }
    }
}

impl RoundingPolicy {
    /// Mode used when a non-integer must become an integer.
    pub(crate) fn integer_mode(&self) -> RoundingMode {
        self.mode.unwrap_or(RoundingMode::HalfUp)
    }

    pub(crate) fn prepare(&self, number: &Number) -> Result<Operand, FormatError> {
        let exact = match number {
            Number::Integer(i) => BigDecimal::from(*i),
            Number::Double(d) if d.is_nan() => return Ok(Operand::NaN),
            Number::Double(d) if d.is_infinite() => return Ok(Operand::Infinite { negative: *d < 0.0 }),
            Number::Double(d) => BigDecimal::from_str(&d.to_string())
                .map_err(|err| FormatError::Arithmetic(format!("cannot convert {d} exactly: {err}")))?,
            Number::Decimal(v) => v.clone(),
        };
        Ok(Operand::Finite(self.round(exact)))
    }

    fn round(&self, value: BigDecimal) -> BigDecimal {
        let scale = i64::from(self.max_fraction_digits);
        let value = match self.mode {
            Some(mode) => value.with_scale_round(scale, mode),
            None => value,
        };
        if floor(&value.abs()).to_i64().is_none() && value.fractional_digit_count() > scale {
            tracing::trace!(%value, scale, "integer part exceeds 64 bits, truncating fraction");
            return value.with_scale_round(scale, RoundingMode::Down);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn finite(s: &str) -> Operand {
        Operand::Finite(BigDecimal::from_str(s).unwrap())
    }

    #[test_case(Number::Double(0.1), "0.1" ; "shortest double string")]
    #[test_case(Number::Double(4.3), "4.3" ; "no binary noise")]
    #[test_case(Number::Integer(-36), "-36" ; "integers are exact")]
    #[test_case(Number::Double(1e21), "1000000000000000000000" ; "no exponent")]
    fn unrounded(number: Number, expected: &str) {
        assert_eq!(RoundingPolicy::default().prepare(&number).unwrap(), finite(expected));
    }

    #[test_case(RoundingMode::HalfEven, 0, "1.5", "2")]
    #[test_case(RoundingMode::HalfEven, 0, "0.5", "0")]
    #[test_case(RoundingMode::HalfEven, 1, "10.15", "10.2")]
    #[test_case(RoundingMode::Down, 3, "4.3", "4.3")]
    #[test_case(RoundingMode::Down, 1, "-2.29", "-2.2")]
    #[test_case(RoundingMode::Ceiling, 0, "2.1", "3")]
    #[test_case(RoundingMode::Floor, 0, "-2.1", "-3")]
    fn rounding_modes(mode: RoundingMode, digits: u32, value: &str, expected: &str) {
        let policy = RoundingPolicy { mode: Some(mode), max_fraction_digits: digits };
        let number = Number::Decimal(BigDecimal::from_str(value).unwrap());
        assert_eq!(policy.prepare(&number).unwrap(), finite(expected));
    }

    #[test]
    fn doubles_and_decimals_agree() {
        let policy = RoundingPolicy { mode: Some(RoundingMode::HalfEven), max_fraction_digits: 2 };
        for (double, decimal) in [(1.005, "1.005"), (2.675, "2.675"), (0.125, "0.125")] {
            let a = policy.prepare(&Number::Double(double)).unwrap();
            let b = policy.prepare(&Number::Decimal(BigDecimal::from_str(decimal).unwrap())).unwrap();
            assert_eq!(a, b, "{double} vs {decimal}");
        }
    }

    #[test]
    fn huge_values_lose_extra_fraction_digits() {
        let number = Number::Decimal(BigDecimal::from_str("12345678901234567890.123456").unwrap());
        assert_eq!(RoundingPolicy::default().prepare(&number).unwrap(), finite("12345678901234567890.123"));
        let small = Number::Decimal(BigDecimal::from_str("1.123456").unwrap());
        assert_eq!(RoundingPolicy::default().prepare(&small).unwrap(), finite("1.123456"));
    }

    #[test]
    fn non_finite_doubles() {
        assert_eq!(RoundingPolicy::default().prepare(&Number::Double(f64::NAN)), Ok(Operand::NaN));
        assert_eq!(
            RoundingPolicy::default().prepare(&Number::Double(f64::NEG_INFINITY)),
            Ok(Operand::Infinite { negative: true })
        );
    }
}
