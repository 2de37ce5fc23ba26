use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

/// A number accepted by [`crate::RuleBasedNumberFormat::format`] and returned
/// by its parse methods.
///
/// `Decimal` carries values of any magnitude and precision. Formatting an
/// `f64` and formatting the `Decimal` spelled the same way produce the same
/// text.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Integer(i64),
    Double(f64),
    Decimal(BigDecimal),
}

impl Number {
    /// Lossy conversion, mostly for assertions and display.
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Double(d) => *d,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Double(d) if d.fract() == 0.0 && d.abs() < 9.2e18 => Some(*d as i64),
            Number::Double(_) => None,
            Number::Decimal(d) if d.is_integer() => d.to_i64(),
            Number::Decimal(_) => None,
        }
    }

    /// Narrow an exact value to the most natural variant: integers that fit
    /// become `Integer`, everything else stays a `Decimal`.
    pub(crate) fn from_exact(value: BigDecimal) -> Number {
        if value.is_integer() {
            if let Some(i) = value.to_i64() {
                return Number::Integer(i);
            }
        }
        Number::Decimal(value.normalized())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Double(d) => write!(f, "{d}"),
            Number::Decimal(d) => f.write_str(&plain_string(d)),
        }
    }
}

macro_rules! integer_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Number {
            fn from(value: $t) -> Self {
                Number::Integer(value as i64)
            }
        })*
    };
}

integer_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Number::Integer(i),
            Err(_) => Number::Decimal(BigDecimal::from(value)),
        }
    }
}

impl From<i128> for Number {
    fn from(value: i128) -> Self {
        match i64::try_from(value) {
            Ok(i) => Number::Integer(i),
            Err(_) => Number::Decimal(BigDecimal::new(BigInt::from(value), 0)),
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        // Through the shortest f32 spelling, so 0.1f32 stays 0.1.
        match value.to_string().parse::<f64>() {
            Ok(d) => Number::Double(d),
            Err(_) => Number::Double(value as f64),
        }
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}

impl From<BigDecimal> for Number {
    fn from(value: BigDecimal) -> Self {
        Number::Decimal(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::Decimal(BigDecimal::new(value, 0))
    }
}

/// Digits of `value` without exponent notation, e.g. `1E+3` as `1000`.
pub(crate) fn plain_string(value: &BigDecimal) -> String {
    let (int, scale) = value.as_bigint_and_exponent();
    let negative = int.sign() == Sign::Minus;
    let digits = int.magnitude().to_string();
    let mut out = String::with_capacity(digits.len() + 2);
    if negative {
        out.push('-');
    }
    if scale <= 0 {
        out.push_str(&digits);
        if digits != "0" {
            out.extend(std::iter::repeat_n('0', scale.unsigned_abs() as usize));
        }
        return out;
    }
    let scale = scale as usize;
    if digits.len() > scale {
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    } else {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', scale - digits.len()));
        out.push_str(&digits);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn plain_string_never_uses_exponents() {
        let cases = vec![
            ("1000", BigDecimal::new(BigInt::from(1), -3)),
            ("0.001", BigDecimal::from_str("0.001").unwrap()),
            ("-12.50", BigDecimal::new(BigInt::from(-1250), 2)),
            ("0", BigDecimal::new(BigInt::from(0), -4)),
        ];
        for (expected, value) in cases {
            assert_eq!(plain_string(&value), expected, "plain spelling of {value:?}");
        }
    }

    #[test]
    fn exact_values_narrow_to_integers() {
        assert_eq!(Number::from_exact(BigDecimal::from_str("42.000").unwrap()), Number::Integer(42));
        assert_eq!(
            Number::from_exact(BigDecimal::from_str("0.250").unwrap()),
            Number::Decimal(BigDecimal::from_str("0.25").unwrap())
        );
        let huge = BigDecimal::from_str("100000000000000000000").unwrap();
        assert!(matches!(Number::from_exact(huge), Number::Decimal(_)));
    }

    #[test]
    fn unsigned_values_beyond_i64_stay_exact() {
        assert_eq!(Number::from(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Number::from(7u64), Number::Integer(7));
    }
}
