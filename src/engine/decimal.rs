//! Plain decimal formatting for `=#,##0=`-style substitutions.
//!
//! Only what rule bodies use is supported: `0` and `#` digits, one grouping
//! size taken from the last `,` of the integer part, and an optional
//! fraction part. Rounding is half-even at the pattern's maximum fraction
//! digits.

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, Sign};

use crate::Operand;

/// Symbols used when numbers are written as digits.
///
/// The decimal separator also decides which of a rule set's `x.x` / `x,x`
/// style fraction rules is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalSymbols {
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub minus_sign: char,
    pub infinity: String,
    pub nan: String,
}

impl Default for DecimalSymbols {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: ',',
            minus_sign: '-',
            infinity: "∞".to_string(),
            nan: "NaN".to_string(),
        }
    }
}

/// A compiled `#,##0.##` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecimalPattern {
    min_integer_digits: usize,
    grouping: usize,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
}

impl DecimalPattern {
    pub(crate) fn compile(source: &str) -> Result<Self, String> {
        if !regex!(r"^[#0,]*[#0](?:\.[#0]*)?$").is_match(source) {
            return Err(format!("unsupported number pattern `{source}`"));
        }
        let (int_part, frac_part) = source.split_once('.').unwrap_or((source, ""));
        let grouping = match int_part.rfind(',') {
            Some(pos) => int_part[pos + 1..].len(),
            None => 0,
        };
        Ok(Self {
            min_integer_digits: int_part.chars().filter(|&c| c == '0').count(),
            grouping,
            min_fraction_digits: frac_part.chars().filter(|&c| c == '0').count(),
            max_fraction_digits: frac_part.len(),
        })
    }

    /// The fallback used by lenient parsing and huge values.
    pub(crate) fn general() -> Self {
        Self {
            min_integer_digits: 1,
            grouping: 3,
            min_fraction_digits: 0,
            max_fraction_digits: 3,
        }
    }

    pub(crate) fn has_fraction_digits(&self) -> bool {
        self.max_fraction_digits > 0
    }

    pub(crate) fn format(&self, value: &Operand, symbols: &DecimalSymbols) -> String {
        match value {
            Operand::NaN => symbols.nan.clone(),
            Operand::Infinite { negative: false } => symbols.infinity.clone(),
            Operand::Infinite { negative: true } => format!("{}{}", symbols.minus_sign, symbols.infinity),
            Operand::Finite(v) => self.format_decimal(v, symbols),
        }
    }

    fn format_decimal(&self, value: &BigDecimal, symbols: &DecimalSymbols) -> String {
        let rounded = value.with_scale_round(self.max_fraction_digits as i64, RoundingMode::HalfEven);
        let (int, _) = rounded.as_bigint_and_exponent();
        let negative = int.sign() == Sign::Minus;
        let digits = int.magnitude().to_string();

        let split = digits.len().saturating_sub(self.max_fraction_digits);
        let mut int_digits = digits[..split].trim_start_matches('0').to_string();
        let mut frac_digits = format!("{:0>width$}", &digits[split..], width = self.max_fraction_digits);
        while frac_digits.len() > self.min_fraction_digits && frac_digits.ends_with('0') {
            frac_digits.pop();
        }
        if int_digits.len() < self.min_integer_digits {
            int_digits = format!("{:0>width$}", int_digits, width = self.min_integer_digits);
        }

        let mut out = String::new();
        if negative {
            out.push(symbols.minus_sign);
        }
        out.push_str(&group(&int_digits, self.grouping, symbols.grouping_separator));
        if !frac_digits.is_empty() {
            out.push(symbols.decimal_separator);
            out.push_str(&frac_digits);
        }
        out
    }

    /// Read a number at the start of `text`. Returns the value and the bytes
    /// consumed. Grouping separators are accepted between digits.
    pub(crate) fn parse_prefix(&self, text: &str, symbols: &DecimalSymbols) -> Option<(BigDecimal, usize)> {
        let mut digits = String::new();
        let mut scale: i64 = 0;
        let mut pos = 0;
        let mut chars = text.char_indices().peekable();

        let negative = match chars.peek() {
            Some(&(_, c)) if c == symbols.minus_sign || c == '-' => {
                chars.next();
                true
            }
            _ => false,
        };

        let mut in_fraction = false;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                if in_fraction {
                    scale += 1;
                }
                pos = i + c.len_utf8();
                chars.next();
                continue;
            }
            let next_is_digit = text[i + c.len_utf8()..].starts_with(|n: char| n.is_ascii_digit());
            if c == symbols.grouping_separator && !in_fraction && !digits.is_empty() && next_is_digit {
                chars.next();
                continue;
            }
            if c == symbols.decimal_separator && !in_fraction && !digits.is_empty() && next_is_digit {
                in_fraction = true;
                chars.next();
                continue;
            }
            break;
        }

        if digits.is_empty() {
            return None;
        }
        let mut int: BigInt = digits.parse().ok()?;
        if negative {
            int = -int;
        }
        Some((BigDecimal::new(int, scale), pos))
    }
}

fn group(digits: &str, size: usize, separator: char) -> String {
    if size == 0 || digits.len() <= size {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / size);
    let first = digits.len() % size;
    if first > 0 {
        out.push_str(&digits[..first]);
    }
    for (i, chunk) in digits.as_bytes()[first..].chunks(size).enumerate() {
        if i > 0 || first > 0 {
            out.push(separator);
        }
        out.extend(chunk.iter().map(|&b| b as char));
    }
    out
}
