//! Rule-based number formatting and parsing.
//!
//! A formatter is compiled from a small rule language (named rule sets of
//! `key: body;` rules) and turns numbers into text such as spelled-out
//! cardinals, ordinals or durations. The same rules drive the reverse
//! direction: [`RuleBasedNumberFormat::parse`] recovers a number from text.
//!
//! ```
//! use rbnf::RuleBasedNumberFormat;
//!
//! let fmt = RuleBasedNumberFormat::spellout().unwrap();
//! assert_eq!(fmt.format(106, None).unwrap(), "one hundred six");
//! assert_eq!(fmt.parse("minus thirty-six", None).unwrap().to_f64(), -36.0);
//! ```

extern crate self as rbnf;

use bigdecimal::BigDecimal;

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod number;
pub mod rules;

pub use api::{Capitalization, FormatRequest, ParseOutcome, ParseRequest, RuleBasedNumberFormat};
pub use bigdecimal::RoundingMode;
pub use engine::{
    DecimalSymbols, DelimiterScanner, IcuPluralResolver, LenientScanner, PluralCategory, PluralKind,
    PluralResolver, RuleSetCollection, RuleSetInfo,
};
pub use error::{CompileError, FormatError, ParseError};
pub use number::Number;

// --- Internal types ---------------------------------------------------------

/// Nested rule applications allowed before a format or parse call gives up.
pub(crate) const RECURSION_LIMIT: usize = 64;

/// A value flowing through the engine.
///
/// Everything finite is carried exactly; the double path converts to this
/// representation once, at the API boundary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Finite(BigDecimal),
    Infinite { negative: bool },
    NaN,
}

impl Operand {
    pub(crate) fn is_negative(&self) -> bool {
        match self {
            Operand::Finite(v) => v.sign() == num_bigint::Sign::Minus,
            Operand::Infinite { negative } => *negative,
            Operand::NaN => false,
        }
    }

    pub(crate) fn abs(&self) -> Operand {
        match self {
            Operand::Finite(v) => Operand::Finite(v.abs()),
            Operand::Infinite { .. } => Operand::Infinite { negative: false },
            Operand::NaN => Operand::NaN,
        }
    }

    pub(crate) fn negated(&self) -> Operand {
        match self {
            Operand::Finite(v) => Operand::Finite(-v),
            Operand::Infinite { negative } => Operand::Infinite { negative: !negative },
            Operand::NaN => Operand::NaN,
        }
    }

    pub(crate) fn as_finite(&self) -> Option<&BigDecimal> {
        match self {
            Operand::Finite(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Finite(v) => f.write_str(&number::plain_string(v)),
            Operand::Infinite { negative: true } => f.write_str("-Infinity"),
            Operand::Infinite { negative: false } => f.write_str("Infinity"),
            Operand::NaN => f.write_str("NaN"),
        }
    }
}
