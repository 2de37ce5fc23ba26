//! Compiled rules, rule sets, and rule selection.
//!
//! A [`RuleSet`] keeps its threshold rules sorted by base value and its
//! special rules (`-x`, fractions, `Inf`, `NaN`) on the side. Selecting a rule
//! for a value follows a fixed order:
//!
//! ```text
//! NaN ──> NaN rule | symbol
//! v < 0 ──> -x rule | minus sign + |v|
//! +Inf ──> Inf rule | symbol
//! fraction set ──> closest denominator
//! non-integer ──> 0.x (v < 1) | x.x
//! x.0 present ──> x.0
//! non-integer ──> round, then threshold lookup
//! integer ──> largest base <= v, with rollback
//! ```

use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::Operand;
use crate::engine::decimal::DecimalSymbols;
use crate::engine::descriptor::{DEFAULT_RADIX, SpecialKind};
use crate::engine::substitution::{Substitution, SubstitutionKind, floor, round_half_up};
use crate::engine::template::{Segment, write_literal};

bitflags::bitflags! {
    /// Properties of a rule set fixed at compile time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct RuleSetFlags: u8 {
        /// Name starts with a single `%`.
        const PUBLIC    = 1 << 0;
        /// Formats fractional parts (numerators over a denominator).
        const FRACTION  = 1 << 1;
        /// Tried by parsing when no set is named.
        const PARSEABLE = 1 << 2;
    }
}

/// One compiled rule.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rule {
    pub base: i64,
    pub radix: u32,
    pub exponent: u32,
    pub divisor: i64,
    /// Number of `>` written after the key.
    pub lowered: u32,
    pub radix_given: bool,
    pub special: Option<SpecialKind>,
    pub decimal_point: Option<char>,
    pub segments: Vec<Segment<Substitution>>,
}

impl Rule {
    pub(crate) fn substitutions(&self) -> Vec<&Substitution> {
        crate::engine::template::substitutions(&self.segments)
    }

    pub(crate) fn has_modulus(&self) -> bool {
        self.substitutions().iter().any(|s| matches!(s.kind, SubstitutionKind::Modulus { .. }))
    }

    /// True when `n` is an exact multiple of the divisor but this rule's base
    /// is not, so the remainder would read as "zero".
    pub(crate) fn should_roll_back(&self, n: &BigInt) -> bool {
        if !self.has_modulus() || self.divisor == 0 {
            return false;
        }
        let divisor = BigInt::from(self.divisor);
        (n % &divisor).is_zero() && self.base % self.divisor != 0
    }

    pub(crate) fn key_text(&self) -> String {
        match self.special {
            Some(kind) => {
                let point = self.decimal_point.unwrap_or('.');
                match kind {
                    SpecialKind::Negative => "-x".to_string(),
                    SpecialKind::ImproperFraction => format!("x{point}x"),
                    SpecialKind::ProperFraction => format!("0{point}x"),
                    SpecialKind::Master => format!("x{point}0"),
                    SpecialKind::Infinity => "Inf".to_string(),
                    SpecialKind::NotANumber => "NaN".to_string(),
                }
            }
            None => {
                let mut key = self.base.to_string();
                if self.radix_given || self.radix != DEFAULT_RADIX {
                    key.push_str(&format!("/{}", self.radix));
                }
                key.push_str(&">".repeat(self.lowered as usize));
                key
            }
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.key_text())?;
        write_segments(f, &self.segments, true)?;
        f.write_str(";")
    }
}

fn write_segments(f: &mut fmt::Formatter<'_>, segments: &[Segment<Substitution>], at_start: bool) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Literal(text) => write_literal(f, text, at_start && i == 0)?,
            Segment::Substitution(sub) => f.write_str(&sub.source)?,
            Segment::Plural(block) => write!(f, "{block}")?,
            Segment::Optional(inner) => {
                f.write_str("[")?;
                write_segments(f, inner, false)?;
                f.write_str("]")?;
            }
        }
    }
    Ok(())
}

/// A named, ordered group of rules.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RuleSet {
    pub name: String,
    pub flags: RuleSetFlags,
    /// Threshold rules in ascending base order.
    pub rules: Vec<Rule>,
    /// Special rules in definition order.
    pub specials: Vec<Rule>,
    /// Least common multiple of the bases, for fraction sets.
    pub lcm: Option<i64>,
}

/// Outcome of rule selection.
#[derive(Debug)]
pub(crate) enum Selection<'a> {
    Rule(&'a Rule),
    /// No rule applies; print this text.
    Symbol(&'a str),
    /// Negative value without a `-x` rule.
    MinusThenAbs,
    /// Non-integer without any fraction rule.
    RoundToInteger,
}

impl RuleSet {
    pub(crate) fn is_public(&self) -> bool {
        self.flags.contains(RuleSetFlags::PUBLIC)
    }

    pub(crate) fn is_fraction(&self) -> bool {
        self.flags.contains(RuleSetFlags::FRACTION)
    }

    /// The special rule of `kind`. Fraction kinds prefer the rule written with
    /// `separator` and fall back to the first one defined.
    pub(crate) fn special(&self, kind: SpecialKind, separator: char) -> Option<&Rule> {
        let mut candidates = self.specials.iter().filter(|r| r.special == Some(kind));
        if !kind.is_fraction() {
            return candidates.next();
        }
        let first = self.specials.iter().find(|r| r.special == Some(kind));
        self.specials
            .iter()
            .rev()
            .find(|r| r.special == Some(kind) && r.decimal_point == Some(separator))
            .or(first)
    }

    pub(crate) fn select<'a>(&'a self, value: &Operand, symbols: &'a DecimalSymbols) -> Option<Selection<'a>> {
        let v = match value {
            Operand::NaN => {
                return Some(match self.special(SpecialKind::NotANumber, symbols.decimal_separator) {
                    Some(rule) => Selection::Rule(rule),
                    None => Selection::Symbol(&symbols.nan),
                });
            }
            _ if value.is_negative() => {
                return Some(match self.special(SpecialKind::Negative, symbols.decimal_separator) {
                    Some(rule) => Selection::Rule(rule),
                    None => Selection::MinusThenAbs,
                });
            }
            Operand::Infinite { .. } => {
                return Some(match self.special(SpecialKind::Infinity, symbols.decimal_separator) {
                    Some(rule) => Selection::Rule(rule),
                    None => Selection::Symbol(&symbols.infinity),
                });
            }
            Operand::Finite(v) => v,
        };

        if self.is_fraction() {
            return self.fraction_rule(v).map(Selection::Rule);
        }

        let separator = symbols.decimal_separator;
        if !v.is_integer() {
            if *v < BigDecimal::from(1) {
                if let Some(rule) = self.special(SpecialKind::ProperFraction, separator) {
                    return Some(Selection::Rule(rule));
                }
            }
            if let Some(rule) = self.special(SpecialKind::ImproperFraction, separator) {
                return Some(Selection::Rule(rule));
            }
        }
        if let Some(rule) = self.special(SpecialKind::Master, separator) {
            return Some(Selection::Rule(rule));
        }
        if !v.is_integer() {
            return Some(Selection::RoundToInteger);
        }
        self.normal_rule(&floor(v)).map(Selection::Rule)
    }

    /// Threshold rule for a non-negative integer.
    pub(crate) fn normal_rule(&self, n: &BigInt) -> Option<&Rule> {
        let Some(small) = n.to_i64() else {
            return self.rules.last();
        };
        let idx = self.rules.partition_point(|r| r.base <= small);
        if idx == 0 {
            return None;
        }
        let rule = &self.rules[idx - 1];
        if rule.base != small && rule.should_roll_back(n) {
            if idx == 1 {
                return None;
            }
            return Some(&self.rules[idx - 2]);
        }
        Some(rule)
    }

    /// Rule whose base best approximates `v` as a fraction.
    pub(crate) fn fraction_rule(&self, v: &BigDecimal) -> Option<&Rule> {
        let lcm = BigInt::from(self.lcm?);
        let numerator = round_half_up(&(v * BigDecimal::from(lcm.clone())));

        let mut winner = 0;
        let mut best: Option<BigInt> = None;
        for (i, rule) in self.rules.iter().enumerate() {
            let mut diff = (&numerator * BigInt::from(rule.base)) % &lcm;
            let complement = &lcm - &diff;
            if complement < diff {
                diff = complement;
            }
            if best.as_ref().is_none_or(|b| diff < *b) {
                let exact = diff.is_zero();
                best = Some(diff);
                winner = i;
                if exact {
                    break;
                }
            }
        }

        let rule = self.rules.get(winner)?;
        if let Some(next) = self.rules.get(winner + 1) {
            if next.base == rule.base {
                let count = round_half_up(&(v * BigDecimal::from(rule.base)));
                if count < BigInt::from(1) || count >= BigInt::from(2) {
                    return Some(next);
                }
            }
        }
        Some(rule)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.name)?;
        for rule in self.specials.iter().chain(&self.rules) {
            writeln!(f, "    {rule}")?;
        }
        Ok(())
    }
}
