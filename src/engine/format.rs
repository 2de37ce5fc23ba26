//! The formatting engine.
//!
//! Formatting is a recursive walk: select a rule for the value, emit its
//! literals, and for each substitution transform the value and format it
//! again with the substitution's target. Nothing here mutates shared state;
//! a [`Formatter`] is a bundle of borrowed configuration for one call.

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{ToPrimitive, Zero};

use crate::engine::compiled_rules::RuleSetCollection;
use crate::engine::decimal::DecimalSymbols;
use crate::engine::plural::PluralResolver;
use crate::engine::rule_set::{Rule, Selection};
use crate::engine::substitution::{Substitution, SubstitutionKind, Target, int_to_decimal, round_half_up};
use crate::engine::template::{PluralBlock, Segment, substitutions};
use crate::error::FormatError;
use crate::{Operand, RECURSION_LIMIT};

pub(crate) struct Formatter<'a> {
    pub collection: &'a RuleSetCollection,
    pub symbols: &'a DecimalSymbols,
    pub plurals: &'a dyn PluralResolver,
    pub locale: &'a str,
    /// Used when a non-integer reaches a set without fraction rules.
    pub rounding: RoundingMode,
}

impl Formatter<'_> {
    /// Format `value` with the rule set at index `set`.
    pub(crate) fn format(&self, value: &Operand, set: usize) -> Result<String, FormatError> {
        let mut out = String::new();
        self.format_into(value, set, 0, &mut out)?;
        Ok(out)
    }

    fn format_into(&self, value: &Operand, set: usize, depth: usize, out: &mut String) -> Result<(), FormatError> {
        let rule_set = self.collection.set(set);
        if depth >= RECURSION_LIMIT {
            return Err(FormatError::RecursionLimit { rule_set: rule_set.name.clone(), limit: RECURSION_LIMIT });
        }

        match rule_set.select(value, self.symbols) {
            Some(Selection::Rule(rule)) => self.apply(rule, set, value, depth, out),
            Some(Selection::Symbol(text)) => {
                out.push_str(text);
                Ok(())
            }
            Some(Selection::MinusThenAbs) => {
                out.push(self.symbols.minus_sign);
                self.format_into(&value.abs(), set, depth + 1, out)
            }
            Some(Selection::RoundToInteger) => {
                let rounded = match value {
                    Operand::Finite(v) => Operand::Finite(v.with_scale_round(0, self.rounding)),
                    other => other.clone(),
                };
                tracing::trace!(rule_set = %rule_set.name, %value, %rounded, "no fraction rule, rounding");
                self.format_into(&rounded, set, depth + 1, out)
            }
            None => Err(FormatError::NoApplicableRule { rule_set: rule_set.name.clone(), value: value.to_string() }),
        }
    }

    fn apply(&self, rule: &Rule, owner: usize, value: &Operand, depth: usize, out: &mut String) -> Result<(), FormatError> {
        tracing::trace!(rule_set = %self.collection.set(owner).name, rule = %rule.key_text(), %value, "applying rule");
        self.write_segments(&rule.segments, rule, owner, value, depth, out)
    }

    fn write_segments(
        &self,
        segments: &[Segment<Substitution>],
        rule: &Rule,
        owner: usize,
        value: &Operand,
        depth: usize,
        out: &mut String,
    ) -> Result<(), FormatError> {
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Substitution(sub) => self.substitute(sub, owner, value, depth, out)?,
                Segment::Plural(block) => out.push_str(self.plural_text(block, rule, value)),
                Segment::Optional(inner) => {
                    let elided = substitutions(inner).iter().all(|sub| is_zero(&sub.transform(value)));
                    if !elided {
                        self.write_segments(inner, rule, owner, value, depth, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn substitute(
        &self,
        sub: &Substitution,
        owner: usize,
        value: &Operand,
        depth: usize,
        out: &mut String,
    ) -> Result<(), FormatError> {
        let inner = sub.transform(value);

        match (&sub.kind, &sub.target) {
            (SubstitutionKind::FractionalPart { by_digits: true, spaced }, Target::RuleSet(target)) => {
                return self.format_digits(&inner, *target, *spaced, depth, out);
            }
            (SubstitutionKind::Modulus { predecessor: Some(idx), .. }, _) => {
                if let Some(rule) = self.collection.set(owner).rules.get(*idx) {
                    return self.apply(rule, owner, &inner, depth + 1, out);
                }
            }
            (SubstitutionKind::Numerator { denominator, keep_zeros: true }, Target::RuleSet(target)) => {
                self.leading_zeros(&inner, *denominator, *target, depth, out)?;
            }
            _ => {}
        }

        match &sub.target {
            Target::Pattern(pattern) => {
                out.push_str(&pattern.format(&inner, self.symbols));
                Ok(())
            }
            Target::RuleSet(target) => self.format_into(&inner, *target, depth + 1, out),
        }
    }

    /// Spell each digit of a fractional part through `target`.
    fn format_digits(
        &self,
        fraction: &Operand,
        target: usize,
        spaced: bool,
        depth: usize,
        out: &mut String,
    ) -> Result<(), FormatError> {
        let Operand::Finite(fraction) = fraction else {
            return self.format_into(fraction, target, depth + 1, out);
        };
        for (i, digit) in fraction_digits(fraction).into_iter().enumerate() {
            if i > 0 && spaced {
                out.push(' ');
            }
            self.format_into(&Operand::Finite(BigDecimal::from(digit)), target, depth + 1, out)?;
        }
        Ok(())
    }

    /// One "zero " per power of ten the numerator is short of the
    /// denominator.
    fn leading_zeros(
        &self,
        numerator: &Operand,
        denominator: i64,
        target: usize,
        depth: usize,
        out: &mut String,
    ) -> Result<(), FormatError> {
        let Some(n) = numerator.as_finite() else { return Ok(()) };
        if n.is_zero() {
            return Ok(());
        }
        let denominator = BigDecimal::from(denominator);
        let mut scaled = n * BigDecimal::from(10);
        while scaled < denominator {
            self.format_into(&Operand::Finite(BigDecimal::zero()), target, depth + 1, out)?;
            out.push(' ');
            scaled *= BigDecimal::from(10);
        }
        Ok(())
    }

    fn plural_text<'b>(&self, block: &'b PluralBlock, rule: &Rule, value: &Operand) -> &'b str {
        let Operand::Finite(v) = value else {
            return block.text_for(crate::PluralCategory::Other);
        };
        let divisor = BigDecimal::from(rule.divisor);
        let plural_value = if *v > BigDecimal::zero() && *v < BigDecimal::from(1) {
            round_half_up(&(v * &divisor))
        } else {
            (v / &divisor).with_scale_round(0, RoundingMode::Down).into_bigint_and_exponent().0
        };
        let category = self.plurals.category(&int_to_decimal(plural_value), block.kind, self.locale);
        block.text_for(category)
    }
}

fn is_zero(value: &Operand) -> bool {
    value.as_finite().is_some_and(Zero::is_zero)
}

/// Digits of a value in `[0, 1)`, most significant first, without trailing
/// zeros.
fn fraction_digits(fraction: &BigDecimal) -> Vec<u8> {
    let normalized = fraction.normalized();
    let (int, scale) = normalized.as_bigint_and_exponent();
    if scale <= 0 || int.is_zero() {
        return Vec::new();
    }
    let digits = int.magnitude().to_string();
    let width = scale.to_usize().unwrap_or(digits.len());
    let padded = format!("{digits:0>width$}");
    let start = padded.len().saturating_sub(width);
    padded[start..].bytes().map(|b| b - b'0').collect()
}
