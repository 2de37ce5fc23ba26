//! Resolved substitutions.
//!
//! What a token *does* depends on where it sits: `<<` is a quotient in a
//! threshold rule, the integral part in an `x.x` rule and a numerator in a
//! fraction rule set. [`resolve`] makes that decision once, at compile time,
//! so formatting and parsing only match on [`SubstitutionKind`].
//!
//! Every transform assumes a non-negative operand; negative values never
//! reach a substitution other than the absolute-value one of a `-x` rule.

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::Zero;

use crate::Operand;
use crate::engine::decimal::DecimalPattern;
use crate::engine::descriptor::SpecialKind;
use crate::engine::template::{Token, TokenSide, TokenTarget};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubstitutionKind {
    /// `=...=`
    SameValue,
    /// `<<` in a threshold rule: `floor(v / divisor)`.
    Multiplier { divisor: i64 },
    /// `>>` in a threshold rule: `floor(v) mod divisor`. `>>>` formats with
    /// the rule just below the owning one instead of a fresh lookup.
    Modulus { divisor: i64, predecessor: Option<usize> },
    /// `<<` in a fraction rule.
    IntegralPart,
    /// `>>` in a fraction rule. Digit by digit unless it names another set.
    FractionalPart { by_digits: bool, spaced: bool },
    /// `>>` in a `-x` rule.
    AbsoluteValue,
    /// `<<` in a fraction rule set: `round(v * denominator)`.
    Numerator { denominator: i64, keep_zeros: bool },
}

/// Where a substitution sends its value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
    /// Index into the collection's rule sets.
    RuleSet(usize),
    Pattern(DecimalPattern),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Substitution {
    pub kind: SubstitutionKind,
    pub target: Target,
    pub source: String,
}

/// What [`resolve`] needs to know about the rule a token appears in.
pub(crate) struct RuleContext<'a> {
    pub owner: usize,
    pub owner_name: &'a str,
    pub owner_is_fraction_set: bool,
    pub special: Option<SpecialKind>,
    pub base: i64,
    pub divisor: i64,
    /// Index of the previous threshold rule in the owning set.
    pub predecessor: Option<usize>,
    pub default_set: usize,
}

/// Why a token could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResolveError {
    UnknownRuleSet(String),
    Invalid(String),
}

/// Resolve `token` for the rule described by `ctx`. `lookup` maps rule set
/// names to indices.
pub(crate) fn resolve(
    token: Token,
    ctx: &RuleContext<'_>,
    lookup: impl Fn(&str) -> Option<usize>,
) -> Result<Substitution, ResolveError> {
    let fraction_rule = ctx.special.is_some_and(SpecialKind::is_fraction);

    let kind = match token.side {
        TokenSide::Equal => SubstitutionKind::SameValue,
        TokenSide::Less if ctx.special == Some(SpecialKind::Negative) => {
            return Err(ResolveError::Invalid("`<` substitutions are not allowed in a `-x` rule".into()));
        }
        TokenSide::Less if fraction_rule => SubstitutionKind::IntegralPart,
        TokenSide::Less if ctx.owner_is_fraction_set => {
            SubstitutionKind::Numerator { denominator: ctx.base, keep_zeros: token.tripled }
        }
        TokenSide::Less => SubstitutionKind::Multiplier { divisor: ctx.divisor },
        TokenSide::Greater if ctx.special == Some(SpecialKind::Negative) => SubstitutionKind::AbsoluteValue,
        TokenSide::Greater if fraction_rule => {
            let by_digits = match &token.target {
                TokenTarget::Current => true,
                TokenTarget::RuleSet(name) => name == ctx.owner_name,
                TokenTarget::Pattern(_) => {
                    return Err(ResolveError::Invalid(
                        "the fractional part of a fraction rule cannot use a number pattern".into(),
                    ));
                }
            };
            SubstitutionKind::FractionalPart { by_digits, spaced: !token.tripled }
        }
        TokenSide::Greater if ctx.owner_is_fraction_set => {
            return Err(ResolveError::Invalid("`>` substitutions are not allowed in a fraction rule set".into()));
        }
        TokenSide::Greater => SubstitutionKind::Modulus {
            divisor: ctx.divisor,
            predecessor: if token.tripled { ctx.predecessor } else { None },
        },
    };

    let target = match token.target {
        TokenTarget::Current if matches!(kind, SubstitutionKind::Numerator { .. }) => Target::RuleSet(ctx.default_set),
        TokenTarget::Current => Target::RuleSet(ctx.owner),
        TokenTarget::RuleSet(name) => Target::RuleSet(lookup(&name).ok_or(ResolveError::UnknownRuleSet(name))?),
        TokenTarget::Pattern(pattern) => Target::Pattern(DecimalPattern::compile(&pattern).map_err(ResolveError::Invalid)?),
    };

    Ok(Substitution { kind, target, source: token.source })
}

impl Substitution {
    /// The value this substitution formats, given the value of its rule.
    pub(crate) fn transform(&self, value: &Operand) -> Operand {
        let Operand::Finite(v) = value else {
            return match self.kind {
                SubstitutionKind::AbsoluteValue => value.abs(),
                _ => value.clone(),
            };
        };
        let v = match &self.kind {
            SubstitutionKind::SameValue => v.clone(),
            SubstitutionKind::Multiplier { divisor } => match &self.target {
                Target::Pattern(p) if p.has_fraction_digits() => v.clone() / BigDecimal::from(*divisor),
                _ => int_to_decimal(floor(v) / BigInt::from(*divisor)),
            },
            SubstitutionKind::Modulus { divisor, .. } => int_to_decimal(floor(v) % BigInt::from(*divisor)),
            SubstitutionKind::IntegralPart => int_to_decimal(floor(v)),
            SubstitutionKind::FractionalPart { .. } => v - int_to_decimal(floor(v)),
            SubstitutionKind::AbsoluteValue => v.abs(),
            SubstitutionKind::Numerator { denominator, .. } => {
                int_to_decimal(round_half_up(&(v * BigDecimal::from(*denominator))))
            }
        };
        Operand::Finite(v)
    }

    /// Fold a parsed value into the rule value accumulated so far.
    pub(crate) fn compose(&self, parsed: &Operand, acc: &Operand) -> Operand {
        let (Operand::Finite(new), Operand::Finite(old)) = (parsed, acc) else {
            return match self.kind {
                SubstitutionKind::AbsoluteValue => parsed.negated(),
                _ => parsed.clone(),
            };
        };
        let v = match &self.kind {
            SubstitutionKind::SameValue => new.clone(),
            SubstitutionKind::Multiplier { divisor } => new * BigDecimal::from(*divisor),
            SubstitutionKind::Modulus { divisor, .. } => {
                old - int_to_decimal(floor(old) % BigInt::from(*divisor)) + new
            }
            SubstitutionKind::IntegralPart | SubstitutionKind::FractionalPart { .. } => old + new,
            SubstitutionKind::AbsoluteValue => -new,
            SubstitutionKind::Numerator { .. } if old.is_zero() => new.clone(),
            SubstitutionKind::Numerator { .. } => new / old,
        };
        Operand::Finite(v)
    }

    /// Bound on the values an inner parse may produce; rules at or above it
    /// are skipped.
    pub(crate) fn upper_bound(&self, outer: Option<i64>) -> Option<i64> {
        match self.kind {
            SubstitutionKind::Multiplier { divisor } | SubstitutionKind::Modulus { divisor, .. } => Some(divisor),
            SubstitutionKind::Numerator { denominator, .. } => Some(denominator),
            SubstitutionKind::FractionalPart { by_digits: true, .. } => Some(10),
            SubstitutionKind::FractionalPart { by_digits: false, .. } => None,
            SubstitutionKind::SameValue | SubstitutionKind::IntegralPart | SubstitutionKind::AbsoluteValue => outer,
        }
    }
}

// --- Exact arithmetic helpers ------------------------------------------------

pub(crate) fn floor(v: &BigDecimal) -> BigInt {
    v.with_scale_round(0, RoundingMode::Floor).into_bigint_and_exponent().0
}

pub(crate) fn round_half_up(v: &BigDecimal) -> BigInt {
    v.with_scale_round(0, RoundingMode::HalfUp).into_bigint_and_exponent().0
}

pub(crate) fn int_to_decimal(v: BigInt) -> BigDecimal {
    BigDecimal::new(v, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::template::parse_body;
    use crate::engine::template::Segment;
    use std::str::FromStr;

    fn token(body: &str) -> Token {
        match parse_body(body).unwrap().remove(0) {
            Segment::Substitution(t) => t,
            other => panic!("expected a token, got {other:?}"),
        }
    }

    fn ctx(special: Option<SpecialKind>, fraction_set: bool) -> RuleContext<'static> {
        RuleContext {
            owner: 0,
            owner_name: "%main",
            owner_is_fraction_set: fraction_set,
            special,
            base: 100,
            divisor: 100,
            predecessor: Some(4),
            default_set: 7,
        }
    }

    fn lookup(name: &str) -> Option<usize> {
        (name == "%%frac").then_some(3)
    }

    fn dec(s: &str) -> Operand {
        Operand::Finite(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn kinds_depend_on_the_rule() {
        let cases = vec![
            ("<<", None, false, SubstitutionKind::Multiplier { divisor: 100 }),
            (">>", None, false, SubstitutionKind::Modulus { divisor: 100, predecessor: None }),
            (">>>", None, false, SubstitutionKind::Modulus { divisor: 100, predecessor: Some(4) }),
            ("<<", Some(SpecialKind::ImproperFraction), false, SubstitutionKind::IntegralPart),
            (
                ">>",
                Some(SpecialKind::ImproperFraction),
                false,
                SubstitutionKind::FractionalPart { by_digits: true, spaced: true },
            ),
            (
                ">>>",
                Some(SpecialKind::ProperFraction),
                false,
                SubstitutionKind::FractionalPart { by_digits: true, spaced: false },
            ),
            (
                ">%%frac>",
                Some(SpecialKind::Master),
                false,
                SubstitutionKind::FractionalPart { by_digits: false, spaced: true },
            ),
            (">>", Some(SpecialKind::Negative), false, SubstitutionKind::AbsoluteValue),
            ("<0<", None, true, SubstitutionKind::Numerator { denominator: 100, keep_zeros: false }),
            ("<<<", None, true, SubstitutionKind::Numerator { denominator: 100, keep_zeros: true }),
            ("=#,##0=", None, false, SubstitutionKind::SameValue),
        ];
        for (body, special, fraction_set, expected) in cases {
            let sub = resolve(token(body), &ctx(special, fraction_set), lookup).unwrap();
            assert_eq!(sub.kind, expected, "token {body:?} in {special:?}");
        }
    }

    #[test]
    fn numerators_default_to_the_default_set() {
        let sub = resolve(token("<<"), &ctx(None, true), lookup).unwrap();
        assert_eq!(sub.target, Target::RuleSet(7));
        let sub = resolve(token(">>"), &ctx(None, false), lookup).unwrap();
        assert_eq!(sub.target, Target::RuleSet(0));
    }

    #[test]
    fn illegal_placements() {
        assert!(matches!(
            resolve(token("<<"), &ctx(Some(SpecialKind::Negative), false), lookup),
            Err(ResolveError::Invalid(_))
        ));
        assert!(matches!(resolve(token(">>"), &ctx(None, true), lookup), Err(ResolveError::Invalid(_))));
        assert_eq!(
            resolve(token("<%missing<"), &ctx(None, false), lookup),
            Err(ResolveError::UnknownRuleSet("%missing".into()))
        );
    }

    #[test]
    fn transforms() {
        let c = ctx(None, false);
        let quotient = resolve(token("<<"), &c, lookup).unwrap();
        let remainder = resolve(token(">>"), &c, lookup).unwrap();
        assert_eq!(quotient.transform(&dec("1234")), dec("12"));
        assert_eq!(remainder.transform(&dec("1234")), dec("34"));
        assert_eq!(remainder.transform(&dec("1234.9")), dec("34"));

        let exact = resolve(token("<#,##0.#<"), &c, lookup).unwrap();
        assert_eq!(exact.transform(&dec("150")), dec("1.5"));

        let fraction = ctx(Some(SpecialKind::ImproperFraction), false);
        let frac = resolve(token(">>"), &fraction, lookup).unwrap();
        assert_eq!(frac.transform(&dec("234.567")), dec("0.567"));

        let numerator = resolve(token("<0<"), &ctx(None, true), lookup).unwrap();
        assert_eq!(numerator.transform(&dec("0.2856")), dec("29"));
    }

    #[test]
    fn compose_inverts_transform() {
        let c = ctx(None, false);
        let quotient = resolve(token("<<"), &c, lookup).unwrap();
        let remainder = resolve(token(">>"), &c, lookup).unwrap();
        let acc = quotient.compose(&dec("2"), &dec("100"));
        assert_eq!(acc, dec("200"));
        assert_eq!(remainder.compose(&dec("5"), &acc), dec("205"));

        let negative = resolve(token(">>"), &ctx(Some(SpecialKind::Negative), false), lookup).unwrap();
        assert_eq!(negative.compose(&dec("36"), &dec("0")), dec("-36"));
        assert_eq!(
            negative.compose(&Operand::Infinite { negative: false }, &dec("0")),
            Operand::Infinite { negative: true }
        );
    }
}
