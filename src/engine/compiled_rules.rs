//! Rule compilation and indexing.
//!
//! This module turns description text into an immutable [`RuleSetCollection`].
//! Compilation runs in three passes so that every cross-reference can be
//! checked before anything is handed out:
//!
//! 1. **Split and parse**: cut the text into rule sets and rules, parse each
//!    rule's key (`descriptor.rs`) and body (`template.rs`).
//! 2. **Fraction detection**: a set named by `>%set>` inside an `x.x`, `0.x`
//!    or `x.0` rule formats fractional parts, which changes how its own
//!    tokens resolve.
//! 3. **Resolve**: assign implicit base values, compute divisors, check
//!    ordering and duplicate specials, and map every raw token to a
//!    substitution (`substitution.rs`) that points at a rule-set index.
//!
//! Compilation is all-or-nothing: the first error aborts it.
//!
//! ## Invariants
//!
//! - Rule-set indices handed to substitutions are indices into
//!   `RuleSetCollection::sets` and stay valid for the collection's lifetime.
//! - Threshold rules of a non-fraction set are strictly ascending; fraction
//!   sets may repeat a base (singular/plural pairs).
//! - Fraction sets always carry their least common multiple.
//! - `default_set` names a public set.

use std::collections::HashMap;
use std::fmt;

use crate::engine::descriptor::{DEFAULT_RADIX, RuleKey, SpecialKind, divisor_for, exponent_for, parse_key, split_rule};
use crate::engine::rule_set::{Rule, RuleSet, RuleSetFlags};
use crate::engine::substitution::{ResolveError, RuleContext, resolve};
use crate::engine::template::{Segment, Token, TokenSide, TokenTarget, parse_body, substitutions};
use crate::error::CompileError;

/// Sets tried, in order, when choosing a default without localizations.
const PREFERRED_DEFAULTS: [&str; 3] = ["%spellout-numbering", "%digits-ordinal", "%duration"];

const LENIENT_PARSE: &str = "%%lenient-parse";
const POST_PROCESS: &str = "%%post-process";

/// Public summary of one compiled rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetInfo {
    pub name: String,
    pub public: bool,
    pub fraction: bool,
    pub parseable: bool,
    /// Threshold and special rules together.
    pub rule_count: usize,
}

/// Display names for public rule sets, per locale.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Localizations {
    names: Vec<String>,
    by_locale: Vec<(String, Vec<String>)>,
}

/// Every rule set of one description, compiled and cross-linked.
///
/// Immutable once built. Formatting and parsing only read from it, so one
/// collection can serve any number of threads.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetCollection {
    sets: Vec<RuleSet>,
    index: HashMap<String, usize>,
    /// Public sets in `rule_set_names` order.
    public_order: Vec<usize>,
    default_set: usize,
    localizations: Option<Localizations>,
    lenient_rules: Option<String>,
}

/// A rule set as written: name plus raw rule texts.
struct RawSet<'a> {
    name: &'a str,
    rules: Vec<&'a str>,
}

/// Output of the first pass for one rule.
struct RawRule {
    key: RuleKey,
    segments: Vec<Segment<Token>>,
}

impl RuleSetCollection {
    /// Compile a description.
    pub fn compile(description: &str) -> Result<Self, CompileError> {
        Self::compile_with_localizations(description, &[])
    }

    /// Compile a description together with a display-name table.
    ///
    /// Row 0 of `localizations` lists public rule-set names; each later row is
    /// a locale id followed by one display name per listed set. An empty table
    /// means no localizations.
    pub fn compile_with_localizations(description: &str, localizations: &[&[&str]]) -> Result<Self, CompileError> {
        let (raw_sets, lenient_rules) = split_description(description)?;

        let mut index = HashMap::new();
        for (i, raw) in raw_sets.iter().enumerate() {
            if index.insert(raw.name.to_string(), i).is_some() {
                return Err(CompileError::DuplicateRuleSet(raw.name.to_string()));
            }
            if raw.rules.is_empty() {
                return Err(CompileError::EmptyRuleSet(raw.name.to_string()));
            }
        }

        // Pass 1: keys and bodies.
        let mut parsed: Vec<Vec<RawRule>> = Vec::with_capacity(raw_sets.len());
        for raw in &raw_sets {
            let mut rules = Vec::with_capacity(raw.rules.len());
            for (i, text) in raw.rules.iter().enumerate() {
                let malformed = |reason: String| CompileError::MalformedRule {
                    rule_set: raw.name.to_string(),
                    index: i,
                    reason,
                };
                let (key, body) = split_rule(text);
                let key = parse_key(key).map_err(malformed)?;
                let segments = parse_body(body).map_err(malformed)?;
                rules.push(RawRule { key, segments });
            }
            parsed.push(rules);
        }

        // Pass 2: fraction sets.
        let mut fraction = vec![false; raw_sets.len()];
        for (owner, rules) in parsed.iter().enumerate() {
            for rule in rules {
                let RuleKey::Special { kind, .. } = rule.key else { continue };
                if !kind.is_fraction() {
                    continue;
                }
                for token in substitutions(&rule.segments) {
                    if let (TokenSide::Greater, TokenTarget::RuleSet(name)) = (token.side, &token.target) {
                        match index.get(name.as_str()) {
                            Some(&target) if target != owner => fraction[target] = true,
                            _ => {}
                        }
                    }
                }
            }
        }

        let flags: Vec<RuleSetFlags> = raw_sets
            .iter()
            .zip(&fraction)
            .map(|(raw, &is_fraction)| {
                let mut flags = RuleSetFlags::empty();
                flags.set(RuleSetFlags::PUBLIC, !raw.name.starts_with("%%"));
                flags.set(RuleSetFlags::FRACTION, is_fraction);
                flags.set(RuleSetFlags::PARSEABLE, !raw.name.ends_with("@noparse"));
                flags
            })
            .collect();

        let public: Vec<usize> = (0..raw_sets.len()).filter(|&i| flags[i].contains(RuleSetFlags::PUBLIC)).collect();
        if public.is_empty() {
            return Err(CompileError::NoPublicRuleSet);
        }

        let localizations = build_localizations(localizations, &index, &flags)?;
        let default_set = match &localizations {
            Some(loc) => index[loc.names[0].as_str()],
            None => PREFERRED_DEFAULTS
                .iter()
                .find_map(|name| index.get(*name).copied().filter(|&i| flags[i].contains(RuleSetFlags::PUBLIC)))
                .or_else(|| public.last().copied())
                .ok_or(CompileError::NoPublicRuleSet)?,
        };

        // Pass 3: bases, divisors, substitutions.
        let lookup = |name: &str| index.get(name).copied();
        let mut sets = Vec::with_capacity(raw_sets.len());
        for (owner, (raw, rules)) in raw_sets.iter().zip(parsed).enumerate() {
            let set = build_set(raw.name, owner, flags[owner], rules, default_set, &lookup)?;
            sets.push(set);
        }

        let mut public_order: Vec<usize> = Vec::with_capacity(public.len());
        if let Some(loc) = &localizations {
            public_order.extend(loc.names.iter().map(|name| index[name.as_str()]));
        }
        for i in public {
            if !public_order.contains(&i) {
                public_order.push(i);
            }
        }

        tracing::debug!(
            rule_sets = sets.len(),
            public = public_order.len(),
            default = %sets[default_set].name,
            localized = localizations.is_some(),
            "compiled rule-based number format"
        );

        Ok(Self { sets, index, public_order, default_set, localizations, lenient_rules })
    }

    pub(crate) fn set(&self, index: usize) -> &RuleSet {
        &self.sets[index]
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn default_set(&self) -> usize {
        self.default_set
    }

    /// Public sets that parsing tries when no set is named.
    pub(crate) fn parseable_sets(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.public_order.iter().copied().filter(|&i| self.sets[i].flags.contains(RuleSetFlags::PARSEABLE))
    }

    pub(crate) fn lenient_rules(&self) -> Option<&str> {
        self.lenient_rules.as_deref()
    }

    /// Names of the public rule sets.
    pub fn rule_set_names(&self) -> Vec<&str> {
        self.public_order.iter().map(|&i| self.sets[i].name.as_str()).collect()
    }

    pub fn default_rule_set_name(&self) -> &str {
        &self.sets[self.default_set].name
    }

    /// A summary of every rule set, private ones included, in definition
    /// order.
    pub fn info(&self) -> Vec<RuleSetInfo> {
        self.sets
            .iter()
            .map(|set| RuleSetInfo {
                name: set.name.clone(),
                public: set.is_public(),
                fraction: set.is_fraction(),
                parseable: set.flags.contains(RuleSetFlags::PARSEABLE),
                rule_count: set.rules.len() + set.specials.len(),
            })
            .collect()
    }

    /// Locales with display names, in table order.
    pub fn display_name_locales(&self) -> Vec<&str> {
        match &self.localizations {
            Some(loc) => loc.by_locale.iter().map(|(locale, _)| locale.as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// Localized display name for `set`, looked up along the fallback chain
    /// of `locale` and then of `fallback`. Without a match the name is
    /// returned without its leading `%`.
    pub fn display_name(&self, set: &str, locale: &str, fallback: &str) -> String {
        let localized = self.localizations.as_ref().and_then(|loc| {
            let column = loc.names.iter().position(|n| n == set)?;
            let names = self.names_for(locale).or_else(|| self.names_for(fallback))?;
            names.get(column).cloned()
        });
        localized.unwrap_or_else(|| set.trim_start_matches('%').to_string())
    }

    /// All display names for one locale, in `rule_set_names` order.
    pub fn display_names(&self, locale: &str, fallback: &str) -> Vec<String> {
        self.rule_set_names().into_iter().map(|name| self.display_name(name, locale, fallback)).collect()
    }

    fn names_for(&self, locale: &str) -> Option<&[String]> {
        let loc = self.localizations.as_ref()?;
        fallback_chain(locale).find_map(|candidate| {
            loc.by_locale.iter().find(|(l, _)| *l == candidate).map(|(_, names)| names.as_slice())
        })
    }
}

impl fmt::Display for RuleSetCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, set) in self.sets.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{set}")?;
        }
        Ok(())
    }
}

/// `en_GB_oed` → `en_GB_oed`, `en_GB`, `en`. Both `_` and `-` separate.
fn fallback_chain(locale: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(locale).filter(|l| !l.is_empty()), |&l| {
        l.rfind(['_', '-']).map(|pos| &l[..pos]).filter(|l| !l.is_empty())
    })
}

// --- Pass helpers -------------------------------------------------------------

/// Cut a description into rule sets. The `%%lenient-parse` section is
/// returned separately; `%%post-process` is dropped.
fn split_description(description: &str) -> Result<(Vec<RawSet<'_>>, Option<String>), CompileError> {
    let chunks: Vec<&str> = split_rules(description).into_iter().map(str::trim_start).filter(|c| !c.trim().is_empty()).collect();
    if chunks.is_empty() {
        return Err(CompileError::EmptyDescription);
    }

    let mut sets: Vec<RawSet<'_>> = Vec::new();
    if !chunks[0].starts_with('%') {
        sets.push(RawSet { name: "%default", rules: Vec::new() });
    }
    for chunk in chunks {
        if chunk.starts_with('%') {
            let (name, first) = split_header(chunk)?;
            let rules = if first.is_empty() { Vec::new() } else { vec![first] };
            sets.push(RawSet { name, rules });
        } else if let Some(set) = sets.last_mut() {
            set.rules.push(chunk);
        }
    }

    let mut lenient = None;
    sets.retain(|set| match set.name {
        LENIENT_PARSE => {
            lenient = Some(set.rules.join(";"));
            false
        }
        POST_PROCESS => {
            tracing::debug!(rules = set.rules.len(), "ignoring %%post-process section");
            false
        }
        _ => true,
    });
    Ok((sets, lenient))
}

/// Split on every `;`. Quotes do not protect semicolons: a rule body may
/// open with a lone `'` as its leading-space marker.
fn split_rules(text: &str) -> Vec<&str> {
    text.split(';').collect()
}

/// `%name: first rule` → (`%name`, `first rule`).
fn split_header(chunk: &str) -> Result<(&str, &str), CompileError> {
    let bad = || CompileError::BadRuleSetName { header: chunk.trim().to_string() };
    let colon = chunk.find(':').ok_or_else(bad)?;
    let name = chunk[..colon].trim_end();
    if !regex!(r"^%%?[^%\s:;]+$").is_match(name) {
        return Err(bad());
    }
    Ok((name, chunk[colon + 1..].trim_start()))
}

fn build_localizations(
    table: &[&[&str]],
    index: &HashMap<String, usize>,
    flags: &[RuleSetFlags],
) -> Result<Option<Localizations>, CompileError> {
    let Some((header, rows)) = table.split_first() else {
        return Ok(None);
    };
    if header.is_empty() {
        return Err(CompileError::Localization("the first row lists no rule sets".into()));
    }
    for name in header.iter() {
        match index.get(*name) {
            Some(&i) if flags[i].contains(RuleSetFlags::PUBLIC) => {}
            _ => return Err(CompileError::Localization(format!("`{name}` is not a public rule set"))),
        }
    }
    let mut by_locale = Vec::with_capacity(rows.len());
    for row in rows {
        let Some((locale, names)) = row.split_first() else {
            return Err(CompileError::Localization("empty localization row".into()));
        };
        if names.len() != header.len() {
            return Err(CompileError::Localization(format!(
                "locale `{locale}` has {} names for {} rule sets",
                names.len(),
                header.len()
            )));
        }
        by_locale.push((locale.to_string(), names.iter().map(|n| n.to_string()).collect()));
    }
    Ok(Some(Localizations { names: header.iter().map(|n| n.to_string()).collect(), by_locale }))
}

fn build_set(
    name: &str,
    owner: usize,
    flags: RuleSetFlags,
    raw_rules: Vec<RawRule>,
    default_set: usize,
    lookup: &impl Fn(&str) -> Option<usize>,
) -> Result<RuleSet, CompileError> {
    let is_fraction = flags.contains(RuleSetFlags::FRACTION);
    let mut rules: Vec<Rule> = Vec::new();
    let mut specials: Vec<Rule> = Vec::new();
    let mut previous: Option<i64> = None;

    for (i, raw) in raw_rules.into_iter().enumerate() {
        let malformed = |reason: String| CompileError::MalformedRule { rule_set: name.to_string(), index: i, reason };

        let (base, radix, lowered, radix_given, special, decimal_point) = match raw.key {
            RuleKey::Implicit => {
                let base = match previous {
                    None => 0,
                    Some(prev) if is_fraction => prev,
                    Some(prev) => prev.checked_add(1).ok_or_else(|| malformed("implicit base value overflows".into()))?,
                };
                (base, DEFAULT_RADIX, 0, false, None, None)
            }
            RuleKey::Numeric { base, radix, lowered, radix_given } => (base, radix, lowered, radix_given, None, None),
            RuleKey::Special { kind, decimal_point } => (0, DEFAULT_RADIX, 0, false, Some(kind), decimal_point),
        };

        if special.is_none() {
            if let Some(prev) = previous {
                if base < prev || (base == prev && !is_fraction) {
                    return Err(CompileError::RulesOutOfOrder { rule_set: name.to_string(), index: i, base, previous: prev });
                }
            }
            previous = Some(base);
        } else if specials.iter().any(|r| r.special == special && r.decimal_point == decimal_point) {
            return Err(CompileError::DuplicateSpecialRule {
                rule_set: name.to_string(),
                index: i,
                descriptor: special_descriptor(special, decimal_point),
            });
        }

        let exponent = exponent_for(base, radix).map_err(|reason| CompileError::DivisionByZero {
            rule_set: name.to_string(),
            index: i,
            reason,
        })?;
        let exponent = exponent
            .checked_sub(lowered)
            .ok_or_else(|| malformed(format!("`{}` lowers the exponent below zero", ">".repeat(lowered as usize))))?;
        let divisor = divisor_for(radix, exponent).map_err(malformed)?;

        if matches!(special, Some(SpecialKind::Infinity | SpecialKind::NotANumber)) && !substitutions(&raw.segments).is_empty() {
            return Err(malformed("`Inf` and `NaN` rules cannot contain substitutions".into()));
        }

        let ctx = RuleContext {
            owner,
            owner_name: name,
            owner_is_fraction_set: is_fraction,
            special,
            base,
            divisor,
            predecessor: if special.is_none() { rules.len().checked_sub(1) } else { None },
            default_set,
        };
        let segments = raw
            .segments
            .into_iter()
            .map(|seg| {
                seg.try_map(&mut |token| {
                    resolve(token, &ctx, lookup).map_err(|err| match err {
                        ResolveError::UnknownRuleSet(target) => {
                            CompileError::UnknownRuleSet { rule_set: name.to_string(), index: i, target }
                        }
                        ResolveError::Invalid(reason) => malformed(reason),
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rule = Rule { base, radix, exponent, divisor, lowered, radix_given, special, decimal_point, segments };
        if special.is_some() {
            specials.push(rule);
        } else {
            rules.push(rule);
        }
    }

    let lcm = if is_fraction { Some(fraction_lcm(name, &rules)?) } else { None };
    Ok(RuleSet { name: name.to_string(), flags, rules, specials, lcm })
}

fn fraction_lcm(name: &str, rules: &[Rule]) -> Result<i64, CompileError> {
    let mut lcm: i64 = 1;
    for (i, rule) in rules.iter().enumerate() {
        if rule.base == 0 {
            return Err(CompileError::DivisionByZero {
                rule_set: name.to_string(),
                index: i,
                reason: "a fraction rule set cannot have a rule with base value 0".into(),
            });
        }
        let common = gcd(lcm, rule.base);
        lcm = (lcm / common).checked_mul(rule.base).ok_or_else(|| CompileError::FractionOverflow(name.to_string()))?;
    }
    Ok(lcm)
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn special_descriptor(kind: Option<SpecialKind>, point: Option<char>) -> String {
    let point = point.unwrap_or('.');
    match kind {
        Some(SpecialKind::Negative) => "-x".into(),
        Some(SpecialKind::ImproperFraction) => format!("x{point}x"),
        Some(SpecialKind::ProperFraction) => format!("0{point}x"),
        Some(SpecialKind::Master) => format!("x{point}0"),
        Some(SpecialKind::Infinity) => "Inf".into(),
        Some(SpecialKind::NotANumber) => "NaN".into(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::substitution::SubstitutionKind;

    const SMALL: &str = "%main: zero; one; two; 10: ten[ >>]; 20: twenty[-<<]; 100: << hundred[ >>];\n\
                         %%frac: 2: half; 3: third;\n\
                         %with-frac: -x: minus >>; x.x: << and >%%frac>; 0: =%main=;";

    #[test]
    fn implicit_bases_count_up() {
        let c = RuleSetCollection::compile(SMALL).unwrap();
        let main = c.set(c.lookup("%main").unwrap());
        let bases: Vec<i64> = main.rules.iter().map(|r| r.base).collect();
        assert_eq!(bases, vec![0, 1, 2, 10, 20, 100]);
        assert_eq!(main.rules[5].divisor, 100);
        assert_eq!(main.rules[4].divisor, 10);
    }

    #[test]
    fn fraction_sets_are_detected() {
        let c = RuleSetCollection::compile(SMALL).unwrap();
        let frac = c.set(c.lookup("%%frac").unwrap());
        assert!(frac.is_fraction());
        assert_eq!(frac.lcm, Some(6));
        assert!(!c.set(c.lookup("%main").unwrap()).is_fraction());
        let with_frac = c.set(c.lookup("%with-frac").unwrap());
        let improper = with_frac.special(SpecialKind::ImproperFraction, '.').unwrap();
        let kinds: Vec<_> = improper.substitutions().into_iter().map(|s| s.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![SubstitutionKind::IntegralPart, SubstitutionKind::FractionalPart { by_digits: false, spaced: true }]
        );
    }

    #[test]
    fn names_and_defaults() {
        let c = RuleSetCollection::compile(SMALL).unwrap();
        assert_eq!(c.rule_set_names(), vec!["%main", "%with-frac"]);
        assert_eq!(c.default_rule_set_name(), "%with-frac");

        let preferred = "%a: =#,##0=; %digits-ordinal: =#,##0=; %b: =#,##0=;";
        assert_eq!(RuleSetCollection::compile(preferred).unwrap().default_rule_set_name(), "%digits-ordinal");

        let bare = RuleSetCollection::compile("zero; one; two;").unwrap();
        assert_eq!(bare.rule_set_names(), vec!["%default"]);
    }

    #[test]
    fn special_sections_are_not_rule_sets() {
        let text = "%main: =#,##0=;\n%%lenient-parse: & ' ' = '-';\n%%post-process: com.example.Thing;";
        let c = RuleSetCollection::compile(text).unwrap();
        assert_eq!(c.info().len(), 1);
        assert_eq!(c.lenient_rules(), Some("& ' ' = '-'"));
    }

    #[test]
    fn compile_errors() {
        let cases: Vec<(&str, fn(&CompileError) -> bool)> = vec![
            ("", |e| matches!(e, CompileError::EmptyDescription)),
            ("%a: one; %a: two;", |e| matches!(e, CompileError::DuplicateRuleSet(_))),
            ("%a: one; %b:", |e| matches!(e, CompileError::EmptyRuleSet(_))),
            ("%%only: one;", |e| matches!(e, CompileError::NoPublicRuleSet)),
            ("%a: 10: ten; 5: five;", |e| matches!(e, CompileError::RulesOutOfOrder { index: 1, .. })),
            ("%a: 10: ten; 10: ten again;", |e| matches!(e, CompileError::RulesOutOfOrder { .. })),
            ("%a: -x: minus >>; -x: negative >>; 0: zero;", |e| {
                matches!(e, CompileError::DuplicateSpecialRule { index: 1, .. })
            }),
            ("%a: 0: =%nowhere=;", |e| matches!(e, CompileError::UnknownRuleSet { index: 0, .. })),
            ("%a: 0: zero; 100/0: << hundred;", |e| matches!(e, CompileError::DivisionByZero { index: 1, .. })),
            ("%a: 0: zero; 100/1: << hundred;", |e| matches!(e, CompileError::DivisionByZero { .. })),
            ("%a: 0: zero; 5>>: five >>;", |e| matches!(e, CompileError::MalformedRule { index: 1, .. })),
            ("%a: abc: zero;", |e| matches!(e, CompileError::MalformedRule { index: 0, .. })),
            ("%a: -x: << minus;", |e| matches!(e, CompileError::MalformedRule { .. })),
            ("%a: Inf: =#,##0=;", |e| matches!(e, CompileError::MalformedRule { .. })),
            ("%a: x.x: << point >%%f>; 0: zero; %%f: 0: none;", |e| matches!(e, CompileError::DivisionByZero { .. })),
            ("% bad: zero;", |e| matches!(e, CompileError::BadRuleSetName { .. })),
        ];
        for (text, check) in cases {
            let err = RuleSetCollection::compile(text).unwrap_err();
            assert!(check(&err), "{text:?} failed with unexpected error {err:?}");
        }
    }

    #[test]
    fn lcm_overflow_is_reported() {
        let text = "%a: x.x: << point >%%f>; 0: zero;\n\
                    %%f: 1000000007: a; 1000000009: b; 1000000021: c;";
        assert_eq!(RuleSetCollection::compile(text).unwrap_err(), CompileError::FractionOverflow("%%f".into()));
    }

    #[test]
    fn localizations() {
        let text = "%simple: =#,##0=; %fancy: =#,##0.00=;";
        let table: &[&[&str]] = &[
            &["%fancy", "%simple"],
            &["en", "Fancy", "Simple"],
            &["zh_Hans", "花哨", "简单"],
        ];
        let c = RuleSetCollection::compile_with_localizations(text, table).unwrap();
        assert_eq!(c.rule_set_names(), vec!["%fancy", "%simple"]);
        assert_eq!(c.default_rule_set_name(), "%fancy");
        assert_eq!(c.display_name("%simple", "zh_Hans_CN", "en_US"), "简单");
        assert_eq!(c.display_name("%simple", "fr_FR", "en_US"), "Simple");
        assert_eq!(c.display_name("%simple", "fr_FR", "de"), "simple");
        assert_eq!(c.display_names("en_GB", "en_US"), vec!["Fancy".to_string(), "Simple".to_string()]);
        assert_eq!(c.display_name_locales(), vec!["en", "zh_Hans"]);

        let bad: &[&[&str]] = &[&["%fancy"], &["en"]];
        assert!(matches!(
            RuleSetCollection::compile_with_localizations(text, bad),
            Err(CompileError::Localization(_))
        ));
        let private: &[&[&str]] = &[&["%%hidden"]];
        assert!(RuleSetCollection::compile_with_localizations("%a: one; %%hidden: two;", private).is_err());
    }

    #[test]
    fn display_writes_canonical_rules() {
        let c = RuleSetCollection::compile("%a: -x: minus >>; 0: zero; 1: one; 100: << hundred[ >>]; 1000/100: 'x:y' =#,##0=;").unwrap();
        let text = c.to_string();
        assert!(text.contains("-x: minus >>;"), "{text}");
        assert!(text.contains("100: << hundred[ >>];"), "{text}");
        assert!(text.contains("1000/100: 'x:y '=#,##0=;"), "{text}");
        let again = RuleSetCollection::compile(&text).unwrap();
        assert_eq!(again.to_string(), text);
    }

    #[test]
    fn fallback_chain_strips_segments() {
        let chain: Vec<&str> = fallback_chain("en_GB-oed").collect();
        assert_eq!(chain, vec!["en_GB-oed", "en_GB", "en"]);
        assert_eq!(fallback_chain("").count(), 0);
    }
}
