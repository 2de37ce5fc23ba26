//! The parsing engine: text back to numbers.
//!
//! Parsing runs the rules in reverse. For one rule set:
//!
//! ```text
//! special rules (-x, x.x, 0.x, x.0, Inf, NaN)
//!     then threshold rules, highest base first
//!         skip bases >= the bound handed down by the enclosing substitution
//!     keep the longest match (first one wins ties)
//! lenient mode, non-fraction set, nothing matched -> plain decimal digits
//! ```
//!
//! A rule matches when its pieces match in order. Literals must appear
//! exactly (or per the [`LenientScanner`] in lenient mode). A substitution
//! followed by literal text must end exactly where that text starts; every
//! occurrence of the text is tried, first success wins. A substitution at
//! the end of a rule, or before another substitution, takes the longest
//! parse it can get. Rules with optional groups are tried with the group
//! first and without it second.
//!
//! Values are composed back with [`Substitution::compose`], starting from
//! the rule's base value.

use bigdecimal::BigDecimal;
use num_traits::{One, Zero};

use crate::engine::compiled_rules::RuleSetCollection;
use crate::engine::decimal::{DecimalPattern, DecimalSymbols};
use crate::engine::descriptor::SpecialKind;
use crate::engine::lenient::LenientScanner;
use crate::engine::rule_set::{Rule, RuleSet};
use crate::engine::substitution::{Substitution, SubstitutionKind, Target};
use crate::engine::template::{PluralBlock, Segment};
use crate::{Operand, RECURSION_LIMIT};

/// A successful parse: the value and the bytes consumed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Match {
    pub value: Operand,
    pub len: usize,
}

/// One piece of a rule with its optional groups expanded.
#[derive(Debug, Clone, Copy)]
enum Piece<'r> {
    Literal(&'r str),
    Sub(&'r Substitution),
    Plural(&'r PluralBlock),
}

pub(crate) struct Parser<'a> {
    pub collection: &'a RuleSetCollection,
    pub symbols: &'a DecimalSymbols,
    /// `Some` in lenient mode.
    pub scanner: Option<&'a dyn LenientScanner>,
}

impl Parser<'_> {
    /// Parse the longest prefix of `text` with the rule set at `set`.
    pub(crate) fn parse(&self, text: &str, set: usize) -> Option<Match> {
        self.parse_set(text, set, None, 0)
    }

    /// Try every parseable public set, last to first; the longest match
    /// wins.
    pub(crate) fn parse_any(&self, text: &str) -> Option<(usize, Match)> {
        let mut best: Option<(usize, Match)> = None;
        for set in self.collection.parseable_sets().rev() {
            if let Some(m) = self.parse(text, set) {
                if best.as_ref().is_none_or(|(_, b)| m.len > b.len) {
                    best = Some((set, m));
                }
            }
            if best.as_ref().is_some_and(|(_, b)| b.len == text.len()) {
                break;
            }
        }
        best
    }

    fn parse_set(&self, text: &str, set: usize, upper: Option<i64>, depth: usize) -> Option<Match> {
        if depth >= RECURSION_LIMIT || text.is_empty() {
            return None;
        }
        let rule_set = self.collection.set(set);
        let mut best: Option<Match> = None;

        let thresholds = rule_set
            .rules
            .iter()
            .rev()
            .filter(|rule| rule_set.is_fraction() || upper.is_none_or(|bound| rule.base < bound));
        for rule in special_order(rule_set).chain(thresholds) {
            if let Some(m) = self.parse_rule(text, rule, rule_set, set, upper, depth) {
                if m.len > 0 && best.as_ref().is_none_or(|b| m.len > b.len) {
                    best = Some(m);
                }
            }
            if best.as_ref().is_some_and(|b| b.len == text.len()) {
                break;
            }
        }

        if best.is_none() && self.scanner.is_some() && !rule_set.is_fraction() {
            best = DecimalPattern::general()
                .parse_prefix(text, self.symbols)
                .map(|(value, len)| Match { value: Operand::Finite(value), len });
        }
        if let Some(m) = &best {
            tracing::trace!(rule_set = %rule_set.name, value = %m.value, consumed = m.len, "parsed");
        }
        best
    }

    fn parse_rule(
        &self,
        text: &str,
        rule: &Rule,
        rule_set: &RuleSet,
        set: usize,
        upper: Option<i64>,
        depth: usize,
    ) -> Option<Match> {
        let start = match rule.special {
            Some(SpecialKind::Infinity) => Operand::Infinite { negative: false },
            Some(SpecialKind::NotANumber) => Operand::NaN,
            Some(_) => Operand::Finite(BigDecimal::zero()),
            None => Operand::Finite(BigDecimal::from(rule.base)),
        };

        let mut best: Option<Match> = None;
        for pieces in forms(&rule.segments) {
            let ctx = RuleCtx { owner: set, upper, depth };
            if let Some((value, len)) = self.match_pieces(&pieces, text, 0, start.clone(), &ctx) {
                if best.as_ref().is_none_or(|b| len > b.len) {
                    best = Some(Match { value, len });
                }
            }
        }

        let mut m = best?;
        let has_numerator =
            rule.substitutions().iter().any(|sub| matches!(sub.kind, SubstitutionKind::Numerator { .. }));
        if rule_set.is_fraction() && !has_numerator && rule.base != 0 {
            m.value = Operand::Finite(BigDecimal::one() / BigDecimal::from(rule.base));
        }
        Some(m)
    }

    fn match_pieces(
        &self,
        pieces: &[Piece<'_>],
        text: &str,
        pos: usize,
        acc: Operand,
        ctx: &RuleCtx,
    ) -> Option<(Operand, usize)> {
        let Some((first, rest)) = pieces.split_first() else {
            return Some((acc, pos));
        };
        match *first {
            Piece::Literal(literal) => {
                let len = self.literal_len(&text[pos..], literal)?;
                self.match_pieces(rest, text, pos + len, acc, ctx)
            }
            Piece::Plural(block) => block.branches.iter().find_map(|(_, branch)| {
                let len = self.literal_len(&text[pos..], branch)?;
                self.match_pieces(rest, text, pos + len, acc.clone(), ctx)
            }),
            Piece::Sub(sub) => match rest.first() {
                Some(Piece::Literal(delimiter)) => {
                    self.delimited(sub, &[*delimiter], rest, text, pos, &acc, ctx)
                }
                Some(Piece::Plural(block)) => {
                    let delimiters: Vec<&str> = block.branches.iter().map(|(_, t)| t.as_str()).collect();
                    self.delimited(sub, &delimiters, rest, text, pos, &acc, ctx)
                }
                _ => {
                    let (parsed, len) = self.parse_substitution(sub, &text[pos..], ctx)?;
                    self.match_pieces(rest, text, pos + len, sub.compose(&parsed, &acc), ctx)
                }
            },
        }
    }

    /// Parse `sub` so that it ends exactly where one of `delimiters` begins.
    #[allow(clippy::too_many_arguments)]
    fn delimited(
        &self,
        sub: &Substitution,
        delimiters: &[&str],
        rest: &[Piece<'_>],
        text: &str,
        pos: usize,
        acc: &Operand,
        ctx: &RuleCtx,
    ) -> Option<(Operand, usize)> {
        let mut ends: Vec<usize> = delimiters.iter().flat_map(|d| self.occurrences(text, d, pos)).collect();
        ends.sort_unstable();
        ends.dedup();
        ends.into_iter().filter(|&end| end > pos).find_map(|end| {
            let (parsed, len) = self.parse_substitution(sub, &text[pos..end], ctx)?;
            if pos + len != end {
                return None;
            }
            self.match_pieces(rest, text, end, sub.compose(&parsed, acc), ctx)
        })
    }

    /// Parse the text a substitution covers.
    fn parse_substitution(&self, sub: &Substitution, text: &str, ctx: &RuleCtx) -> Option<(Operand, usize)> {
        let upper = sub.upper_bound(ctx.upper);
        match (&sub.kind, &sub.target) {
            (_, Target::Pattern(pattern)) => {
                let (value, len) = pattern.parse_prefix(text, self.symbols)?;
                Some((Operand::Finite(value), len))
            }
            (SubstitutionKind::FractionalPart { by_digits: true, .. }, Target::RuleSet(target)) => {
                self.parse_digits(text, *target, ctx.depth)
            }
            (SubstitutionKind::Modulus { predecessor: Some(idx), .. }, Target::RuleSet(_)) => {
                let owner = self.collection.set(ctx.owner);
                let rule = owner.rules.get(*idx)?;
                let m = self.parse_rule(text, rule, owner, ctx.owner, upper, ctx.depth + 1)?;
                Some((m.value, m.len))
            }
            (SubstitutionKind::Numerator { keep_zeros: true, .. }, Target::RuleSet(target)) => {
                let skipped = self.skip_zeros(text, *target, ctx.depth);
                let m = self.parse_set(&text[skipped..], *target, upper, ctx.depth + 1)?;
                Some((m.value, skipped + m.len))
            }
            (_, Target::RuleSet(target)) => {
                let m = self.parse_set(text, *target, upper, ctx.depth + 1)?;
                Some((m.value, m.len))
            }
        }
    }

    /// Digits spelled one by one, optionally separated by spaces, read back
    /// as `0.d1d2d3...`.
    fn parse_digits(&self, text: &str, target: usize, depth: usize) -> Option<(Operand, usize)> {
        let mut digits = String::new();
        let mut pos = 0;
        loop {
            let skip = if digits.is_empty() { 0 } else { text[pos..].len() - text[pos..].trim_start_matches(' ').len() };
            let Some(m) = self.parse_set(&text[pos + skip..], target, Some(10), depth + 1) else { break };
            let Operand::Finite(digit) = m.value else { break };
            if !digit.is_integer() || digit < BigDecimal::zero() || digit >= BigDecimal::from(10) {
                break;
            }
            digits.push_str(&digit.with_scale(0).to_string());
            pos += skip + m.len;
        }
        if digits.is_empty() {
            return None;
        }
        let value: BigDecimal = format!("0.{digits}").parse().ok()?;
        Some((Operand::Finite(value), pos))
    }

    /// Bytes of leading "zero " words before a zero-keeping numerator.
    fn skip_zeros(&self, text: &str, target: usize, depth: usize) -> usize {
        let mut pos = 0;
        while let Some(m) = self.parse_set(&text[pos..], target, Some(1), depth + 1) {
            if !m.value.as_finite().is_some_and(Zero::is_zero) || m.len == 0 {
                break;
            }
            let after = &text[pos + m.len..];
            let spaces = after.len() - after.trim_start_matches(' ').len();
            if spaces == 0 {
                break;
            }
            pos += m.len + spaces;
        }
        pos
    }

    fn literal_len(&self, text: &str, literal: &str) -> Option<usize> {
        match self.scanner {
            Some(scanner) => scanner.prefix_length(text, literal),
            None => text.starts_with(literal).then_some(literal.len()),
        }
    }

    /// Start positions of `needle` in `text` at or after `from`.
    fn occurrences(&self, text: &str, needle: &str, from: usize) -> Vec<usize> {
        match self.scanner {
            Some(scanner) => {
                let mut out = Vec::new();
                let mut start = from;
                while let Some((at, _)) = scanner.find_text(text, needle, start) {
                    out.push(at);
                    match text[at..].chars().next() {
                        Some(c) => start = at + c.len_utf8(),
                        None => break,
                    }
                }
                out
            }
            None => text[from..].match_indices(needle).map(|(i, _)| from + i).collect(),
        }
    }
}

struct RuleCtx {
    owner: usize,
    upper: Option<i64>,
    depth: usize,
}

/// Special rules in the order parsing tries them.
fn special_order(rule_set: &RuleSet) -> impl Iterator<Item = &Rule> {
    const ORDER: [SpecialKind; 6] = [
        SpecialKind::Negative,
        SpecialKind::ImproperFraction,
        SpecialKind::ProperFraction,
        SpecialKind::Master,
        SpecialKind::Infinity,
        SpecialKind::NotANumber,
    ];
    ORDER.into_iter().flat_map(move |kind| rule_set.specials.iter().filter(move |r| r.special == Some(kind)))
}

/// Optional groups that may be dropped while parsing. Groups past this many
/// are always read as present.
const MAX_DROPPABLE_GROUPS: usize = 8;

/// Every way of reading a rule: with all optional groups, then with fewer.
fn forms(segments: &[Segment<Substitution>]) -> Vec<Vec<Piece<'_>>> {
    let optional_count = segments.iter().filter(|s| matches!(s, Segment::Optional(_))).count();
    let combinations: u32 = 1 << optional_count.min(MAX_DROPPABLE_GROUPS);
    (0..combinations)
        .map(|mask| {
            let mut pieces = Vec::new();
            let mut optional_idx = 0;
            for segment in segments {
                match segment {
                    Segment::Optional(inner) => {
                        let dropped = optional_idx < MAX_DROPPABLE_GROUPS && mask & (1 << optional_idx) != 0;
                        if !dropped {
                            flatten(inner, &mut pieces);
                        }
                        optional_idx += 1;
                    }
                    other => flatten(std::slice::from_ref(other), &mut pieces),
                }
            }
            pieces
        })
        .collect()
}

fn flatten<'r>(segments: &'r [Segment<Substitution>], out: &mut Vec<Piece<'r>>) {
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push(Piece::Literal(text)),
            Segment::Substitution(sub) => out.push(Piece::Sub(sub)),
            Segment::Plural(block) => out.push(Piece::Plural(block)),
            Segment::Optional(inner) => flatten(inner, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lenient::DelimiterScanner;
    use std::str::FromStr;

    const WORDS: &str = "%main: -x: minus >>; x.x: << point >>; 0: zero; one; two; three; four; five; six; seven; eight; nine;\
                         10: ten; 20: twenty[->>]; 30: thirty[->>]; 100: << hundred[ >>]; 1000: << thousand[ >>];";

    fn parse_with(description: &str, set: &str, text: &str, lenient: bool) -> Option<Match> {
        let collection = RuleSetCollection::compile(description).unwrap();
        let symbols = DecimalSymbols::default();
        let scanner = DelimiterScanner::default();
        let parser = Parser {
            collection: &collection,
            symbols: &symbols,
            scanner: if lenient { Some(&scanner) } else { None },
        };
        parser.parse(text, collection.lookup(set).unwrap())
    }

    fn value(description: &str, text: &str) -> Option<(String, usize)> {
        parse_with(description, "%main", text, false).map(|m| (m.value.to_string(), m.len))
    }

    #[test]
    fn words_compose_back_into_numbers() {
        let cases = vec![
            ("0", "zero"),
            ("7", "seven"),
            ("23", "twenty-three"),
            ("30", "thirty"),
            ("205", "two hundred five"),
            ("3000", "three thousand"),
            ("2305", "two thousand three hundred five"),
            ("-36", "minus thirty-six"),
            ("1.25", "one point two five"),
        ];
        for (expected, text) in cases {
            let (got, len) = value(WORDS, text).unwrap_or_else(|| panic!("{text:?} did not parse"));
            assert_eq!(BigDecimal::from_str(&got).unwrap(), BigDecimal::from_str(expected).unwrap(), "{text:?}");
            assert_eq!(len, text.len(), "{text:?} was not fully consumed");
        }
    }

    #[test]
    fn unknown_words_end_the_match() {
        // "forty" is not in the rule set, so only the hundreds are read.
        let text = "two thousand three hundred forty-five";
        assert_eq!(value(WORDS, text), Some(("2300".into(), "two thousand three hundred".len())));
    }

    #[test]
    fn longest_prefix_is_reported() {
        assert_eq!(value(WORDS, "three hundred apples"), Some(("300".into(), 13)));
        assert_eq!(value(WORDS, "apples"), None);
    }

    #[test]
    fn lenient_mode_relaxes_literals() {
        let m = parse_with(WORDS, "%main", "Twenty-THREE", true).unwrap();
        assert_eq!(m.value, Operand::Finite(BigDecimal::from(23)));
        assert_eq!(parse_with(WORDS, "%main", "Twenty-THREE", false), None);
    }

    #[test]
    fn lenient_mode_falls_back_to_digits() {
        let m = parse_with(WORDS, "%main", "1,234 items", true).unwrap();
        assert_eq!(m.value, Operand::Finite(BigDecimal::from(1234)));
        assert_eq!(m.len, 5);
    }

    #[test]
    fn fraction_sets_parse_to_fractions() {
        let text = "%main: x.x: << and >%%frac>; 0: =#,##0=;\n%%frac: 2: one half; 2: <0< halves; 4: <0< quarters;";
        let m = parse_with(text, "%main", "3 and one half", false).unwrap();
        assert_eq!(m.value, Operand::Finite(BigDecimal::from_str("3.5").unwrap()));
        let m = parse_with(text, "%main", "1 and 3 quarters", false).unwrap();
        assert_eq!(m.value, Operand::Finite(BigDecimal::from_str("1.75").unwrap()));
    }

    #[test]
    fn inf_and_nan_rules() {
        let text = "%main: -x: minus >>; Inf: infinity; NaN: not a number; 0: =#,##0=;";
        assert_eq!(parse_with(text, "%main", "minus infinity", false).unwrap().value, Operand::Infinite { negative: true });
        assert_eq!(parse_with(text, "%main", "not a number", false).unwrap().value, Operand::NaN);
        assert_eq!(parse_with(text, "%main", "42", false).unwrap().value, Operand::Finite(BigDecimal::from(42)));
    }

    #[test]
    fn plural_blocks_accept_any_branch() {
        let text = "%main: 0: =#,##0=; 1000: <<$(cardinal,one{ thousand}other{ thousands})$[ >>];";
        let m = parse_with(text, "%main", "21 thousands 5", false).unwrap();
        assert_eq!(m.value, Operand::Finite(BigDecimal::from(21_005)));
        let m = parse_with(text, "%main", "1 thousand", false).unwrap();
        assert_eq!(m.value, Operand::Finite(BigDecimal::from(1_000)));
    }

    #[test]
    fn optional_groups_expand_into_forms() {
        let collection = RuleSetCollection::compile("%a: 0: x; 100: << hundred[ and >>];").unwrap();
        let rule = &collection.set(0).rules[1];
        let forms = forms(&rule.segments);
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].len(), 4);
        assert_eq!(forms[1].len(), 2);
    }

    #[test]
    fn many_optional_groups_keep_the_extra_ones() {
        let body = "[ >>]".repeat(40);
        let collection = RuleSetCollection::compile(&format!("%a: 0: x; 100: <<{body};")).unwrap();
        let rule = &collection.set(0).rules[1];
        let forms = forms(&rule.segments);
        assert_eq!(forms.len(), 1 << MAX_DROPPABLE_GROUPS);
        let subs = |form: &[Piece<'_>]| form.iter().filter(|p| matches!(p, Piece::Sub(_))).count();
        assert_eq!(subs(&forms[0]), 41);
        assert_eq!(subs(forms.last().unwrap()), 41 - MAX_DROPPABLE_GROUPS);
    }
}
