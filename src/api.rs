use crate::engine::{
    DEFAULT_MAX_FRACTION_DIGITS, DecimalSymbols, DelimiterScanner, Formatter, IcuPluralResolver, LenientScanner,
    Parser, PluralResolver, RoundingPolicy, RuleSetCollection,
};
use crate::error::{CompileError, FormatError, ParseError};
use crate::number::Number;
use crate::{Operand, rules};
use bigdecimal::RoundingMode;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

static SPELLOUT: Lazy<Result<RuleBasedNumberFormat, CompileError>> =
    Lazy::new(|| RuleBasedNumberFormat::new(rules::en::SPELLOUT, "en"));
static ORDINAL: Lazy<Result<RuleBasedNumberFormat, CompileError>> =
    Lazy::new(|| RuleBasedNumberFormat::new(rules::en::ORDINAL, "en"));
static DURATION: Lazy<Result<RuleBasedNumberFormat, CompileError>> =
    Lazy::new(|| RuleBasedNumberFormat::new(rules::en::DURATION, "en"));

/// How the first letter of formatted text is cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capitalization {
    /// Leave the text exactly as the rules produce it.
    #[default]
    None,
    /// Uppercase the first character ("Twenty-one").
    BeginningOfSentence,
}

impl Capitalization {
    fn apply(self, text: String) -> String {
        match self {
            Capitalization::None => text,
            Capitalization::BeginningOfSentence => {
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => text,
                }
            }
        }
    }
}

/// A single format call.
///
/// Rounding only happens when `rounding_mode` is set; the value is then
/// rounded to `max_fraction_digits` before any rule is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRequest {
    pub value: Number,
    /// Public rule set to format with; the formatter's default when `None`.
    pub rule_set: Option<String>,
    pub rounding_mode: Option<RoundingMode>,
    pub max_fraction_digits: u32,
    pub capitalization: Capitalization,
}

impl FormatRequest {
    pub fn new(value: impl Into<Number>) -> Self {
        Self {
            value: value.into(),
            rule_set: None,
            rounding_mode: None,
            max_fraction_digits: DEFAULT_MAX_FRACTION_DIGITS,
            capitalization: Capitalization::None,
        }
    }

    pub fn rule_set(mut self, name: impl Into<String>) -> Self {
        self.rule_set = Some(name.into());
        self
    }

    pub fn rounding(mut self, mode: RoundingMode, max_fraction_digits: u32) -> Self {
        self.rounding_mode = Some(mode);
        self.max_fraction_digits = max_fraction_digits;
        self
    }

    pub fn capitalization(mut self, capitalization: Capitalization) -> Self {
        self.capitalization = capitalization;
        self
    }
}

/// A single parse call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    pub text: String,
    /// Rule set to parse with; every parseable public set when `None`.
    pub rule_set: Option<String>,
    /// Overrides the formatter's lenient setting for this call.
    pub lenient: Option<bool>,
}

impl ParseRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), rule_set: None, lenient: None }
    }

    pub fn rule_set(mut self, name: impl Into<String>) -> Self {
        self.rule_set = Some(name.into());
        self
    }

    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = Some(lenient);
        self
    }
}

/// Result of [`RuleBasedNumberFormat::parse_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub value: Number,
    /// Bytes of the input that the match consumed.
    pub consumed: usize,
    /// Rule set that produced the match.
    pub rule_set: String,
    /// Total time spent parsing.
    pub elapsed: Duration,
}

/// A compiled rule-based number formatter.
///
/// Values are immutable: the `with_*` methods return a new formatter and
/// clones share only the compiled rules, so a formatter can be handed to
/// any number of threads.
///
/// ```
/// use rbnf::{Capitalization, FormatRequest, RuleBasedNumberFormat};
///
/// let fmt = RuleBasedNumberFormat::spellout().unwrap();
/// let request = FormatRequest::new(2_345_678).capitalization(Capitalization::BeginningOfSentence);
/// assert_eq!(
///     fmt.format_with(&request).unwrap(),
///     "Two million three hundred forty-five thousand six hundred seventy-eight"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RuleBasedNumberFormat {
    rules: Arc<RuleSetCollection>,
    locale: String,
    symbols: DecimalSymbols,
    default_set: usize,
    lenient: bool,
    scanner: Arc<dyn LenientScanner>,
    plurals: Arc<dyn PluralResolver>,
}

impl RuleBasedNumberFormat {
    /// Compile `description` for `locale` (used for plural categories and
    /// display names).
    pub fn new(description: &str, locale: &str) -> Result<Self, CompileError> {
        Ok(Self::from_collection(RuleSetCollection::compile(description)?, locale))
    }

    /// Like [`new`](Self::new), with a table of display names: row 0 lists
    /// public rule sets, each later row is a locale followed by one name per
    /// set.
    pub fn with_localizations(description: &str, localizations: &[&[&str]], locale: &str) -> Result<Self, CompileError> {
        Ok(Self::from_collection(RuleSetCollection::compile_with_localizations(description, localizations)?, locale))
    }

    /// English cardinal and ordinal spellout.
    pub fn spellout() -> Result<Self, CompileError> {
        SPELLOUT.clone()
    }

    /// English digit ordinals ("1st", "22nd").
    pub fn ordinal() -> Result<Self, CompileError> {
        ORDINAL.clone()
    }

    /// English durations in seconds ("1:02:20", "3 minutes, 5 seconds").
    pub fn duration() -> Result<Self, CompileError> {
        DURATION.clone()
    }

    fn from_collection(rules: RuleSetCollection, locale: &str) -> Self {
        let scanner = rules.lenient_rules().map(DelimiterScanner::from_rules).unwrap_or_default();
        Self {
            default_set: rules.default_set(),
            rules: Arc::new(rules),
            locale: locale.to_string(),
            symbols: DecimalSymbols::default(),
            lenient: false,
            scanner: Arc::new(scanner),
            plurals: Arc::new(IcuPluralResolver),
        }
    }

    // --- Options -------------------------------------------------------------

    pub fn with_decimal_symbols(mut self, symbols: DecimalSymbols) -> Self {
        self.symbols = symbols;
        self
    }

    /// Use `name` when a call does not name a rule set.
    pub fn with_default_rule_set(mut self, name: &str) -> Result<Self, FormatError> {
        self.default_set = self.format_target(Some(name))?;
        Ok(self)
    }

    pub fn with_lenient_parse(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_lenient_scanner(mut self, scanner: Arc<dyn LenientScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_plural_resolver(mut self, plurals: Arc<dyn PluralResolver>) -> Self {
        self.plurals = plurals;
        self
    }

    // --- Formatting ----------------------------------------------------------

    /// Format `value` with `rule_set`, or the default set.
    pub fn format(&self, value: impl Into<Number>, rule_set: Option<&str>) -> Result<String, FormatError> {
        let mut request = FormatRequest::new(value);
        request.rule_set = rule_set.map(str::to_string);
        self.format_with(&request)
    }

    pub fn format_with(&self, request: &FormatRequest) -> Result<String, FormatError> {
        let set = self.format_target(request.rule_set.as_deref())?;
        let policy = RoundingPolicy { mode: request.rounding_mode, max_fraction_digits: request.max_fraction_digits };
        let operand = policy.prepare(&request.value)?;
        let formatter = Formatter {
            collection: &self.rules,
            symbols: &self.symbols,
            plurals: self.plurals.as_ref(),
            locale: &self.locale,
            rounding: policy.integer_mode(),
        };
        let text = formatter.format(&operand, set)?;
        Ok(request.capitalization.apply(text))
    }

    fn format_target(&self, name: Option<&str>) -> Result<usize, FormatError> {
        let Some(name) = name else { return Ok(self.default_set) };
        match self.rules.lookup(name) {
            Some(idx) if self.rules.set(idx).is_public() => Ok(idx),
            Some(_) => Err(FormatError::PrivateRuleSet(name.to_string())),
            None => Err(FormatError::UnknownRuleSet(name.to_string())),
        }
    }

    // --- Parsing -------------------------------------------------------------

    /// Parse the longest prefix of `text` that the rules recognise.
    pub fn parse(&self, text: &str, rule_set: Option<&str>) -> Result<Number, ParseError> {
        self.parse_prefix(text, rule_set).map(|outcome| outcome.value)
    }

    /// Like [`parse`](Self::parse), also reporting how much text matched.
    pub fn parse_prefix(&self, text: &str, rule_set: Option<&str>) -> Result<ParseOutcome, ParseError> {
        let mut request = ParseRequest::new(text);
        request.rule_set = rule_set.map(str::to_string);
        self.parse_with(&request)
    }

    pub fn parse_with(&self, request: &ParseRequest) -> Result<ParseOutcome, ParseError> {
        let start = Instant::now();
        let lenient = request.lenient.unwrap_or(self.lenient);
        let parser = Parser {
            collection: &self.rules,
            symbols: &self.symbols,
            scanner: lenient.then_some(self.scanner.as_ref()),
        };

        let found = match request.rule_set.as_deref() {
            Some(name) => {
                let set = self.parse_target(name)?;
                parser.parse(&request.text, set).map(|m| (set, m))
            }
            None => parser.parse_any(&request.text),
        };

        match found {
            Some((set, m)) if m.len > 0 => {
                let rule_set = self.rules.set(set).name.clone();
                tracing::debug!(text = %request.text, %rule_set, value = %m.value, consumed = m.len, "parsed");
                Ok(ParseOutcome { value: to_number(m.value), consumed: m.len, rule_set, elapsed: start.elapsed() })
            }
            _ => Err(ParseError::NoMatch {
                text: request.text.clone(),
                rule_set: request.rule_set.clone(),
                error_index: 0,
            }),
        }
    }

    fn parse_target(&self, name: &str) -> Result<usize, ParseError> {
        match self.rules.lookup(name) {
            Some(idx) if self.rules.set(idx).is_public() => Ok(idx),
            Some(_) => Err(ParseError::PrivateRuleSet(name.to_string())),
            None => Err(ParseError::UnknownRuleSet(name.to_string())),
        }
    }

    // --- Introspection -------------------------------------------------------

    pub fn rule_set_names(&self) -> Vec<&str> {
        self.rules.rule_set_names()
    }

    pub fn default_rule_set_name(&self) -> &str {
        &self.rules.set(self.default_set).name
    }

    /// Display name of `rule_set` in `locale`, falling back to this
    /// formatter's locale and then to the bare set name.
    pub fn display_name(&self, rule_set: &str, locale: Option<&str>) -> String {
        self.rules.display_name(rule_set, locale.unwrap_or(&self.locale), &self.locale)
    }

    pub fn display_names(&self, locale: Option<&str>) -> Vec<String> {
        self.rules.display_names(locale.unwrap_or(&self.locale), &self.locale)
    }

    pub fn display_name_locales(&self) -> Vec<&str> {
        self.rules.display_name_locales()
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn decimal_symbols(&self) -> &DecimalSymbols {
        &self.symbols
    }

    /// The compiled rule sets.
    pub fn rules(&self) -> &RuleSetCollection {
        &self.rules
    }
}

impl fmt::Display for RuleBasedNumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.rules, f)
    }
}

fn to_number(value: Operand) -> Number {
    match value {
        Operand::Finite(v) => Number::from_exact(v),
        Operand::Infinite { negative: true } => Number::Double(f64::NEG_INFINITY),
        Operand::Infinite { negative: false } => Number::Double(f64::INFINITY),
        Operand::NaN => Number::Double(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PluralCategory, PluralKind};
    use bigdecimal::BigDecimal;

    const SMALL: &str = "%main: -x: minus >>; x.x: << point >>; zero; one; two; three; 4: =#,##0=;\n\
                         %other: 0: =#,##0= items;\n\
                         %%hidden: 0: hidden;";

    #[test]
    fn format_uses_the_default_set_or_the_named_one() {
        let fmt = RuleBasedNumberFormat::new(SMALL, "en").unwrap();
        assert_eq!(fmt.default_rule_set_name(), "%other");
        assert_eq!(fmt.format(3, None).unwrap(), "3 items");
        assert_eq!(fmt.format(3, Some("%main")).unwrap(), "three");
        assert_eq!(fmt.format(-2.1, Some("%main")).unwrap(), "minus two point one");
    }

    #[test]
    fn rule_set_lookup_errors() {
        let fmt = RuleBasedNumberFormat::new(SMALL, "en").unwrap();
        assert_eq!(fmt.format(1, Some("%%hidden")), Err(FormatError::PrivateRuleSet("%%hidden".into())));
        assert_eq!(fmt.format(1, Some("%nope")), Err(FormatError::UnknownRuleSet("%nope".into())));
        assert_eq!(fmt.parse("one", Some("%%hidden")), Err(ParseError::PrivateRuleSet("%%hidden".into())));
        assert!(fmt.clone().with_default_rule_set("%nope").is_err());
    }

    #[test]
    fn default_rule_set_override() {
        let fmt = RuleBasedNumberFormat::new(SMALL, "en").unwrap().with_default_rule_set("%main").unwrap();
        assert_eq!(fmt.default_rule_set_name(), "%main");
        assert_eq!(fmt.format(2, None).unwrap(), "two");
    }

    #[test]
    fn rounding_and_capitalization_requests() {
        let fmt = RuleBasedNumberFormat::spellout().unwrap();
        let request = FormatRequest::new(10.15).rounding(RoundingMode::HalfEven, 1);
        assert_eq!(fmt.format_with(&request).unwrap(), "ten point two");

        let request = FormatRequest::new(21).capitalization(Capitalization::BeginningOfSentence);
        assert_eq!(fmt.format_with(&request).unwrap(), "Twenty-one");
        assert_eq!(Capitalization::BeginningOfSentence.apply(String::new()), "");
    }

    #[test]
    fn parse_reports_the_matching_set_and_length() {
        let fmt = RuleBasedNumberFormat::new(SMALL, "en").unwrap();
        let outcome = fmt.parse_prefix("two apples", Some("%main")).unwrap();
        assert_eq!(outcome.value, Number::Integer(2));
        assert_eq!(outcome.consumed, 3);
        assert_eq!(outcome.rule_set, "%main");

        let outcome = fmt.parse_prefix("12 items", None).unwrap();
        assert_eq!(outcome.value, Number::Integer(12));
        assert_eq!(outcome.rule_set, "%other");
    }

    #[test]
    fn parse_failures_carry_the_text() {
        let fmt = RuleBasedNumberFormat::new(SMALL, "en").unwrap();
        let err = fmt.parse("banana", Some("%main")).unwrap_err();
        assert_eq!(
            err,
            ParseError::NoMatch { text: "banana".into(), rule_set: Some("%main".into()), error_index: 0 }
        );
    }

    #[test]
    fn lenient_parsing_is_per_call_or_per_formatter() {
        let fmt = RuleBasedNumberFormat::spellout().unwrap();
        let strict = ParseRequest::new("Twenty-THREE").rule_set("%spellout-cardinal");
        assert!(fmt.parse_with(&strict).is_err());
        assert_eq!(fmt.parse_with(&strict.clone().lenient(true)).unwrap().value, Number::Integer(23));

        let lenient = fmt.with_lenient_parse(true);
        assert_eq!(lenient.parse("Twenty-THREE", Some("%spellout-cardinal")).unwrap(), Number::Integer(23));
    }

    #[test]
    fn non_finite_results_become_doubles() {
        assert_eq!(to_number(Operand::Infinite { negative: true }), Number::Double(f64::NEG_INFINITY));
        assert!(to_number(Operand::NaN).to_f64().is_nan());
        assert_eq!(to_number(Operand::Finite(BigDecimal::from(7))), Number::Integer(7));
    }

    #[derive(Debug)]
    struct AlwaysFew;

    impl PluralResolver for AlwaysFew {
        fn category(&self, _: &BigDecimal, _: PluralKind, _: &str) -> PluralCategory {
            PluralCategory::Few
        }
    }

    #[test]
    fn custom_plural_resolver() {
        let fmt = RuleBasedNumberFormat::ordinal().unwrap().with_plural_resolver(Arc::new(AlwaysFew));
        assert_eq!(fmt.format(4, None).unwrap(), "4rd");
    }

    #[test]
    fn options_do_not_leak_between_clones() {
        let base = RuleBasedNumberFormat::spellout().unwrap();
        let comma = base.clone().with_decimal_symbols(DecimalSymbols { decimal_separator: ',', ..DecimalSymbols::default() });
        assert_eq!(base.decimal_symbols().decimal_separator, '.');
        assert_eq!(comma.decimal_symbols().decimal_separator, ',');
        assert_eq!(base.format(1.5, None).unwrap(), "one point five");
    }

    #[test]
    fn formatters_are_shareable_across_threads() {
        let fmt = RuleBasedNumberFormat::spellout().unwrap();
        let handles: Vec<_> = (0..10i64)
            .map(|i| {
                let fmt = fmt.clone();
                std::thread::spawn(move || {
                    let text = fmt.format(i * 111, None).unwrap();
                    (i * 111, fmt.parse(&text, None).unwrap())
                })
            })
            .collect();
        for handle in handles {
            let (value, parsed) = handle.join().unwrap();
            assert_eq!(parsed, Number::Integer(value));
        }
    }

    #[test]
    fn display_renders_the_rules() {
        let fmt = RuleBasedNumberFormat::new("%a: 0: =#,##0=;", "en").unwrap();
        assert_eq!(fmt.to_string().trim_end(), fmt.rules().to_string().trim_end());
        assert!(fmt.to_string().starts_with("%a:"));
    }
}
