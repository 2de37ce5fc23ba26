use thiserror::Error;

/// A rule description that cannot be compiled.
///
/// Compilation is all-or-nothing: any of these aborts construction and no
/// partially usable formatter is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("rule description is empty")]
    EmptyDescription,

    #[error("rule set header `{header}` must look like `%name:` or `%%name:`")]
    BadRuleSetName { header: String },

    #[error("rule set `{0}` is defined more than once")]
    DuplicateRuleSet(String),

    #[error("rule set `{0}` has no rules")]
    EmptyRuleSet(String),

    #[error("malformed rule {index} in `{rule_set}`: {reason}")]
    MalformedRule { rule_set: String, index: usize, reason: String },

    #[error("rule {index} in `{rule_set}`: base value {base} does not follow {previous}")]
    RulesOutOfOrder { rule_set: String, index: usize, base: i64, previous: i64 },

    #[error("rule {index} in `{rule_set}` repeats the `{descriptor}` rule")]
    DuplicateSpecialRule { rule_set: String, index: usize, descriptor: String },

    #[error("rule {index} in `{rule_set}` refers to undefined rule set `{target}`")]
    UnknownRuleSet { rule_set: String, index: usize, target: String },

    #[error("rule {index} in `{rule_set}` would divide by zero: {reason}")]
    DivisionByZero { rule_set: String, index: usize, reason: String },

    #[error("denominators of fraction rule set `{0}` overflow 64 bits")]
    FractionOverflow(String),

    #[error("no public rule set is defined")]
    NoPublicRuleSet,

    #[error("invalid localization table: {0}")]
    Localization(String),
}

/// Failure of a single format call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("no rule set named `{0}`")]
    UnknownRuleSet(String),

    #[error("rule set `{0}` is private and cannot be used directly")]
    PrivateRuleSet(String),

    #[error("no rule in `{rule_set}` applies to {value}")]
    NoApplicableRule { rule_set: String, value: String },

    #[error("rules recursed deeper than {limit} levels while formatting with `{rule_set}`")]
    RecursionLimit { rule_set: String, limit: usize },

    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}

/// Failure of a parse call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no rule set named `{0}`")]
    UnknownRuleSet(String),

    #[error("rule set `{0}` is private and cannot be used directly")]
    PrivateRuleSet(String),

    #[error("no rule matches the start of {text:?} (error index {error_index})")]
    NoMatch { text: String, rule_set: Option<String>, error_index: usize },
}
