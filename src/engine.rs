//! Rule compilation, formatting and parsing.
//!
//! The engine is split into focused submodules under `src/engine/`, leaves
//! first:
//!
//! ```text
//! description text
//!     │  split into rule sets and rules          (compiled_rules.rs)
//!     │  key → RuleKey                           (descriptor.rs)
//!     │  body → Segment<Token>                   (template.rs)
//!     │  Token → Substitution                    (substitution.rs)
//!     v
//! RuleSetCollection  (immutable, shareable)
//!     │
//!     ├── format: Number ─ RoundingPolicy::prepare (rounding.rs)
//!     │              └─ Formatter: RuleSet::select (rule_set.rs)
//!     │                   ├─ literals, plural blocks (plural.rs)
//!     │                   ├─ =#,##0= patterns        (decimal.rs)
//!     │                   └─ recurse per substitution
//!     │
//!     └── parse: text ─ Parser (parser.rs)
//!                   ├─ specials, then thresholds high to low
//!                   ├─ literal matching, strict or via LenientScanner (lenient.rs)
//!                   └─ Substitution::compose back into a value
//! ```
//!
//! ## Responsibilities by module
//!
//! - `descriptor.rs`: rule keys (`100`, `1000/100>`, `-x`, `x.x`, ...) and
//!   divisor arithmetic.
//! - `template.rs`: rule body syntax: literals, quotes, tokens, `[...]`,
//!   `$(...)$`.
//! - `substitution.rs`: what each token means in context, its value
//!   transform and its inverse.
//! - `rule_set.rs`: compiled rules and the rule selection algorithm.
//! - `compiled_rules.rs`: the three compile passes and the collection-level
//!   queries (names, default set, display names).
//! - `format.rs` / `parser.rs`: the two recursive walks.
//! - `rounding.rs`: caller numbers to exact operands.
//! - `decimal.rs`, `plural.rs`, `lenient.rs`: the collaborators the rules
//!   lean on (digit patterns, plural categories, loose text matching).
//!
//! ## Debugging
//!
//! Compilation logs a summary at `debug` level; rule selection during
//! formatting and parsing is logged at `trace` level.

#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/decimal.rs"]
mod decimal;
#[path = "engine/descriptor.rs"]
mod descriptor;
#[path = "engine/format.rs"]
mod format;
#[path = "engine/lenient.rs"]
mod lenient;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/plural.rs"]
mod plural;
#[path = "engine/rounding.rs"]
mod rounding;
#[path = "engine/rule_set.rs"]
mod rule_set;
#[path = "engine/substitution.rs"]
mod substitution;
#[path = "engine/template.rs"]
mod template;

pub use compiled_rules::{RuleSetCollection, RuleSetInfo};
pub use decimal::DecimalSymbols;
pub use lenient::{DelimiterScanner, LenientScanner};
pub use plural::{IcuPluralResolver, PluralCategory, PluralKind, PluralResolver};

pub(crate) use format::Formatter;
pub(crate) use parser::Parser;
pub(crate) use rounding::{DEFAULT_MAX_FRACTION_DIGITS, RoundingPolicy};
