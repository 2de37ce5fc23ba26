//! Plural categories for `$(cardinal,...)$` / `$(ordinal,...)$` blocks.
//!
//! The engine only needs "which branch applies to this number in this
//! locale". That question is answered by a [`PluralResolver`]; the default
//! implementation asks ICU's CLDR plural rules.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use fixed_decimal::Decimal;
use icu::locale::Locale as IcuLocale;
use icu::plurals::{
    PluralCategory as IcuCategory, PluralOperands, PluralRuleType, PluralRules, PluralRulesOptions,
    PluralRulesPreferences,
};
use num_traits::ToPrimitive;

use crate::number::plain_string;

/// CLDR plural category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }

    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "zero" => PluralCategory::Zero,
            "one" => PluralCategory::One,
            "two" => PluralCategory::Two,
            "few" => PluralCategory::Few,
            "many" => PluralCategory::Many,
            "other" => PluralCategory::Other,
            _ => return None,
        })
    }
}

/// Cardinal ("3 books") or ordinal ("3rd book") plural rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralKind {
    Cardinal,
    Ordinal,
}

/// Maps a number to its plural category in a locale.
pub trait PluralResolver: Send + Sync + fmt::Debug {
    fn category(&self, value: &BigDecimal, kind: PluralKind, locale: &str) -> PluralCategory;
}

/// [`PluralResolver`] backed by ICU's compiled CLDR data.
///
/// Rules are loaded once per thread for each locale and kind. Locales that
/// ICU cannot parse resolve every number to `other`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IcuPluralResolver;

thread_local! {
    /// Loaded rules by (locale, kind). `None` records a locale without rules.
    static LOADED_RULES: RefCell<HashMap<(String, PluralKind), Option<Rc<PluralRules>>>> =
        RefCell::new(HashMap::new());
}

impl PluralResolver for IcuPluralResolver {
    fn category(&self, value: &BigDecimal, kind: PluralKind, locale: &str) -> PluralCategory {
        match rules_for(locale, kind) {
            Some(rules) => from_icu(rules.category_for(operands(value))),
            None => PluralCategory::Other,
        }
    }
}

fn rules_for(locale: &str, kind: PluralKind) -> Option<Rc<PluralRules>> {
    LOADED_RULES.with(|cache| {
        let key = (locale.to_string(), kind);
        if let Some(loaded) = cache.borrow().get(&key) {
            return loaded.clone();
        }
        let loaded = load_rules(locale, kind).map(Rc::new);
        cache.borrow_mut().insert(key, loaded.clone());
        loaded
    })
}

fn load_rules(locale: &str, kind: PluralKind) -> Option<PluralRules> {
    let Ok(icu_locale) = locale.replace('_', "-").parse::<IcuLocale>() else {
        tracing::debug!(locale, "unparseable locale, using plural category `other`");
        return None;
    };
    let prefs = PluralRulesPreferences::from(&icu_locale);
    let mut opts = PluralRulesOptions::default();
    opts.rule_type = Some(match kind {
        PluralKind::Cardinal => PluralRuleType::Cardinal,
        PluralKind::Ordinal => PluralRuleType::Ordinal,
    });
    match PluralRules::try_new(prefs, opts) {
        Ok(rules) => Some(rules),
        Err(err) => {
            tracing::debug!(locale, %err, "no plural rules, using category `other`");
            None
        }
    }
}

fn operands(value: &BigDecimal) -> PluralOperands {
    let abs = value.abs();
    if abs.is_integer() {
        if let Some(n) = abs.to_u64() {
            return PluralOperands::from(n);
        }
    }
    let decimal: Decimal = plain_string(&abs).parse().unwrap_or_else(|_| Decimal::from(0i32));
    PluralOperands::from(&decimal)
}

fn from_icu(category: IcuCategory) -> PluralCategory {
    match category {
        IcuCategory::Zero => PluralCategory::Zero,
        IcuCategory::One => PluralCategory::One,
        IcuCategory::Two => PluralCategory::Two,
        IcuCategory::Few => PluralCategory::Few,
        IcuCategory::Many => PluralCategory::Many,
        IcuCategory::Other => PluralCategory::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(n: i64, kind: PluralKind, locale: &str) -> PluralCategory {
        IcuPluralResolver.category(&BigDecimal::from(n), kind, locale)
    }

    #[test]
    fn english_ordinals() {
        let cases = vec![
            (PluralCategory::One, 1),
            (PluralCategory::Two, 22),
            (PluralCategory::Few, 103),
            (PluralCategory::Other, 111),
            (PluralCategory::Other, 12_345),
        ];
        for (expected, n) in cases {
            assert_eq!(category(n, PluralKind::Ordinal, "en"), expected, "ordinal category of {n}");
        }
    }

    #[test]
    fn russian_cardinals() {
        assert_eq!(category(21, PluralKind::Cardinal, "ru"), PluralCategory::One);
        assert_eq!(category(2, PluralKind::Cardinal, "ru"), PluralCategory::Few);
        assert_eq!(category(5, PluralKind::Cardinal, "ru_RU"), PluralCategory::Many);
    }

    #[test]
    fn unparseable_locales_fall_back_to_other() {
        assert_eq!(category(1, PluralKind::Cardinal, "not a locale!"), PluralCategory::Other);
    }

    #[test]
    fn rules_are_loaded_once_per_locale_and_kind() {
        for n in 0..100 {
            category(n, PluralKind::Ordinal, "en");
            category(n, PluralKind::Cardinal, "ru");
            category(n, PluralKind::Cardinal, "not a locale!");
        }
        let loaded = |locale: &str, kind: PluralKind| {
            LOADED_RULES.with(|cache| cache.borrow().get(&(locale.to_string(), kind)).map(Option::is_some))
        };
        assert_eq!(loaded("en", PluralKind::Ordinal), Some(true));
        assert_eq!(loaded("ru", PluralKind::Cardinal), Some(true));
        assert_eq!(loaded("not a locale!", PluralKind::Cardinal), Some(false));
    }

    #[test]
    fn keywords_round_trip() {
        for keyword in ["zero", "one", "two", "few", "many", "other"] {
            assert_eq!(PluralCategory::from_keyword(keyword).map(PluralCategory::as_str), Some(keyword));
        }
        assert_eq!(PluralCategory::from_keyword("lots"), None);
    }
}
