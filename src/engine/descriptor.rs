//! Rule keys: the text before a rule's colon.
//!
//! A key is either a numeric threshold (`100`, `1,000`, `3600/60`, `100>`),
//! one of the special markers (`-x`, `x.x`, `0.x`, `x.0`, `Inf`, `NaN`, and
//! their comma-decimal twins), or absent, in which case the rule takes the
//! next base value in sequence.

/// Default radix for numeric rules.
pub(crate) const DEFAULT_RADIX: u32 = 10;

/// The special rule kinds that are not selected by threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SpecialKind {
    /// `-x`
    Negative,
    /// `x.x`: values with an integral and a fractional part.
    ImproperFraction,
    /// `0.x`: values strictly between 0 and 1.
    ProperFraction,
    /// `x.0`: any non-integral value not claimed by the two above.
    Master,
    /// `Inf`
    Infinity,
    /// `NaN`
    NotANumber,
}

impl SpecialKind {
    pub(crate) fn is_fraction(self) -> bool {
        matches!(self, SpecialKind::ImproperFraction | SpecialKind::ProperFraction | SpecialKind::Master)
    }
}

/// A parsed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RuleKey {
    /// No key: base value is assigned from the preceding rule.
    Implicit,
    Numeric { base: i64, radix: u32, lowered: u32, radix_given: bool },
    /// `decimal_point` is `Some` for the fraction markers (`.` or `,`).
    Special { kind: SpecialKind, decimal_point: Option<char> },
}

/// Split a rule into its key and body.
///
/// The key is the text before the first colon outside quotes; whitespace
/// after the colon is dropped. A rule with no colon has no key.
pub(crate) fn split_rule(rule: &str) -> (Option<&str>, &str) {
    let mut in_quote = false;
    for (i, c) in rule.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ':' if !in_quote => {
                let body = rule[i + 1..].trim_start();
                return (Some(rule[..i].trim()), body);
            }
            _ => {}
        }
    }
    (None, rule)
}

/// Parse a key into a [`RuleKey`]. Errors are plain reasons; the caller adds
/// the rule set and rule index.
pub(crate) fn parse_key(key: Option<&str>) -> Result<RuleKey, String> {
    let Some(key) = key else {
        return Ok(RuleKey::Implicit);
    };

    let special = match key {
        "-x" => Some((SpecialKind::Negative, None)),
        "x.x" => Some((SpecialKind::ImproperFraction, Some('.'))),
        "x,x" => Some((SpecialKind::ImproperFraction, Some(','))),
        "0.x" => Some((SpecialKind::ProperFraction, Some('.'))),
        "0,x" => Some((SpecialKind::ProperFraction, Some(','))),
        "x.0" => Some((SpecialKind::Master, Some('.'))),
        "x,0" => Some((SpecialKind::Master, Some(','))),
        "Inf" => Some((SpecialKind::Infinity, None)),
        "NaN" => Some((SpecialKind::NotANumber, None)),
        _ => None,
    };
    if let Some((kind, decimal_point)) = special {
        return Ok(RuleKey::Special { kind, decimal_point });
    }

    let caps = regex!(r"^([0-9][0-9,.\s]*?)\s*(?:/\s*([0-9][0-9,.\s]*?))?\s*(>*)$")
        .captures(key)
        .ok_or_else(|| format!("unrecognized rule descriptor `{key}`"))?;

    let base = digits_to_i64(&caps[1]).ok_or_else(|| format!("base value `{}` does not fit in 64 bits", &caps[1]))?;
    let (radix, radix_given) = match caps.get(2) {
        Some(m) => {
            let radix = digits_to_i64(m.as_str())
                .and_then(|r| u32::try_from(r).ok())
                .ok_or_else(|| format!("radix `{}` is out of range", m.as_str()))?;
            (radix, true)
        }
        None => (DEFAULT_RADIX, false),
    };
    let lowered = caps[3].len() as u32;

    Ok(RuleKey::Numeric { base, radix, lowered, radix_given })
}

fn digits_to_i64(text: &str) -> Option<i64> {
    let mut value: i64 = 0;
    for c in text.chars().filter(|c| c.is_ascii_digit()) {
        value = value.checked_mul(10)?.checked_add(i64::from(c as u8 - b'0'))?;
    }
    Some(value)
}

/// Largest `e` such that `radix^e <= base`.
///
/// Radix 0 and 1 have no such bound and are rejected.
pub(crate) fn exponent_for(base: i64, radix: u32) -> Result<u32, String> {
    if radix < 2 {
        return Err(format!("radix {radix} cannot define a divisor"));
    }
    let radix = i64::from(radix);
    let mut exponent = 0;
    let mut power: i64 = 1;
    while let Some(next) = power.checked_mul(radix) {
        if next > base {
            break;
        }
        power = next;
        exponent += 1;
    }
    Ok(exponent)
}

/// `radix^exponent`, failing on overflow.
pub(crate) fn divisor_for(radix: u32, exponent: u32) -> Result<i64, String> {
    i64::from(radix)
        .checked_pow(exponent)
        .ok_or_else(|| format!("{radix}^{exponent} overflows 64 bits"))
}
