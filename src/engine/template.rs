//! Rule bodies: literal text, substitution tokens, optional `[...]` groups
//! and embedded plural blocks.
//!
//! Parsing happens in two steps. [`parse_body`] recognizes the syntax and
//! yields [`Segment<Token>`]s; the collection compiler later maps each raw
//! [`Token`] to a resolved substitution once it knows what kind of rule and
//! rule set the token lives in (see `substitution.rs`).
//!
//! Quoting: `'...'` is literal text and `''` is an apostrophe. A lone `'` at
//! the very start of a body with no closing quote only marks that the
//! following whitespace is significant.

use std::fmt;

use crate::engine::plural::{PluralCategory, PluralKind};

/// One piece of a rule body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment<S> {
    Literal(String),
    Substitution(S),
    Plural(PluralBlock),
    Optional(Vec<Segment<S>>),
}

/// Which side a substitution token was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenSide {
    /// `<...<`
    Less,
    /// `>...>`
    Greater,
    /// `=...=`
    Equal,
}

/// What a token's description names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenTarget {
    /// Empty description: the owning rule set (or a token-specific default).
    Current,
    RuleSet(String),
    Pattern(String),
}

/// A substitution token as written, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub side: TokenSide,
    pub target: TokenTarget,
    /// `>>>`, `<<<` or `<%name<<`.
    pub tripled: bool,
    pub source: String,
}

/// `$(kind, keyword{text} ...)$`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PluralBlock {
    pub kind: PluralKind,
    pub branches: Vec<(PluralCategory, String)>,
}

impl PluralBlock {
    /// The branch for `category`, falling back to `other`.
    pub(crate) fn text_for(&self, category: PluralCategory) -> &str {
        self.branches
            .iter()
            .find(|(c, _)| *c == category)
            .or_else(|| self.branches.iter().find(|(c, _)| *c == PluralCategory::Other))
            .map(|(_, text)| text.as_str())
            .unwrap_or("")
    }
}

impl fmt::Display for PluralBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            PluralKind::Cardinal => "cardinal",
            PluralKind::Ordinal => "ordinal",
        };
        write!(f, "$({kind},")?;
        for (category, text) in &self.branches {
            write!(f, "{}{{{}}}", category.as_str(), text)?;
        }
        f.write_str(")$")
    }
}

impl<S> Segment<S> {
    /// Rebuild the segment with every substitution mapped through `f`.
    pub(crate) fn try_map<T, E>(self, f: &mut impl FnMut(S) -> Result<T, E>) -> Result<Segment<T>, E> {
        Ok(match self {
            Segment::Literal(text) => Segment::Literal(text),
            Segment::Substitution(s) => Segment::Substitution(f(s)?),
            Segment::Plural(block) => Segment::Plural(block),
            Segment::Optional(inner) => {
                Segment::Optional(inner.into_iter().map(|seg| seg.try_map(f)).collect::<Result<_, _>>()?)
            }
        })
    }
}

/// Visit every substitution in `segments`, optional groups included.
pub(crate) fn substitutions<S>(segments: &[Segment<S>]) -> Vec<&S> {
    let mut out = Vec::new();
    collect(segments, &mut out);
    out
}

fn collect<'a, S>(segments: &'a [Segment<S>], out: &mut Vec<&'a S>) {
    for seg in segments {
        match seg {
            Segment::Substitution(s) => out.push(s),
            Segment::Optional(inner) => collect(inner, out),
            Segment::Literal(_) | Segment::Plural(_) => {}
        }
    }
}

const TOKEN_PREFIXES: [&str; 11] = ["<<", "<%", "<#", "<0", ">>", ">%", ">#", ">0", "=%", "=#", "=0"];

/// Parse a rule body (text after the key) into raw segments.
pub(crate) fn parse_body(body: &str) -> Result<Vec<Segment<Token>>, String> {
    let mut text = body;
    if text.starts_with('\'') && !has_closing_quote(&text[1..]) {
        text = &text[1..];
    }

    let mut top: Vec<Segment<Token>> = Vec::new();
    let mut optional: Option<Vec<Segment<Token>>> = None;
    let mut literal = String::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let current = optional.as_mut().unwrap_or(&mut top);

        if let Some(after) = rest.strip_prefix('\'') {
            if let Some(after) = after.strip_prefix('\'') {
                literal.push('\'');
                i = text.len() - after.len();
                continue;
            }
            let (quoted, consumed) = read_quoted(after).ok_or("unterminated quote")?;
            literal.push_str(&quoted);
            i += 1 + consumed;
            continue;
        }

        if rest.starts_with('[') {
            if optional.is_some() {
                return Err("optional groups cannot nest".into());
            }
            flush(&mut literal, &mut top);
            optional = Some(Vec::new());
            i += 1;
            continue;
        }

        if rest.starts_with(']') {
            let Some(mut inner) = optional.take() else {
                return Err("`]` without a matching `[`".into());
            };
            flush(&mut literal, &mut inner);
            if substitutions(&inner).is_empty() {
                return Err("optional group has no substitution".into());
            }
            top.push(Segment::Optional(inner));
            i += 1;
            continue;
        }

        if rest.starts_with("$(") {
            let end = rest.find(")$").ok_or("plural block is missing its closing `)$`")?;
            flush(&mut literal, current);
            current.push(Segment::Plural(parse_plural(&rest[2..end])?));
            i += end + 2;
            continue;
        }

        if rest.starts_with("==") {
            return Err("`==` is not a valid substitution".into());
        }

        if TOKEN_PREFIXES.iter().any(|p| rest.starts_with(p)) {
            let len = token_len(rest).ok_or_else(|| format!("unterminated substitution in `{rest}`"))?;
            flush(&mut literal, current);
            current.push(Segment::Substitution(parse_token(&rest[..len])?));
            i += len;
            continue;
        }

        let Some(c) = rest.chars().next() else { break };
        literal.push(c);
        i += c.len_utf8();
    }

    if optional.is_some() {
        return Err("`[` without a matching `]`".into());
    }
    flush(&mut literal, &mut top);
    Ok(top)
}

fn flush<S>(literal: &mut String, into: &mut Vec<Segment<S>>) {
    if literal.is_empty() {
        return;
    }
    let text = std::mem::take(literal);
    if let Some(Segment::Literal(prev)) = into.last_mut() {
        prev.push_str(&text);
    } else {
        into.push(Segment::Literal(text));
    }
}

fn has_closing_quote(text: &str) -> bool {
    read_quoted(text).is_some()
}

/// Read quoted text up to the closing quote. Returns the unescaped content
/// and the bytes consumed, including the closing quote.
fn read_quoted(text: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                chars.next();
                out.push('\'');
                continue;
            }
            return Some((out, i + 1));
        }
        out.push(c);
    }
    None
}

/// Byte length of the token starting `rest`, which begins with a known
/// prefix. `>>>` is its own token; a `<` token may be followed by one extra
/// `<` (`<<<`, `<%name<<`).
fn token_len(rest: &str) -> Option<usize> {
    if rest.starts_with(">>>") {
        return Some(3);
    }
    let delim = rest.chars().next()?;
    let close = rest[1..].find(delim)? + 1;
    if delim == '<' && rest[close + 1..].starts_with('<') {
        return Some(close + 2);
    }
    Some(close + 1)
}

fn parse_token(source: &str) -> Result<Token, String> {
    let side = match source.as_bytes()[0] {
        b'<' => TokenSide::Less,
        b'>' => TokenSide::Greater,
        _ => TokenSide::Equal,
    };
    let tripled = source == ">>>" || (side == TokenSide::Less && source.len() >= 3 && source.ends_with("<<"));
    let inner = if tripled { &source[1..source.len() - 2] } else { &source[1..source.len() - 1] };

    let target = if inner.is_empty() {
        TokenTarget::Current
    } else if inner.starts_with('%') {
        TokenTarget::RuleSet(inner.to_string())
    } else if inner.starts_with('#') || inner.starts_with('0') {
        TokenTarget::Pattern(inner.to_string())
    } else {
        return Err(format!("bad substitution description `{inner}`"));
    };

    Ok(Token { side, target, tripled, source: source.to_string() })
}

fn parse_plural(inner: &str) -> Result<PluralBlock, String> {
    let (kind, branches) = inner.split_once(',').ok_or("plural block needs a type and branches")?;
    let kind = match kind.trim() {
        "cardinal" => PluralKind::Cardinal,
        "ordinal" => PluralKind::Ordinal,
        other => return Err(format!("unknown plural type `{other}`")),
    };

    let mut parsed = Vec::new();
    let mut consumed = 0;
    for caps in regex!(r"\s*([A-Za-z=0-9]+)\s*\{([^}]*)\}").captures_iter(branches) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        if whole.start != consumed {
            return Err(format!("malformed plural branches `{branches}`"));
        }
        consumed = whole.end;
        let keyword = &caps[1];
        let category =
            PluralCategory::from_keyword(keyword).ok_or_else(|| format!("unknown plural keyword `{keyword}`"))?;
        parsed.push((category, caps[2].to_string()));
    }
    if !branches[consumed..].trim().is_empty() {
        return Err(format!("malformed plural branches `{branches}`"));
    }
    if !parsed.iter().any(|(c, _)| *c == PluralCategory::Other) {
        return Err("plural block has no `other` branch".into());
    }
    Ok(PluralBlock { kind, branches: parsed })
}

/// Write a literal so that it reads back as the same literal.
pub(crate) fn write_literal(f: &mut impl fmt::Write, text: &str, at_start: bool) -> fmt::Result {
    let needs_quotes = text.contains(['\'', '<', '>', '=', '[', ']', '$', ':'])
        || (at_start && text.starts_with(char::is_whitespace));
    if !needs_quotes {
        return f.write_str(text);
    }
    f.write_char('\'')?;
    for c in text.chars() {
        if c == '\'' {
            f.write_str("''")?;
        } else {
            f.write_char(c)?;
        }
    }
    f.write_char('\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit<S>(s: &str) -> Segment<S> {
        Segment::Literal(s.to_string())
    }

    fn tok(body: &str) -> Token {
        match parse_body(body).unwrap().remove(0) {
            Segment::Substitution(t) => t,
            other => panic!("expected a token in {body:?}, got {other:?}"),
        }
    }

    #[test]
    fn literals_and_tokens_alternate() {
        let segs = parse_body("<< hundred[ >>]").unwrap();
        assert_eq!(segs.len(), 3);
        assert!(matches!(&segs[0], Segment::Substitution(t) if t.side == TokenSide::Less));
        assert_eq!(segs[1], lit(" hundred"));
        match &segs[2] {
            Segment::Optional(inner) => {
                assert_eq!(inner[0], lit(" "));
                assert!(matches!(&inner[1], Segment::Substitution(t) if t.side == TokenSide::Greater));
            }
            other => panic!("expected optional group, got {other:?}"),
        }
    }

    #[test]
    fn token_descriptions() {
        assert_eq!(tok("<%spellout-numbering<").target, TokenTarget::RuleSet("%spellout-numbering".into()));
        assert_eq!(tok("=#,##0=").target, TokenTarget::Pattern("#,##0".into()));
        assert_eq!(tok("<0<").target, TokenTarget::Pattern("0".into()));
        assert_eq!(tok(">>").target, TokenTarget::Current);
        assert!(tok(">>>").tripled);
        assert!(tok("<<<").tripled);
        let named = tok("<%%frac<<");
        assert!(named.tripled);
        assert_eq!(named.target, TokenTarget::RuleSet("%%frac".into()));
    }

    #[test]
    fn quotes_and_leading_space_marker() {
        assert_eq!(parse_body("' =%x='").unwrap(), vec![lit(" =%x=")]);
        let segs = parse_body("' =%spellout-ordinal=").unwrap();
        assert_eq!(segs[0], lit(" "));
        assert_eq!(parse_body("l''arbre").unwrap(), vec![lit("l'arbre")]);
        assert_eq!(parse_body("a 'b;c' d").unwrap(), vec![lit("a b;c d")]);
        assert!(parse_body("a 'b").is_err());
    }

    #[test]
    fn plural_blocks() {
        let segs = parse_body("=#,##0=$(ordinal,one{st}two{nd}few{rd}other{th})$").unwrap();
        match &segs[1] {
            Segment::Plural(block) => {
                assert_eq!(block.kind, PluralKind::Ordinal);
                assert_eq!(block.text_for(PluralCategory::Two), "nd");
                assert_eq!(block.text_for(PluralCategory::Many), "th");
            }
            other => panic!("expected plural block, got {other:?}"),
        }
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        let cases = vec![
            "[a [b >>]]",
            "a ]",
            "[ >>",
            "[ text ]",
            "$(cardinal,one{a}",
            "$(dual,one{a}other{b})$",
            "$(cardinal,one{a}lots{b}other{c})$",
            "$(cardinal,one{a})$",
            "<%foo",
            "==",
        ];
        for body in cases {
            assert!(parse_body(body).is_err(), "body {body:?} should be rejected");
        }
    }

    #[test]
    fn text_before_a_group_stays_outside_it() {
        let segs = parse_body("twenty[->>] more[ $(cardinal,one{x}other{y})$ <<]").unwrap();
        assert_eq!(segs[0], lit("twenty"));
        match &segs[1] {
            Segment::Optional(inner) => assert_eq!(inner[0], lit("-")),
            other => panic!("expected optional group, got {other:?}"),
        }
        assert_eq!(segs[2], lit(" more"));
        match &segs[3] {
            Segment::Optional(inner) => {
                assert_eq!(inner[0], lit(" "));
                assert!(matches!(&inner[1], Segment::Plural(_)));
                assert!(matches!(&inner[3], Segment::Substitution(t) if t.side == TokenSide::Less));
            }
            other => panic!("expected optional group, got {other:?}"),
        }
        assert_eq!(segs.len(), 4);
    }

    #[test]
    fn single_delimiters_are_plain_text() {
        assert_eq!(parse_body("a < b = c").unwrap(), vec![lit("a < b = c")]);
    }
}
