//! Text matching for lenient parsing.
//!
//! Strict parsing compares literal rule text byte for byte. Lenient parsing
//! hands every literal comparison to a [`LenientScanner`], which decides
//! what counts as "the same text". The default [`DelimiterScanner`] ignores
//! case, collapses whitespace, and honours the equivalence classes written
//! in a description's `%%lenient-parse:` section:
//!
//! ```text
//! %%lenient-parse:
//!     & ' ' = '-' = ',';         one class: the members match each other
//!     &[last primary ignorable ] << ' ' << ',';   members may be skipped
//! ```

use std::fmt;

/// Equivalence-aware text matching used in lenient mode.
pub trait LenientScanner: Send + Sync + fmt::Debug {
    /// Bytes of `text` matched by `prefix` at its start, or `None`.
    fn prefix_length(&self, text: &str, prefix: &str) -> Option<usize>;

    /// First match of `key` in `text` at or after byte `start`, as
    /// `(position, length)`.
    fn find_text(&self, text: &str, key: &str, start: usize) -> Option<(usize, usize)> {
        text.char_indices()
            .map(|(i, _)| i)
            .filter(|&i| i >= start)
            .find_map(|i| self.prefix_length(&text[i..], key).map(|len| (i, len)))
    }
}

/// The default [`LenientScanner`].
#[derive(Debug, Clone, Default)]
pub struct DelimiterScanner {
    classes: Vec<Vec<char>>,
    ignorable: Vec<char>,
}

impl DelimiterScanner {
    /// Build a scanner from the body of a `%%lenient-parse:` section.
    pub fn from_rules(rules: &str) -> Self {
        let mut scanner = Self::default();
        for group in rules.split('&').map(str::trim).filter(|g| !g.is_empty()) {
            let mut members: Vec<char> = Vec::new();
            let mut anchor_ignorable = false;
            for (i, item) in group.split(['=', '<', ';']).map(str::trim).enumerate() {
                if i == 0 && item.starts_with('[') {
                    anchor_ignorable = item.contains("ignorable");
                    continue;
                }
                members.extend(unquote(item));
            }
            if anchor_ignorable {
                scanner.ignorable.extend(members);
            } else if members.len() > 1 {
                scanner.classes.push(members);
            }
        }
        scanner
    }

    fn is_ignorable(&self, c: char) -> bool {
        self.ignorable.contains(&c)
    }

    fn equivalent(&self, a: char, b: char) -> bool {
        if a == b || a.to_lowercase().eq(b.to_lowercase()) {
            return true;
        }
        if a.is_whitespace() && b.is_whitespace() {
            return true;
        }
        self.classes.iter().any(|class| class.contains(&a) && class.contains(&b))
    }
}

impl LenientScanner for DelimiterScanner {
    fn prefix_length(&self, text: &str, prefix: &str) -> Option<usize> {
        let mut t = text.char_indices().peekable();
        let mut p = prefix.chars().peekable();
        let mut used = 0;

        loop {
            while p.peek().is_some_and(|&c| self.is_ignorable(c)) {
                p.next();
            }
            let Some(&pc) = p.peek() else {
                return Some(used);
            };
            if pc.is_whitespace() {
                while p.peek().is_some_and(|c| c.is_whitespace()) {
                    p.next();
                }
                while let Some(&(i, tc)) = t.peek() {
                    if !self.equivalent(tc, pc) && !self.is_ignorable(tc) {
                        break;
                    }
                    used = i + tc.len_utf8();
                    t.next();
                }
                continue;
            }
            while let Some(&(_, tc)) = t.peek() {
                if !self.is_ignorable(tc) || self.equivalent(tc, pc) {
                    break;
                }
                t.next();
            }
            match t.next() {
                Some((i, tc)) if self.equivalent(tc, pc) => {
                    used = i + tc.len_utf8();
                    p.next();
                }
                _ => return None,
            }
        }
    }
}

fn unquote(item: &str) -> Vec<char> {
    let inner = item.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')).unwrap_or(item);
    if inner.is_empty() && !item.is_empty() {
        return Vec::new();
    }
    inner.chars().collect()
}
