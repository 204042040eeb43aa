//! Placeholder tokens and their replacement values

use std::sync::OnceLock;

use regex::Regex;

/// Ordered mapping from literal token to replacement value
///
/// Declaration order decides which token wins when two tokens could match
/// at the same position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

/// Result of substituting one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Text after substitution
    pub text: String,
    /// Replacement count per entry, parallel to the map's declaration order
    pub counts: Vec<usize>,
}

impl Substitution {
    /// Total number of tokens replaced
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl PlaceholderMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token, or update its value in place if already declared
    ///
    /// Empty tokens are ignored.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    /// Value bound to a token
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map has no tokens
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens in declaration order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    /// (token, value) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Whether any token occurs in `text`
    pub fn occurs_in(&self, text: &str) -> bool {
        self.tokens().any(|token| text.contains(token))
    }

    /// Replace every token occurrence in one left-to-right pass
    ///
    /// Inserted values are never rescanned, so a value that itself looks
    /// like a token stays literal.
    pub fn substitute(&self, text: &str) -> Substitution {
        let mut out = String::with_capacity(text.len());
        let mut counts = vec![0; self.entries.len()];
        let mut rest = text;

        'scan: while !rest.is_empty() {
            for (i, (token, value)) in self.entries.iter().enumerate() {
                if let Some(after) = rest.strip_prefix(token.as_str()) {
                    out.push_str(value);
                    counts[i] += 1;
                    rest = after;
                    continue 'scan;
                }
            }

            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                out.push(ch);
            }
            rest = chars.as_str();
        }

        Substitution { text: out, counts }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (token, value) in iter {
            map.insert(token, value);
        }
        map
    }
}

/// Find placeholder-shaped tokens (`open` + name + `close`) in text
///
/// Returns every occurrence in order, delimiters included. A name must be
/// non-empty and contain neither whitespace nor a delimiter character, so
/// `{{{GMAIL}}}` yields `{{GMAIL}}`.
pub fn find_placeholders(text: &str, open: &str, close: &str) -> Vec<String> {
    static BRACES_RE: OnceLock<Option<Regex>> = OnceLock::new();

    let built;
    let re = if (open, close) == ("{{", "}}") {
        BRACES_RE.get_or_init(|| placeholder_regex(open, close))
    } else {
        built = placeholder_regex(open, close);
        &built
    };

    match re {
        Some(re) => re.find_iter(text).map(|m| m.as_str().to_string()).collect(),
        None => Vec::new(),
    }
}

/// `open`, a name free of whitespace and delimiter characters, `close`
fn placeholder_regex(open: &str, close: &str) -> Option<Regex> {
    if open.is_empty() || close.is_empty() {
        return None;
    }

    let mut excluded: Vec<char> = open.chars().chain(close.chars()).collect();
    excluded.sort_unstable();
    excluded.dedup();
    let class: String = excluded
        .iter()
        .map(|c| regex::escape(&c.to_string()))
        .collect();

    let pattern = format!(
        r"{}[^\s{}]+{}",
        regex::escape(open),
        class,
        regex::escape(close)
    );
    Regex::new(&pattern).ok()
}
