//! Username derivation from a display name
//!
//! A base username is built from the first two words of the name, folded to
//! plain ASCII: `"João da Silva"` becomes `joao.da`. Collisions are resolved
//! by appending an increasing counter to the base (`joao.da1`, `joao.da2`, ...),
//! see [`Candidates`].

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum number of name words kept in a username
pub const MAX_WORDS: usize = 2;

/// Separator placed between kept words
pub const SEPARATOR: char = '.';

/// Derive the base username for `name`
///
/// Returns `None` when nothing usable survives normalization (empty names,
/// names made only of punctuation or non-Latin script).
#[must_use]
pub fn base_username(name: &str) -> Option<String> {
    let folded: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    let words: Vec<&str> = folded.split_whitespace().take(MAX_WORDS).collect();
    if words.is_empty() {
        return None;
    }

    Some(words.join(&SEPARATOR.to_string()))
}

/// Username candidate for the given attempt: the base itself first, then the
/// base with a numeric suffix
#[inline]
#[must_use]
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}{attempt}")
    }
}

/// Iterator over successive username candidates for one base
///
/// Always suffixes the original base, never a previous candidate.
#[derive(Debug, Clone)]
pub struct Candidates {
    base: String,
    attempt: u32,
}

impl Candidates {
    /// Start at the unsuffixed base
    #[inline]
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            attempt: 0,
        }
    }

    /// The unsuffixed base
    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Number of candidates produced so far
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Iterator for Candidates {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let current = candidate(&self.base, self.attempt);
        self.attempt = self.attempt.checked_add(1)?;
        Some(current)
    }
}
