//! Module name normalization
//!
//! SugarCRM module names are title cased ("Accounts", "Project Task").
//! Callers may pass any casing; the name is normalized once when a
//! [`ModuleName`] is built and never again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A module name in canonical title case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(raw: &str) -> Self {
        Self(title_case(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for ModuleName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ModuleName {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<ModuleName> for String {
    fn from(name: ModuleName) -> Self {
        name.0
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Title case each alphanumeric run of `raw`.
///
/// The first character of a word is upper cased and the rest lower cased,
/// so any two casings of a name normalize to the same string. Uses Unicode
/// case mappings only, never the process locale. A character whose mapping
/// is more than one character (`ß` to `SS`) is left as it is, which keeps
/// the result stable under a second pass.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut word_start = None;

    for (i, c) in raw.char_indices() {
        if c.is_alphanumeric() {
            word_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = word_start.take() {
            push_title_word(&raw[start..i], &mut out);
        }
        out.push(c);
    }
    if let Some(start) = word_start {
        push_title_word(&raw[start..], &mut out);
    }

    out
}

fn push_title_word(word: &str, out: &mut String) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.push(single(first, first.to_uppercase()));
    }
    for c in chars {
        out.push(single(c, c.to_lowercase()));
    }
}

fn single(c: char, mut mapped: impl Iterator<Item = char>) -> char {
    match (mapped.next(), mapped.next()) {
        (Some(m), None) => m,
        _ => c,
    }
}
