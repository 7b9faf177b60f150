//! Message template tokens and substitution.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.*?)\}").expect("valid token pattern"));

/// One `{HEAD}` or `{HEAD.SUB}` token found in a message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateToken {
    /// Text between the braces, as written.
    pub raw: String,
    /// Uppercased segment before the first `.`.
    pub head: String,
    /// Uppercased remainder after the first `.`, if any.
    pub sub: Option<String>,
}

impl TemplateToken {
    fn parse(raw: &str) -> Self {
        let (head, sub) = match raw.split_once('.') {
            Some((head, sub)) => (head, Some(sub.to_uppercase())),
            None => (raw, None),
        };
        Self {
            raw: raw.to_string(),
            head: head.to_uppercase(),
            sub,
        }
    }

    /// Lookup key for substitution values (`PLAYER.NAME`).
    pub fn key(&self) -> String {
        self.raw.to_uppercase()
    }
}

/// All tokens in `template`, in order of appearance.
pub fn scan_tokens(template: &str) -> Vec<TemplateToken> {
    RE_TOKEN
        .captures_iter(template)
        .map(|c| TemplateToken::parse(&c[1]))
        .collect()
}

/// Replace every token whose uppercased content has a value.
///
/// A single left-to-right pass: substituted text is never rescanned, and
/// tokens without a value are kept verbatim.
pub fn substitute(template: &str, values: &HashMap<String, String>) -> String {
    RE_TOKEN
        .replace_all(template, |c: &Captures<'_>| match values.get(&c[1].to_uppercase()) {
            Some(v) => v.clone(),
            None => c[0].to_string(),
        })
        .into_owned()
}
