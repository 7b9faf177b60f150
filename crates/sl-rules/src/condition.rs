//! Compiled rule conditions and the allow/deny check.
//!
//! Each rule carries sets of uppercased tokens keyed by [`ConditionKey`].
//! A candidate value is denied when:
//!
//! 1. the scope's `IGNORED` set contains it (deny always wins), or
//! 2. the scope has a `LOGGED` set and the value is not in it.
//!
//! The whole-event scope is checked against the subject's identity; a
//! field scope is checked against that field's value.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Key of one condition set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionKey {
    /// Token heads resolved from the message template.
    Args,
    Ignored,
    Logged,
    FieldIgnored(String),
    FieldLogged(String),
}

impl ConditionKey {
    /// Parse a configuration key. Field names are uppercased.
    ///
    /// Returns `None` for keys that are not conditions. `ARGS` is derived
    /// from the template and cannot be configured.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.to_uppercase();
        match key.as_str() {
            "IGNORED" => return Some(ConditionKey::Ignored),
            "LOGGED" => return Some(ConditionKey::Logged),
            _ => {}
        }
        let (field, suffix) = key.split_once('-')?;
        match suffix {
            "IGNORED" => Some(ConditionKey::FieldIgnored(field.to_string())),
            "LOGGED" => Some(ConditionKey::FieldLogged(field.to_string())),
            _ => None,
        }
    }

    pub fn ignored(scope: Option<&str>) -> Self {
        match scope {
            Some(field) => ConditionKey::FieldIgnored(field.to_uppercase()),
            None => ConditionKey::Ignored,
        }
    }

    pub fn logged(scope: Option<&str>) -> Self {
        match scope {
            Some(field) => ConditionKey::FieldLogged(field.to_uppercase()),
            None => ConditionKey::Logged,
        }
    }
}

impl fmt::Display for ConditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKey::Args => write!(f, "ARGS"),
            ConditionKey::Ignored => write!(f, "IGNORED"),
            ConditionKey::Logged => write!(f, "LOGGED"),
            ConditionKey::FieldIgnored(field) => write!(f, "{field}-IGNORED"),
            ConditionKey::FieldLogged(field) => write!(f, "{field}-LOGGED"),
        }
    }
}

/// Condition sets of one compiled rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    sets: HashMap<ConditionKey, BTreeSet<String>>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add uppercased values to a set. Empty input leaves no set behind,
    /// so an empty `LOGGED` list never becomes an allow-list.
    pub fn insert<I, S>(&mut self, key: ConditionKey, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_uppercase())
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            return;
        }
        self.sets.entry(key).or_default().extend(values);
    }

    pub fn get(&self, key: &ConditionKey) -> Option<&BTreeSet<String>> {
        self.sets.get(key)
    }

    /// Resolved template token heads.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.sets
            .get(&ConditionKey::Args)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn has_arg(&self, head: &str) -> bool {
        self.sets
            .get(&ConditionKey::Args)
            .is_some_and(|args| args.contains(&head.to_uppercase()))
    }

    /// Whether `candidate` is denied in `scope` (`None` = whole event).
    pub fn is_denied(&self, scope: Option<&str>, candidate: &str) -> bool {
        let candidate = candidate.to_uppercase();
        if self
            .sets
            .get(&ConditionKey::ignored(scope))
            .is_some_and(|ignored| ignored.contains(&candidate))
        {
            return true;
        }
        self.sets
            .get(&ConditionKey::logged(scope))
            .is_some_and(|logged| !logged.contains(&candidate))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
