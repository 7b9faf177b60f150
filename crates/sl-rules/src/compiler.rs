//! Rule compilation.
//!
//! Turns raw per-event definitions into immutable [`EventRule`]s. A rule
//! either compiles completely or is not registered at all.
//!
//! For each enabled definition:
//! 1. resolve the event type in the registry (unknown → skipped)
//! 2. default the message to `executed.`
//! 3. resolve every template token: reserved heads go through the
//!    category accessor, other heads must be readable attributes (a miss
//!    is only a warning)
//! 4. parse condition keys; a field-scoped key naming an unreadable
//!    attribute rejects the rule

use crate::condition::{ConditionKey, Conditions};
use crate::error::RuleCompileError;
use crate::template::{scan_tokens, TemplateToken};
use serde_yaml::Value;
use sl_common::{AttributePath, EventCategory, EventTypeRegistry};
use sl_config::{RawRuleDefinition, RuleDocument};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Message used when a rule has none.
pub const DEFAULT_MESSAGE: &str = "executed.";

/// A field read from every event of a rule's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub path: AttributePath,
    /// Uppercased token key and condition scope (`BLOCK`).
    pub key: String,
}

/// Compiled configuration for one event type.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRule {
    pub event_type: String,
    pub category: EventCategory,
    pub cancellable: bool,
    pub message: String,
    pub tokens: Vec<TemplateToken>,
    /// Fields to extract, in declaration order, without duplicates.
    pub fields: Vec<FieldBinding>,
    pub conditions: Conditions,
}

/// A non-fatal problem found while compiling a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileWarning {
    pub event_type: String,
    pub message: String,
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.event_type, self.message)
    }
}

/// Summary of compiling a whole rule document.
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub registered: usize,
    pub disabled: usize,
    pub skipped: Vec<RuleCompileError>,
    pub warnings: Vec<CompileWarning>,
}

/// Registered rules, keyed by event-type name. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, Arc<EventRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rule: EventRule) {
        self.rules.insert(rule.event_type.clone(), Arc::new(rule));
    }

    pub fn get(&self, event_type: &str) -> Option<&Arc<EventRule>> {
        self.rules.get(event_type)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

/// Compiles raw definitions against the host's event-type registry.
pub struct RuleCompiler<'a> {
    registry: &'a EventTypeRegistry,
}

impl<'a> RuleCompiler<'a> {
    pub fn new(registry: &'a EventTypeRegistry) -> Self {
        Self { registry }
    }

    /// Compile every definition of a document.
    ///
    /// Failures are logged and collected in the report; they never stop
    /// the remaining rules from loading.
    pub fn compile_all(&self, doc: &RuleDocument) -> (RuleSet, CompileReport) {
        let mut set = RuleSet::new();
        let mut report = CompileReport::default();

        for (name, def) in &doc.rules {
            match self.compile(name, def, &mut report.warnings) {
                Ok(Some(rule)) => {
                    debug!(event_type = %name, fields = rule.fields.len(), "rule registered");
                    set.insert(rule);
                }
                Ok(None) => report.disabled += 1,
                Err(e) => {
                    warn!(event_type = %name, category = %e.category(), "{}", e);
                    report.skipped.push(e);
                }
            }
        }
        for w in &report.warnings {
            warn!(event_type = %w.event_type, "{}", w.message);
        }

        report.registered = set.len();
        (set, report)
    }

    /// Compile one definition. Returns `Ok(None)` for a disabled rule.
    pub fn compile(
        &self,
        event_type: &str,
        def: &RawRuleDefinition,
        warnings: &mut Vec<CompileWarning>,
    ) -> Result<Option<EventRule>, RuleCompileError> {
        if !def.enabled {
            return Ok(None);
        }

        let descriptor =
            self.registry
                .resolve(event_type)
                .ok_or_else(|| RuleCompileError::UnknownEventType {
                    event_type: event_type.to_string(),
                })?;
        let category = descriptor.category;

        let message = match def.message.as_deref() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => DEFAULT_MESSAGE.to_string(),
        };

        // Kept local until the rule compiles, so a rejected rule reports
        // only its rejection.
        let mut pending: Vec<CompileWarning> = Vec::new();
        let mut warn = |message: String| {
            pending.push(CompileWarning {
                event_type: event_type.to_string(),
                message,
            })
        };

        let tokens = scan_tokens(&message);
        let mut fields: Vec<FieldBinding> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        for token in &tokens {
            if category.is_reserved(&token.head) {
                args.push(token.head.clone());
                continue;
            }
            match descriptor.resolve_attribute(&token.head) {
                Some(path) => {
                    bind(&mut fields, path, &token.head);
                    args.push(token.head.clone());
                }
                None => warn(format!("unknown field '{}' in message", token.head)),
            }
        }

        let mut conditions = Conditions::new();
        conditions.insert(ConditionKey::Args, &args);

        for (raw_key, raw_value) in &def.conditions {
            let values = match condition_values(raw_value) {
                Ok(Some(values)) => values,
                Ok(None) => continue,
                Err(found) => {
                    return Err(RuleCompileError::InvalidCondition {
                        event_type: event_type.to_string(),
                        key: raw_key.clone(),
                        reason: format!("expected a string or a list, got {found}"),
                    })
                }
            };
            if values.is_empty() {
                continue;
            }

            // Any dashed key is field-scoped, whatever its suffix.
            let scoped = match raw_key.split_once('-') {
                Some((field, _)) => Some(descriptor.resolve_attribute(field).ok_or_else(|| {
                    RuleCompileError::InvalidCondition {
                        event_type: event_type.to_string(),
                        key: raw_key.clone(),
                        reason: format!("unknown field '{field}'"),
                    }
                })?),
                None => None,
            };

            let Some(key) = ConditionKey::parse(raw_key) else {
                warn(format!("unknown condition '{raw_key}' ignored"));
                continue;
            };
            if let (ConditionKey::FieldIgnored(field) | ConditionKey::FieldLogged(field), Some(path)) =
                (&key, scoped)
            {
                bind(&mut fields, path, field);
            }
            conditions.insert(key, values);
        }

        warnings.append(&mut pending);
        Ok(Some(EventRule {
            event_type: event_type.to_string(),
            category,
            cancellable: descriptor.cancellable,
            message,
            tokens,
            fields,
            conditions,
        }))
    }
}

fn bind(fields: &mut Vec<FieldBinding>, path: AttributePath, key: &str) {
    if !fields.iter().any(|f| f.path == path) {
        fields.push(FieldBinding {
            path,
            key: key.to_string(),
        });
    }
}

/// Split a condition value into tokens.
///
/// `Ok(None)` for an empty value, `Err(kind)` for a value that is neither
/// a string nor a list.
fn condition_values(value: &Value) -> Result<Option<Vec<String>>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(
            s.split(',')
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )),
        Value::Sequence(items) => Ok(Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_uppercase()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string().to_uppercase()),
                    _ => None,
                })
                .filter(|t| !t.is_empty())
                .collect(),
        )),
        Value::Bool(_) => Err("a boolean"),
        Value::Number(_) => Err("a number"),
        Value::Mapping(_) => Err("a mapping"),
        Value::Tagged(_) => Err("a tagged value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_common::EventTypeDescriptor;

    fn registry() -> EventTypeRegistry {
        let mut r = EventTypeRegistry::new();
        r.register(
            EventTypeDescriptor::new("BlockBreakEvent", EventCategory::Block)
                .with_attribute("expToDrop")
                .cancellable(),
        );
        r.register(
            EventTypeDescriptor::new("PlayerDropItemEvent", EventCategory::Player)
                .with_attribute("drop"),
        );
        r
    }

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn compile(name: &str, def: RawRuleDefinition) -> (Result<Option<EventRule>, RuleCompileError>, Vec<CompileWarning>) {
        let reg = registry();
        let mut warnings = Vec::new();
        let result = RuleCompiler::new(&reg).compile(name, &def, &mut warnings);
        (result, warnings)
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let def = RawRuleDefinition {
            enabled: false,
            ..RawRuleDefinition::default()
        };
        assert_eq!(compile("BlockBreakEvent", def).0, Ok(None));
    }

    #[test]
    fn test_unknown_event_type() {
        let (result, _) = compile("NopeEvent", RawRuleDefinition::enabled("x"));
        assert_eq!(
            result,
            Err(RuleCompileError::UnknownEventType {
                event_type: "NopeEvent".into()
            })
        );
    }

    #[test]
    fn test_default_message() {
        let def = RawRuleDefinition {
            enabled: true,
            message: Some(String::new()),
            conditions: vec![],
        };
        let rule = compile("BlockBreakEvent", def).0.unwrap().unwrap();
        assert_eq!(rule.message, "executed.");
        assert!(rule.fields.is_empty());
        assert!(rule.cancellable);
    }

    #[test]
    fn test_tokens_resolve_to_args_and_fields() {
        let def = RawRuleDefinition::enabled("{PLAYER.NAME} broke {block} at {LOCX} ({EXPTODROP}) {MISSING}");
        let (result, warnings) = compile("BlockBreakEvent", def);
        let rule = result.unwrap().unwrap();

        let paths: Vec<_> = rule.fields.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["player", "block", "expToDrop"]);
        assert!(rule.conditions.has_arg("PLAYER"));
        assert!(rule.conditions.has_arg("BLOCK"));
        assert!(rule.conditions.has_arg("LOCX"));
        assert!(rule.conditions.has_arg("EXPTODROP"));
        assert!(!rule.conditions.has_arg("MISSING"));

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("MISSING"));
    }

    #[test]
    fn test_field_condition_adds_binding() {
        let def = RawRuleDefinition::enabled("broken")
            .with_condition("BLOCK-IGNORED", yaml("'stone, dirt'"));
        let rule = compile("BlockBreakEvent", def).0.unwrap().unwrap();
        assert_eq!(rule.fields.len(), 1);
        assert_eq!(rule.fields[0].key, "BLOCK");
        let ignored = rule
            .conditions
            .get(&ConditionKey::FieldIgnored("BLOCK".into()))
            .unwrap();
        assert!(ignored.contains("STONE") && ignored.contains("DIRT"));
    }

    #[test]
    fn test_unknown_condition_field_rejects_rule() {
        let def = RawRuleDefinition::enabled("x").with_condition("FOO-IGNORED", yaml("[A]"));
        let (result, _) = compile("BlockBreakEvent", def);
        assert!(matches!(
            result,
            Err(RuleCompileError::InvalidCondition { ref key, .. }) if key == "FOO-IGNORED"
        ));
    }

    #[test]
    fn test_dashed_key_with_unknown_field_rejects_rule() {
        for key in ["NOPE-SKIPPED", "FOO-BAR-IGNORED"] {
            let def = RawRuleDefinition::enabled("x").with_condition(key, yaml("[A]"));
            let (result, warnings) = compile("BlockBreakEvent", def);
            assert!(
                matches!(result, Err(RuleCompileError::InvalidCondition { key: ref k, .. }) if k == key),
                "{key}: {result:?}"
            );
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn test_dashed_key_with_unknown_suffix_warns() {
        let def = RawRuleDefinition::enabled("x").with_condition("BLOCK-SKIPPED", yaml("[A]"));
        let (result, warnings) = compile("BlockBreakEvent", def);
        let rule = result.unwrap().unwrap();
        assert!(rule.fields.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("BLOCK-SKIPPED"));
    }

    #[test]
    fn test_rejected_rule_drops_its_warnings() {
        let doc = RuleDocument::parse(
            r#"
BlockBreakEvent: { enabled: true, message: "{MISSING}", NOPE-IGNORED: [A] }
PlayerDropItemEvent: { enabled: true, message: "{ALSO_MISSING}" }
"#,
        )
        .unwrap();
        let reg = registry();
        let (set, report) = RuleCompiler::new(&reg).compile_all(&doc);
        assert_eq!(set.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].event_type, "PlayerDropItemEvent");
    }

    #[test]
    fn test_non_string_condition_rejects_rule() {
        let def = RawRuleDefinition::enabled("x").with_condition("IGNORED", yaml("5"));
        assert!(compile("BlockBreakEvent", def).0.is_err());
    }

    #[test]
    fn test_empty_condition_skipped_before_field_check() {
        let def = RawRuleDefinition::enabled("x").with_condition("FOO-IGNORED", yaml("''"));
        assert!(compile("BlockBreakEvent", def).0.unwrap().is_some());
    }

    #[test]
    fn test_unknown_plain_key_warns() {
        let def = RawRuleDefinition::enabled("x").with_condition("COLOR", yaml("red"));
        let (result, warnings) = compile("BlockBreakEvent", def);
        assert!(result.unwrap().is_some());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_compile_all_reports() {
        let doc = RuleDocument::parse(
            r#"
BlockBreakEvent: { enabled: true, message: "{PLAYER.NAME} broke {BLOCK.TYPE}" }
PlayerDropItemEvent: { enabled: true, message: "{NAME} dropped {DROP.NAME}", DROP-LOGGED: [DIAMOND] }
Unknown: { enabled: true }
Disabled: { enabled: false }
"#,
        )
        .unwrap();
        let reg = registry();
        let (set, report) = RuleCompiler::new(&reg).compile_all(&doc);
        assert_eq!(set.len(), 2);
        assert_eq!(report.registered, 2);
        assert_eq!(report.disabled, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].event_type(), "Unknown");
        assert!(set.get("PlayerDropItemEvent").is_some());
        assert!(set.get("Unknown").is_none());
    }
}
