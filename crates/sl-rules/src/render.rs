//! Event rendering.
//!
//! The EventRenderer applies one compiled [`EventRule`] to one host event
//! and produces a [`RenderOutcome`]. It never panics and never returns an
//! error to the producer; malformed events come back as
//! [`RenderOutcome::Failed`].

use crate::coerce::{actor_reserved, coerce, inventory_type, Coerced, UNKNOWN};
use crate::compiler::EventRule;
use crate::error::RenderError;
use crate::template::substitute;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sl_common::{
    Actor, AttributeValue, ChunkInfo, EventCategory, FileKey, FilenameTemplate, HostEvent,
    Inventory, Location, PluginInfo, RenderedLog,
};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Renderer options taken from settings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Suppress player events whose actor is an NPC.
    pub ignore_npcs: bool,
    /// Persisted filename template.
    pub filename: FilenameTemplate,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ignore_npcs: true,
            filename: FilenameTemplate::default(),
        }
    }
}

/// Why an event was not logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SuppressReason {
    /// The player is an NPC and NPCs are ignored.
    Npc { name: String },
    /// A condition denied a value. `field` is `None` for the whole-event
    /// identity check.
    Denied { field: Option<String>, value: String },
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressReason::Npc { name } => write!(f, "npc '{name}' ignored"),
            SuppressReason::Denied { field: None, value } => write!(f, "'{value}' denied"),
            SuppressReason::Denied {
                field: Some(field),
                value,
            } => write!(f, "{field} '{value}' denied"),
        }
    }
}

/// Result of rendering one event.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderedLog),
    Suppressed(SuppressReason),
    Failed(RenderError),
}

impl RenderOutcome {
    pub fn rendered(&self) -> Option<&RenderedLog> {
        match self {
            RenderOutcome::Rendered(log) => Some(log),
            _ => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, RenderOutcome::Suppressed(_))
    }
}

/// Primary subject of an event, borrowed from its attributes.
#[derive(Debug, Clone, Copy)]
enum Subject<'e> {
    Actor(&'e Actor),
    Inventory(&'e Inventory),
    Plugin(&'e PluginInfo),
    World(&'e str),
    Chunk(&'e ChunkInfo),
}

impl<'e> Subject<'e> {
    /// Shape each category's subject attribute must have.
    fn expected(category: EventCategory) -> &'static str {
        match category {
            EventCategory::Inventory => "inventory",
            EventCategory::Plugin => "plugin",
            EventCategory::Weather | EventCategory::World => "named",
            EventCategory::Chunk => "chunk",
            _ => "actor",
        }
    }

    fn from_value(category: EventCategory, value: &'e AttributeValue) -> Option<Self> {
        match (category, value) {
            (EventCategory::Inventory, AttributeValue::Inventory(inv)) => {
                Some(Subject::Inventory(inv))
            }
            (EventCategory::Plugin, AttributeValue::Plugin(p)) => Some(Subject::Plugin(p)),
            (
                EventCategory::Weather | EventCategory::World,
                AttributeValue::Named(s) | AttributeValue::Text(s),
            ) => Some(Subject::World(s)),
            (EventCategory::Chunk, AttributeValue::Chunk(c)) => Some(Subject::Chunk(c)),
            (
                EventCategory::Player
                | EventCategory::Block
                | EventCategory::Entity
                | EventCategory::Hanging
                | EventCategory::Vehicle,
                AttributeValue::Actor(a),
            ) => Some(Subject::Actor(a)),
            _ => None,
        }
    }

    /// Token checked against the whole-event conditions.
    fn identity(&self, category: EventCategory) -> Option<&'e str> {
        match (category, *self) {
            (EventCategory::Player, Subject::Actor(a)) => Some(a.name.as_str()),
            (EventCategory::Block | EventCategory::Entity, Subject::Actor(a)) => {
                Some(a.type_name.as_str())
            }
            (EventCategory::Inventory, Subject::Inventory(inv)) => Some(inv.type_name.as_str()),
            (EventCategory::Plugin, Subject::Plugin(p)) => Some(p.name.as_str()),
            _ => None,
        }
    }

    /// Value of reserved token `head`, if it applies to this subject.
    fn reserved(&self, head: &str) -> Option<String> {
        match *self {
            Subject::Actor(actor) => actor_reserved(actor, head),
            Subject::Inventory(inv) => inventory_reserved(inv, head),
            Subject::Plugin(p) => match head {
                "NAME" => Some(p.name.clone()),
                "DESCRIPTION" => Some(
                    p.description
                        .clone()
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                ),
                "AUTHOR" => Some(p.authors.join(", ")),
                "VERSION" => Some(p.version.clone()),
                _ => None,
            },
            Subject::World(name) => (head == "WORLD").then(|| name.to_string()),
            Subject::Chunk(c) => match head {
                "LOCWORLD" => Some(c.world.clone()),
                "LOCX" => Some(c.x.to_string()),
                "LOCZ" => Some(c.z.to_string()),
                "SLIME" => Some(c.slime.to_string()),
                _ => None,
            },
        }
    }
}

fn inventory_reserved(inv: &Inventory, head: &str) -> Option<String> {
    let loc = inv.location.as_ref();
    let coord = |f: fn(&Location) -> i64| {
        Some(loc.map_or_else(|| "?".to_string(), |l| f(l).to_string()))
    };
    match head {
        "NAME" => Some(inv.title.clone()),
        "TYPE" => Some(inventory_type(inv)),
        "LOCWORLD" => loc.and_then(|l| l.world.clone()),
        "LOCX" => coord(Location::block_x),
        "LOCY" => coord(Location::block_y),
        "LOCZ" => coord(Location::block_z),
        "ITEMS" => {
            let items: String = inv
                .items
                .iter()
                .filter(|i| i.amount > 0)
                .map(|i| format!("[Name: {}; Amount: {}]", i.name, i.amount))
                .collect();
            Some(if items.is_empty() {
                "nothing".to_string()
            } else {
                items
            })
        }
        _ => None,
    }
}

/// Applies compiled rules to host events.
#[derive(Debug, Clone, Default)]
pub struct EventRenderer {
    options: RenderOptions,
}

impl EventRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `event` against `rule` at time `now`.
    pub fn render(&self, event: &HostEvent, rule: &EventRule, now: DateTime<Local>) -> RenderOutcome {
        match self.try_render(event, rule, now) {
            Ok(outcome) => outcome,
            Err(e) => RenderOutcome::Failed(e),
        }
    }

    fn try_render(
        &self,
        event: &HostEvent,
        rule: &EventRule,
        now: DateTime<Local>,
    ) -> Result<RenderOutcome, RenderError> {
        if event.event_type != rule.event_type {
            return Err(RenderError::EventTypeMismatch {
                expected: rule.event_type.clone(),
                actual: event.event_type.clone(),
            });
        }
        let category = rule.category;
        let subject = self.subject(event, category)?;

        if let Some(Subject::Actor(actor)) = subject {
            if category == EventCategory::Player && self.options.ignore_npcs && actor.npc {
                return Ok(RenderOutcome::Suppressed(SuppressReason::Npc {
                    name: actor.name.clone(),
                }));
            }
        }

        if let Some(identity) = subject.and_then(|s| s.identity(category)) {
            if rule.conditions.is_denied(None, identity) {
                return Ok(RenderOutcome::Suppressed(SuppressReason::Denied {
                    field: None,
                    value: identity.to_string(),
                }));
            }
        }

        let viewer = match subject {
            Some(Subject::Inventory(inv)) => Some(AttributeValue::Actor(inv.viewer.clone())),
            _ => None,
        };
        let mut values: HashMap<String, String> = HashMap::new();
        for binding in &rule.fields {
            let value = match (event.attribute(&binding.path), &viewer) {
                (Some(v), _) => v,
                (None, Some(viewer)) if binding.key == "PLAYER" => viewer,
                (None, _) => {
                    debug!(event_type = %rule.event_type, field = %binding.path, "field absent on event");
                    continue;
                }
            };
            match coerce(&binding.key, value, &rule.conditions) {
                Coerced::Substitutions(pairs) => values.extend(pairs),
                Coerced::Vetoed(value) => {
                    return Ok(RenderOutcome::Suppressed(SuppressReason::Denied {
                        field: Some(binding.key.clone()),
                        value,
                    }))
                }
                Coerced::Unsupported(kind) => {
                    debug!(event_type = %rule.event_type, field = %binding.path, kind, "no conversion for value");
                }
            }
        }

        if let Some(subject) = subject {
            for head in rule.conditions.args().filter(|h| category.is_reserved(h)) {
                if let Some(v) = subject.reserved(head) {
                    values.insert(head.to_string(), v);
                }
            }
        }

        let message = substitute(&rule.message, &values);
        let subject_key = subject_key(event, category, subject);
        let target_file_key = FileKey::derive(
            &self.options.filename,
            &rule.event_type,
            category,
            subject_key.as_deref(),
            now.date_naive(),
        );

        Ok(RenderOutcome::Rendered(RenderedLog {
            timestamp: now,
            event_type: rule.event_type.clone(),
            subject_key,
            message,
            cancelled: rule.cancellable && event.is_cancelled(),
            target_file_key,
        }))
    }

    fn subject<'e>(
        &self,
        event: &'e HostEvent,
        category: EventCategory,
    ) -> Result<Option<Subject<'e>>, RenderError> {
        let Some(attribute) = category.subject_attribute() else {
            return Ok(None);
        };
        let value = event
            .named(attribute)
            .ok_or_else(|| RenderError::MissingSubject {
                event_type: event.event_type.clone(),
                attribute: attribute.to_string(),
            })?;
        Subject::from_value(category, value)
            .map(Some)
            .ok_or_else(|| RenderError::SubjectShape {
                event_type: event.event_type.clone(),
                attribute: attribute.to_string(),
                expected: Subject::expected(category),
                found: value.kind(),
            })
    }
}

/// Primary actor used for the per-subject directory and live routing.
fn subject_key(event: &HostEvent, category: EventCategory, subject: Option<Subject<'_>>) -> Option<String> {
    match (category, subject?) {
        (EventCategory::Player, Subject::Actor(a)) => Some(a.name.clone()),
        (EventCategory::Entity, Subject::Actor(a)) if a.is_player() => Some(a.name.clone()),
        (EventCategory::Inventory, Subject::Inventory(inv)) => Some(inv.viewer.name.clone()),
        (EventCategory::Block | EventCategory::Hanging, _) => match event.named("player") {
            Some(AttributeValue::Actor(a)) => Some(a.name.clone()),
            _ => None,
        },
        _ => None,
    }
}
