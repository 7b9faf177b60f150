//! Event categories, per-type capability descriptors and host events.
//!
//! Field access is decided when a rule is compiled, not when an event
//! arrives. Every event type the host can emit is described by an
//! [`EventTypeDescriptor`] listing its category and the attributes that
//! can be read from it. The [`EventTypeRegistry`] maps event-type names to
//! descriptors and is the only thing the rule compiler consults.

use crate::value::AttributeValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Reserved token names resolved by the category accessor rather than by
/// attribute lookup.
pub const RESERVED_FIELDS: &[&str] = &[
    "NAME",
    "TYPE",
    "HEALTH",
    "IP",
    "LOCWORLD",
    "LOCX",
    "LOCY",
    "LOCZ",
    "LASTDEATHCAUSE",
    "LASTDEATHBY",
];

/// Category of an event type.
///
/// Decides the file an event lands in, the attribute holding its primary
/// subject and the reserved values it can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Player,
    Block,
    Entity,
    Hanging,
    Inventory,
    Server,
    Plugin,
    Vehicle,
    Weather,
    World,
    Chunk,
}

impl EventCategory {
    pub fn all() -> &'static [EventCategory] {
        &[
            EventCategory::Player,
            EventCategory::Block,
            EventCategory::Entity,
            EventCategory::Hanging,
            EventCategory::Inventory,
            EventCategory::Server,
            EventCategory::Plugin,
            EventCategory::Vehicle,
            EventCategory::Weather,
            EventCategory::World,
            EventCategory::Chunk,
        ]
    }

    /// Value substituted for `{TYPE}` in the persisted filename template.
    pub fn file_type(&self) -> &'static str {
        match self {
            EventCategory::Player => "PlayerEvents",
            EventCategory::Block => "BlockEvents",
            EventCategory::Entity => "EntityEvents",
            EventCategory::Hanging => "HangingEvents",
            EventCategory::Inventory => "InventoryEvents",
            EventCategory::Server => "ServerEvents",
            EventCategory::Plugin => "PluginEvents",
            EventCategory::Vehicle => "VehicleEvents",
            EventCategory::Weather => "WeatherEvents",
            EventCategory::World => "WorldEvents",
            EventCategory::Chunk => "ChunkEvents",
        }
    }

    /// Attribute holding the category's primary subject, if it has one.
    ///
    /// Events of a category with a subject attribute must carry it.
    pub fn subject_attribute(&self) -> Option<&'static str> {
        match self {
            EventCategory::Player => Some("player"),
            EventCategory::Block => Some("block"),
            EventCategory::Entity | EventCategory::Hanging => Some("entity"),
            EventCategory::Inventory => Some("inventory"),
            EventCategory::Plugin => Some("plugin"),
            EventCategory::Vehicle => Some("vehicle"),
            EventCategory::Weather | EventCategory::World => Some("world"),
            EventCategory::Chunk => Some("chunk"),
            EventCategory::Server => None,
        }
    }

    /// Optional attribute naming the player responsible for the event.
    ///
    /// Inventory events fall back to the inventory's viewer.
    pub fn owner_attribute(&self) -> Option<&'static str> {
        match self {
            EventCategory::Block | EventCategory::Hanging | EventCategory::Inventory => {
                Some("player")
            }
            _ => None,
        }
    }

    /// Reserved names this category adds to [`RESERVED_FIELDS`].
    pub fn reserved_extras(&self) -> &'static [&'static str] {
        match self {
            EventCategory::Inventory => &["ITEMS"],
            EventCategory::Plugin => &["DESCRIPTION", "AUTHOR", "VERSION"],
            EventCategory::Weather | EventCategory::World => &["WORLD"],
            EventCategory::Chunk => &["SLIME"],
            _ => &[],
        }
    }

    /// Whether `head` (any case) is a reserved token for this category.
    pub fn is_reserved(&self, head: &str) -> bool {
        RESERVED_FIELDS
            .iter()
            .chain(self.reserved_extras())
            .any(|r| r.eq_ignore_ascii_case(head))
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_type())
    }
}

/// Canonical name of a readable attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath(String);

impl AttributePath {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Token key used in message templates (`{BLOCK}` for `block`).
    pub fn token_key(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability table for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeDescriptor {
    pub name: String,
    pub category: EventCategory,
    /// Attributes readable from events of this type, canonical spelling.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Whether events of this type can be cancelled by the host.
    #[serde(default)]
    pub cancellable: bool,
}

impl EventTypeDescriptor {
    pub fn new(name: impl Into<String>, category: EventCategory) -> Self {
        Self {
            name: name.into(),
            category,
            attributes: Vec::new(),
            cancellable: false,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn cancellable(mut self) -> Self {
        self.cancellable = true;
        self
    }

    /// Resolve an attribute name, ignoring case.
    ///
    /// The category's subject and owner attributes are always readable.
    pub fn resolve_attribute(&self, name: &str) -> Option<AttributePath> {
        self.attributes
            .iter()
            .map(String::as_str)
            .chain(self.category.subject_attribute())
            .chain(self.category.owner_attribute())
            .find(|attr| attr.eq_ignore_ascii_case(name))
            .map(AttributePath::new)
    }
}

/// Registry of every event type the host can emit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<EventTypeDescriptor>", into = "Vec<EventTypeDescriptor>")]
pub struct EventTypeRegistry {
    types: HashMap<String, EventTypeDescriptor>,
}

impl EventTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: EventTypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn resolve(&self, name: &str) -> Option<&EventTypeDescriptor> {
        self.types.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl From<Vec<EventTypeDescriptor>> for EventTypeRegistry {
    fn from(descriptors: Vec<EventTypeDescriptor>) -> Self {
        let mut registry = Self::new();
        for d in descriptors {
            registry.register(d);
        }
        registry
    }
}

impl From<EventTypeRegistry> for Vec<EventTypeDescriptor> {
    fn from(registry: EventTypeRegistry) -> Self {
        let mut out: Vec<_> = registry.types.into_values().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

/// One event instance delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    pub event_type: String,
    /// `Some` only for cancellable events.
    #[serde(default)]
    pub cancelled: Option<bool>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl HostEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            cancelled: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn with_cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = Some(cancelled);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.unwrap_or(false)
    }

    /// Read an attribute by path, falling back to a case-insensitive match.
    pub fn attribute(&self, path: &AttributePath) -> Option<&AttributeValue> {
        self.named(path.as_str())
    }

    /// Read an attribute by plain name, falling back to a case-insensitive match.
    pub fn named(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_break() -> EventTypeDescriptor {
        EventTypeDescriptor::new("BlockBreakEvent", EventCategory::Block)
            .with_attribute("expToDrop")
            .cancellable()
    }

    #[test]
    fn test_resolve_attribute_case_insensitive() {
        let d = block_break();
        assert_eq!(
            d.resolve_attribute("EXPTODROP"),
            Some(AttributePath::new("expToDrop"))
        );
        assert_eq!(d.resolve_attribute("Block"), Some(AttributePath::new("block")));
        assert_eq!(d.resolve_attribute("PLAYER"), Some(AttributePath::new("player")));
        assert_eq!(d.resolve_attribute("nope"), None);
    }

    #[test]
    fn test_reserved_per_category() {
        assert!(EventCategory::Player.is_reserved("locx"));
        assert!(EventCategory::Inventory.is_reserved("items"));
        assert!(!EventCategory::Player.is_reserved("items"));
        assert!(EventCategory::Chunk.is_reserved("SLIME"));
    }

    #[test]
    fn test_registry_from_yaml_list() {
        let yaml = r#"
- name: PlayerJoinEvent
  category: player
  attributes: [joinMessage]
- name: WeatherChangeEvent
  category: weather
  cancellable: true
"#;
        let registry: EventTypeRegistry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(registry.len(), 2);
        let weather = registry.resolve("WeatherChangeEvent").unwrap();
        assert_eq!(weather.category, EventCategory::Weather);
        assert!(weather.cancellable);
        assert!(registry.resolve("playerjoinevent").is_none());
    }

    #[test]
    fn test_host_event_attribute_fallback() {
        let ev = HostEvent::new("BlockBreakEvent")
            .with("expToDrop", AttributeValue::Integer(3))
            .with_cancelled(true);
        assert_eq!(
            ev.attribute(&AttributePath::new("exptodrop")),
            Some(&AttributeValue::Integer(3))
        );
        assert!(ev.is_cancelled());
        assert!(!HostEvent::new("X").is_cancelled());
    }

    #[test]
    fn test_file_types() {
        let names: Vec<_> = EventCategory::all().iter().map(|c| c.file_type()).collect();
        assert_eq!(names.len(), 11);
        assert!(names.iter().all(|n| n.ends_with("Events")));
    }
}
