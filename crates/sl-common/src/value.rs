//! Attribute values carried by host events.
//!
//! The host supplies events as named-attribute bags. Each attribute is one
//! of the closed set of shapes below; the renderer converts them to text
//! by shape, never by inspecting host class hierarchies.

use serde::{Deserialize, Serialize};

/// A single attribute value read from a host event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// Free text (player message, command line, reason...).
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Anything identified by a name alone: material, enum constant,
    /// world, advancement key.
    Named(String),
    /// A stack of items.
    Item(ItemStack),
    Location(Location),
    /// A player, entity or block.
    Actor(Actor),
    Inventory(Inventory),
    Plugin(PluginInfo),
    Chunk(ChunkInfo),
    /// A collection of named things.
    List(Vec<AttributeValue>),
    /// A mapping from named things to a count (e.g. enchantment levels).
    Counts(Vec<NamedCount>),
    /// A value the host could not describe; carries its type name.
    Opaque(String),
}

impl AttributeValue {
    /// Short name of the value's shape, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Text(_) => "text",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Float(_) => "float",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Named(_) => "named",
            AttributeValue::Item(_) => "item",
            AttributeValue::Location(_) => "location",
            AttributeValue::Actor(_) => "actor",
            AttributeValue::Inventory(_) => "inventory",
            AttributeValue::Plugin(_) => "plugin",
            AttributeValue::Chunk(_) => "chunk",
            AttributeValue::List(_) => "list",
            AttributeValue::Counts(_) => "counts",
            AttributeValue::Opaque(_) => "opaque",
        }
    }

    /// The name this value is known by, if it has one.
    ///
    /// Used when a collection is flattened to a comma-joined name list.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) | AttributeValue::Named(s) => Some(s),
            AttributeValue::Item(item) => Some(&item.name),
            AttributeValue::Actor(actor) => Some(&actor.name),
            AttributeValue::Plugin(plugin) => Some(&plugin.name),
            _ => None,
        }
    }
}

/// A stack of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Material name, e.g. `DIAMOND_SWORD`.
    pub name: String,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(name: impl Into<String>, amount: u32) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// A named thing with an associated count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

/// A position in a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: Some(world.into()),
            x,
            y,
            z,
        }
    }

    pub fn block_x(&self) -> i64 {
        self.x.floor() as i64
    }

    pub fn block_y(&self) -> i64 {
        self.y.floor() as i64
    }

    pub fn block_z(&self) -> i64 {
        self.z.floor() as i64
    }
}

/// What kind of thing an [`Actor`] is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    #[default]
    Entity,
    Block,
}

/// A player, entity or block taking part in an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Display name. For blocks, the full block data string.
    pub name: String,
    /// Entity type or block material, e.g. `PLAYER`, `ZOMBIE`, `STONE`.
    pub type_name: String,
    #[serde(default)]
    pub kind: ActorKind,
    /// Player-shaped actor driven by another plugin (not a real client).
    #[serde(default)]
    pub npc: bool,
    #[serde(default)]
    pub living: bool,
    #[serde(default)]
    pub health: Option<f64>,
    /// Remote address, players only.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub last_damage_cause: Option<String>,
    /// Name of the player who last killed this actor.
    #[serde(default)]
    pub killer: Option<String>,
}

impl Actor {
    /// A connected player.
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: "PLAYER".to_string(),
            kind: ActorKind::Player,
            npc: false,
            living: true,
            health: Some(20.0),
            address: None,
            location: None,
            last_damage_cause: None,
            killer: None,
        }
    }

    /// A non-player entity.
    pub fn entity(name: impl Into<String>, type_name: impl Into<String>, living: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            kind: ActorKind::Entity,
            npc: false,
            living,
            health: None,
            address: None,
            location: None,
            last_damage_cause: None,
            killer: None,
        }
    }

    /// A block of the given material.
    pub fn block(type_name: impl Into<String>, location: Location) -> Self {
        let type_name = type_name.into();
        Self {
            name: type_name.clone(),
            type_name,
            kind: ActorKind::Block,
            npc: false,
            living: false,
            health: None,
            address: None,
            location: Some(location),
            last_damage_cause: None,
            killer: None,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == ActorKind::Player
    }

    pub fn is_block(&self) -> bool {
        self.kind == ActorKind::Block
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_health(mut self, health: f64) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_last_damage_cause(mut self, cause: impl Into<String>) -> Self {
        self.last_damage_cause = Some(cause.into());
        self
    }

    pub fn with_killer(mut self, killer: impl Into<String>) -> Self {
        self.killer = Some(killer.into());
        self
    }

    pub fn as_npc(mut self) -> Self {
        self.npc = true;
        self
    }
}

/// An open inventory view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Inventory type, e.g. `CHEST`, `CRAFTING`.
    pub type_name: String,
    pub title: String,
    #[serde(default)]
    pub location: Option<Location>,
    /// Slot contents; empty slots are omitted.
    #[serde(default)]
    pub items: Vec<ItemStack>,
    /// The player looking at the inventory.
    pub viewer: Actor,
}

/// A plugin taking part in a plugin event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub version: String,
}

/// A loaded chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub world: String,
    pub x: i32,
    pub z: i32,
    #[serde(default)]
    pub slime: bool,
}
