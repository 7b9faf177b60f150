//! Value coercion: attribute values to display strings.
//!
//! Dispatch is on the value's shape. Named values (text, material, enum,
//! item, actor) are checked against the field's conditions first; a denied
//! value vetoes the whole event.
//!
//! | shape      | substitutions                                   |
//! |------------|-------------------------------------------------|
//! | text/named | `{F}`                                           |
//! | number/bool| `{F}`                                           |
//! | item       | `{F.NAME}` `{F.AMOUNT}`                         |
//! | location   | `{F.LOCWORLD}` `{F.LOCX}` `{F.LOCY}` `{F.LOCZ}` |
//! | actor      | `{F}` plus `{F.<reserved>}`                     |
//! | inventory  | `{F.NAME}` `{F.TYPE}`                           |
//! | plugin     | `{F}` `{F.NAME}` `{F.VERSION}`                  |
//! | chunk      | `{F.LOCWORLD}` `{F.LOCX}` `{F.LOCZ}` `{F.SLIME}`|
//! | list       | `{F}` comma-joined distinct names               |
//! | counts     | `{F}` `[Name: K; Level: V]...`                  |

use crate::condition::Conditions;
use sl_common::{Actor, AttributeValue, Inventory, Location, RESERVED_FIELDS};

/// Placeholder used when a value the template asks for does not exist.
pub const UNKNOWN: &str = "Unknown";

/// Outcome of coercing one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// `(token key, text)` pairs to substitute.
    Substitutions(Vec<(String, String)>),
    /// The field's conditions deny this value.
    Vetoed(String),
    /// No conversion for this shape; carries the shape name.
    Unsupported(&'static str),
}

/// Coerce the value of field `field` (uppercased token key).
pub fn coerce(field: &str, value: &AttributeValue, conditions: &Conditions) -> Coerced {
    let denied = |candidate: &str| conditions.is_denied(Some(field), candidate);
    let whole = |text: String| Coerced::Substitutions(vec![(field.to_string(), text)]);
    let sub = |name: &str| format!("{field}.{name}");

    match value {
        AttributeValue::Text(s) | AttributeValue::Named(s) => {
            if denied(s) {
                return Coerced::Vetoed(s.clone());
            }
            whole(s.clone())
        }
        AttributeValue::Integer(i) => whole(i.to_string()),
        AttributeValue::Float(f) => whole(format_float(*f)),
        AttributeValue::Bool(b) => whole(b.to_string()),
        AttributeValue::Item(item) => {
            if denied(&item.name) {
                return Coerced::Vetoed(item.name.clone());
            }
            Coerced::Substitutions(vec![
                (sub("NAME"), item.name.clone()),
                (sub("AMOUNT"), item.amount.to_string()),
            ])
        }
        AttributeValue::Location(loc) => Coerced::Substitutions(location_parts(loc, &sub)),
        AttributeValue::Actor(actor) => {
            if denied(&actor.type_name) {
                return Coerced::Vetoed(actor.type_name.clone());
            }
            let label = if actor.is_block() {
                actor.type_name.clone()
            } else {
                actor.name.clone()
            };
            let mut out = vec![(field.to_string(), label)];
            out.extend(
                RESERVED_FIELDS
                    .iter()
                    .filter_map(|&r| actor_reserved(actor, r).map(|v| (sub(r), v))),
            );
            Coerced::Substitutions(out)
        }
        AttributeValue::Inventory(inv) => Coerced::Substitutions(vec![
            (sub("NAME"), inv.title.clone()),
            (sub("TYPE"), inventory_type(inv)),
        ]),
        AttributeValue::Plugin(plugin) => Coerced::Substitutions(vec![
            (field.to_string(), plugin.name.clone()),
            (sub("NAME"), plugin.name.clone()),
            (sub("VERSION"), plugin.version.clone()),
        ]),
        AttributeValue::Chunk(chunk) => Coerced::Substitutions(vec![
            (sub("LOCWORLD"), chunk.world.clone()),
            (sub("LOCX"), chunk.x.to_string()),
            (sub("LOCZ"), chunk.z.to_string()),
            (sub("SLIME"), chunk.slime.to_string()),
        ]),
        AttributeValue::List(items) => {
            if items.is_empty() {
                return Coerced::Substitutions(Vec::new());
            }
            let mut names: Vec<String> = Vec::new();
            for item in items {
                let Some(name) = list_entry(item) else {
                    return Coerced::Unsupported("list");
                };
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            whole(names.join(","))
        }
        AttributeValue::Counts(counts) => whole(
            counts
                .iter()
                .map(|c| format!("[Name: {}; Level: {}]", c.name, c.count))
                .collect(),
        ),
        AttributeValue::Opaque(_) => Coerced::Unsupported(value.kind()),
    }
}

fn list_entry(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Integer(i) => Some(i.to_string()),
        AttributeValue::Float(f) => Some(format_float(*f)),
        AttributeValue::Bool(b) => Some(b.to_string()),
        other => other.display_name().map(str::to_string),
    }
}

fn location_parts(loc: &Location, sub: &dyn Fn(&str) -> String) -> Vec<(String, String)> {
    vec![
        (
            sub("LOCWORLD"),
            loc.world.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (sub("LOCX"), loc.block_x().to_string()),
        (sub("LOCY"), loc.block_y().to_string()),
        (sub("LOCZ"), loc.block_z().to_string()),
    ]
}

/// Reserved value `name` for a player, entity or block.
///
/// Returns `None` for combinations that do not apply (e.g. `HEALTH` on a
/// non-living entity), leaving the token unsubstituted.
pub fn actor_reserved(actor: &Actor, name: &str) -> Option<String> {
    let loc = actor.location.as_ref();
    if actor.is_block() {
        return match name {
            "NAME" => Some(actor.name.clone()),
            "LOCWORLD" => Some(
                loc.and_then(|l| l.world.clone())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            ),
            "LOCX" => loc.map(|l| l.block_x().to_string()),
            "LOCY" => loc.map(|l| l.block_y().to_string()),
            "LOCZ" => loc.map(|l| l.block_z().to_string()),
            _ => None,
        };
    }
    match name {
        "NAME" => Some(actor.name.clone()),
        "TYPE" => Some(actor.type_name.clone()),
        "HEALTH" if actor.living => actor.health.map(format_float),
        "IP" if actor.is_player() => Some(
            actor
                .address
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        "LOCWORLD" => loc.and_then(|l| l.world.clone()),
        "LOCX" => loc.map(|l| l.block_x().to_string()),
        "LOCY" => loc.map(|l| l.block_y().to_string()),
        "LOCZ" => loc.map(|l| l.block_z().to_string()),
        "LASTDEATHCAUSE" => Some(
            actor
                .last_damage_cause
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        "LASTDEATHBY" if actor.living => {
            Some(actor.killer.clone().unwrap_or_else(|| UNKNOWN.to_string()))
        }
        _ => None,
    }
}

/// Inventory type as shown in logs; a player's own crafting view is
/// reported as `INVENTORY`.
pub fn inventory_type(inv: &Inventory) -> String {
    if inv.type_name.eq_ignore_ascii_case("CRAFTING") {
        "INVENTORY".to_string()
    } else {
        inv.type_name.clone()
    }
}

/// Render a float the way the host prints doubles: integral values keep
/// one decimal place.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}
