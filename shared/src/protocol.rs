//! JSON wire protocol. Every message is an object carrying a `type` discriminator.

use crate::{EnemyId, EnemyKind, ItemId, PetalId, PetalKind, PlayerId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join {
        #[serde(alias = "name")]
        username: String,
    },
    #[serde(rename = "setName")]
    SetName {
        #[serde(alias = "username")]
        name: String,
    },
    #[serde(rename = "move")]
    Move { x: f32, y: f32 },
    /// Movement vector and/or an inventory action.
    #[serde(rename = "input")]
    Input {
        #[serde(default)]
        vx: Option<f32>,
        #[serde(default)]
        vy: Option<f32>,
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        payload: Option<Value>,
    },
    #[serde(rename = "updateInventory")]
    UpdateInventory {
        hotbar: Vec<Option<PetalRef>>,
        inventory: Vec<PetalRef>,
    },
    #[serde(rename = "equip")]
    Equip {
        slot: usize,
        #[serde(rename = "petalId")]
        petal_id: PetalId,
    },
    #[serde(rename = "unequip")]
    Unequip { slot: usize },
    #[serde(rename = "pickup")]
    Pickup {
        #[serde(rename = "itemId")]
        item_id: ItemId,
    },
    #[serde(rename = "attackMob")]
    AttackMob {
        #[serde(rename = "mobId")]
        mob_id: EnemyId,
        /// Accepted for compatibility, never trusted.
        #[serde(default)]
        damage: Option<f32>,
    },
    #[serde(rename = "attackTick")]
    AttackTick,
}

impl ClientMessage {
    /// Builds an `input` message carrying only an inventory action.
    pub fn inventory_action(action: &InventoryAction) -> Self {
        let (name, payload) = action.to_parts();
        ClientMessage::Input {
            vx: None,
            vy: None,
            action: Some(name),
            payload: Some(payload),
        }
    }
}

/// A petal reference inside a client-sent inventory layout. Only the id is
/// read; any other fields the client echoes back are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetalRef {
    pub id: PetalId,
}

/// Inventory mutation carried by an `input` message's `action`/`payload` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "lowercase")]
pub enum InventoryAction {
    Add { kind: PetalKind },
    Drop { index: usize },
    Combine { indices: Vec<usize> },
}

impl InventoryAction {
    /// Parses the split `action` name and `payload` object of an `input` message.
    pub fn from_parts(action: &str, payload: Option<Value>) -> Result<Self, serde_json::Error> {
        let mut object = serde_json::Map::new();
        object.insert("action".to_string(), Value::String(action.to_string()));
        object.insert("payload".to_string(), payload.unwrap_or(Value::Null));
        serde_json::from_value(Value::Object(object))
    }

    pub fn to_parts(&self) -> (String, Value) {
        let (name, payload) = match self {
            InventoryAction::Add { kind } => ("add", serde_json::json!({ "kind": kind })),
            InventoryAction::Drop { index } => ("drop", serde_json::json!({ "index": index })),
            InventoryAction::Combine { indices } => {
                ("combine", serde_json::json!({ "indices": indices }))
            }
        };
        (name.to_string(), payload)
    }
}

/// Messages sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Init { id: PlayerId },
    State(WorldSnapshot),
    /// Private view of the receiving player's own petals and progress.
    Inventory(InventoryView),
    Disconnected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    pub tick: u64,
    pub players: Vec<PlayerView>,
    pub enemies: Vec<EnemyView>,
    pub petals_on_ground: BTreeMap<ItemId, GroundItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub level: u32,
    pub dead: bool,
    pub in_safe_zone: bool,
    pub orbit_radius: f32,
    pub orbit_angle: f32,
    pub hotbar: Vec<Option<PetalView>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetalView {
    pub id: PetalId,
    pub kind: PetalKind,
    pub tier: u8,
    pub hp: f32,
    pub max_hp: f32,
    pub broken: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyView {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundItemView {
    pub x: f32,
    pub y: f32,
    pub kind: PetalKind,
    pub tier: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryView {
    pub hotbar: Vec<Option<PetalView>>,
    pub inventory: Vec<PetalView>,
    pub xp: u32,
    pub currency: u32,
    pub level: u32,
}
