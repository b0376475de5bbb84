use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::constants::{ITEM_SLOT_SALT_PREFIX, RUNE_SLOT_SALT_PREFIX};
use crate::models::address::Address;

/// Battle context an item slot or rune slot is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BattleType {
    Adventure,
    Arena,
    Raid,
}

impl BattleType {
    pub const ALL: [BattleType; 3] = [BattleType::Adventure, BattleType::Arena, BattleType::Raid];

    pub fn code(self) -> i64 {
        match self {
            BattleType::Adventure => 1,
            BattleType::Arena => 2,
            BattleType::Raid => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|battle_type| battle_type.code() == code)
    }

    pub fn item_slot_salt(self) -> String {
        format!("{}-{}", ITEM_SLOT_SALT_PREFIX, self)
    }

    pub fn rune_slot_salt(self) -> String {
        format!("{}-{}", RUNE_SLOT_SALT_PREFIX, self)
    }
}

impl fmt::Display for BattleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BattleType::Adventure => "Adventure",
            BattleType::Arena => "Arena",
            BattleType::Raid => "Raid",
        };
        f.write_str(label)
    }
}

/// Avatar root state, before its inventory is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarState {
    pub address: Option<Address>,
    pub agent_address: Option<Address>,
    pub name: String,
    pub character_id: i64,
    pub level: i64,
    pub exp: i64,
}

impl AvatarState {
    /// Attaches the inventory. Only the merged snapshot can enter a digest.
    pub fn with_inventory(self, inventory: InventorySnapshot) -> AvatarSnapshot {
        AvatarSnapshot {
            state: self,
            inventory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarSnapshot {
    pub state: AvatarState,
    pub inventory: InventorySnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: i64,
    pub item_type: String,
    pub grade: i64,
    pub non_fungible_id: Option<Vec<u8>>,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub items: Vec<InventoryItem>,
}

impl InventorySnapshot {
    pub fn find_non_fungible(&self, id: &[u8]) -> Option<&InventoryItem> {
        self.items
            .iter()
            .find(|item| item.non_fungible_id.as_deref() == Some(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSlotSnapshot {
    pub battle_type: BattleType,
    pub costumes: Vec<Vec<u8>>,
    pub equipments: Vec<Vec<u8>>,
}

impl ItemSlotSnapshot {
    /// Canonical value used when nothing is stored on chain.
    pub fn empty(battle_type: BattleType) -> Self {
        Self {
            battle_type,
            costumes: Vec::new(),
            equipments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuneSlot {
    pub index: i64,
    pub slot_type: i64,
    pub rune_type: i64,
    pub is_locked: bool,
    pub rune_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuneSlotInfo {
    pub slot_index: i64,
    pub rune_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuneSlotSnapshot {
    pub battle_type: BattleType,
    pub slots: Vec<RuneSlot>,
}

impl RuneSlotSnapshot {
    pub fn empty(battle_type: BattleType) -> Self {
        Self {
            battle_type,
            slots: Vec::new(),
        }
    }

    /// Slots that hold a rune, in slot order.
    pub fn equipped_rune_slot_infos(&self) -> Vec<RuneSlotInfo> {
        self.slots
            .iter()
            .filter_map(|slot| {
                slot.rune_id.map(|rune_id| RuneSlotInfo {
                    slot_index: slot.index,
                    rune_id,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuneStateSnapshot {
    pub address: Option<Address>,
    pub rune_id: i64,
    pub level: i64,
}

/// Everything the simulator needs about one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDigest {
    pub avatar: AvatarSnapshot,
    pub equipments: Vec<Vec<u8>>,
    pub costumes: Vec<Vec<u8>>,
    pub runes: Vec<RuneStateSnapshot>,
}

impl PlayerDigest {
    pub fn new(avatar: AvatarSnapshot, item_slot: ItemSlotSnapshot, runes: Vec<RuneStateSnapshot>) -> Self {
        Self {
            avatar,
            equipments: item_slot.equipments,
            costumes: item_slot.costumes,
            runes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    pub id: i64,
    pub name: String,
    pub stage_begin: i64,
    pub stage_end: i64,
    pub stage_cleared_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorldInformation {
    pub worlds: BTreeMap<i64, World>,
}

impl WorldInformation {
    pub fn last_cleared_stage(&self) -> Option<i64> {
        self.worlds
            .values()
            .filter_map(|world| world.stage_cleared_id)
            .max()
    }
}
