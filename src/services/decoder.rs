use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::models::address::Address;
use crate::models::state::{
    AvatarState, BattleType, InventoryItem, InventorySnapshot, ItemSlotSnapshot, RuneSlot,
    RuneSlotSnapshot, RuneStateSnapshot, World, WorldInformation,
};
use crate::models::value::{EncodedValue, Key, ValueKind};

/// Typed view over a fetched value. Implementations check the top-level shape first.
pub trait FromState: Sized {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self>;
}

pub fn decode<T: FromState>(value: &EncodedValue, context: &str) -> Result<T> {
    T::from_state(value, context)
}

// ==================== SHAPE CHECKS ====================

pub fn expect_dictionary<'a>(
    value: &'a EncodedValue,
    context: &str,
) -> Result<&'a BTreeMap<Key, EncodedValue>> {
    match value {
        EncodedValue::Dictionary(entries) => Ok(entries),
        other => Err(AppError::type_mismatch(ValueKind::Dictionary, other.kind(), context)),
    }
}

pub fn expect_list<'a>(value: &'a EncodedValue, context: &str) -> Result<&'a [EncodedValue]> {
    match value {
        EncodedValue::List(items) => Ok(items),
        other => Err(AppError::type_mismatch(ValueKind::List, other.kind(), context)),
    }
}

pub fn expect_text<'a>(value: &'a EncodedValue, context: &str) -> Result<&'a str> {
    match value {
        EncodedValue::Text(text) => Ok(text),
        other => Err(AppError::type_mismatch(ValueKind::Text, other.kind(), context)),
    }
}

pub fn expect_binary<'a>(value: &'a EncodedValue, context: &str) -> Result<&'a [u8]> {
    match value {
        EncodedValue::Binary(bytes) => Ok(bytes),
        other => Err(AppError::type_mismatch(ValueKind::Binary, other.kind(), context)),
    }
}

pub fn expect_boolean(value: &EncodedValue, context: &str) -> Result<bool> {
    match value {
        EncodedValue::Boolean(flag) => Ok(*flag),
        other => Err(AppError::type_mismatch(ValueKind::Boolean, other.kind(), context)),
    }
}

/// Integers may also be stored as decimal text.
pub fn expect_integer(value: &EncodedValue, context: &str) -> Result<i64> {
    match value {
        EncodedValue::Integer(n) => Ok(*n),
        EncodedValue::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::type_mismatch(ValueKind::Integer, ValueKind::Text, context)),
        other => Err(AppError::type_mismatch(ValueKind::Integer, other.kind(), context)),
    }
}

pub fn expect_address(value: &EncodedValue, context: &str) -> Result<Address> {
    let bytes = expect_binary(value, context)?;
    Address::from_slice(bytes).ok_or_else(|| {
        AppError::malformed_state(context, format!("expected 20 address bytes, got {}", bytes.len()))
    })
}

// ==================== FIELD ACCESS ====================

fn field_context(context: &str, field: &str) -> String {
    format!("{}.{}", context, field)
}

fn index_context(context: &str, index: usize) -> String {
    format!("{}[{}]", context, index)
}

fn optional_field<'a>(
    entries: &'a BTreeMap<Key, EncodedValue>,
    field: &str,
) -> Option<&'a EncodedValue> {
    entries
        .get(&Key::text(field))
        .filter(|value| !matches!(value, EncodedValue::Null))
}

fn required_field<'a>(
    entries: &'a BTreeMap<Key, EncodedValue>,
    field: &str,
    context: &str,
) -> Result<&'a EncodedValue> {
    optional_field(entries, field).ok_or_else(|| AppError::missing_field(field, context))
}

fn required_element<'a>(
    items: &'a [EncodedValue],
    index: usize,
    name: &str,
    context: &str,
) -> Result<&'a EncodedValue> {
    items
        .get(index)
        .ok_or_else(|| AppError::missing_field(format!("{} (#{})", name, index), context))
}

fn decode_battle_type(value: &EncodedValue, context: &str) -> Result<BattleType> {
    let code = expect_integer(value, context)?;
    BattleType::from_code(code)
        .ok_or_else(|| AppError::malformed_state(context, format!("unknown battle type {}", code)))
}

fn decode_id_list(value: &EncodedValue, context: &str) -> Result<Vec<Vec<u8>>> {
    expect_list(value, context)?
        .iter()
        .enumerate()
        .map(|(i, item)| expect_binary(item, &index_context(context, i)).map(<[u8]>::to_vec))
        .collect()
}

// ==================== SNAPSHOTS ====================

impl FromState for AvatarState {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self> {
        let entries = expect_dictionary(value, context)?;

        let address = optional_field(entries, "address")
            .map(|v| expect_address(v, &field_context(context, "address")))
            .transpose()?;
        let agent_address = optional_field(entries, "agentAddress")
            .map(|v| expect_address(v, &field_context(context, "agentAddress")))
            .transpose()?;
        let name = expect_text(
            required_field(entries, "name", context)?,
            &field_context(context, "name"),
        )?
        .to_string();
        let character_id = expect_integer(
            required_field(entries, "characterId", context)?,
            &field_context(context, "characterId"),
        )?;
        let level = expect_integer(
            required_field(entries, "level", context)?,
            &field_context(context, "level"),
        )?;
        let exp = optional_field(entries, "exp")
            .map(|v| expect_integer(v, &field_context(context, "exp")))
            .transpose()?
            .unwrap_or(0);

        Ok(AvatarState {
            address,
            agent_address,
            name,
            character_id,
            level,
            exp,
        })
    }
}

fn decode_inventory_item(value: &EncodedValue, context: &str) -> Result<InventoryItem> {
    let entry = expect_dictionary(value, context)?;
    let item_context = field_context(context, "item");
    let item = expect_dictionary(required_field(entry, "item", context)?, &item_context)?;

    let id = expect_integer(
        required_field(item, "id", &item_context)?,
        &field_context(&item_context, "id"),
    )?;
    let item_type = expect_text(
        required_field(item, "item_type", &item_context)?,
        &field_context(&item_context, "item_type"),
    )?
    .to_string();
    let grade = optional_field(item, "grade")
        .map(|v| expect_integer(v, &field_context(&item_context, "grade")))
        .transpose()?
        .unwrap_or(0);
    let non_fungible_id = optional_field(item, "itemId")
        .map(|v| expect_binary(v, &field_context(&item_context, "itemId")).map(<[u8]>::to_vec))
        .transpose()?;
    let count = expect_integer(
        required_field(entry, "count", context)?,
        &field_context(context, "count"),
    )?;

    Ok(InventoryItem {
        id,
        item_type,
        grade,
        non_fungible_id,
        count,
    })
}

impl FromState for InventorySnapshot {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self> {
        let items = expect_list(value, context)?
            .iter()
            .enumerate()
            .map(|(i, item)| decode_inventory_item(item, &index_context(context, i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(InventorySnapshot { items })
    }
}

impl FromState for ItemSlotSnapshot {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self> {
        let items = expect_list(value, context)?;
        let battle_type = decode_battle_type(
            required_element(items, 0, "battleType", context)?,
            &index_context(context, 0),
        )?;
        let costumes = decode_id_list(
            required_element(items, 1, "costumes", context)?,
            &index_context(context, 1),
        )?;
        let equipments = decode_id_list(
            required_element(items, 2, "equipments", context)?,
            &index_context(context, 2),
        )?;

        Ok(ItemSlotSnapshot {
            battle_type,
            costumes,
            equipments,
        })
    }
}

fn decode_rune_slot(value: &EncodedValue, context: &str) -> Result<RuneSlot> {
    let items = expect_list(value, context)?;
    let index = expect_integer(
        required_element(items, 0, "index", context)?,
        &index_context(context, 0),
    )?;
    let slot_type = expect_integer(
        required_element(items, 1, "runeSlotType", context)?,
        &index_context(context, 1),
    )?;
    let rune_type = expect_integer(
        required_element(items, 2, "runeType", context)?,
        &index_context(context, 2),
    )?;
    let is_locked = expect_boolean(
        required_element(items, 3, "isLock", context)?,
        &index_context(context, 3),
    )?;
    let rune_id = match items.get(4) {
        None | Some(EncodedValue::Null) => None,
        Some(v) => Some(expect_integer(v, &index_context(context, 4))?),
    };

    Ok(RuneSlot {
        index,
        slot_type,
        rune_type,
        is_locked,
        rune_id,
    })
}

impl FromState for RuneSlotSnapshot {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self> {
        let items = expect_list(value, context)?;
        let battle_type = decode_battle_type(
            required_element(items, 0, "battleType", context)?,
            &index_context(context, 0),
        )?;
        let slots_context = index_context(context, 1);
        let slots = expect_list(required_element(items, 1, "slots", context)?, &slots_context)?
            .iter()
            .enumerate()
            .map(|(i, slot)| decode_rune_slot(slot, &index_context(&slots_context, i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(RuneSlotSnapshot { battle_type, slots })
    }
}

impl FromState for RuneStateSnapshot {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self> {
        let items = expect_list(value, context)?;
        let address = match items.first() {
            None | Some(EncodedValue::Null) => None,
            Some(v) => Some(expect_address(v, &index_context(context, 0))?),
        };
        let rune_id = expect_integer(
            required_element(items, 1, "runeId", context)?,
            &index_context(context, 1),
        )?;
        let level = expect_integer(
            required_element(items, 2, "level", context)?,
            &index_context(context, 2),
        )?;

        Ok(RuneStateSnapshot {
            address,
            rune_id,
            level,
        })
    }
}

impl FromState for WorldInformation {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self> {
        let entries = expect_dictionary(value, context)?;
        let mut worlds = BTreeMap::new();

        for (key, world_value) in entries {
            let world_context = format!("{}[{}]", context, key);
            let world = expect_dictionary(world_value, &world_context)?;
            let int_field = |field: &str| -> Result<i64> {
                expect_integer(
                    required_field(world, field, &world_context)?,
                    &field_context(&world_context, field),
                )
            };

            let id = int_field("Id")?;
            let name = expect_text(
                required_field(world, "Name", &world_context)?,
                &field_context(&world_context, "Name"),
            )?
            .to_string();
            let stage_begin = int_field("StageBegin")?;
            let stage_end = int_field("StageEnd")?;
            let stage_cleared_id = optional_field(world, "StageClearedId")
                .map(|v| expect_integer(v, &field_context(&world_context, "StageClearedId")))
                .transpose()?
                .filter(|stage| *stage > 0);

            worlds.insert(
                id,
                World {
                    id,
                    name,
                    stage_begin,
                    stage_end,
                    stage_cleared_id,
                },
            );
        }

        Ok(WorldInformation { worlds })
    }
}

impl FromState for String {
    fn from_state(value: &EncodedValue, context: &str) -> Result<Self> {
        expect_text(value, context).map(str::to_string)
    }
}
