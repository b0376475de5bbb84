use futures_util::future::try_join_all;

use crate::constants::INVENTORY_SALT;
use crate::error::Result;
use crate::models::address::Address;
use crate::models::state::{
    AvatarSnapshot, AvatarState, BattleType, InventorySnapshot, ItemSlotSnapshot, PlayerDigest,
    RuneSlotSnapshot, RuneStateSnapshot,
};
use crate::models::value::EncodedValue;
use crate::services::decoder::decode;
use crate::services::state_service::{fetch_optional_or_default, fetch_required, StateService};

pub fn inventory_address(avatar_address: &Address) -> Address {
    avatar_address.derive(INVENTORY_SALT)
}

pub fn item_slot_address(avatar_address: &Address, battle_type: BattleType) -> Address {
    avatar_address.derive(battle_type.item_slot_salt())
}

pub fn rune_slot_address(avatar_address: &Address, battle_type: BattleType) -> Address {
    avatar_address.derive(battle_type.rune_slot_salt())
}

/// Rune states hang off the avatar address, not the rune slot address.
pub fn rune_state_address(avatar_address: &Address, rune_id: i64) -> Address {
    avatar_address.derive(rune_id)
}

/// Builds a player's digest from on-chain state. Nothing is cached between calls.
pub struct SnapshotAssembler<'a> {
    state: &'a dyn StateService,
}

impl<'a> SnapshotAssembler<'a> {
    pub fn new(state: &'a dyn StateService) -> Self {
        Self { state }
    }

    pub async fn assemble(
        &self,
        avatar_address: &Address,
        battle_type: BattleType,
    ) -> Result<PlayerDigest> {
        let (avatar, item_slot, rune_slot) = tokio::try_join!(
            self.avatar_snapshot(avatar_address),
            self.item_slot(avatar_address, battle_type),
            self.rune_slot(avatar_address, battle_type),
        )?;
        let runes = self.rune_states(avatar_address, &rune_slot).await?;

        tracing::debug!(
            "Assembled digest for {}: {} inventory items, {} equipments, {} costumes, {} runes",
            avatar_address,
            avatar.inventory.items.len(),
            item_slot.equipments.len(),
            item_slot.costumes.len(),
            runes.len()
        );

        Ok(PlayerDigest::new(avatar, item_slot, runes))
    }

    /// Avatar root and inventory are both mandatory.
    pub async fn avatar_snapshot(&self, avatar_address: &Address) -> Result<AvatarSnapshot> {
        let avatar: AvatarState = fetch_required(self.state, avatar_address, "avatar").await?;
        let inventory: InventorySnapshot =
            fetch_required(self.state, &inventory_address(avatar_address), "inventory").await?;
        Ok(avatar.with_inventory(inventory))
    }

    pub async fn item_slot(
        &self,
        avatar_address: &Address,
        battle_type: BattleType,
    ) -> Result<ItemSlotSnapshot> {
        fetch_optional_or_default(
            self.state,
            &item_slot_address(avatar_address, battle_type),
            "item slot",
            || ItemSlotSnapshot::empty(battle_type),
        )
        .await
    }

    pub async fn rune_slot(
        &self,
        avatar_address: &Address,
        battle_type: BattleType,
    ) -> Result<RuneSlotSnapshot> {
        fetch_optional_or_default(
            self.state,
            &rune_slot_address(avatar_address, battle_type),
            "rune slot",
            || RuneSlotSnapshot::empty(battle_type),
        )
        .await
    }

    /// Equipped runes whose state is not a stored list are left out.
    pub async fn rune_states(
        &self,
        avatar_address: &Address,
        rune_slot: &RuneSlotSnapshot,
    ) -> Result<Vec<RuneStateSnapshot>> {
        let fetches = rune_slot.equipped_rune_slot_infos().into_iter().map(|info| {
            let address = rune_state_address(avatar_address, info.rune_id);
            async move {
                let fetched = self.state.get_state(&address).await?;
                match fetched {
                    Some(value @ EncodedValue::List(_)) => {
                        let context = format!("rune {} {}", info.rune_id, address);
                        decode::<RuneStateSnapshot>(&value, &context).map(Some)
                    }
                    Some(other) => {
                        tracing::warn!(
                            "Skipping rune {} of {}: state at {} is {}",
                            info.rune_id,
                            avatar_address,
                            address,
                            other.kind()
                        );
                        Ok(None)
                    }
                    None => {
                        tracing::debug!(
                            "Skipping rune {} of {}: nothing stored at {}",
                            info.rune_id,
                            avatar_address,
                            address
                        );
                        Ok(None)
                    }
                }
            }
        });

        Ok(try_join_all(fetches).await?.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::decoder::tests::{
        avatar_value, inventory_value, rune_slot_value, rune_state_value,
    };
    use crate::services::state_service::memory::MemoryStateService;

    fn avatar_a() -> Address {
        "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap()
    }

    fn seeded_state(avatar: &Address) -> MemoryStateService {
        let state = MemoryStateService::new();
        state.insert(*avatar, avatar_value("Hero", 10));
        state.insert(
            inventory_address(avatar),
            inventory_value(&[(303000, "Material", None), (10100000, "Equipment", Some(vec![5; 16]))]),
        );
        state
    }

    #[tokio::test]
    async fn scenario_absent_slots_yield_empty_digest_parts() {
        let avatar = avatar_a();
        let state = seeded_state(&avatar);

        let digest = SnapshotAssembler::new(&state)
            .assemble(&avatar, BattleType::Arena)
            .await
            .unwrap();

        assert_eq!(digest.avatar.state.name, "Hero");
        assert_eq!(digest.avatar.inventory.items.len(), 2);
        assert!(digest.equipments.is_empty());
        assert!(digest.costumes.is_empty());
        assert!(digest.runes.is_empty());
    }

    #[tokio::test]
    async fn absent_item_slot_equals_canonical_empty() {
        let avatar = avatar_a();
        let state = seeded_state(&avatar);
        let slot = SnapshotAssembler::new(&state)
            .item_slot(&avatar, BattleType::Arena)
            .await
            .unwrap();
        assert_eq!(slot, ItemSlotSnapshot::empty(BattleType::Arena));
    }

    #[tokio::test]
    async fn missing_avatar_is_required_state() {
        let state = MemoryStateService::new();
        let err = SnapshotAssembler::new(&state)
            .assemble(&avatar_a(), BattleType::Arena)
            .await
            .unwrap_err();
        match err {
            AppError::MissingRequiredState(context) => assert!(context.starts_with("avatar ")),
            other => panic!("expected MissingRequiredState, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_inventory_is_required_state() {
        let avatar = avatar_a();
        let state = MemoryStateService::new();
        state.insert(avatar, avatar_value("Hero", 10));
        let err = SnapshotAssembler::new(&state)
            .assemble(&avatar, BattleType::Arena)
            .await
            .unwrap_err();
        match err {
            AppError::MissingRequiredState(context) => assert!(context.starts_with("inventory ")),
            other => panic!("expected MissingRequiredState, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn avatar_of_wrong_shape_fails_before_decoding() {
        let avatar = avatar_a();
        let state = seeded_state(&avatar);
        state.insert(avatar, EncodedValue::List(vec![]));
        let err = SnapshotAssembler::new(&state)
            .avatar_snapshot(&avatar)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn item_slot_of_wrong_shape_is_mismatch() {
        let avatar = avatar_a();
        let state = seeded_state(&avatar);
        state.insert(
            item_slot_address(&avatar, BattleType::Arena),
            EncodedValue::text("oops"),
        );
        let err = SnapshotAssembler::new(&state)
            .assemble(&avatar, BattleType::Arena)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn only_fetchable_runes_are_kept() {
        let avatar = avatar_a();
        let state = seeded_state(&avatar);
        state.insert(
            rune_slot_address(&avatar, BattleType::Arena),
            rune_slot_value(&[Some(1), Some(2), Some(3)]),
        );
        state.insert(rune_state_address(&avatar, 2), rune_state_value(2, 7));
        // present but not a list
        state.insert(rune_state_address(&avatar, 3), EncodedValue::Integer(3));

        let digest = SnapshotAssembler::new(&state)
            .assemble(&avatar, BattleType::Arena)
            .await
            .unwrap();

        assert_eq!(digest.runes.len(), 1);
        assert_eq!(digest.runes[0].rune_id, 2);
        assert_eq!(digest.runes[0].level, 7);
    }

    #[test]
    fn rune_state_lives_under_avatar_not_rune_slot() {
        let avatar = avatar_a();
        let slot = rune_slot_address(&avatar, BattleType::Arena);
        assert_ne!(rune_state_address(&avatar, 1), slot.derive(1_i64));
        assert_eq!(rune_state_address(&avatar, 1), avatar.derive(1_i64));
    }

    #[tokio::test]
    async fn item_slot_contents_flow_into_digest() {
        let avatar = avatar_a();
        let state = seeded_state(&avatar);
        state.insert(
            item_slot_address(&avatar, BattleType::Arena),
            EncodedValue::List(vec![
                EncodedValue::Integer(2),
                EncodedValue::List(vec![EncodedValue::Binary(vec![8; 16])]),
                EncodedValue::List(vec![EncodedValue::Binary(vec![5; 16])]),
            ]),
        );
        let digest = SnapshotAssembler::new(&state)
            .assemble(&avatar, BattleType::Arena)
            .await
            .unwrap();
        assert_eq!(digest.equipments, vec![vec![5u8; 16]]);
        assert_eq!(digest.costumes, vec![vec![8u8; 16]]);
    }

    #[tokio::test]
    async fn every_assembly_refetches() {
        let avatar = avatar_a();
        let state = seeded_state(&avatar);
        let assembler = SnapshotAssembler::new(&state);
        assembler.assemble(&avatar, BattleType::Arena).await.unwrap();
        let first = state.fetch_count();
        assembler.assemble(&avatar, BattleType::Arena).await.unwrap();
        assert_eq!(state.fetch_count(), first * 2);
    }
}
