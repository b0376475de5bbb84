use crate::error::Result;
use crate::models::address::Address;
use crate::models::sheet::{
    ActionBuffSheet, ArenaRules, CharacterLevelSheet, CharacterSheet, CostumeStatSheet,
    EquipmentItemSetEffectSheet, MaterialItemSheet, RuneOptionSheet, SkillActionBuffSheet,
    SkillBuffSheet, SkillSheet, StatBuffSheet, TableSheet, WeeklyArenaRewardSheet,
};
use crate::services::state_service::{fetch_required, StateService};

pub fn table_address(table_root: &Address, type_name: &str) -> Address {
    table_root.derive(type_name)
}

/// Resolves rule tables stored as text under `derive(table_root, TypeName)`.
pub struct RulesResolver<'a> {
    state: &'a dyn StateService,
    table_root: Address,
}

impl<'a> RulesResolver<'a> {
    pub fn new(state: &'a dyn StateService, table_root: Address) -> Self {
        Self { state, table_root }
    }

    pub async fn resolve_table<T: TableSheet>(&self) -> Result<T> {
        let address = table_address(&self.table_root, T::TYPE_NAME);
        let role = format!("table {}", T::TYPE_NAME);
        let text: String = fetch_required(self.state, &address, &role).await?;
        T::parse(&text)
    }

    pub async fn resolve_arena_rules(&self) -> Result<ArenaRules> {
        let (
            material_item,
            skill,
            skill_buff,
            stat_buff,
            skill_action_buff,
            action_buff,
            character,
            character_level,
            equipment_item_set_effect,
            costume_stat,
            weekly_arena_reward,
            rune_option,
        ) = tokio::try_join!(
            self.resolve_table::<MaterialItemSheet>(),
            self.resolve_table::<SkillSheet>(),
            self.resolve_table::<SkillBuffSheet>(),
            self.resolve_table::<StatBuffSheet>(),
            self.resolve_table::<SkillActionBuffSheet>(),
            self.resolve_table::<ActionBuffSheet>(),
            self.resolve_table::<CharacterSheet>(),
            self.resolve_table::<CharacterLevelSheet>(),
            self.resolve_table::<EquipmentItemSetEffectSheet>(),
            self.resolve_table::<CostumeStatSheet>(),
            self.resolve_table::<WeeklyArenaRewardSheet>(),
            self.resolve_table::<RuneOptionSheet>(),
        )?;

        let rules = ArenaRules {
            material_item,
            skill,
            skill_buff,
            stat_buff,
            skill_action_buff,
            action_buff,
            character,
            character_level,
            equipment_item_set_effect,
            costume_stat,
            weekly_arena_reward,
            rune_option,
        };
        for (name, table) in rules.tables() {
            if table.is_empty() {
                tracing::warn!("Rule table {} has no rows", name);
            } else {
                tracing::debug!("Rule table {}: {} rows", name, table.len());
            }
        }
        tracing::debug!(
            "Resolved {} rule tables under {}",
            ArenaRules::TABLE_NAMES.len(),
            self.table_root
        );
        Ok(rules)
    }
}
