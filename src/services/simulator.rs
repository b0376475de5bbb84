use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::constants::{ARENA_HP_MODIFIER, ARENA_MAX_ACTIONS_PER_TURN, ARENA_MAX_TURNS};
use crate::error::{AppError, Result};
use crate::models::sheet::{ArenaRules, CharacterSheet, TableSheet};
use crate::models::state::PlayerDigest;

// Flat bonuses per equipped piece, scaled by item grade.
const EQUIPMENT_ATK_PER_GRADE: i64 = 4;
const COSTUME_HP_PER_GRADE: i64 = 15;
const RUNE_ATK_PER_LEVEL: i64 = 2;

// Chain values outside these ranges are clamped before any stat math.
const MAX_AVATAR_LEVEL: i64 = 400;
const MAX_ITEM_GRADE: i64 = 10;
const MAX_RUNE_LEVEL: i64 = 1_000;

/// Internal battle outcome, from the challenger's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArenaResult {
    Win,
    Lose,
}

impl fmt::Display for ArenaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaResult::Win => f.write_str("Win"),
            ArenaResult::Lose => f.write_str("Lose"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaLog {
    pub result: ArenaResult,
    pub turns: u32,
    pub my_remaining_hp: i64,
    pub enemy_remaining_hp: i64,
}

/// Deterministic arena battle. Identical inputs must give an identical log.
pub trait ArenaSimulator: Send + Sync {
    fn simulate(
        &self,
        seed: i32,
        my: &PlayerDigest,
        enemy: &PlayerDigest,
        rules: &ArenaRules,
        is_challenger: bool,
    ) -> Result<ArenaLog>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatStats {
    pub hp: i64,
    pub atk: i64,
    pub def: i64,
}

impl CombatStats {
    /// Level-scaled character stats plus bonuses from pieces the player actually owns.
    pub fn for_player(player: &PlayerDigest, characters: &CharacterSheet) -> Result<Self> {
        let avatar = &player.avatar.state;
        let base = characters
            .stats(avatar.character_id)
            .ok_or_else(|| AppError::InvalidTable {
                table: CharacterSheet::TYPE_NAME.to_string(),
                reason: format!("no row for character {}", avatar.character_id),
            })?;
        let growth = (avatar.level.clamp(1, MAX_AVATAR_LEVEL) - 1) as f64;

        let mut stats = CombatStats {
            hp: (base.hp + base.lv_hp * growth) as i64,
            atk: (base.atk + base.lv_atk * growth) as i64,
            def: (base.def + base.lv_def * growth) as i64,
        };

        let inventory = &player.avatar.inventory;
        let owned_grade = |id: &Vec<u8>| {
            inventory
                .find_non_fungible(id)
                .map(|item| item.grade.clamp(0, MAX_ITEM_GRADE))
        };
        for grade in player.equipments.iter().filter_map(owned_grade) {
            stats.atk = stats.atk.saturating_add(grade * EQUIPMENT_ATK_PER_GRADE);
        }
        for grade in player.costumes.iter().filter_map(owned_grade) {
            stats.hp = stats.hp.saturating_add(grade * COSTUME_HP_PER_GRADE);
        }
        for rune in &player.runes {
            let level = rune.level.clamp(0, MAX_RUNE_LEVEL);
            stats.atk = stats.atk.saturating_add(level * RUNE_ATK_PER_LEVEL);
        }

        stats.hp = stats.hp.max(1).saturating_mul(ARENA_HP_MODIFIER);
        Ok(stats)
    }
}

/// Turn-based simulator driven by a `StdRng` seeded from the request seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededArenaSimulator;

impl SeededArenaSimulator {
    pub fn new() -> Self {
        Self
    }

    fn strike(rng: &mut StdRng, attacker: &CombatStats, defender: &mut CombatStats) {
        let spread = (attacker.atk / 10).max(0);
        let damage = attacker
            .atk
            .saturating_sub(defender.def / 2)
            .max(1)
            .saturating_add(rng.random_range(0..=spread));
        defender.hp = defender.hp.saturating_sub(damage);
    }

    // Returns true once the defender is down.
    fn take_turn(rng: &mut StdRng, attacker: &CombatStats, defender: &mut CombatStats) -> bool {
        let actions = rng.random_range(1..=ARENA_MAX_ACTIONS_PER_TURN);
        for _ in 0..actions {
            Self::strike(rng, attacker, defender);
            if defender.hp <= 0 {
                return true;
            }
        }
        false
    }
}

impl ArenaSimulator for SeededArenaSimulator {
    fn simulate(
        &self,
        seed: i32,
        my: &PlayerDigest,
        enemy: &PlayerDigest,
        rules: &ArenaRules,
        is_challenger: bool,
    ) -> Result<ArenaLog> {
        let mut mine = CombatStats::for_player(my, &rules.character)?;
        let mut theirs = CombatStats::for_player(enemy, &rules.character)?;
        let mut rng = StdRng::seed_from_u64(seed as u32 as u64);

        let finish = |result, turns, mine: &CombatStats, theirs: &CombatStats| ArenaLog {
            result,
            turns,
            my_remaining_hp: mine.hp.max(0),
            enemy_remaining_hp: theirs.hp.max(0),
        };

        for turn in 1..=ARENA_MAX_TURNS {
            if is_challenger {
                if Self::take_turn(&mut rng, &mine, &mut theirs) {
                    return Ok(finish(ArenaResult::Win, turn, &mine, &theirs));
                }
                if Self::take_turn(&mut rng, &theirs, &mut mine) {
                    return Ok(finish(ArenaResult::Lose, turn, &mine, &theirs));
                }
            } else {
                if Self::take_turn(&mut rng, &theirs, &mut mine) {
                    return Ok(finish(ArenaResult::Lose, turn, &mine, &theirs));
                }
                if Self::take_turn(&mut rng, &mine, &mut theirs) {
                    return Ok(finish(ArenaResult::Win, turn, &mine, &theirs));
                }
            }
        }

        // Challenger loses on timeout.
        let result = if is_challenger {
            ArenaResult::Lose
        } else {
            ArenaResult::Win
        };
        Ok(finish(result, ARENA_MAX_TURNS, &mine, &theirs))
    }
}
