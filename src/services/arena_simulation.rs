use rand::Rng;

use crate::error::Result;
use crate::models::sheet::ArenaRules;
use crate::models::state::PlayerDigest;
use crate::models::ExternalArenaResult;
use crate::services::simulator::{ArenaLog, ArenaResult, ArenaSimulator};

/// Entropy for requests that do not pin a seed.
pub trait SeedSource: Send + Sync {
    /// A non-negative seed.
    fn next_seed(&self) -> i32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn next_seed(&self) -> i32 {
        rand::rng().random_range(0..i32::MAX)
    }
}

pub fn resolve_seed(seed: Option<i32>, seeds: &dyn SeedSource) -> i32 {
    match seed {
        Some(seed) => seed,
        None => seeds.next_seed(),
    }
}

/// Runs one battle. The simulator is called exactly once and its log returned as-is.
pub fn run_arena_simulation(
    simulator: &dyn ArenaSimulator,
    seeds: &dyn SeedSource,
    seed: Option<i32>,
    my: &PlayerDigest,
    enemy: &PlayerDigest,
    rules: &ArenaRules,
    is_challenger: bool,
) -> Result<ArenaLog> {
    let seed = resolve_seed(seed, seeds);
    let log = simulator.simulate(seed, my, enemy, rules, is_challenger)?;

    tracing::info!(
        "Arena simulation {} vs {} (seed {}): {} after {} turns, hp {} / {}",
        my.avatar.state.name,
        enemy.avatar.state.name,
        seed,
        log.result,
        log.turns,
        log.my_remaining_hp,
        log.enemy_remaining_hp
    );

    Ok(log)
}

pub fn to_external(result: ArenaResult) -> ExternalArenaResult {
    match result {
        ArenaResult::Win => ExternalArenaResult::Win,
        ArenaResult::Lose => ExternalArenaResult::Lose,
    }
}
