use axum::{extract::State, Json};

use crate::{
    error::Result,
    models::state::BattleType,
    models::{ArenaSimulateRequest, ArenaSimulateResponse},
    services::arena_simulation::{run_arena_simulation, to_external},
    services::rules_resolver::RulesResolver,
    services::snapshot_assembler::SnapshotAssembler,
};

use super::{parse_address_param, AppState};

/// POST /arena/simulate
pub async fn simulate(
    State(state): State<AppState>,
    Json(req): Json<ArenaSimulateRequest>,
) -> Result<Json<ArenaSimulateResponse>> {
    let my_address = parse_address_param(&req.my_avatar_address, "myAvatarAddress")?;
    let enemy_address = parse_address_param(&req.enemy_avatar_address, "enemyAvatarAddress")?;

    let assembler = SnapshotAssembler::new(state.state_service.as_ref());
    let resolver = RulesResolver::new(state.state_service.as_ref(), state.table_root);

    let (my, enemy, rules) = tokio::try_join!(
        async {
            assembler
                .assemble(&my_address, BattleType::Arena)
                .await
                .map_err(|e| e.for_parameter("myAvatarAddress"))
        },
        async {
            assembler
                .assemble(&enemy_address, BattleType::Arena)
                .await
                .map_err(|e| e.for_parameter("enemyAvatarAddress"))
        },
        resolver.resolve_arena_rules(),
    )?;

    let log = run_arena_simulation(
        state.simulator.as_ref(),
        state.seeds.as_ref(),
        req.seed,
        &my,
        &enemy,
        &rules,
        true,
    )?;

    Ok(Json(ArenaSimulateResponse {
        result: to_external(log.result),
    }))
}
