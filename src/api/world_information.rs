use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    constants::WORLD_INFORMATION_SALT,
    error::{AppError, Result},
    models::{ApiResponse, WorldInformationResponse},
    services::state_handler::{StateHandler, WorldInformationStateHandler},
};

use super::{parse_address_param, AppState};

/// GET /avatar/:address/world-information
pub async fn get_world_information(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WorldInformationResponse>>> {
    let avatar_address = parse_address_param(&address, "address")?;
    let world_address = avatar_address.derive(WORLD_INFORMATION_SALT);

    tracing::debug!("Fetching world information of {} at {}", avatar_address, world_address);
    let value = state
        .state_service
        .get_state(&world_address)
        .await?
        .ok_or_else(|| {
            AppError::MissingRequiredState(format!("world information {}", world_address))
                .for_parameter("address")
        })?;

    let data = WorldInformationStateHandler
        .convert(world_address, &value)
        .map_err(|e| e.for_parameter("address"))?;

    let response = WorldInformationResponse {
        address: data.address,
        last_cleared_stage: data.state.last_cleared_stage(),
        worlds: data.state.worlds.into_values().collect(),
    };
    Ok(Json(ApiResponse::success(response)))
}
