use serde::{Deserialize, Serialize};

use crate::models::address::Address;
use crate::models::state::World;

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// ==================== ARENA ====================
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaSimulateRequest {
    pub seed: Option<i32>,
    pub my_avatar_address: String,
    pub enemy_avatar_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternalArenaResult {
    Win,
    Lose,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaSimulateResponse {
    pub result: ExternalArenaResult,
}

// ==================== WORLD INFORMATION ====================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldInformationResponse {
    pub address: Address,
    pub last_cleared_stage: Option<i64>,
    pub worlds: Vec<World>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }

    #[test]
    fn request_uses_camel_case_and_optional_seed() {
        let req: ArenaSimulateRequest = serde_json::from_str(
            r#"{"myAvatarAddress":"0x01","enemyAvatarAddress":"0x02"}"#,
        )
        .unwrap();
        assert_eq!(req.seed, None);
        assert_eq!(req.my_avatar_address, "0x01");

        let req: ArenaSimulateRequest = serde_json::from_str(
            r#"{"seed":42,"myAvatarAddress":"0x01","enemyAvatarAddress":"0x02"}"#,
        )
        .unwrap();
        assert_eq!(req.seed, Some(42));
    }

    #[test]
    fn response_serializes_result_as_text() {
        let body = serde_json::to_value(ArenaSimulateResponse {
            result: ExternalArenaResult::Win,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "result": "Win" }));
    }
}
