// src/api/mod.rs

pub mod arena;
pub mod health;
pub mod world_information;

use std::sync::Arc;

use crate::config::Config;
use crate::models::address::Address;
use crate::services::arena_simulation::SeedSource;
use crate::services::simulator::ArenaSimulator;
use crate::services::state_service::StateService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub table_root: Address,
    pub state_service: Arc<dyn StateService>,
    pub simulator: Arc<dyn ArenaSimulator>,
    pub seeds: Arc<dyn SeedSource>,
}

/// Parses a request address, attributing failures to `parameter`.
pub fn parse_address_param(value: &str, parameter: &str) -> crate::error::Result<Address> {
    value
        .parse::<Address>()
        .map_err(|e| e.for_parameter(parameter))
}
