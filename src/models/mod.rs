// src/models/mod.rs
pub mod address;
pub mod api;
pub mod sheet;
pub mod state;
pub mod value;

pub use api::{
    ApiResponse, ArenaSimulateRequest, ArenaSimulateResponse, ExternalArenaResult,
    WorldInformationResponse,
};
