// Domain services
pub mod arena_simulation;
pub mod decoder;
pub mod rules_resolver;
pub mod simulator;
pub mod snapshot_assembler;
pub mod state_handler;
pub mod state_service;
