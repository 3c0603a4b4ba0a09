/// Cadence - terminal host for the playback controller
pub mod commands;
pub mod config;
pub mod error;
pub mod gateways;
pub mod sim_engine;
