//! # sp-protocol
//!
//! Core protocol definitions and data models for storyplay.
//!
//! This crate defines all shared data structures used for:
//! - Pipeline run progress as reported by the backend
//! - Game blueprints and legacy visualization payloads
//! - Client configuration (`config.toml`)
//! - Events emitted by the core to presentation
//!
//! ## Modules
//!
//! - [`pipeline_models`]: Runs, steps and poll snapshots
//! - [`blueprint_models`]: Typed game blueprints, one variant per game type
//! - [`game_models`]: Visualization payloads and answer checking
//! - [`config_models`]: Client configuration from config.toml
//! - [`ipc`]: Events sent from Core to presentation
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, chrono and uuid
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other storyplay crates

pub mod blueprint_models;
pub mod config_models;
pub mod game_models;
pub mod ipc;
pub mod pipeline_models;

// Re-export all public types for convenience
pub use blueprint_models::*;
pub use config_models::*;
pub use game_models::*;
pub use ipc::*;
pub use pipeline_models::*;
