//! # sp-core
//!
//! Client core for storyplay: tracks a backend pipeline run until it
//! produces a visualization, then plays the resulting game.
//!
//! ## Modules
//!
//! - [`client`]: Backend collaborator traits, HTTP and scripted backends
//! - [`config`]: Configuration loading from `.storyplay/`
//! - [`store`]: Per-session store and scratchpad
//! - [`pipeline`]: Run reconciliation, progress animation and display merge
//! - [`render`]: Blueprint resolution and projection into a render tree
//! - [`game`]: Game session state machine

pub mod client;
pub mod config;
pub mod game;
pub mod pipeline;
pub mod render;
pub mod store;
