//! Configuration loading and management.
//!
//! This module provides functionality to load and validate the client
//! configuration from the `.storyplay/` directory.

pub mod error;
pub mod loader;
