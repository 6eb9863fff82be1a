//! Client configuration models for `.storyplay/config.toml`.
//!
//! This module defines the structure of the configuration file that
//! controls polling cadence, game timing and the cosmetic progress
//! simulator. Every field has a default, so an empty file is valid.

use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use ts_rs::TS;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Represents the client settings from `.storyplay/config.toml`.
///
/// # Example
///
/// ```toml
/// # .storyplay/config.toml
/// api_base_url = "http://localhost:8000"
///
/// [poll]
/// interval_ms = 2000
/// max_attempts = 300
/// server_error_threshold = 3
///
/// [game]
/// feedback_delay_ms = 2000
///
/// [simulator]
/// enabled = true
/// step_units = { min = 10.0, max = 12.0 }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct ClientConfig {
    /// Base URL of the backend API, without a trailing `/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub poll: PollSettings,

    #[serde(default)]
    pub game: GameSettings,

    #[serde(default)]
    pub simulator: SimulatorSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll: PollSettings::default(),
            game: GameSettings::default(),
            simulator: SimulatorSettings::default(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Cadence and give-up policy of the progress poll loop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(default)]
pub struct PollSettings {
    /// Delay between the end of one poll round-trip and the next poll.
    pub interval_ms: u64,

    /// Polls issued before the run is declared too slow.
    ///
    /// 300 polls at 2 seconds is ten minutes.
    pub max_attempts: u32,

    /// Consecutive 5xx responses tolerated before the run is failed.
    pub server_error_threshold: u32,

    /// Longest a single backend round-trip may take before it counts as a
    /// dropped connection.
    pub request_timeout_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 300,
            server_error_threshold: 3,
            request_timeout_ms: 30_000,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(default)]
pub struct GameSettings {
    /// How long answer feedback stays up before the game moves on.
    pub feedback_delay_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            feedback_delay_ms: 2000,
        }
    }
}

impl GameSettings {
    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}

/// Closed range of simulator time units.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, TS)]
pub struct UnitRange {
    pub min: f64,
    pub max: f64,
}

impl UnitRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

/// Timing of the cosmetic progress animation.
///
/// Durations are expressed in time units; one unit lasts `time_unit_ms`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(default)]
pub struct SimulatorSettings {
    pub enabled: bool,

    /// Number of steps the animation walks through.
    pub step_count: usize,

    pub time_unit_ms: u64,

    /// How often the animation publishes a new frame.
    pub tick_ms: u64,

    /// Duration of every step except the last.
    pub step_units: UnitRange,

    pub final_step_units: UnitRange,

    /// Pause between two steps.
    pub pause_units: UnitRange,

    /// Fixed seed for reproducible animations.
    pub seed: Option<u64>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            step_count: 9,
            time_unit_ms: 1000,
            tick_ms: 100,
            step_units: UnitRange::new(10.0, 12.0),
            final_step_units: UnitRange::new(14.0, 22.0),
            pause_units: UnitRange::new(0.5, 1.5),
            seed: None,
        }
    }
}

impl SimulatorSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
