//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Largest accepted speed multiplier.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Tool diagnostics longer than this (in characters) are cut before they
    /// reach a job message.
    #[serde(default = "default_error_excerpt")]
    pub error_excerpt_chars: usize,

    /// Capacity of the job event channel. Slow subscribers lag past this.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_speed() -> f64 {
    10.0
}

fn default_error_excerpt() -> usize {
    500
}

fn default_event_buffer() -> usize {
    256
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            error_excerpt_chars: default_error_excerpt(),
            event_buffer: default_event_buffer(),
        }
    }
}
