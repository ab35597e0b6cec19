//! Engine configuration.
//!
//! All knobs are plain bounded values; nothing in the engine branches on where
//! they came from. The server binary populates this from environment variables
//! and CLI flags.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// How often the disconnect watcher runs.
    pub watcher_interval: Duration,
    /// Consecutive late watcher ticks before a warning is logged.
    pub watcher_skip_threshold: u32,
    /// How long an outbound event may stay pending before the player is
    /// considered disconnected.
    pub player_timeout: Duration,
    /// Capacity of each player's outbound event queue.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            watcher_interval: Duration::from_secs(1),
            watcher_skip_threshold: 3,
            player_timeout: Duration::from_secs(10),
            queue_capacity: 64,
        }
    }
}
