//! Background disconnect watcher.
//!
//! A single periodic task that shares the game lock with request handlers.
//! Each tick recomputes every player's connectivity from the staleness of
//! their pending-message timestamp; see [`Game::watcher_tick`]. The loop
//! tolerates being descheduled: consecutive late ticks are logged once they
//! cross the configured threshold instead of silently drifting.

use std::sync::Arc;

use log::{info, warn};
use tokio::time::{Instant, MissedTickBehavior, interval};

use super::Game;

pub async fn run(game: Arc<Game>) {
    let tick_interval = game.config().watcher_interval;
    let skip_threshold = game.config().watcher_skip_threshold;
    info!("watcher started (interval: {tick_interval:?})");

    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let slow_cutoff = tick_interval + tick_interval / 2;
    let mut previous = Instant::now();
    let mut continuous_slow_count: u32 = 0;

    loop {
        ticker.tick().await;
        let now = Instant::now();
        if now.duration_since(previous) > slow_cutoff {
            continuous_slow_count += 1;
            if continuous_slow_count >= skip_threshold {
                warn!(
                    "watcher loop seems to be slow \
                     (continuous_slow_count: {continuous_slow_count})"
                );
            }
        } else {
            continuous_slow_count = 0;
        }
        previous = now;

        game.watcher_tick();
    }
}
