//! Periodic wall-clock timers.
//!
//! A [`WallTimer`] is driven by the node that owns it:
//!
//! ```rust,no_run
//! # async fn run(node: demo_middleware::Node) -> Result<(), demo_types::MwError> {
//! let mut timer = node.create_wall_timer(std::time::Duration::from_secs(1))?;
//! while timer.tick().await {
//!     // periodic work
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::context::Context;

pub struct WallTimer {
    interval: Interval,
    context: Context,
}

impl WallTimer {
    /// The first tick fires one full `period` after creation.
    pub(crate) fn new(period: Duration, context: Context) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, context }
    }

    /// Wait for the next period.
    ///
    /// Returns `true` when the period elapsed and the caller should do its
    /// work, `false` once the context has shut down.
    pub async fn tick(&mut self) -> bool {
        if !self.context.ok() {
            return false;
        }
        tokio::select! {
            _ = self.interval.tick() => self.context.ok(),
            _ = self.context.shutdown_requested() => false,
        }
    }
}
