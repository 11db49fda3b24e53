//! # Pump a [`FrameLoop`] from a tokio runtime.
//!
//! Hosts without their own frame loop can let tokio supply the ticks.
//!
//! ## Flow
//! ```text
//! drive(frames, cfg, token)
//! loop {
//!   ├─► frames idle?        → stop (Idle)
//!   ├─► wait for next tick  (interval, or yield_now if tick_interval = 0)
//!   │     └─ token cancelled → stop (Cancelled)
//!   └─► frames.tick()
//! }
//! ```
//!
//! ## Rules
//! - Runs on the current task; `FrameLoop` is `!Send`, so use a
//!   current-thread runtime or a `LocalSet`
//! - Cancellation is checked before every tick and wins over a ready interval
//! - Missed interval ticks are skipped, never replayed in a burst

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::FrameLoop;

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveExit {
    /// No cycle left to run.
    Idle,
    /// The cancellation token fired.
    Cancelled,
}

/// Summary of one [`drive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveReport {
    /// Ticks run by this call.
    pub ticks: u64,
    /// Exit reason.
    pub exit: DriveExit,
}

/// Ticks `frames` until it is idle or `token` is cancelled.
///
/// The period comes from [`Config::tick_period`]; with no period the pump
/// yields to the runtime between ticks.
pub async fn drive(frames: &FrameLoop, cfg: &Config, token: &CancellationToken) -> DriveReport {
    let start = frames.ticks();
    let mut interval = cfg.tick_period().map(|period| {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        interval
    });

    let exit = loop {
        if frames.is_idle() {
            break DriveExit::Idle;
        }

        match interval.as_mut() {
            Some(interval) => {
                select! {
                    biased;
                    _ = token.cancelled() => break DriveExit::Cancelled,
                    _ = interval.tick() => {}
                }
            }
            None => {
                tokio::task::yield_now().await;
                if token.is_cancelled() {
                    break DriveExit::Cancelled;
                }
            }
        }

        frames.tick();
    };

    let report = DriveReport {
        ticks: frames.ticks() - start,
        exit,
    };
    tracing::debug!(ticks = report.ticks, exit = ?report.exit, "frame pump stopped");
    report
}
