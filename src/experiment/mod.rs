//! Pod kill experiment engine
//!
//! A session moves through these stages:
//! - target selection (namespace, explicit names or one random running pod)
//! - concurrent termination
//! - replacement resolution, one killed pod at a time
//! - readiness monitoring of each replacement
//! - report assembly and persistence
//!
//! Progress is streamed through an [`EventEmitter`] while the session runs.

pub mod clock;
pub mod events;
pub mod executor;
pub mod readiness;
pub mod resolver;
pub mod selector;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

pub use clock::{Clock, SystemClock};
pub use events::{EventEmitter, ProgressEvent, ProgressKind};
pub use executor::{kill_targets, KillOutcome};
pub use resolver::{pick_replacement, resolve_replacement, ClaimedReplacements};
pub use session::{ChaosEngine, KillRequest};

/// Bounded polling: `attempts` checks, `interval` apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Replacement discovery: 30 checks, one second apart
    pub fn discovery() -> Self {
        Self::new(30, Duration::from_secs(1))
    }

    /// Readiness monitoring: 60 checks, one second apart
    pub fn readiness() -> Self {
        Self::new(60, Duration::from_secs(1))
    }

    /// Upper bound on the time spent sleeping between checks
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts.saturating_sub(1)
    }
}
