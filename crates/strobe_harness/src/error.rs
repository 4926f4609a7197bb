//! Error types for harness configuration, scheduling, and protocol checks.

use strobe_sim::SimError;

/// Errors that can occur while configuring or running a verification
/// scenario.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A single named signal required by the harness is absent.
    #[error("configuration error: missing signal `{name}` on the device surface")]
    MissingSignal {
        /// The signal name that failed to resolve.
        name: String,
    },

    /// A stream interface signal is absent or has an unusable shape.
    #[error("configuration error on interface `{prefix}`: signal `{signal}` {reason}")]
    Configuration {
        /// The interface prefix being bound.
        prefix: String,
        /// The offending signal name.
        signal: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A handshake made no progress within its cycle deadline.
    #[error("handshake stalled on interface `{interface}` after {cycles} idle cycles")]
    Stall {
        /// The interface prefix whose handshake stalled.
        interface: String,
        /// How many idle edges elapsed before giving up.
        cycles: u64,
    },

    /// The scenario as a whole exceeded its cycle budget.
    #[error("scenario exceeded the {cycles}-cycle watchdog")]
    Watchdog {
        /// The watchdog limit that was hit.
        cycles: u64,
    },

    /// A signal surface access failed.
    #[error("signal access failed: {0}")]
    Signal(#[from] SimError),

    /// The task executor refused a spawn (it has shut down).
    #[error("task spawn failed: executor is shut down")]
    Spawn,
}
