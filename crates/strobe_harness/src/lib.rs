//! Stream-protocol verification harness for clocked valid/ready interfaces.
//!
//! This crate drives and samples simulated devices through the handshake
//! discipline: a value transfers on a rising clock edge exactly when
//! `valid` and `ready` are both asserted at that edge. Drivers push value
//! sequences respecting backpressure, monitors accumulate a fixed count of
//! observed values, and scenarios orchestrate several of each concurrently
//! against one shared clock before comparing results in order.
//!
//! # Concurrency model
//!
//! All tasks are cooperative futures on a single-threaded pool. The only
//! suspension points are [`Clock::rising_edge`] futures; between edges the
//! bench runs every task to quiescence, steps the device, and wakes the
//! waiters, so progress happens strictly at edge boundaries. Every
//! suspension is deadline-bounded and every run is watchdog-bounded: a
//! stalled handshake produces an error, never a hang.
//!
//! # Example
//!
//! ```no_run
//! use strobe_harness::StreamScenario;
//! use strobe_sim::StreamAdder;
//!
//! let report = StreamScenario::new("specifics")
//!     .drive("a_", &[0x0A, 0x0A, -0x0A, -0x0A, 0x0A])
//!     .drive("b_", &[0x04, -0x04, 0x04, -0x04, -0x0A])
//!     .expect("r_", &[0x0E, 0x06, 0x1A, 0x12, 0x00])
//!     .run(StreamAdder::new(5))
//!     .unwrap();
//! assert!(report.passed());
//! ```
//!
//! # Modules
//!
//! - `error` — configuration, stall, and watchdog error types
//! - `clock` — the shared clock and rising-edge futures
//! - `bench` — device ownership, task scheduling, edge stepping
//! - `binding` — prefix-resolved valid/ready/data signal bindings
//! - `driver` — stream driver (`send`)
//! - `monitor` — stream monitor (`recv`)
//! - `scenario` — end-to-end orchestration and reporting

#![warn(missing_docs)]

pub mod bench;
pub mod binding;
pub mod clock;
pub mod driver;
pub mod error;
pub mod monitor;
pub mod scenario;

pub use bench::{spawn_task, Bench, DEFAULT_MAX_CYCLES};
pub use binding::StreamBinding;
pub use clock::{Clock, RisingEdge};
pub use driver::StreamDriver;
pub use error::HarnessError;
pub use monitor::StreamMonitor;
pub use scenario::{Mismatch, ScenarioOptions, ScenarioReport, ScenarioState, StreamScenario};
