//! Device substrate for the Strobe verification harness.
//!
//! This crate defines the black-box shape of a simulated circuit as the
//! harness sees it: a named, width-typed signal [`Surface`] with stable
//! IDs, the [`Device`] trait's settle/tick edge discipline, waveform
//! recording, and a behavioral [`StreamAdder`] demo device.
//!
//! # Edge discipline
//!
//! [`step_edge`] advances a device through one rising clock edge:
//! combinational settle, at-edge sampling of every signal, register
//! update, and a final settle. Testbench code reads the *sampled* values
//! to decide what happened at the edge, and writes live values that take
//! effect at the next one.
//!
//! # Modules
//!
//! - `error` — surface access and waveform error types
//! - `signal` — signal IDs, per-signal state, the surface table
//! - `device` — the `Device` trait and the edge-step sequence
//! - `adder` — behavioral elastic stream adder demo device
//! - `waveform` — waveform recording (VCD format)

#![warn(missing_docs)]

pub mod adder;
pub mod device;
pub mod error;
pub mod signal;
pub mod waveform;

pub use adder::StreamAdder;
pub use device::{step_edge, Device};
pub use error::SimError;
pub use signal::{PortDirection, SignalId, SignalState, Surface};
pub use waveform::{VcdRecorder, WaveformRecorder};
