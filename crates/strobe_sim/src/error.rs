//! Error types for device surface access and waveform output.

use std::io;

/// Errors that can occur accessing a device's signal surface or writing
/// waveform output.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A signal name was not found on the device surface.
    #[error("no signal named `{name}` on the device surface")]
    UnknownSignal {
        /// The name that failed to resolve.
        name: String,
    },

    /// A value's width did not match the signal it was written to.
    #[error("signal `{name}` has width {actual}, but the value has width {given}")]
    WidthMismatch {
        /// The signal name.
        name: String,
        /// The signal's declared width.
        actual: u32,
        /// The width of the offending value.
        given: u32,
    },

    /// A testbench write targeted a device-driven (output) signal.
    #[error("signal `{name}` is driven by the device and cannot be written from the testbench")]
    NotAnInput {
        /// The signal name.
        name: String,
    },

    /// A device drive targeted a testbench-driven (input) signal.
    #[error("signal `{name}` is owned by the testbench and cannot be driven by the device")]
    NotAnOutput {
        /// The signal name.
        name: String,
    },

    /// An I/O error occurred while writing waveform output.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),
}
