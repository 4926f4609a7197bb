//! The black-box device abstraction driven by the harness.
//!
//! A [`Device`] exposes a named signal [`Surface`] plus two synchronous
//! hooks: `settle` propagates combinational logic from the live signal
//! values, and `tick` performs the rising-edge register update from the
//! values sampled at the edge. The clock is advanced *for* the device by
//! [`step_edge`]; a device never advances time itself.

use crate::error::SimError;
use crate::signal::Surface;

/// A simulated circuit exposed as a signal surface with an
/// edge-synchronous update.
pub trait Device {
    /// The device's signal surface.
    fn surface(&self) -> &Surface;

    /// Mutable access to the signal surface.
    fn surface_mut(&mut self) -> &mut Surface;

    /// Propagates combinational logic from the current signal values.
    ///
    /// Must be idempotent: calling `settle` twice without intervening
    /// writes leaves the surface unchanged.
    fn settle(&mut self) -> Result<(), SimError>;

    /// Applies one rising-edge register update.
    ///
    /// State transitions must be computed from the surface's *sampled*
    /// values (the values at the edge), never from live values, which may
    /// already reflect next-cycle testbench writes.
    fn tick(&mut self) -> Result<(), SimError>;
}

/// Advances a device through one rising clock edge.
///
/// The sequence is: settle combinational logic against the testbench's
/// latest writes, capture the at-edge sample of every signal, apply the
/// register update, then settle again so device outputs reflect the new
/// state. After this call, `Surface::sampled` holds the values observed at
/// the edge and `Surface::value` holds the post-edge state.
pub fn step_edge(device: &mut dyn Device) -> Result<(), SimError> {
    device.settle()?;
    device.surface_mut().sample_all();
    device.tick()?;
    device.settle()
}
