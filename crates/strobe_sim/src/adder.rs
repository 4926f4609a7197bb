//! Behavioral stream adder used as the demo device for the harness.
//!
//! Two valid/ready input streams `a_*` and `b_*` join into one output
//! stream `r_*` carrying `(a + b)` reduced to the data width. A pair is
//! consumed on an edge where both inputs are valid and the single-entry
//! output slot is free; the result sits in the slot until the downstream
//! side takes it, so backpressure on `r_ready` propagates to both inputs.

use strobe_common::mask_u64;

use crate::device::Device;
use crate::error::SimError;
use crate::signal::{SignalId, Surface};

/// A width-parameterized elastic adder with stream interfaces
/// `a_*`, `b_*` (inputs), `r_*` (output), and a synchronous `rst`.
pub struct StreamAdder {
    surface: Surface,
    width: u32,

    rst: SignalId,
    a_valid: SignalId,
    a_ready: SignalId,
    a_data: SignalId,
    b_valid: SignalId,
    b_ready: SignalId,
    b_data: SignalId,
    r_valid: SignalId,
    r_ready: SignalId,
    r_data: SignalId,

    // Output slot registers.
    out_valid: bool,
    out_data: u64,
}

impl StreamAdder {
    /// Creates an adder with the given data width on all three interfaces.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or greater than 64.
    pub fn new(width: u32) -> Self {
        assert!(
            (1..=64).contains(&width),
            "stream adder width {width} out of range 1..=64"
        );
        let mut surface = Surface::new();
        let rst = surface.add_input("rst", 1);
        let a_valid = surface.add_input("a_valid", 1);
        let a_ready = surface.add_output("a_ready", 1);
        let a_data = surface.add_input("a_data", width);
        let b_valid = surface.add_input("b_valid", 1);
        let b_ready = surface.add_output("b_ready", 1);
        let b_data = surface.add_input("b_data", width);
        let r_valid = surface.add_output("r_valid", 1);
        let r_ready = surface.add_input("r_ready", 1);
        let r_data = surface.add_output("r_data", width);
        Self {
            surface,
            width,
            rst,
            a_valid,
            a_ready,
            a_data,
            b_valid,
            b_ready,
            b_data,
            r_valid,
            r_ready,
            r_data,
            out_valid: false,
            out_data: 0,
        }
    }

    /// The data width of the adder's interfaces.
    pub fn width(&self) -> u32 {
        self.width
    }
}

impl Device for StreamAdder {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn settle(&mut self) -> Result<(), SimError> {
        self.surface.drive_u64(self.r_valid, self.out_valid as u64)?;
        self.surface.drive_u64(self.r_data, self.out_data)?;

        // Inputs are accepted only when the partner stream has data and
        // the output slot can take the sum this edge.
        let slot_free = !self.out_valid || self.surface.value_bool(self.r_ready);
        let a_v = self.surface.value_bool(self.a_valid);
        let b_v = self.surface.value_bool(self.b_valid);
        self.surface
            .drive_u64(self.a_ready, (slot_free && b_v) as u64)?;
        self.surface
            .drive_u64(self.b_ready, (slot_free && a_v) as u64)
    }

    fn tick(&mut self) -> Result<(), SimError> {
        if self.surface.sampled_bool(self.rst) {
            self.out_valid = false;
            self.out_data = 0;
            return Ok(());
        }

        let fire = self.surface.sampled_bool(self.a_valid)
            && self.surface.sampled_bool(self.a_ready)
            && self.surface.sampled_bool(self.b_valid)
            && self.surface.sampled_bool(self.b_ready);
        let drain = self.out_valid && self.surface.sampled_bool(self.r_ready);

        if fire {
            let a = self.surface.sampled_u64(self.a_data);
            let b = self.surface.sampled_u64(self.b_data);
            self.out_data = mask_u64(a.wrapping_add(b), self.width);
            self.out_valid = true;
        } else if drain {
            self.out_valid = false;
        }
        Ok(())
    }
}
