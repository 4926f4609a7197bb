//! Stream monitor: collects values from a valid/ready interface.

use std::cell::RefCell;
use std::rc::Rc;

use strobe_common::mask_u64;
use strobe_sim::Device;

use crate::binding::StreamBinding;
use crate::clock::Clock;
use crate::error::HarnessError;

/// Samples one stream interface, accumulating a fixed number of values.
///
/// The monitor owns the interface's `ready` signal; it keeps it asserted
/// for the duration of a receive.
pub struct StreamMonitor {
    dut: Rc<RefCell<dyn Device>>,
    clock: Clock,
    binding: StreamBinding,
    deadline: u64,
}

impl StreamMonitor {
    pub(crate) fn new(
        dut: Rc<RefCell<dyn Device>>,
        clock: Clock,
        binding: StreamBinding,
        deadline: u64,
    ) -> Self {
        Self {
            dut,
            clock,
            binding,
            deadline,
        }
    }

    /// The binding this monitor operates on.
    pub fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    /// Receives exactly `count` values, in arrival order.
    ///
    /// Asserts `ready`, then samples `data` (masked to the interface
    /// width) at every edge where the peer's `valid` was observed
    /// asserted, until `count` values have been collected. The monitor
    /// suspends only on clock edges; if `valid` stays low for `deadline`
    /// consecutive edges the receive fails with a stall error.
    pub async fn recv(&self, count: usize) -> Result<Vec<u64>, HarnessError> {
        let width = self.binding.width();
        self.set_ready(true)?;
        let mut values = Vec::with_capacity(count);
        let mut idle = 0u64;
        while values.len() < count {
            self.clock.rising_edge().await;
            if self.valid_at_edge() {
                let value = mask_u64(self.data_at_edge(), width);
                log::debug!(
                    "{}: value {}/{count} (0x{value:x}) observed at cycle {}",
                    self.binding.prefix(),
                    values.len() + 1,
                    self.clock.cycle()
                );
                values.push(value);
                idle = 0;
            } else {
                idle += 1;
                if idle >= self.deadline {
                    self.set_ready(false)?;
                    return Err(HarnessError::Stall {
                        interface: self.binding.prefix().to_string(),
                        cycles: idle,
                    });
                }
            }
        }
        self.set_ready(false)?;
        Ok(values)
    }

    fn set_ready(&self, on: bool) -> Result<(), HarnessError> {
        self.dut
            .borrow_mut()
            .surface_mut()
            .write_u64(self.binding.ready(), on as u64)?;
        Ok(())
    }

    /// Whether the peer's `valid` was asserted at the most recent edge.
    fn valid_at_edge(&self) -> bool {
        self.dut
            .borrow()
            .surface()
            .sampled_bool(self.binding.valid())
    }

    /// The `data` value at the most recent edge.
    fn data_at_edge(&self) -> u64 {
        self.dut.borrow().surface().sampled_u64(self.binding.data())
    }
}
