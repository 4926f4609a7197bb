//! Stream driver: pushes a value sequence onto a valid/ready interface.

use std::cell::RefCell;
use std::rc::Rc;

use strobe_common::mask_i64;
use strobe_sim::Device;

use crate::binding::StreamBinding;
use crate::clock::Clock;
use crate::error::HarnessError;

/// Drives one stream interface, presenting values in order and respecting
/// backpressure.
///
/// The driver owns the interface's `valid` and `data` signals; nothing
/// else may write them while a send is in flight.
pub struct StreamDriver {
    dut: Rc<RefCell<dyn Device>>,
    clock: Clock,
    binding: StreamBinding,
    deadline: u64,
}

impl StreamDriver {
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

    /// The binding this driver operates on.
    pub fn binding(&self) -> &StreamBinding {
        &self.binding
    }

    /// Sends the given values as handshake transactions, in order.
    ///
    /// Each value is reduced to the interface width by two's-complement
    /// masking, presented on `data` with `valid` asserted, and held until
    /// an edge at which `ready` was observed asserted. After the last
    /// acceptance `valid` is deasserted. The driver suspends only on clock
    /// edges; if `ready` stays low for `deadline` consecutive edges the
    /// send fails with a stall error.
    pub async fn send(&self, values: &[i64]) -> Result<(), HarnessError> {
        let width = self.binding.width();
        self.set_valid(true)?;
        for (index, &value) in values.iter().enumerate() {
            let masked = mask_i64(value, width);
            self.put_data(masked)?;

            let mut waited = 0u64;
            loop {
                self.clock.rising_edge().await;
                if self.ready_at_edge() {
                    break;
                }
                waited += 1;
                if waited >= self.deadline {
                    self.set_valid(false)?;
                    return Err(HarnessError::Stall {
                        interface: self.binding.prefix().to_string(),
                        cycles: waited,
                    });
                }
            }
            log::debug!(
                "{}: value {}/{} (0x{masked:x}) accepted at cycle {}",
                self.binding.prefix(),
                index + 1,
                values.len(),
                self.clock.cycle()
            );
        }
        self.set_valid(false)?;
        Ok(())
    }

    fn set_valid(&self, on: bool) -> Result<(), HarnessError> {
        self.dut
            .borrow_mut()
            .surface_mut()
            .write_u64(self.binding.valid(), on as u64)?;
        Ok(())
    }

    fn put_data(&self, masked: u64) -> Result<(), HarnessError> {
        self.dut
            .borrow_mut()
            .surface_mut()
            .write_u64(self.binding.data(), masked)?;
        Ok(())
    }

    /// Whether `ready` was asserted at the most recent edge.
    fn ready_at_edge(&self) -> bool {
        self.dut
            .borrow()
            .surface()
            .sampled_bool(self.binding.ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::Bench;
    use strobe_sim::StreamAdder;

    #[test]
    fn send_masks_negative_values_onto_the_bus() {
        let mut bench = Bench::new(StreamAdder::new(5));
        // Pair every `a` value with a zero on `b` and let the sink run free
        // so the stream flows every cycle.
        let r_ready = bench.lookup("r_ready").unwrap();
        bench.write_u64(r_ready, 1).unwrap();

        let a = bench.stream_driver("a_", 100).unwrap();
        let b = bench.stream_driver("b_", 100).unwrap();
        let a_data = bench.lookup("a_data").unwrap();
        let dut = bench.device();

        let observe = bench
            .spawn({
                let clock = bench.clock();
                async move {
                    clock.rising_edge().await;
                    dut.borrow().surface().sampled_u64(a_data)
                }
            })
            .unwrap();

        let sent = bench
            .run_until(async move { futures::join!(a.send(&[-0x0A]), b.send(&[0])) })
            .unwrap();
        sent.0.unwrap();
        sent.1.unwrap();

        // -10 masked to 5 bits is 0x16.
        let seen = bench.run_until(async move { observe.await }).unwrap();
        assert_eq!(seen, 0x16);
    }

    #[test]
    fn valid_deasserted_after_last_value() {
        let mut bench = Bench::new(StreamAdder::new(5));
        let r_ready = bench.lookup("r_ready").unwrap();
        bench.write_u64(r_ready, 1).unwrap();

        let a = bench.stream_driver("a_", 100).unwrap();
        let b = bench.stream_driver("b_", 100).unwrap();
        let a_valid = bench.lookup("a_valid").unwrap();

        bench
            .run_until(async move {
                let (ra, rb) = futures::join!(a.send(&[1, 2]), b.send(&[3, 4]));
                ra?;
                rb
            })
            .unwrap()
            .unwrap();

        assert!(!bench.device().borrow().surface().value_bool(a_valid));
    }

    #[test]
    fn stalls_when_partner_never_arrives() {
        let mut bench = Bench::new(StreamAdder::new(5));
        let r_ready = bench.lookup("r_ready").unwrap();
        bench.write_u64(r_ready, 1).unwrap();

        // Only `a` is driven; the adder never raises a_ready without `b`.
        let a = bench.stream_driver("a_", 20).unwrap();
        let err = bench
            .run_until(async move { a.send(&[5]).await })
            .unwrap()
            .unwrap_err();
        match err {
            HarnessError::Stall { interface, cycles } => {
                assert_eq!(interface, "a_");
                assert_eq!(cycles, 20);
            }
            other => panic!("expected Stall, got {other}"),
        }
    }

    #[test]
    fn empty_send_completes_without_edges() {
        let mut bench = Bench::new(StreamAdder::new(5));
        let a = bench.stream_driver("a_", 10).unwrap();
        bench
            .run_until(async move { a.send(&[]).await })
            .unwrap()
            .unwrap();
        assert_eq!(bench.cycles(), 0);
    }
}
