//! End-to-end scenario orchestration: reset, stimulate, sample, compare.

use std::fmt;

use strobe_sim::Device;

use crate::bench::{spawn_task, Bench};
use crate::error::HarnessError;

/// Tunable policies for a scenario run.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioOptions {
    /// Edges to hold `rst` asserted before releasing it.
    pub reset_cycles: u32,
    /// Watchdog budget for the whole scenario, in edges.
    pub max_cycles: u64,
    /// Per-handshake stall deadline, in idle edges.
    pub handshake_timeout: u64,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            reset_cycles: 2,
            max_cycles: 10_000,
            handshake_timeout: 1_000,
        }
    }
}

/// Lifecycle states of a scenario.
///
/// `Passed` and `Failed` are terminal; a scenario is never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioState {
    /// Created, nothing run yet.
    Idle,
    /// Holding the device in reset.
    Resetting,
    /// Stimulus and sampling tasks in flight.
    Running,
    /// All tasks joined, comparing received against expected.
    Comparing,
    /// Every received value matched.
    Passed,
    /// A comparison mismatched.
    Failed,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioState::Idle => "idle",
            ScenarioState::Resetting => "resetting",
            ScenarioState::Running => "running",
            ScenarioState::Comparing => "comparing",
            ScenarioState::Passed => "passed",
            ScenarioState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Diagnostic record for the first comparison failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// Position in the expected sequence.
    pub index: usize,
    /// The expected (masked) value.
    pub expected: u64,
    /// The value actually observed.
    pub observed: u64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position {}: expected 0x{:x}, observed 0x{:x}",
            self.index, self.expected, self.observed
        )
    }
}

/// Outcome of a completed scenario.
#[derive(Debug)]
pub struct ScenarioReport {
    /// The scenario name.
    pub name: String,
    /// Terminal state: `Passed` or `Failed`.
    pub state: ScenarioState,
    /// Rising edges consumed by the run.
    pub cycles: u64,
    /// The full received sequence, masked.
    pub received: Vec<u64>,
    /// The first mismatch, when `state` is `Failed`.
    pub mismatch: Option<Mismatch>,
}

impl ScenarioReport {
    /// Whether the scenario reached `Passed`.
    pub fn passed(&self) -> bool {
        self.state == ScenarioState::Passed
    }
}

/// A named stimulate-and-check run against one device.
///
/// Builds up input streams and one expected output stream, then [`run`]s
/// them concurrently against a shared clock: all input sends are joined
/// before the scenario considers stimulus finished, while the output
/// monitor samples in parallel throughout.
///
/// Comparison is fail-fast: the first mismatching position produces the
/// report's [`Mismatch`] and later positions are not inspected.
///
/// [`run`]: StreamScenario::run
pub struct StreamScenario {
    name: String,
    inputs: Vec<(String, Vec<i64>)>,
    output: Option<(String, Vec<u64>)>,
    options: ScenarioOptions,
}

impl StreamScenario {
    /// Creates an empty scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            output: None,
            options: ScenarioOptions::default(),
        }
    }

    /// Adds an input stream: `values` will be sent on interface `prefix`.
    pub fn drive(mut self, prefix: &str, values: &[i64]) -> Self {
        self.inputs.push((prefix.to_string(), values.to_vec()));
        self
    }

    /// Sets the output stream: `expected` values on interface `prefix`.
    pub fn expect(mut self, prefix: &str, expected: &[u64]) -> Self {
        self.output = Some((prefix.to_string(), expected.to_vec()));
        self
    }

    /// Overrides the default options.
    pub fn options(mut self, options: ScenarioOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs the scenario against the given device.
    ///
    /// Configuration errors (missing signals, malformed interfaces) abort
    /// before reset. Stall and watchdog errors abort the run. A completed
    /// run yields a report in `Passed` or `Failed` state; a failed
    /// comparison is a report, not an `Err`, so independent scenarios can
    /// keep running.
    pub fn run(self, device: impl Device + 'static) -> Result<ScenarioReport, HarnessError> {
        let (out_prefix, expected) = self
            .output
            .unwrap_or_else(|| panic!("scenario `{}` has no expected output stream", self.name));
        let name = self.name;
        let options = self.options;

        let mut bench = Bench::new(device);
        bench.set_max_cycles(options.max_cycles);

        // Bind everything before touching the device: configuration
        // failures must abort before reset.
        let rst = bench.lookup("rst")?;
        let mut drivers = Vec::new();
        for (prefix, values) in self.inputs {
            let driver = bench.stream_driver(&prefix, options.handshake_timeout)?;
            drivers.push((driver, values));
        }
        let monitor = bench.stream_monitor(&out_prefix, options.handshake_timeout)?;

        // All interfaces in one scenario must agree on the data width,
        // since expected values are masked with a single width.
        let width = monitor.binding().width();
        for (driver, _) in &drivers {
            let w = driver.binding().width();
            if w != width {
                return Err(HarnessError::Configuration {
                    prefix: driver.binding().prefix().to_string(),
                    signal: format!("{}data", driver.binding().prefix()),
                    reason: format!(
                        "has width {w}, inconsistent with `{out_prefix}data` width {width}"
                    ),
                });
            }
        }

        let clock = bench.clock();
        let dut = bench.device();
        let spawner = bench.spawner();
        let count = expected.len();
        let scenario = name.clone();
        log::info!("scenario `{name}`: {} -> {}", ScenarioState::Idle, ScenarioState::Resetting);

        let body = async move {
            dut.borrow_mut().surface_mut().write_u64(rst, 1)?;
            clock.edges(options.reset_cycles as u64).await;
            dut.borrow_mut().surface_mut().write_u64(rst, 0)?;
            log::info!(
                "scenario `{scenario}`: {} -> {}",
                ScenarioState::Resetting,
                ScenarioState::Running
            );

            let mut sends = Vec::new();
            for (driver, values) in drivers {
                sends.push(spawn_task(&spawner, async move {
                    driver.send(&values).await
                })?);
            }
            let recv = spawn_task(&spawner, async move { monitor.recv(count).await })?;

            // Both inputs must finish before stimulus counts as done;
            // sampling continues in parallel regardless.
            for send in sends {
                send.await?;
            }
            let received = recv.await?;

            log::info!(
                "scenario `{scenario}`: {} -> {}",
                ScenarioState::Running,
                ScenarioState::Comparing
            );
            let mismatch = expected
                .iter()
                .zip(received.iter())
                .enumerate()
                .find_map(|(index, (&expected, &observed))| {
                    (expected != observed).then_some(Mismatch {
                        index,
                        expected,
                        observed,
                    })
                });
            Ok::<_, HarnessError>((received, mismatch))
        };

        let (received, mismatch) = bench.run_until(body)??;
        let state = if mismatch.is_none() {
            ScenarioState::Passed
        } else {
            ScenarioState::Failed
        };
        match &mismatch {
            None => log::info!("scenario `{name}`: {state}"),
            Some(m) => log::warn!("scenario `{name}`: {state} ({m})"),
        }

        Ok(ScenarioReport {
            name,
            state,
            cycles: bench.cycles(),
            received,
            mismatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strobe_sim::{SimError, StreamAdder, Surface};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn default_options() {
        let options = ScenarioOptions::default();
        assert_eq!(options.reset_cycles, 2);
        assert_eq!(options.max_cycles, 10_000);
        assert_eq!(options.handshake_timeout, 1_000);
    }

    #[test]
    fn state_display() {
        assert_eq!(ScenarioState::Idle.to_string(), "idle");
        assert_eq!(ScenarioState::Resetting.to_string(), "resetting");
        assert_eq!(ScenarioState::Running.to_string(), "running");
        assert_eq!(ScenarioState::Comparing.to_string(), "comparing");
        assert_eq!(ScenarioState::Passed.to_string(), "passed");
        assert_eq!(ScenarioState::Failed.to_string(), "failed");
    }

    #[test]
    fn mismatch_display() {
        let m = Mismatch {
            index: 3,
            expected: 0x1A,
            observed: 0x0E,
        };
        assert_eq!(m.to_string(), "position 3: expected 0x1a, observed 0xe");
    }

    #[test]
    fn passing_scenario_reports_passed() {
        init_logging();
        let report = StreamScenario::new("smoke")
            .drive("a_", &[1, 2])
            .drive("b_", &[3, 4])
            .expect("r_", &[4, 6])
            .run(StreamAdder::new(8))
            .unwrap();
        assert!(report.passed());
        assert_eq!(report.state, ScenarioState::Passed);
        assert_eq!(report.received, vec![4, 6]);
        assert!(report.mismatch.is_none());
        assert!(report.cycles > 0);
    }

    #[test]
    fn failing_scenario_reports_first_mismatch() {
        init_logging();
        let report = StreamScenario::new("bad-expectation")
            .drive("a_", &[1, 2])
            .drive("b_", &[3, 4])
            .expect("r_", &[4, 7])
            .run(StreamAdder::new(8))
            .unwrap();
        assert!(!report.passed());
        assert_eq!(report.state, ScenarioState::Failed);
        assert_eq!(
            report.mismatch,
            Some(Mismatch {
                index: 1,
                expected: 7,
                observed: 6,
            })
        );
    }

    #[test]
    fn unknown_interface_aborts_before_reset() {
        let err = StreamScenario::new("bad-prefix")
            .drive("q_", &[1])
            .drive("b_", &[1])
            .expect("r_", &[2])
            .run(StreamAdder::new(8))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Configuration { .. }));
    }

    /// A device with a stream surface but no reset line.
    struct NoResetDevice {
        surface: Surface,
    }

    impl NoResetDevice {
        fn new() -> Self {
            let mut surface = Surface::new();
            surface.add_input("r_ready", 1);
            surface.add_output("r_valid", 1);
            surface.add_output("r_data", 4);
            Self { surface }
        }
    }

    impl Device for NoResetDevice {
        fn surface(&self) -> &Surface {
            &self.surface
        }

        fn surface_mut(&mut self) -> &mut Surface {
            &mut self.surface
        }

        fn settle(&mut self) -> Result<(), SimError> {
            Ok(())
        }

        fn tick(&mut self) -> Result<(), SimError> {
            Ok(())
        }
    }

    #[test]
    fn missing_reset_aborts_before_reset() {
        let err = StreamScenario::new("no-rst")
            .expect("r_", &[0])
            .run(NoResetDevice::new())
            .unwrap_err();
        assert!(matches!(err, HarnessError::MissingSignal { .. }));
    }

    #[test]
    #[should_panic(expected = "no expected output stream")]
    fn run_without_expectation_panics() {
        let _ = StreamScenario::new("incomplete").run(StreamAdder::new(4));
    }

    /// A device whose input and output interfaces disagree on data width.
    struct MixedWidthDevice {
        surface: Surface,
    }

    impl MixedWidthDevice {
        fn new() -> Self {
            let mut surface = Surface::new();
            surface.add_input("rst", 1);
            surface.add_input("a_valid", 1);
            surface.add_output("a_ready", 1);
            surface.add_input("a_data", 4);
            surface.add_output("r_valid", 1);
            surface.add_input("r_ready", 1);
            surface.add_output("r_data", 8);
            Self { surface }
        }
    }

    impl Device for MixedWidthDevice {
        fn surface(&self) -> &Surface {
            &self.surface
        }

        fn surface_mut(&mut self) -> &mut Surface {
            &mut self.surface
        }

        fn settle(&mut self) -> Result<(), SimError> {
            Ok(())
        }

        fn tick(&mut self) -> Result<(), SimError> {
            Ok(())
        }
    }

    #[test]
    fn inconsistent_widths_abort_before_reset() {
        let err = StreamScenario::new("mixed-widths")
            .drive("a_", &[1])
            .expect("r_", &[1])
            .run(MixedWidthDevice::new())
            .unwrap_err();
        match err {
            HarnessError::Configuration { prefix, reason, .. } => {
                assert_eq!(prefix, "a_");
                assert!(reason.contains("inconsistent"));
            }
            other => panic!("expected Configuration, got {other}"),
        }
    }

    #[test]
    fn stalled_scenario_errors_instead_of_hanging() {
        init_logging();
        // `b` never sends, so `a`'s handshake and the monitor both starve.
        let err = StreamScenario::new("starved")
            .drive("a_", &[1])
            .drive("b_", &[])
            .expect("r_", &[1])
            .options(ScenarioOptions {
                reset_cycles: 2,
                max_cycles: 500,
                handshake_timeout: 50,
            })
            .run(StreamAdder::new(8))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Stall { .. }));
    }
}
