//! Conformance test helpers for the Strobe stream harness.
//!
//! Provides shared builders that run complete stimulate-and-check
//! scenarios against the behavioral stream adder and return structured
//! reports for assertion in integration tests.

#![warn(missing_docs)]

use strobe_common::mask_i64;
use strobe_harness::{HarnessError, ScenarioReport, StreamScenario};
use strobe_sim::StreamAdder;

/// Initializes test logging once per process; safe to call repeatedly.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Computes the expected output sequence of the stream adder:
/// `(a[i] + b[i])` reduced to `width` bits.
pub fn expected_sums(width: u32, a: &[i64], b: &[i64]) -> Vec<u64> {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| mask_i64(x.wrapping_add(y), width))
        .collect()
}

/// Runs a full adder scenario: sends `a` and `b` concurrently, receives
/// `expected.len()` values, and compares them in order.
pub fn run_adder(
    name: &str,
    width: u32,
    a: &[i64],
    b: &[i64],
    expected: &[u64],
) -> Result<ScenarioReport, HarnessError> {
    StreamScenario::new(name)
        .drive("a_", a)
        .drive("b_", b)
        .expect("r_", expected)
        .run(StreamAdder::new(width))
}
