//! Shared foundational types for the Strobe verification harness.
//!
//! This crate provides the packed two-state bit vector used for signal
//! values and the width-parameterized two's-complement masking helpers
//! shared by protocol drivers, monitors, device models, and expected-value
//! computation.

#![warn(missing_docs)]

pub mod bits;
pub mod mask;

pub use bits::BitVec;
pub use mask::{mask, mask_i64, mask_u64};
