//! The named, width-typed signal surface of a simulated device.
//!
//! A [`Surface`] is a flat table of signals with stable [`SignalId`]s,
//! resolved by name once and addressed by ID afterwards. Each signal keeps
//! two values: the live `value`, and the `sampled` value captured at the
//! most recent rising clock edge. Handshake decisions are made against the
//! sampled values, which is the view a testbench gets reading a signal
//! immediately after a rising-edge trigger.

use strobe_common::BitVec;

use crate::error::SimError;

/// Opaque ID for a signal on a device surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SignalId(u32);

impl SignalId {
    /// Creates a `SignalId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Which side of the testbench boundary owns a signal's value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PortDirection {
    /// Written by the testbench, read by the device.
    Input,
    /// Driven by the device, read by the testbench.
    Output,
}

/// The runtime state of one surface signal.
#[derive(Clone, Debug)]
pub struct SignalState {
    /// The signal name, unique on the surface.
    pub name: String,
    /// Bit width of this signal.
    pub width: u32,
    /// Ownership side.
    pub direction: PortDirection,
    /// The live value.
    pub value: BitVec,
    /// The value captured at the most recent rising edge.
    pub sampled: BitVec,
}

impl SignalState {
    fn new(name: String, width: u32, direction: PortDirection) -> Self {
        let value = BitVec::new(width);
        Self {
            name,
            width,
            direction,
            sampled: value.clone(),
            value,
        }
    }
}

/// A flat table of named signals forming a device's external surface.
#[derive(Debug, Default)]
pub struct Surface {
    signals: Vec<SignalState>,
}

impl Surface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a testbench-written signal and returns its ID.
    pub fn add_input(&mut self, name: &str, width: u32) -> SignalId {
        self.add(name, width, PortDirection::Input)
    }

    /// Adds a device-driven signal and returns its ID.
    pub fn add_output(&mut self, name: &str, width: u32) -> SignalId {
        self.add(name, width, PortDirection::Output)
    }

    fn add(&mut self, name: &str, width: u32, direction: PortDirection) -> SignalId {
        assert!(
            self.lookup(name).is_none(),
            "duplicate signal name `{name}` on surface"
        );
        let id = SignalId(self.signals.len() as u32);
        self.signals
            .push(SignalState::new(name.to_string(), width, direction));
        id
    }

    /// Finds a signal by name, returning its ID.
    pub fn lookup(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .position(|s| s.name == name)
            .map(|i| SignalId(i as u32))
    }

    /// Returns the state of a signal.
    ///
    /// # Panics
    ///
    /// Panics if the ID does not belong to this surface.
    pub fn state(&self, id: SignalId) -> &SignalState {
        &self.signals[id.0 as usize]
    }

    /// Returns the name of a signal.
    pub fn name(&self, id: SignalId) -> &str {
        &self.state(id).name
    }

    /// Returns the width of a signal.
    pub fn width(&self, id: SignalId) -> u32 {
        self.state(id).width
    }

    /// Returns the live value of a signal.
    pub fn value(&self, id: SignalId) -> &BitVec {
        &self.state(id).value
    }

    /// Returns the value of a signal as sampled at the most recent edge.
    pub fn sampled(&self, id: SignalId) -> &BitVec {
        &self.state(id).sampled
    }

    /// Returns the live value truncated to 64 bits.
    pub fn value_u64(&self, id: SignalId) -> u64 {
        self.state(id).value.low_u64()
    }

    /// Returns the at-edge value truncated to 64 bits.
    pub fn sampled_u64(&self, id: SignalId) -> u64 {
        self.state(id).sampled.low_u64()
    }

    /// Returns the live value of a signal as a boolean (true if nonzero).
    pub fn value_bool(&self, id: SignalId) -> bool {
        !self.state(id).value.is_zero()
    }

    /// Returns the at-edge value of a signal as a boolean (true if nonzero).
    pub fn sampled_bool(&self, id: SignalId) -> bool {
        !self.state(id).sampled.is_zero()
    }

    /// Writes a value to a testbench-owned signal.
    ///
    /// Fails if the signal is device-driven or the value width does not
    /// match the signal width.
    pub fn write(&mut self, id: SignalId, value: BitVec) -> Result<(), SimError> {
        let state = &self.signals[id.0 as usize];
        if state.direction != PortDirection::Input {
            return Err(SimError::NotAnInput {
                name: state.name.clone(),
            });
        }
        self.put(id, value)
    }

    /// Writes a raw `u64` to a testbench-owned signal, truncated to its width.
    pub fn write_u64(&mut self, id: SignalId, raw: u64) -> Result<(), SimError> {
        let width = self.width(id);
        self.write(id, BitVec::from_u64(raw, width))
    }

    /// Drives a value onto a device-owned signal.
    ///
    /// Fails if the signal is testbench-owned or the value width does not
    /// match the signal width.
    pub fn drive(&mut self, id: SignalId, value: BitVec) -> Result<(), SimError> {
        let state = &self.signals[id.0 as usize];
        if state.direction != PortDirection::Output {
            return Err(SimError::NotAnOutput {
                name: state.name.clone(),
            });
        }
        self.put(id, value)
    }

    /// Drives a raw `u64` onto a device-owned signal, truncated to its width.
    pub fn drive_u64(&mut self, id: SignalId, raw: u64) -> Result<(), SimError> {
        let width = self.width(id);
        self.drive(id, BitVec::from_u64(raw, width))
    }

    fn put(&mut self, id: SignalId, value: BitVec) -> Result<(), SimError> {
        let state = &mut self.signals[id.0 as usize];
        if value.width() != state.width {
            return Err(SimError::WidthMismatch {
                name: state.name.clone(),
                actual: state.width,
                given: value.width(),
            });
        }
        state.value = value;
        Ok(())
    }

    /// Captures every signal's live value as its at-edge sample.
    ///
    /// Called once per rising edge, before the device's register update.
    pub fn sample_all(&mut self) {
        for state in self.signals.iter_mut() {
            state.sampled = state.value.clone();
        }
    }

    /// Returns the number of signals on the surface.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns true if the surface has no signals.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterates over all signals with their IDs.
    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &SignalState)> {
        self.signals
            .iter()
            .enumerate()
            .map(|(i, s)| (SignalId(i as u32), s))
    }
}
