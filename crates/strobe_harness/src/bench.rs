//! The test bench: device ownership, task scheduling, and edge stepping.
//!
//! A [`Bench`] owns the device under test, the shared [`Clock`], and a
//! single-threaded task pool. [`Bench::run_until`] alternates between
//! running every task to its next suspension point and advancing the
//! device through one rising edge, so all tasks make progress strictly at
//! edge boundaries with no polling in between. A cycle watchdog bounds
//! every run.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::RemoteHandle;
use futures::task::LocalSpawnExt;
use strobe_common::BitVec;
use strobe_sim::{step_edge, Device, SignalId, WaveformRecorder};

use crate::binding::StreamBinding;
use crate::clock::Clock;
use crate::driver::StreamDriver;
use crate::error::HarnessError;
use crate::monitor::StreamMonitor;

/// Default cycle budget for a bench run.
pub const DEFAULT_MAX_CYCLES: u64 = 10_000;

/// Spawns a future onto a bench spawner, returning a join handle.
pub fn spawn_task<T: 'static>(
    spawner: &LocalSpawner,
    future: impl Future<Output = T> + 'static,
) -> Result<RemoteHandle<T>, HarnessError> {
    spawner
        .spawn_local_with_handle(future)
        .map_err(|_| HarnessError::Spawn)
}

/// A device under test plus the scheduling machinery to exercise it.
pub struct Bench {
    pool: LocalPool,
    spawner: LocalSpawner,
    clock: Clock,
    dut: Rc<RefCell<dyn Device>>,
    recorder: Option<Box<dyn WaveformRecorder>>,
    last_recorded: Vec<BitVec>,
    max_cycles: u64,
}

impl Bench {
    /// Creates a bench around the given device.
    pub fn new(device: impl Device + 'static) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool,
            spawner,
            clock: Clock::new(),
            dut: Rc::new(RefCell::new(device)),
            recorder: None,
            last_recorded: Vec::new(),
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }

    /// Sets the watchdog cycle budget for subsequent runs.
    pub fn set_max_cycles(&mut self, cycles: u64) {
        self.max_cycles = cycles;
    }

    /// Returns a handle to the shared clock.
    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    /// Returns a shared handle to the device under test.
    pub fn device(&self) -> Rc<RefCell<dyn Device>> {
        self.dut.clone()
    }

    /// Returns a cloneable spawner for launching tasks from inside a run.
    pub fn spawner(&self) -> LocalSpawner {
        self.spawner.clone()
    }

    /// Returns the number of rising edges run so far.
    pub fn cycles(&self) -> u64 {
        self.clock.cycle()
    }

    /// Resolves a signal by name.
    pub fn lookup(&self, name: &str) -> Result<SignalId, HarnessError> {
        self.dut
            .borrow()
            .surface()
            .lookup(name)
            .ok_or_else(|| HarnessError::MissingSignal {
                name: name.to_string(),
            })
    }

    /// Writes a raw value to a testbench-owned signal.
    pub fn write_u64(&self, id: SignalId, raw: u64) -> Result<(), HarnessError> {
        self.dut
            .borrow_mut()
            .surface_mut()
            .write_u64(id, raw)
            .map_err(Into::into)
    }

    /// Binds a stream interface and returns a driver for it.
    pub fn stream_driver(
        &self,
        prefix: &str,
        deadline: u64,
    ) -> Result<StreamDriver, HarnessError> {
        let binding = StreamBinding::bind(self.dut.borrow().surface(), prefix)?;
        Ok(StreamDriver::new(
            self.device(),
            self.clock(),
            binding,
            deadline,
        ))
    }

    /// Binds a stream interface and returns a monitor for it.
    pub fn stream_monitor(
        &self,
        prefix: &str,
        deadline: u64,
    ) -> Result<StreamMonitor, HarnessError> {
        let binding = StreamBinding::bind(self.dut.borrow().surface(), prefix)?;
        Ok(StreamMonitor::new(
            self.device(),
            self.clock(),
            binding,
            deadline,
        ))
    }

    /// Spawns a concurrent task, returning a handle to join it with.
    pub fn spawn<T: 'static>(
        &self,
        future: impl Future<Output = T> + 'static,
    ) -> Result<RemoteHandle<T>, HarnessError> {
        spawn_task(&self.spawner, future)
    }

    /// Attaches a waveform recorder and dumps the initial signal values.
    ///
    /// Recording is observational only; it does not alter edge scheduling.
    pub fn record_waveform(
        &mut self,
        mut recorder: Box<dyn WaveformRecorder>,
    ) -> Result<(), HarnessError> {
        {
            let dut = self.dut.borrow();
            let surface = dut.surface();
            recorder.begin_scope("dut")?;
            for (id, state) in surface.iter() {
                recorder.register_signal(id, &state.name, state.width)?;
            }
            recorder.end_scope()?;
            self.last_recorded.clear();
            for (id, state) in surface.iter() {
                recorder.record_change(0, id, &state.value)?;
                self.last_recorded.push(state.value.clone());
            }
        }
        self.recorder = Some(recorder);
        Ok(())
    }

    /// Drives the bench until the given future completes.
    ///
    /// Each iteration runs every task to its next suspension point, then
    /// advances the device through one rising edge and wakes the edge
    /// waiters. Returns a watchdog error if the future has not completed
    /// within the cycle budget.
    pub fn run_until<T: 'static>(
        &mut self,
        future: impl Future<Output = T> + 'static,
    ) -> Result<T, HarnessError> {
        let slot: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        {
            let slot = slot.clone();
            self.spawner
                .spawn_local(async move {
                    *slot.borrow_mut() = Some(future.await);
                })
                .map_err(|_| HarnessError::Spawn)?;
        }

        let result = loop {
            self.pool.run_until_stalled();
            if let Some(value) = slot.borrow_mut().take() {
                break Ok(value);
            }
            if self.clock.cycle() >= self.max_cycles {
                break Err(HarnessError::Watchdog {
                    cycles: self.max_cycles,
                });
            }
            if let Err(err) = self.advance_edge() {
                break Err(err);
            }
        };

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.finalize()?;
        }
        result
    }

    /// Steps the device through one rising edge and wakes edge waiters.
    fn advance_edge(&mut self) -> Result<(), HarnessError> {
        {
            let mut dut = self.dut.borrow_mut();
            step_edge(&mut *dut)?;
        }
        self.clock.advance();
        log::trace!("rising edge {}", self.clock.cycle());
        self.record_changes()
    }

    /// Records post-edge value changes for the attached recorder, if any.
    fn record_changes(&mut self) -> Result<(), HarnessError> {
        let Some(recorder) = self.recorder.as_mut() else {
            return Ok(());
        };
        let cycle = self.clock.cycle();
        let dut = self.dut.borrow();
        let surface = dut.surface();
        let last = &mut self.last_recorded;
        for (index, (id, state)) in surface.iter().enumerate() {
            if last.get(index) != Some(&state.value) {
                recorder.record_change(cycle, id, &state.value)?;
                last[index] = state.value.clone();
            }
        }
        Ok(())
    }
}
