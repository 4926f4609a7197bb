//! The shared clock observed by every driver and monitor task.
//!
//! A [`Clock`] is a cheap cloneable handle over a cycle counter and a
//! waker list. Tasks suspend on [`Clock::rising_edge`] futures — the only
//! suspension points in the harness — and the bench wakes them all after
//! each device edge step. Tasks never advance the clock themselves.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Debug, Default)]
struct ClockInner {
    cycle: Cell<u64>,
    waiters: RefCell<Vec<Waker>>,
}

/// A handle to the shared clock.
///
/// Clones observe the same underlying edge sequence; the counter is
/// read-only to tasks.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    inner: Rc<ClockInner>,
}

impl Clock {
    /// Creates a clock at cycle zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rising edges seen so far.
    pub fn cycle(&self) -> u64 {
        self.inner.cycle.get()
    }

    /// Returns a future that resolves at the next rising edge.
    pub fn rising_edge(&self) -> RisingEdge {
        RisingEdge {
            inner: self.inner.clone(),
            armed_at: self.inner.cycle.get(),
        }
    }

    /// Waits for the given number of rising edges.
    pub async fn edges(&self, count: u64) {
        for _ in 0..count {
            self.rising_edge().await;
        }
    }

    /// Advances the clock by one edge and wakes all edge waiters.
    ///
    /// Called by the bench after stepping the device; never by tasks.
    pub fn advance(&self) {
        self.inner.cycle.set(self.inner.cycle.get() + 1);
        let waiters = std::mem::take(&mut *self.inner.waiters.borrow_mut());
        for waker in waiters {
            waker.wake();
        }
    }
}

/// Future resolving at the first rising edge after its creation.
#[derive(Debug)]
pub struct RisingEdge {
    inner: Rc<ClockInner>,
    armed_at: u64,
}

impl Future for RisingEdge {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.inner.cycle.get() > self.armed_at {
            Poll::Ready(())
        } else {
            self.inner.waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}
