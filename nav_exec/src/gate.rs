//! # Run gates
//!
//! A run gate is the pause/resume control shared between a periodic component and its callers.
//! The gate also owns the component's cycle state, so a cycle body and a pause toggle can never
//! interleave: once `set_running(false)` has returned, no cycle of that component is mid-way
//! through issuing motor commands.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Anything a periodic loop can block on while it is paused.
pub trait Pausable: Send + Sync {
    /// Block until the gate is running or the timeout elapses, returning the running state.
    fn wait_running(&self, timeout: Duration) -> bool;
}

/// A component whose run gate can be toggled from outside.
pub trait Switchable: Send + Sync {
    fn is_running(&self) -> bool;

    fn set_running(&self, running: bool);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pausable-loop control gate guarding the cycle state `T`.
#[derive(Debug, Default)]
pub struct RunGate<T> {
    inner: Mutex<Gated<T>>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct Gated<T> {
    running: bool,
    data: T,
}

/// Pauses a component for as long as it is alive, then puts it back in the state it was found in.
///
/// Restoration happens on drop, so every exit path of a procedure holding one of these resumes the
/// components it paused.
pub struct PauseScope<'a> {
    component: &'a dyn Switchable,
    was_running: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> RunGate<T> {
    pub fn new(data: T, running: bool) -> Self {
        Self {
            inner: Mutex::new(Gated { running, data }),
            changed: Condvar::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Pause or resume the gate.
    ///
    /// `on_toggle` runs inside the same critical section as the flag change, which is where a
    /// component stops its motors or clears its buffers.
    pub fn set_running<F>(&self, running: bool, on_toggle: F)
    where
        F: FnOnce(bool, &mut T),
    {
        {
            let mut gated = self.lock();
            gated.running = running;
            on_toggle(running, &mut gated.data);
        }
        self.changed.notify_all();
    }

    /// Run one cycle body if, and only if, the gate is running.
    pub fn cycle<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let ret = {
            let mut gated = self.lock();
            if !gated.running {
                return None;
            }
            f(&mut gated.data)
        };
        self.changed.notify_all();
        Some(ret)
    }

    /// Access the state regardless of the running flag, waking any waiters afterwards.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let ret = f(&mut self.lock().data);
        self.changed.notify_all();
        ret
    }

    /// Read the state regardless of the running flag.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.lock().data)
    }

    /// Block while `condition` holds on the state.
    ///
    /// With a timeout, returns `false` if the condition still held when it elapsed.
    pub fn wait_while<P>(&self, mut condition: P, timeout: Option<Duration>) -> bool
    where
        P: FnMut(&T) -> bool,
    {
        let gated = self.lock();

        match timeout {
            Some(t) => {
                let (_gated, result) = self
                    .changed
                    .wait_timeout_while(gated, t, |g| condition(&g.data))
                    .unwrap_or_else(PoisonError::into_inner);
                !result.timed_out()
            }
            None => {
                let _gated = self
                    .changed
                    .wait_while(gated, |g| condition(&g.data))
                    .unwrap_or_else(PoisonError::into_inner);
                true
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Gated<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send> Pausable for RunGate<T> {
    fn wait_running(&self, timeout: Duration) -> bool {
        let gated = self.lock();
        let (gated, _) = self
            .changed
            .wait_timeout_while(gated, timeout, |g| !g.running)
            .unwrap_or_else(PoisonError::into_inner);
        gated.running
    }
}

impl<'a> PauseScope<'a> {
    pub fn new(component: &'a dyn Switchable) -> Self {
        let was_running = component.is_running();
        component.set_running(false);

        Self {
            component,
            was_running,
        }
    }

    /// Whether the component was running when the scope was entered.
    pub fn was_running(&self) -> bool {
        self.was_running
    }
}

impl Drop for PauseScope<'_> {
    fn drop(&mut self) {
        self.component.set_running(self.was_running);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
