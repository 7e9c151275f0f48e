//! # Periodic task scheduling
//!
//! Every periodic component runs as an unbounded loop on its own scoped thread with a fixed
//! target period. A cycle that overruns its period is followed immediately by the next one, there
//! is no catch-up and no cycle is skipped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use log::{info, trace};

use crate::gate::Pausable;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A component executed periodically by the scheduler.
pub trait PeriodicTask: Send + Sync {
    /// Name used in log messages and as the thread name.
    fn name(&self) -> &'static str;

    /// Target period between the start of two cycles.
    fn period(&self) -> Duration;

    /// The component's pause gate, or `None` if it runs unconditionally.
    fn gate(&self) -> Option<&dyn Pausable>;

    /// Execute one cycle.
    fn step(&self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Request for all periodic loops to exit.
#[derive(Debug, Default)]
pub struct ShutdownFlag(AtomicBool);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ShutdownFlag {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Spawn the task's loop on a thread of the given scope.
pub fn spawn<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    task: &'env dyn PeriodicTask,
    shutdown: &'env ShutdownFlag,
) -> ScopedJoinHandle<'scope, ()> {
    thread::Builder::new()
        .name(task.name().to_string())
        .spawn_scoped(scope, move || run(task, shutdown))
        // Only fails if the OS refuses to create a thread, nothing sensible to recover into
        .unwrap_or_else(|e| panic!("Cannot spawn the {} loop: {}", task.name(), e))
}

/// Run the task's loop on the calling thread until shutdown is requested.
pub fn run(task: &dyn PeriodicTask, shutdown: &ShutdownFlag) {
    let period = task.period();

    info!("{} loop started (period {:?})", task.name(), period);

    while !shutdown.is_requested() {
        // Paused tasks sleep on their gate, waking at least once a period to check for shutdown
        if let Some(gate) = task.gate() {
            if !gate.wait_running(period) {
                continue;
            }
        }

        let cycle_start = Instant::now();

        task.step();

        let elapsed = cycle_start.elapsed();
        if elapsed < period {
            thread::sleep(period - elapsed);
        } else {
            trace!(
                "{} cycle overran: {:?} (period {:?})",
                task.name(),
                elapsed,
                period
            );
        }
    }

    info!("{} loop stopped", task.name());
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
