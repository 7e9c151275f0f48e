//! Speaker which logs its cues

use std::sync::atomic::{AtomicUsize, Ordering};

use eqpt_if::Speaker;
use log::debug;

/// Logs and counts the cues it is asked to play.
#[derive(Debug, Default)]
pub struct SimSpeaker {
    beeps: AtomicUsize,
    buzzes: AtomicUsize,
}

impl SimSpeaker {
    pub fn beeps(&self) -> usize {
        self.beeps.load(Ordering::SeqCst)
    }

    pub fn buzzes(&self) -> usize {
        self.buzzes.load(Ordering::SeqCst)
    }
}

impl Speaker for SimSpeaker {
    fn beep(&self) {
        self.beeps.fetch_add(1, Ordering::SeqCst);
        debug!("*beep*");
    }

    fn buzz(&self) {
        self.buzzes.fetch_add(1, Ordering::SeqCst);
        debug!("*buzz*");
    }
}
