//! Execution callbacks and cooperative cancellation (`spec.md` §5).
//!
//! The elaborator and query engine both run as a single-threaded,
//! cooperative loop: they check for cancellation only at well-defined yield
//! points (a level boundary during elaboration, a premise-resolution step
//! during a query) rather than supporting preemptive interruption. A caller
//! driving statehorn from a UI or a server can set the shared flag from
//! another thread to ask the run to stop at its next yield point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::attack::Attack;

/// Optional progress hooks plus the shared cancellation flag for a single
/// verification run.
pub struct ExecutionCallbacks<'a> {
    on_level_start: Option<Box<dyn FnMut(usize) + 'a>>,
    on_level_end: Option<Box<dyn FnMut(usize) + 'a>>,
    on_attack_found: Option<Box<dyn FnMut(&Attack) + 'a>>,
    cancel: Arc<AtomicBool>,
}

impl<'a> ExecutionCallbacks<'a> {
    pub fn new() -> Self {
        Self {
            on_level_start: None,
            on_level_end: None,
            on_attack_found: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn on_level_start(mut self, f: impl FnMut(usize) + 'a) -> Self {
        self.on_level_start = Some(Box::new(f));
        self
    }

    pub fn on_level_end(mut self, f: impl FnMut(usize) + 'a) -> Self {
        self.on_level_end = Some(Box::new(f));
        self
    }

    pub fn on_attack_found(mut self, f: impl FnMut(&Attack) + 'a) -> Self {
        self.on_attack_found = Some(Box::new(f));
        self
    }

    /// A clone of the cancellation flag, to be shared with whatever thread
    /// or signal handler should be able to request cancellation.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn notify_level_start(&mut self, level: usize) {
        if let Some(cb) = &mut self.on_level_start {
            cb(level);
        }
    }

    pub fn notify_level_end(&mut self, level: usize) {
        if let Some(cb) = &mut self.on_level_end {
            cb(level);
        }
    }

    pub fn notify_attack_found(&mut self, attack: &Attack) {
        if let Some(cb) = &mut self.on_attack_found {
            cb(attack);
        }
    }
}

impl<'a> Default for ExecutionCallbacks<'a> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statehorn_kernel::{Event, Message};

    #[test]
    fn fresh_callbacks_are_not_cancelled() {
        let callbacks = ExecutionCallbacks::new();
        assert!(!callbacks.is_cancelled());
    }

    #[test]
    fn request_cancel_is_observed_through_the_handle() {
        let callbacks = ExecutionCallbacks::new();
        let handle = callbacks.cancel_handle();
        callbacks.request_cancel();
        assert!(handle.load(Ordering::Relaxed));
        assert!(callbacks.is_cancelled());
    }

    #[test]
    fn level_start_callback_is_invoked_with_the_level() {
        let mut seen = Vec::new();
        {
            let mut callbacks = ExecutionCallbacks::new().on_level_start(|level| seen.push(level));
            callbacks.notify_level_start(0);
            callbacks.notify_level_start(1);
        }
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn attack_found_callback_receives_the_attack() {
        let mut found = None;
        {
            let mut callbacks = ExecutionCallbacks::new().on_attack_found(|attack: &Attack| {
                found = Some(attack.clone());
            });
            let attack = Attack {
                goal: Event::Leak(Message::name("a")),
                rule_trail: vec!["r1".to_string()],
            };
            callbacks.notify_attack_found(&attack);
        }
        assert!(found.is_some());
    }
}
