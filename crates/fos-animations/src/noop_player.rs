//! No-op Animation Player
//!
//! Stand-in used when animations are disabled so callers never check for a
//! missing player. Completion is still delivered asynchronously through the
//! microtask queue.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::player::{run_all, Phase, PlayerCallbacks};
use crate::{AnimationPlayer, Completion, MicrotaskQueue, PlayerCallback, PlayerPhase};

/// Player that performs no animation work
#[derive(Debug)]
pub struct NoopAnimationPlayer {
    state: Rc<RefCell<PlayerCallbacks>>,
    queue: MicrotaskQueue,
    total_time: f64,
}

impl NoopAnimationPlayer {
    /// Create a player; `duration` and `delay` are in milliseconds
    pub fn new(queue: MicrotaskQueue, duration: f64, delay: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(PlayerCallbacks::default())),
            queue,
            total_time: duration + delay,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    fn fire(state: &RefCell<PlayerCallbacks>, phase: Phase) {
        let callbacks = state.borrow_mut().take(phase);
        run_all(callbacks);
    }

    fn finish_state(state: &RefCell<PlayerCallbacks>) {
        {
            let mut s = state.borrow_mut();
            if s.finished {
                return;
            }
            s.finished = true;
        }
        Self::fire(state, Phase::Done);
    }

    fn trigger_microtask(&self) {
        let weak: Weak<RefCell<PlayerCallbacks>> = Rc::downgrade(&self.state);
        self.queue.schedule(move || {
            if let Some(state) = weak.upgrade() {
                Self::finish_state(&state);
            }
        });
    }
}

impl AnimationPlayer for NoopAnimationPlayer {
    fn on_start(&mut self, callback: PlayerCallback) {
        self.state.borrow_mut().push(Phase::Start, callback);
    }

    fn on_done(&mut self, callback: PlayerCallback) {
        self.state.borrow_mut().push(Phase::Done, callback);
    }

    fn on_destroy(&mut self, callback: PlayerCallback) {
        self.state.borrow_mut().push(Phase::Destroy, callback);
    }

    fn has_started(&self) -> bool {
        self.state.borrow().started
    }

    fn play(&mut self) {
        if !self.has_started() {
            tracing::debug!("noop player started ({}ms)", self.total_time);
            Self::fire(&self.state, Phase::Start);
            self.trigger_microtask();
        }
        self.state.borrow_mut().started = true;
    }

    fn finish(&mut self) {
        Self::finish_state(&self.state);
    }

    fn destroy(&mut self) {
        {
            let mut s = self.state.borrow_mut();
            if s.destroyed {
                return;
            }
            s.destroyed = true;
        }
        tracing::debug!("noop player destroyed");
        if !self.has_started() {
            Self::fire(&self.state, Phase::Start);
        }
        self.finish();
        Self::fire(&self.state, Phase::Destroy);
    }

    fn total_time(&self) -> f64 {
        self.total_time
    }

    fn trigger_callback(&mut self, phase: PlayerPhase) {
        Self::fire(&self.state, phase.into());
    }

    fn completion(&mut self) -> Completion {
        self.state.borrow_mut().completion()
    }
}
