//! Animation Player
//!
//! The player contract shared by real and no-op players, plus the callback
//! bookkeeping both use.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Computed styles keyed by property name
pub type StyleMap = BTreeMap<String, String>;

/// Player callback
pub type PlayerCallback = Box<dyn FnOnce()>;

/// Callback phase for [`AnimationPlayer::trigger_callback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Start,
    Done,
}

/// Programmatic controller for a running animation
pub trait AnimationPlayer {
    /// Register a callback fired once when the animation starts
    fn on_start(&mut self, callback: PlayerCallback);
    /// Register a callback fired once when the animation is done
    fn on_done(&mut self, callback: PlayerCallback);
    /// Register a callback fired once when the player is destroyed
    fn on_destroy(&mut self, callback: PlayerCallback);

    fn init(&mut self) {}
    fn has_started(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self) {}
    fn restart(&mut self) {}
    fn finish(&mut self);
    /// Tear the player down. Idempotent.
    fn destroy(&mut self);
    fn reset(&mut self) {}
    fn set_position(&mut self, _position: f64) {}
    fn position(&self) -> f64 {
        0.0
    }

    /// Duration plus delay, in milliseconds
    fn total_time(&self) -> f64;

    /// Styles the animation currently applies
    fn current_snapshot(&self) -> StyleMap {
        StyleMap::new()
    }

    /// Fire and clear the callbacks of a phase without changing player state
    fn trigger_callback(&mut self, phase: PlayerPhase);

    /// Future resolving to `true` once the done callbacks have fired, or `false`
    /// if the player is dropped before finishing
    fn completion(&mut self) -> Completion;
}

/// Uniform asynchronous completion of a player
pub type Completion = Pin<Box<dyn Future<Output = bool>>>;

/// Callback lists and lifecycle flags
#[derive(Default)]
pub(crate) struct PlayerCallbacks {
    on_start: Vec<PlayerCallback>,
    on_done: Vec<PlayerCallback>,
    on_destroy: Vec<PlayerCallback>,
    pub(crate) started: bool,
    pub(crate) finished: bool,
    pub(crate) destroyed: bool,
}

impl PlayerCallbacks {
    pub(crate) fn push(&mut self, phase: Phase, callback: PlayerCallback) {
        match phase {
            Phase::Start => self.on_start.push(callback),
            Phase::Done => self.on_done.push(callback),
            Phase::Destroy => self.on_destroy.push(callback),
        }
    }

    /// Completion future; resolves immediately when already finished
    pub(crate) fn completion(&mut self) -> Completion {
        if self.finished {
            return Box::pin(async { true });
        }
        let (tx, rx) = smol::channel::bounded::<()>(1);
        self.on_done.push(Box::new(move || {
            let _ = tx.try_send(());
        }));
        Box::pin(async move { rx.recv().await.is_ok() })
    }

    /// Take a callback list, leaving it empty
    pub(crate) fn take(&mut self, phase: Phase) -> Vec<PlayerCallback> {
        match phase {
            Phase::Start => std::mem::take(&mut self.on_start),
            Phase::Done => std::mem::take(&mut self.on_done),
            Phase::Destroy => std::mem::take(&mut self.on_destroy),
        }
    }
}

impl fmt::Debug for PlayerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerCallbacks")
            .field("on_start", &self.on_start.len())
            .field("on_done", &self.on_done.len())
            .field("on_destroy", &self.on_destroy.len())
            .field("started", &self.started)
            .field("finished", &self.finished)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Start,
    Done,
    Destroy,
}

impl From<PlayerPhase> for Phase {
    fn from(phase: PlayerPhase) -> Self {
        match phase {
            PlayerPhase::Start => Phase::Start,
            PlayerPhase::Done => Phase::Done,
        }
    }
}

/// Run callbacks outside of any borrow of their owner
pub(crate) fn run_all(callbacks: Vec<PlayerCallback>) {
    for callback in callbacks {
        callback();
    }
}
