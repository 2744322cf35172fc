//! fOS Animations
//!
//! Animation players and drivers for the view engine.
//!
//! Every player honors the same asynchronous completion contract: done
//! callbacks (and [`AnimationPlayer::completion`]) fire after the work is
//! finished, even when no animation runs at all.

mod driver;
mod keyframes;
mod noop_player;
mod player;
mod scheduler;

pub use driver::{validate_style_property, AnimationDriver, Keyframe, NoopAnimationDriver, Timing};
pub use keyframes::{
    allow_previous_player_styles_merge, balance_previous_styles_into_keyframes, DriverConfig,
    Fill, KeyframesDriver, PlayerOptions, TimelinePlayer, AUTO_STYLE,
};
pub use noop_player::NoopAnimationPlayer;
pub use player::{AnimationPlayer, Completion, PlayerCallback, PlayerPhase, StyleMap};
pub use scheduler::{Microtask, MicrotaskQueue};

/// Animation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("invalid style property: {0}")]
    InvalidStyleProperty(String),
}
