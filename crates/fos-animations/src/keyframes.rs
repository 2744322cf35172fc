//! Keyframes Driver
//!
//! Timeline-based players built from keyframes, with styles carried over from
//! players that are still running on the same element.

use fos_dom::{DomTree, NodeId};

use crate::driver::validate_style_property;
use crate::player::{run_all, Phase, PlayerCallbacks};
use crate::{
    AnimationDriver, AnimationError, AnimationPlayer, Completion, Keyframe, PlayerCallback,
    PlayerPhase, StyleMap, Timing,
};

/// Placeholder for a style the element has no value for
pub const AUTO_STYLE: &str = "*";

/// How styles apply outside the active interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Both,
    Forwards,
}

/// Options a timeline player was created with
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    pub duration: f64,
    pub delay: f64,
    pub fill: Fill,
    pub easing: Option<String>,
}

/// Keyframes driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Native timeline support. Without it, players use the keyframe fallback
    /// unless scrubbing is requested.
    pub native_timeline: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            native_timeline: true,
        }
    }
}

/// Previous styles only carry over when the new animation starts immediately
pub fn allow_previous_player_styles_merge(duration: f64, delay: f64) -> bool {
    duration == 0.0 || delay == 0.0
}

/// Merge previous styles into the first keyframe; properties the first keyframe
/// lacked are filled with `resolve(prop)` in every later keyframe.
pub fn balance_previous_styles_into_keyframes(
    mut keyframes: Vec<Keyframe>,
    previous_styles: &StyleMap,
    resolve: impl Fn(&str) -> String,
) -> Vec<Keyframe> {
    let Some((first, rest)) = keyframes.split_first_mut() else {
        return keyframes;
    };
    if previous_styles.is_empty() {
        return keyframes;
    }
    let mut missing = Vec::new();
    for (prop, value) in previous_styles {
        if !first.styles.contains_key(prop) {
            missing.push(prop.clone());
        }
        first.styles.insert(prop.clone(), value.clone());
    }
    let resolved: Vec<(String, String)> = missing
        .into_iter()
        .map(|prop| {
            let value = resolve(&prop);
            (prop, value)
        })
        .collect();
    for keyframe in rest {
        for (prop, value) in &resolved {
            keyframe.styles.insert(prop.clone(), value.clone());
        }
    }
    keyframes
}

/// Driver producing [`TimelinePlayer`]s
#[derive(Debug, Clone, Default)]
pub struct KeyframesDriver {
    config: DriverConfig,
}

impl KeyframesDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }
}

impl AnimationDriver for KeyframesDriver {
    fn animate(
        &self,
        tree: &DomTree,
        element: NodeId,
        keyframes: Vec<Keyframe>,
        timing: Timing,
        previous_players: &[&dyn AnimationPlayer],
        scrubber_access_requested: bool,
    ) -> Result<Box<dyn AnimationPlayer>, AnimationError> {
        if let Some(prop) = keyframes
            .iter()
            .flat_map(|kf| kf.styles.keys())
            .find(|prop| !validate_style_property(prop))
        {
            return Err(AnimationError::InvalidStyleProperty(prop.clone()));
        }

        let easing = timing.easing.filter(|e| !e.is_empty());
        if !scrubber_access_requested && !self.config.native_timeline {
            tracing::debug!("keyframe fallback animation for {:?}", element);
            let options = PlayerOptions {
                duration: timing.duration,
                delay: timing.delay,
                fill: Fill::Both,
                easing,
            };
            return Ok(Box::new(TimelinePlayer::new(element, keyframes, options)));
        }

        let fill = if timing.delay == 0.0 { Fill::Both } else { Fill::Forwards };
        let mut previous_styles = StyleMap::new();
        if allow_previous_player_styles_merge(timing.duration, timing.delay) {
            for player in previous_players {
                previous_styles.extend(player.current_snapshot());
            }
        }
        // Unset styles stay as the auto placeholder
        let keyframes = balance_previous_styles_into_keyframes(keyframes, &previous_styles, |prop| {
            self.compute_style(tree, element, prop, AUTO_STYLE)
        });
        tracing::debug!(
            "timeline animation for {:?}: {} keyframes, {} carried styles",
            element,
            keyframes.len(),
            previous_styles.len()
        );
        let options = PlayerOptions {
            duration: timing.duration,
            delay: timing.delay,
            fill,
            easing,
        };
        Ok(Box::new(TimelinePlayer::new(element, keyframes, options)))
    }
}

/// Player stepping through keyframes as time advances
#[derive(Debug)]
pub struct TimelinePlayer {
    element: NodeId,
    keyframes: Vec<Keyframe>,
    options: PlayerOptions,
    elapsed: f64,
    paused: bool,
    callbacks: PlayerCallbacks,
}

impl TimelinePlayer {
    pub fn new(element: NodeId, keyframes: Vec<Keyframe>, options: PlayerOptions) -> Self {
        Self {
            element,
            keyframes,
            options,
            elapsed: 0.0,
            paused: false,
            callbacks: PlayerCallbacks::default(),
        }
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Advance the timeline by `ms`; finishes once the total time has elapsed
    pub fn advance(&mut self, ms: f64) {
        if !self.callbacks.started || self.paused || self.callbacks.finished {
            return;
        }
        self.elapsed += ms;
        if self.elapsed >= self.total_time() {
            self.finish();
        }
    }

    fn fire(&mut self, phase: Phase) {
        run_all(self.callbacks.take(phase));
    }

    fn fire_start(&mut self) {
        self.fire(Phase::Start);
    }
}

impl AnimationPlayer for TimelinePlayer {
    fn on_start(&mut self, callback: PlayerCallback) {
        self.callbacks.push(Phase::Start, callback);
    }

    fn on_done(&mut self, callback: PlayerCallback) {
        self.callbacks.push(Phase::Done, callback);
    }

    fn on_destroy(&mut self, callback: PlayerCallback) {
        self.callbacks.push(Phase::Destroy, callback);
    }

    fn has_started(&self) -> bool {
        self.callbacks.started
    }

    fn play(&mut self) {
        if !self.has_started() {
            self.fire_start();
            self.callbacks.started = true;
        }
        self.paused = false;
        if self.total_time() == 0.0 {
            self.finish();
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn restart(&mut self) {
        self.elapsed = 0.0;
        self.callbacks.finished = false;
        self.play();
    }

    fn finish(&mut self) {
        if self.callbacks.finished {
            return;
        }
        self.callbacks.finished = true;
        self.elapsed = self.total_time();
        self.fire(Phase::Done);
    }

    fn destroy(&mut self) {
        if self.callbacks.destroyed {
            return;
        }
        self.callbacks.destroyed = true;
        if !self.has_started() {
            self.fire_start();
        }
        self.finish();
        self.fire(Phase::Destroy);
    }

    fn reset(&mut self) {
        self.elapsed = 0.0;
        self.paused = false;
        self.callbacks.started = false;
        self.callbacks.finished = false;
        self.callbacks.destroyed = false;
    }

    fn set_position(&mut self, position: f64) {
        let position = position.clamp(0.0, 1.0);
        self.elapsed = self.options.delay + position * self.options.duration;
    }

    fn position(&self) -> f64 {
        if self.options.duration <= 0.0 {
            return if self.elapsed >= self.options.delay { 1.0 } else { 0.0 };
        }
        ((self.elapsed - self.options.delay) / self.options.duration).clamp(0.0, 1.0)
    }

    fn total_time(&self) -> f64 {
        self.options.duration + self.options.delay
    }

    /// Styles of every keyframe reached so far, later keyframes winning
    fn current_snapshot(&self) -> StyleMap {
        if self.callbacks.destroyed {
            return StyleMap::new();
        }
        let position = self.position();
        let mut snapshot = StyleMap::new();
        for keyframe in self.keyframes.iter().filter(|kf| kf.offset <= position) {
            snapshot.extend(keyframe.styles.clone());
        }
        snapshot
    }

    fn trigger_callback(&mut self, phase: PlayerPhase) {
        self.fire(phase.into());
    }

    fn completion(&mut self) -> Completion {
        self.callbacks.completion()
    }
}
