//! Spring-based animation of widget positions and sizes.
//!
//! [`Spring`] is the pure damped-oscillator integrator. [`SpringAnimation`]
//! drives one spring from a [`FrameScheduler`], re-requesting a frame after
//! every step until the spring settles. [`Spring2D`] composes two animations
//! and reports both axes together.

use crate::scheduler::{FrameId, FrameScheduler};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

/// Fixed integration step: one frame at 60 frames per second.
pub const FRAME_DT: f64 = 1.0 / 60.0;

/// Errors from parsing spring settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpringError {
    #[error("Unknown spring preset: {0}")]
    UnknownPreset(String),
}

/// Physical parameters of a spring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    pub initial_velocity: f64,
    /// Distance to target under which the spring may settle.
    pub precision: f64,
    /// Speed under which the spring may settle.
    pub rest_delta: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 300.0,
            damping: 30.0,
            mass: 1.0,
            initial_velocity: 0.0,
            precision: 0.01,
            rest_delta: 0.001,
        }
    }
}

impl SpringConfig {
    /// Config from a preset, keeping the default mass and thresholds.
    pub fn from_preset(preset: SpringPreset) -> Self {
        let (stiffness, damping) = preset.params();
        Self {
            stiffness,
            damping,
            ..Self::default()
        }
    }
}

/// Named stiffness/damping pairs. `Default` matches [`SpringConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpringPreset {
    #[default]
    Default,
    Gentle,
    Wobbly,
    Stiff,
    Slow,
    Molasses,
    Bouncy,
    Quick,
}

impl SpringPreset {
    pub const ALL: [SpringPreset; 8] = [
        SpringPreset::Default,
        SpringPreset::Gentle,
        SpringPreset::Wobbly,
        SpringPreset::Stiff,
        SpringPreset::Slow,
        SpringPreset::Molasses,
        SpringPreset::Bouncy,
        SpringPreset::Quick,
    ];

    /// `(stiffness, damping)` for this preset.
    pub fn params(self) -> (f64, f64) {
        match self {
            SpringPreset::Default => (300.0, 30.0),
            SpringPreset::Gentle => (120.0, 14.0),
            SpringPreset::Wobbly => (180.0, 12.0),
            SpringPreset::Stiff => (210.0, 20.0),
            SpringPreset::Slow => (280.0, 60.0),
            SpringPreset::Molasses => (280.0, 120.0),
            SpringPreset::Bouncy => (400.0, 10.0),
            SpringPreset::Quick => (500.0, 40.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpringPreset::Default => "default",
            SpringPreset::Gentle => "gentle",
            SpringPreset::Wobbly => "wobbly",
            SpringPreset::Stiff => "stiff",
            SpringPreset::Slow => "slow",
            SpringPreset::Molasses => "molasses",
            SpringPreset::Bouncy => "bouncy",
            SpringPreset::Quick => "quick",
        }
    }
}

impl FromStr for SpringPreset {
    type Err = SpringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpringPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| SpringError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for SpringPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a spring still needs frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpringPhase {
    Running,
    Settled,
}

/// A damped harmonic oscillator pulling `value` toward `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    value: f64,
    velocity: f64,
    target: f64,
    config: SpringConfig,
    phase: SpringPhase,
}

impl Spring {
    /// Create a spring starting at `initial` with the configured initial velocity.
    pub fn new(initial: f64, config: SpringConfig) -> Self {
        Self {
            value: initial,
            velocity: config.initial_velocity,
            target: initial,
            config,
            phase: if config.initial_velocity == 0.0 {
                SpringPhase::Settled
            } else {
                SpringPhase::Running
            },
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    pub fn phase(&self) -> SpringPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == SpringPhase::Settled
    }

    /// Retarget the spring. Velocity is preserved.
    ///
    /// A target within `precision` of a resting spring is snapped to directly.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
        if self.at_rest() {
            self.value = target;
            self.velocity = 0.0;
            self.phase = SpringPhase::Settled;
        } else {
            self.phase = SpringPhase::Running;
        }
    }

    /// Jump to `value` and stop.
    pub fn snap_to(&mut self, value: f64) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
        self.phase = SpringPhase::Settled;
    }

    fn at_rest(&self) -> bool {
        self.velocity.abs() <= self.config.rest_delta
            && (self.target - self.value).abs() <= self.config.precision
    }

    /// Advance one fixed frame. Snaps exactly to the target once at rest.
    pub fn step(&mut self) -> SpringPhase {
        self.step_by(FRAME_DT)
    }

    /// Advance by `dt` seconds.
    pub fn step_by(&mut self, dt: f64) -> SpringPhase {
        if self.phase == SpringPhase::Settled {
            return self.phase;
        }

        let spring_force = -self.config.stiffness * (self.value - self.target);
        let damper_force = -self.config.damping * self.velocity;
        let accel = (spring_force + damper_force) / self.config.mass;
        self.velocity += accel * dt;
        self.value += self.velocity * dt;

        if self.at_rest() {
            self.value = self.target;
            self.velocity = 0.0;
            self.phase = SpringPhase::Settled;
        }
        self.phase
    }
}

type UpdateFn = Box<dyn FnMut(f64)>;

struct AnimationInner {
    spring: Spring,
    frame: Option<FrameId>,
    on_update: Option<UpdateFn>,
}

/// One spring driven by frame callbacks.
///
/// Dropping the animation cancels any outstanding frame request.
pub struct SpringAnimation {
    inner: Rc<RefCell<AnimationInner>>,
    scheduler: FrameScheduler,
}

impl fmt::Debug for SpringAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SpringAnimation")
            .field("spring", &inner.spring)
            .field("frame", &inner.frame)
            .finish()
    }
}

impl SpringAnimation {
    /// Create an animation at rest on `initial`.
    pub fn new(scheduler: &FrameScheduler, initial: f64, config: SpringConfig) -> Self {
        let animation = Self {
            inner: Rc::new(RefCell::new(AnimationInner {
                spring: Spring::new(initial, config),
                frame: None,
                on_update: None,
            })),
            scheduler: scheduler.clone(),
        };
        if !animation.inner.borrow().spring.is_settled() {
            schedule(&animation.inner, &animation.scheduler);
        }
        animation
    }

    pub fn config(&self) -> SpringConfig {
        *self.inner.borrow().spring.config()
    }

    /// Register the callback invoked with each new value.
    pub fn on_update(&self, callback: impl FnMut(f64) + 'static) {
        self.inner.borrow_mut().on_update = Some(Box::new(callback));
    }

    /// Move the target. Keeps momentum and restarts the loop if it stopped.
    pub fn set_target(&self, target: f64) {
        let (needs_frame, snapped) = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.spring.value();
            inner.spring.set_target(target);
            let settled = inner.spring.is_settled();
            let snapped = settled && inner.spring.value() != before;
            (
                !settled && inner.frame.is_none(),
                snapped.then(|| (inner.spring.value(), inner.on_update.take())),
            )
        };
        if needs_frame {
            schedule(&self.inner, &self.scheduler);
        }
        if let Some((value, Some(mut callback))) = snapped {
            callback(value);
            let mut inner = self.inner.borrow_mut();
            if inner.on_update.is_none() {
                inner.on_update = Some(callback);
            }
        }
    }

    /// Jump straight to `value` without animating.
    pub fn snap_to(&self, value: f64) {
        self.cancel();
        let mut inner = self.inner.borrow_mut();
        inner.spring.snap_to(value);
    }

    /// Cancel the pending frame. The spring keeps its current value.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.borrow_mut().frame.take() {
            self.scheduler.cancel_frame(id);
        }
    }

    pub fn value(&self) -> f64 {
        self.inner.borrow().spring.value()
    }

    pub fn velocity(&self) -> f64 {
        self.inner.borrow().spring.velocity()
    }

    pub fn target(&self) -> f64 {
        self.inner.borrow().spring.target()
    }

    pub fn phase(&self) -> SpringPhase {
        self.inner.borrow().spring.phase()
    }

    /// Check if a frame is scheduled.
    pub fn is_animating(&self) -> bool {
        self.inner.borrow().frame.is_some()
    }
}

impl Drop for SpringAnimation {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn schedule(inner: &Rc<RefCell<AnimationInner>>, scheduler: &FrameScheduler) {
    let weak = Rc::downgrade(inner);
    let next = scheduler.clone();
    let id = scheduler.request_frame(move || {
        if let Some(inner) = weak.upgrade() {
            on_frame(&inner, &next);
        }
    });
    inner.borrow_mut().frame = Some(id);
}

fn on_frame(inner: &Rc<RefCell<AnimationInner>>, scheduler: &FrameScheduler) {
    let (value, phase, callback) = {
        let mut state = inner.borrow_mut();
        state.frame = None;
        let phase = state.spring.step();
        (state.spring.value(), phase, state.on_update.take())
    };

    // The callback runs without the borrow held so it may read this animation
    if let Some(mut callback) = callback {
        callback(value);
        let mut state = inner.borrow_mut();
        if state.on_update.is_none() {
            state.on_update = Some(callback);
        }
    }

    if phase == SpringPhase::Running && inner.borrow().frame.is_none() {
        schedule(inner, scheduler);
    } else if phase == SpringPhase::Settled {
        log::trace!("Spring settled at {}", value);
    }
}

/// Two springs animating a point, reported as a pair.
pub struct Spring2D {
    x: SpringAnimation,
    y: SpringAnimation,
    latest: Rc<Cell<Point>>,
}

impl fmt::Debug for Spring2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spring2D")
            .field("value", &self.latest.get())
            .field("target", &self.target())
            .finish()
    }
}

impl Spring2D {
    /// Create a 2D animation at rest on `initial`.
    pub fn new(scheduler: &FrameScheduler, initial: Point, config: SpringConfig) -> Self {
        let spring = Self {
            x: SpringAnimation::new(scheduler, initial.x, config),
            y: SpringAnimation::new(scheduler, initial.y, config),
            latest: Rc::new(Cell::new(initial)),
        };
        spring.install(None);
        spring
    }

    /// Parameters shared by both axes.
    pub fn config(&self) -> SpringConfig {
        self.x.config()
    }

    /// Register a callback that receives both axes whenever either changes.
    pub fn on_update(&self, callback: impl FnMut(Point) + 'static) {
        self.install(Some(Rc::new(RefCell::new(callback))));
    }

    fn install(&self, callback: Option<Rc<RefCell<dyn FnMut(Point)>>>) {
        let (latest, cb) = (self.latest.clone(), callback.clone());
        self.x.on_update(move |x| {
            let p = Point::new(x, latest.get().y);
            latest.set(p);
            if let Some(cb) = &cb {
                (&mut *cb.borrow_mut())(p);
            }
        });
        let (latest, cb) = (self.latest.clone(), callback);
        self.y.on_update(move |y| {
            let p = Point::new(latest.get().x, y);
            latest.set(p);
            if let Some(cb) = &cb {
                (&mut *cb.borrow_mut())(p);
            }
        });
    }

    pub fn set_target(&self, target: Point) {
        self.x.set_target(target.x);
        self.y.set_target(target.y);
    }

    pub fn snap_to(&self, value: Point) {
        self.x.snap_to(value.x);
        self.y.snap_to(value.y);
        self.latest.set(value);
    }

    pub fn cancel(&self) {
        self.x.cancel();
        self.y.cancel();
    }

    /// The most recent pair of values.
    pub fn value(&self) -> Point {
        self.latest.get()
    }

    pub fn target(&self) -> Point {
        Point::new(self.x.target(), self.y.target())
    }

    pub fn is_animating(&self) -> bool {
        self.x.is_animating() || self.y.is_animating()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpringConfig::default();
        assert!((config.stiffness - 300.0).abs() < f64::EPSILON);
        assert!((config.damping - 30.0).abs() < f64::EPSILON);
        assert!((config.mass - 1.0).abs() < f64::EPSILON);
        assert!((config.precision - 0.01).abs() < f64::EPSILON);
        assert!((config.rest_delta - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spring_settles_exactly() {
        let mut spring = Spring::new(0.0, SpringConfig::default());
        spring.set_target(100.0);
        let mut steps = 0;
        while spring.step() == SpringPhase::Running {
            steps += 1;
            assert!(steps < 600, "spring failed to settle");
        }
        assert_eq!(spring.value(), 100.0);
        assert_eq!(spring.velocity(), 0.0);

        // No further movement after settle
        spring.step();
        assert_eq!(spring.value(), 100.0);
    }

    #[test]
    fn test_retarget_keeps_velocity() {
        let mut spring = Spring::new(0.0, SpringConfig::default());
        spring.set_target(100.0);
        for _ in 0..5 {
            spring.step();
        }
        let velocity = spring.velocity();
        assert!(velocity > 0.0);
        spring.set_target(-50.0);
        assert_eq!(spring.velocity(), velocity);
        assert_eq!(spring.phase(), SpringPhase::Running);
    }

    #[test]
    fn test_set_target_at_rest_stays_settled() {
        let mut spring = Spring::new(10.0, SpringConfig::default());
        spring.set_target(10.005);
        assert!(spring.is_settled());
        assert_eq!(spring.value(), 10.005);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("wobbly".parse::<SpringPreset>(), Ok(SpringPreset::Wobbly));
        assert_eq!(
            "springy".parse::<SpringPreset>(),
            Err(SpringError::UnknownPreset("springy".to_string()))
        );
        assert_eq!(SpringConfig::from_preset(SpringPreset::Default), SpringConfig::default());
        let config = SpringConfig::from_preset(SpringPreset::Molasses);
        assert!((config.damping - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_animation_stops_scheduling_after_settle() {
        let scheduler = FrameScheduler::new();
        let animation = SpringAnimation::new(&scheduler, 0.0, SpringConfig::default());
        let updates = Rc::new(Cell::new(0usize));
        let u = updates.clone();
        animation.on_update(move |_| u.set(u.get() + 1));

        animation.set_target(100.0);
        let frames = scheduler.run_until_idle(1000);
        assert!(frames < 1000);
        assert_eq!(animation.value(), 100.0);
        assert_eq!(updates.get(), frames);
        assert!(!animation.is_animating());
        assert_eq!(scheduler.run_frame(), 0);
    }

    #[test]
    fn test_animation_restarts_on_new_target() {
        let scheduler = FrameScheduler::new();
        let animation = SpringAnimation::new(&scheduler, 0.0, SpringConfig::default());
        animation.set_target(50.0);
        scheduler.run_until_idle(1000);
        assert!(!animation.is_animating());

        animation.set_target(80.0);
        assert!(animation.is_animating());
        scheduler.run_until_idle(1000);
        assert_eq!(animation.value(), 80.0);
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let scheduler = FrameScheduler::new();
        let animation = SpringAnimation::new(&scheduler, 0.0, SpringConfig::default());
        animation.set_target(100.0);
        scheduler.run_frame();
        assert!(scheduler.has_pending());

        drop(animation);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_spring_2d_reports_pairs() {
        let scheduler = FrameScheduler::new();
        let spring = Spring2D::new(&scheduler, Point::ZERO, SpringConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        spring.on_update(move |p| s.borrow_mut().push(p));

        spring.set_target(Point::new(100.0, 0.0));
        scheduler.run_until_idle(1000);

        assert_eq!(spring.value(), Point::new(100.0, 0.0));
        let seen = seen.borrow();
        assert!(!seen.is_empty());
        // Y never moved, so every reported pair carries y = 0
        assert!(seen.iter().all(|p| p.y == 0.0));
        assert_eq!(*seen.last().unwrap(), Point::new(100.0, 0.0));
    }
}
