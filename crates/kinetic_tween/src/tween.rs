//! Tween state machines
//!
//! A tween converts elapsed time into values applied to an external target.
//! This module holds the object-safe [`Tween`] trait shared by leaves and
//! groups, the [`TweenDriver`] capability trait that defines a concrete leaf
//! kind, and the [`TargetTween`] leaf itself.
//!
//! Lifecycle: configured (builder methods) -> submitted (ownership moves into
//! a runner or group, configuration freezes) -> advanced every step until the
//! clock reaches the duration (complete) or the tween is cancelled. Start
//! values are captured from the live target on the *first* advancement, never
//! at submission, so a delayed tween picks up late target mutations.

use crate::easing::Easing;
use crate::runner::TweenRunner;
use kinetic_core::{Result, TargetHandle, TweenError};
use smallvec::{smallvec, SmallVec};
use std::any::TypeId;

/// Per-channel value storage for leaf tweens.
pub type Channels = SmallVec<[f32; 4]>;

/// Completion callback, fired by the runner after the advancement pass.
pub type CompletionFn = Box<dyn FnOnce(&mut TweenRunner)>;

/// How interruption of one member affects the rest of its hierarchy.
///
/// Only the setting on the submitted top-level tween is honored; the runner
/// passes it down during interruption checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChildInterruption {
    /// Cancel the whole submitted hierarchy as one unit.
    #[default]
    CancelHierarchy,
    /// Cancel only the interrupted member; siblings keep running and the
    /// muted member degrades to elapsed-time-only padding.
    MuteChild,
}

/// The identity a leaf tween contends on: concrete driver kind plus target.
///
/// Two leaves interrupt each other iff both components match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptKey {
    pub kind: TypeId,
    pub target: TargetHandle,
}

/// A leaf eligible to trigger interruption of running tweens, addressed by
/// its child-index path from the submitted root (outermost first).
#[derive(Clone, Debug)]
pub struct Interrupter {
    pub path: SmallVec<[usize; 4]>,
    pub key: InterruptKey,
    /// Whether captured speeds can be fed back into this leaf.
    pub blendable: bool,
}

/// The per-kind customization surface of a leaf tween.
///
/// A driver knows how many float channels its target exposes, how to read
/// their live values, and how to write one eased channel back. The driver's
/// concrete type is the leaf "kind" used for interruption matching, so two
/// driver types never contend even on the same target.
pub trait TweenDriver: 'static {
    /// Number of float channels, fixed for the driver's lifetime.
    fn channels(&self) -> usize;

    /// Whether the target is still alive.
    fn is_live(&self) -> bool;

    /// Capture the live value of every channel. Returns `false` if the
    /// target is gone.
    fn read(&self, out: &mut [f32]) -> bool;

    /// Write one channel back onto the target. Returns `false` if the
    /// target is gone.
    fn apply(&mut self, channel: usize, value: f32) -> bool;

    /// Identity of the target object.
    fn target(&self) -> TargetHandle;
}

/// A time-driven animation unit: a leaf interpolation or a group of them.
///
/// Advancement is absolute: `advance(to, done)` moves the tween's clock to
/// `to` seconds on its own timeline. Groups re-derive child-local times from
/// their own clock, which keeps sequence bookkeeping immune to accumulated
/// per-frame rounding.
pub trait Tween {
    /// Diagnostic name.
    fn name(&self) -> &str;

    /// Total duration in seconds. Groups derive this from their children.
    fn duration(&self) -> f32;

    /// Elapsed seconds, `0..=duration`.
    fn time(&self) -> f32;

    fn is_started(&self) -> bool;
    fn is_complete(&self) -> bool;
    fn is_canceled(&self) -> bool;

    /// Complete or canceled. The two are mutually exclusive.
    fn is_finished(&self) -> bool {
        self.is_complete() || self.is_canceled()
    }

    fn is_attached(&self) -> bool;
    fn is_parented(&self) -> bool;

    /// Flag the whole subtree as owned by a runner. Called once at submit.
    fn mark_attached(&mut self);

    /// Flag this tween as owned by a group.
    fn mark_parented(&mut self);

    /// Submission-time validation; configuration errors surface here,
    /// never from a later `step`.
    fn validate(&self) -> Result<()>;

    /// Fill in unset easing/duration from the enclosing scope. Groups
    /// substitute their own defaults before recursing.
    fn apply_defaults(&mut self, easing: Easing, duration: f32);

    /// Move the clock to `to` seconds, applying values to the target and
    /// queueing the completion listener into `done` when the clock reaches
    /// the duration.
    fn advance(&mut self, to: f32, done: &mut Vec<CompletionFn>);

    /// Cancel this tween and its subtree. Idempotent; suppresses the
    /// completion listener; a no-op after completion. Returns whether any
    /// state changed.
    fn cancel(&mut self) -> bool;

    /// The policy honored when this tween is a submitted root.
    fn interruption_behavior(&self) -> ChildInterruption {
        ChildInterruption::CancelHierarchy
    }

    /// Collect the leaves eligible to interrupt other running tweens.
    fn collect_interrupters(&self, path: &mut Vec<usize>, out: &mut Vec<Interrupter>);

    /// Cancel any live descendant matching `key`. If the match had already
    /// started, its current per-channel world speeds are written to
    /// `speeds`. Returns whether anything matched.
    fn check_interruption(
        &mut self,
        key: &InterruptKey,
        speeds: &mut Option<Channels>,
        behavior: ChildInterruption,
    ) -> bool;

    /// Cancel any live descendant animating `target`, regardless of kind.
    /// Returns whether anything matched.
    fn cancel_for_target(&mut self, target: TargetHandle, behavior: ChildInterruption) -> bool;

    /// Route inherited world speeds to the leaf at `path`.
    fn inherit_speeds(&mut self, path: &[usize], world_speeds: &[f32]);
}

/// A leaf tween: one driver, one easing, a fixed vector of float channels.
pub struct TargetTween<D: TweenDriver> {
    name: String,
    driver: D,
    start: Channels,
    end: Channels,
    easing: Option<Easing>,
    /// Duration of one cycle; `None` until defaults are resolved.
    duration: Option<f32>,
    iterations: u32,
    time: f32,
    started: bool,
    complete: bool,
    canceled: bool,
    attached: bool,
    parented: bool,
    /// Inherited start speeds in value units per unit progress, applied to
    /// the first cycle only.
    blend: Option<Channels>,
    listener: Option<CompletionFn>,
}

impl<D: TweenDriver> TargetTween<D> {
    /// Create a leaf over `driver`, ending at the target's current values
    /// until [`to`](Self::to) is called.
    pub fn new(driver: D) -> Self {
        let channels = driver.channels();
        Self {
            name: String::new(),
            driver,
            start: smallvec![0.0; channels],
            end: smallvec![0.0; channels],
            easing: None,
            duration: None,
            iterations: 1,
            time: 0.0,
            started: false,
            complete: false,
            canceled: false,
            attached: false,
            parented: false,
            blend: None,
            listener: None,
        }
    }

    /// End value per channel.
    ///
    /// # Panics
    ///
    /// Panics if `end` does not match the driver's channel count.
    pub fn to(mut self, end: &[f32]) -> Self {
        assert_eq!(
            end.len(),
            self.driver.channels(),
            "end values must match the driver's channel count"
        );
        self.end = SmallVec::from_slice(end);
        self
    }

    /// Duration of one cycle, in seconds. Negative values clamp to zero.
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds.max(0.0));
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Repeat the cycle `count` times (minimum 1). The reported duration is
    /// `cycle * count`; an inherited velocity blend applies to the first
    /// cycle only.
    pub fn with_iterations(mut self, count: u32) -> Self {
        self.iterations = count.max(1);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Listener fired once after the step on which the tween completes.
    /// Cancellation suppresses it.
    pub fn on_complete<F>(mut self, listener: F) -> Self
    where
        F: FnOnce(&mut TweenRunner) + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    fn cycle_duration(&self) -> f32 {
        self.duration.unwrap_or(0.0)
    }

    fn total_duration(&self) -> f32 {
        self.cycle_duration() * self.iterations as f32
    }

    fn resolved_easing(&self) -> Easing {
        self.easing.unwrap_or_default()
    }

    /// Cycle index and progress within it for an absolute elapsed time.
    fn cycle_progress(&self, at: f32) -> (u32, f32) {
        let cycle_d = self.cycle_duration();
        if cycle_d <= 0.0 {
            return (0, 1.0);
        }
        let cycle = ((at / cycle_d).floor() as u32).min(self.iterations - 1);
        let local = ((at - cycle as f32 * cycle_d) / cycle_d).clamp(0.0, 1.0);
        (cycle, local)
    }

    fn channel_value(&self, channel: usize, cycle: u32, t: f32) -> f32 {
        let easing = self.resolved_easing();
        match &self.blend {
            Some(speeds) if cycle == 0 && easing.is_blendable() => {
                easing.interp_blended(self.start[channel], self.end[channel], t, speeds[channel])
            }
            _ => easing.interp(self.start[channel], self.end[channel], t),
        }
    }

    /// World speed of one channel, in value units per second.
    fn channel_world_speed(&self, channel: usize, cycle: u32, t: f32) -> f32 {
        let cycle_d = self.cycle_duration();
        if cycle_d <= 0.0 {
            return 0.0;
        }
        let easing = self.resolved_easing();
        let per_progress = match &self.blend {
            Some(speeds) if cycle == 0 && easing.is_blendable() => {
                easing.speed_blended(self.start[channel], self.end[channel], t, speeds[channel])
            }
            _ => easing.speed(self.start[channel], self.end[channel], t),
        };
        per_progress / cycle_d
    }

    /// Cancel quietly: flag, drop the listener, keep the clock where it is.
    fn cancel_quiet(&mut self) {
        self.canceled = true;
        self.listener = None;
    }
}

impl<D: TweenDriver> Tween for TargetTween<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.total_duration()
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn is_canceled(&self) -> bool {
        self.canceled
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn is_parented(&self) -> bool {
        self.parented
    }

    fn mark_attached(&mut self) {
        self.attached = true;
    }

    fn mark_parented(&mut self) {
        self.parented = true;
    }

    fn validate(&self) -> Result<()> {
        if !self.driver.is_live() {
            return Err(TweenError::MissingTarget(self.name.clone()));
        }
        Ok(())
    }

    fn apply_defaults(&mut self, easing: Easing, duration: f32) {
        if self.easing.is_none() {
            self.easing = Some(easing);
        }
        if self.duration.is_none() {
            self.duration = Some(duration.max(0.0));
        }
    }

    fn advance(&mut self, to: f32, done: &mut Vec<CompletionFn>) {
        if self.is_finished() {
            return;
        }
        let total = self.total_duration();
        self.time = to.clamp(0.0, total);

        if !self.started {
            self.started = true;
            if !self.driver.read(&mut self.start) {
                tracing::debug!("tween {:?}: target gone before begin, canceling", self.name);
                self.cancel_quiet();
                return;
            }
            tracing::trace!("tween {:?} began at {:?}", self.name, &self.start[..]);
        }

        let channels = self.driver.channels();
        if to >= total {
            // land exactly on the configured end values, independent of
            // rounding in the eased steps before this one
            for channel in 0..channels {
                let end = self.end[channel];
                if !self.driver.apply(channel, end) {
                    self.cancel_quiet();
                    return;
                }
            }
            self.complete = true;
            tracing::trace!("tween {:?} complete", self.name);
            if let Some(listener) = self.listener.take() {
                done.push(listener);
            }
        } else {
            let (cycle, t) = self.cycle_progress(to);
            for channel in 0..channels {
                let value = self.channel_value(channel, cycle, t);
                if !self.driver.apply(channel, value) {
                    tracing::debug!("tween {:?}: target gone mid-flight, canceling", self.name);
                    self.cancel_quiet();
                    return;
                }
            }
        }
    }

    fn cancel(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.cancel_quiet();
        true
    }

    fn collect_interrupters(&self, path: &mut Vec<usize>, out: &mut Vec<Interrupter>) {
        out.push(Interrupter {
            path: SmallVec::from_slice(path),
            key: InterruptKey {
                kind: TypeId::of::<D>(),
                target: self.driver.target(),
            },
            blendable: self.resolved_easing().is_blendable() && self.cycle_duration() > 0.0,
        });
    }

    fn check_interruption(
        &mut self,
        key: &InterruptKey,
        speeds: &mut Option<Channels>,
        _behavior: ChildInterruption,
    ) -> bool {
        if self.is_finished() {
            return false;
        }
        if key.kind != TypeId::of::<D>() || key.target != self.driver.target() {
            return false;
        }
        if self.started && self.cycle_duration() > 0.0 {
            let (cycle, t) = self.cycle_progress(self.time);
            let channels = self.driver.channels();
            let mut captured = Channels::with_capacity(channels);
            for channel in 0..channels {
                captured.push(self.channel_world_speed(channel, cycle, t));
            }
            *speeds = Some(captured);
        }
        tracing::debug!("tween {:?} interrupted", self.name);
        self.cancel_quiet();
        true
    }

    fn cancel_for_target(&mut self, target: TargetHandle, _behavior: ChildInterruption) -> bool {
        if self.is_finished() || self.driver.target() != target {
            return false;
        }
        self.cancel_quiet();
        true
    }

    fn inherit_speeds(&mut self, path: &[usize], world_speeds: &[f32]) {
        debug_assert!(path.is_empty(), "leaf reached with a non-empty path");
        let cycle_d = self.cycle_duration();
        if !self.resolved_easing().is_blendable() || cycle_d <= 0.0 {
            return;
        }
        if world_speeds.len() != self.driver.channels() {
            return;
        }
        // scale real-world rate into this tween's progress units
        self.blend = Some(world_speeds.iter().map(|s| s * cycle_d).collect());
        tracing::trace!("tween {:?} inherited speeds {:?}", self.name, world_speeds);
    }
}
