//! Group composition
//!
//! A group schedules an ordered list of child tweens under one clock.
//! Sequences run children back to back (duration = sum); parallels run them
//! together (duration = max). Groups recursively propagate cancellation,
//! interruption checks, and inherited defaults; whether interrupting one
//! member cancels the whole hierarchy or merely mutes that member is decided
//! by the top-level [`ChildInterruption`] policy.

use crate::easing::Easing;
use crate::runner::TweenRunner;
use crate::tween::{
    Channels, ChildInterruption, CompletionFn, InterruptKey, Interrupter, Tween,
};
use kinetic_core::{Result, TargetHandle};

/// Composition rule for a [`GroupTween`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    /// Children run one after another.
    Sequence,
    /// Children run together.
    Parallel,
}

/// A composite tween holding an ordered list of children.
pub struct GroupTween {
    name: String,
    kind: GroupKind,
    children: Vec<Box<dyn Tween>>,
    behavior: ChildInterruption,
    default_easing: Option<Easing>,
    default_duration: Option<f32>,
    /// Sequence: index of the child currently receiving time.
    index: usize,
    /// Sequence: group time consumed by children before `index`.
    watermark: f32,
    time: f32,
    started: bool,
    complete: bool,
    canceled: bool,
    attached: bool,
    parented: bool,
    listener: Option<CompletionFn>,
}

impl GroupTween {
    fn new(kind: GroupKind) -> Self {
        Self {
            name: String::new(),
            kind,
            children: Vec::new(),
            behavior: ChildInterruption::default(),
            default_easing: None,
            default_duration: None,
            index: 0,
            watermark: 0.0,
            time: 0.0,
            started: false,
            complete: false,
            canceled: false,
            attached: false,
            parented: false,
            listener: None,
        }
    }

    /// A group whose children run one after another.
    pub fn sequence() -> Self {
        Self::new(GroupKind::Sequence)
    }

    /// A group whose children run together.
    pub fn parallel() -> Self {
        Self::new(GroupKind::Parallel)
    }

    /// Append a child. The child's configuration freezes once added.
    ///
    /// # Panics
    ///
    /// Panics if the child already belongs to a runner or another group.
    pub fn child(mut self, tween: impl Tween + 'static) -> Self {
        assert!(
            !tween.is_attached() && !tween.is_parented(),
            "child tween already belongs to a runner or group"
        );
        let mut boxed: Box<dyn Tween> = Box::new(tween);
        boxed.mark_parented();
        self.children.push(boxed);
        self
    }

    /// Policy applied when a member of this hierarchy is interrupted. Only
    /// honored on the submitted top-level group.
    pub fn with_child_interruption(mut self, behavior: ChildInterruption) -> Self {
        self.behavior = behavior;
        self
    }

    /// Easing inherited by children that don't set their own.
    pub fn with_default_easing(mut self, easing: Easing) -> Self {
        self.default_easing = Some(easing);
        self
    }

    /// Duration inherited by children that don't set their own.
    pub fn with_default_duration(mut self, seconds: f32) -> Self {
        self.default_duration = Some(seconds.max(0.0));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Listener fired once after the step on which the whole group
    /// completes. Cancellation suppresses it.
    pub fn on_complete<F>(mut self, listener: F) -> Self
    where
        F: FnOnce(&mut TweenRunner) + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn finish(&mut self, done: &mut Vec<CompletionFn>) {
        self.complete = true;
        tracing::trace!("group {:?} complete", self.name);
        if let Some(listener) = self.listener.take() {
            done.push(listener);
        }
    }

    fn advance_sequence(&mut self, to: f32, done: &mut Vec<CompletionFn>) {
        while self.index < self.children.len() {
            let local = to - self.watermark;
            let child = &mut self.children[self.index];
            let child_duration = child.duration();

            if child.is_canceled() {
                // a canceled child is delay-equivalent padding: it mutates
                // nothing but its duration must still elapse
                if local < child_duration {
                    return;
                }
            } else {
                child.advance(local, done);
                if !child.is_complete() {
                    return;
                }
            }

            self.index += 1;
            self.watermark += child_duration;
            // rounding must never push the watermark past the elapsed time
            if self.watermark > to {
                self.watermark = to;
            }
        }
        self.finish(done);
    }

    fn advance_parallel(&mut self, to: f32, done: &mut Vec<CompletionFn>) {
        for child in &mut self.children {
            if !child.is_finished() {
                child.advance(to, done);
            }
        }
        if to >= self.duration() {
            self.finish(done);
        }
    }
}

impl Tween for GroupTween {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        match self.kind {
            GroupKind::Sequence => self.children.iter().map(|c| c.duration()).sum(),
            GroupKind::Parallel => self
                .children
                .iter()
                .map(|c| c.duration())
                .fold(0.0, f32::max),
        }
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
        for child in &mut self.children {
            child.mark_attached();
        }
    }

    fn mark_parented(&mut self) {
        self.parented = true;
    }

    fn validate(&self) -> Result<()> {
        for child in &self.children {
            child.validate()?;
        }
        Ok(())
    }

    fn apply_defaults(&mut self, easing: Easing, duration: f32) {
        let easing = self.default_easing.unwrap_or(easing);
        let duration = self.default_duration.unwrap_or(duration);
        for child in &mut self.children {
            child.apply_defaults(easing, duration);
        }
    }

    fn advance(&mut self, to: f32, done: &mut Vec<CompletionFn>) {
        if self.is_finished() {
            return;
        }
        self.started = true;
        self.time = to.clamp(0.0, self.duration());
        match self.kind {
            GroupKind::Sequence => self.advance_sequence(to, done),
            GroupKind::Parallel => self.advance_parallel(to, done),
        }
    }

    fn cancel(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        for child in &mut self.children {
            child.cancel();
        }
        self.canceled = true;
        self.listener = None;
        true
    }

    fn interruption_behavior(&self) -> ChildInterruption {
        self.behavior
    }

    fn collect_interrupters(&self, path: &mut Vec<usize>, out: &mut Vec<Interrupter>) {
        match self.kind {
            GroupKind::Sequence => {
                // only the first step may contend with in-flight tweens; a
                // not-yet-reached step has no well-defined opponent
                if let Some(first) = self.children.first() {
                    path.push(0);
                    first.collect_interrupters(path, out);
                    path.pop();
                }
            }
            GroupKind::Parallel => {
                for (i, child) in self.children.iter().enumerate() {
                    path.push(i);
                    child.collect_interrupters(path, out);
                    path.pop();
                }
            }
        }
    }

    fn check_interruption(
        &mut self,
        key: &InterruptKey,
        speeds: &mut Option<Channels>,
        behavior: ChildInterruption,
    ) -> bool {
        if self.is_finished() {
            return false;
        }
        // already-passed sequence children can never again be live targets
        let from = match self.kind {
            GroupKind::Sequence => self.index,
            GroupKind::Parallel => 0,
        };
        let mut hit = false;
        for child in self.children[from..].iter_mut() {
            if child.check_interruption(key, speeds, behavior) {
                hit = true;
            }
        }
        if hit && behavior == ChildInterruption::CancelHierarchy {
            tracing::debug!("group {:?} canceled as one unit", self.name);
            self.cancel();
        }
        hit
    }

    fn cancel_for_target(&mut self, target: TargetHandle, behavior: ChildInterruption) -> bool {
        if self.is_finished() {
            return false;
        }
        let mut hit = false;
        for child in &mut self.children {
            if child.cancel_for_target(target, behavior) {
                hit = true;
            }
        }
        if hit && behavior == ChildInterruption::CancelHierarchy {
            self.cancel();
        }
        hit
    }

    fn inherit_speeds(&mut self, path: &[usize], world_speeds: &[f32]) {
        if let Some((&index, rest)) = path.split_first() {
            if let Some(child) = self.children.get_mut(index) {
                child.inherit_speeds(rest, world_speeds);
            }
        }
    }
}
