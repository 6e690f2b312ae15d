//! Tween scheduler
//!
//! Owns the population of submitted top-level tweens and advances it once
//! per frame. Submission resolves interruption across the whole population:
//! a new tween cancels any running tween of the same kind on the same
//! target, and, when both sides use a blendable easing, inherits the
//! cancelled tween's instantaneous rate of change so the animated value
//! keeps a continuous first derivative.
//!
//! Completion listeners fire after the advancement pass, never interleaved
//! with it, so a listener that submits new tweens always sees a consistent
//! population.

use crate::easing::Easing;
use crate::tween::{Channels, ChildInterruption, CompletionFn, Interrupter, Tween};
use kinetic_core::{Result, TargetHandle, TweenError};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a submitted top-level tween.
    pub struct TweenId;
}

/// Configuration applied to submitted tweens that don't set their own.
///
/// Explicit runner state, not process-wide globals.
#[derive(Clone, Copy, Debug)]
pub struct RunnerDefaults {
    pub easing: Easing,
    pub duration: f32,
}

impl Default for RunnerDefaults {
    fn default() -> Self {
        Self {
            easing: Easing::Smooth,
            duration: 1.0,
        }
    }
}

/// Scheduling phase of a submitted tween.
enum Phase {
    /// Waiting out a submission delay. Interruption resolution happens on
    /// promotion, not at submission, so the target keeps its current
    /// animation until this tween actually starts.
    Pending { remaining: f32 },
    Running,
}

struct Entry {
    tween: Box<dyn Tween>,
    behavior: ChildInterruption,
    phase: Phase,
}

/// The scheduler owning all active top-level tweens.
pub struct TweenRunner {
    tweens: SlotMap<TweenId, Entry>,
    defaults: RunnerDefaults,
}

impl TweenRunner {
    pub fn new() -> Self {
        Self::with_defaults(RunnerDefaults::default())
    }

    pub fn with_defaults(defaults: RunnerDefaults) -> Self {
        Self {
            tweens: SlotMap::with_key(),
            defaults,
        }
    }

    pub fn defaults(&self) -> RunnerDefaults {
        self.defaults
    }

    /// Submit a configured tween or hierarchy.
    ///
    /// Any running tween matching one of the submission's interrupters
    /// (same concrete kind, same target) is cancelled without firing its
    /// listener; if both sides are blendable, the new tween inherits the
    /// cancelled one's per-channel world speed.
    pub fn start(&mut self, tween: impl Tween + 'static) -> Result<TweenId> {
        self.submit(Box::new(tween), 0.0)
    }

    /// Submit with a start delay, in seconds.
    ///
    /// The tween sits in a pending phase until the delay elapses inside a
    /// [`step`](Self::step); only then does it contend with running tweens.
    /// A pending tween interrupted before it starts is removed with zero
    /// speed contribution.
    pub fn start_after(&mut self, delay: f32, tween: impl Tween + 'static) -> Result<TweenId> {
        self.submit(Box::new(tween), delay.max(0.0))
    }

    fn submit(&mut self, mut tween: Box<dyn Tween>, delay: f32) -> Result<TweenId> {
        if tween.is_attached() {
            return Err(TweenError::AlreadyAttached(tween.name().to_string()));
        }
        if tween.is_parented() {
            return Err(TweenError::AlreadyParented(tween.name().to_string()));
        }
        tween.validate()?;
        tween.apply_defaults(self.defaults.easing, self.defaults.duration);
        tween.mark_attached();
        let behavior = tween.interruption_behavior();

        if delay > 0.0 {
            tracing::debug!("tween {:?} pending for {}s", tween.name(), delay);
            return Ok(self.tweens.insert(Entry {
                tween,
                behavior,
                phase: Phase::Pending { remaining: delay },
            }));
        }

        let interrupters = collect_interrupters(tween.as_ref());
        let captured = self.scan_and_cancel(None, &interrupters);
        apply_captured(tween.as_mut(), &interrupters, captured);
        self.purge_finished();

        tracing::debug!("tween {:?} started", tween.name());
        Ok(self.tweens.insert(Entry {
            tween,
            behavior,
            phase: Phase::Running,
        }))
    }

    /// Advance every submitted tween by `dt` seconds. Call exactly once per
    /// frame.
    pub fn step(&mut self, dt: f32) {
        let mut done: Vec<CompletionFn> = Vec::new();

        // free anything flagged complete/canceled on a previous pass
        self.purge_finished();

        // snapshot before promotions so a tween promoted below is not
        // advanced twice in this step
        let mut running = Vec::new();
        let mut pending = Vec::new();
        for (id, entry) in self.tweens.iter() {
            match entry.phase {
                Phase::Pending { .. } => pending.push(id),
                Phase::Running => running.push(id),
            }
        }

        for id in pending {
            let Some(entry) = self.tweens.get_mut(id) else {
                continue;
            };
            let Phase::Pending { remaining } = &mut entry.phase else {
                continue;
            };
            *remaining -= dt;
            if *remaining > 0.0 {
                continue;
            }
            let overshoot = -*remaining;
            entry.phase = Phase::Running;
            self.promote(id, overshoot, &mut done);
        }

        for id in running {
            let Some(entry) = self.tweens.get_mut(id) else {
                continue;
            };
            if entry.tween.is_finished() {
                continue;
            }
            let to = entry.tween.time() + dt;
            entry.tween.advance(to, &mut done);
        }

        // completion listeners run after the pass; submissions they make
        // land in the population for the next step
        for listener in done {
            listener(self);
        }
    }

    /// Promote a pending tween: resolve interruption against everything
    /// else, then take the delay overshoot as its first advancement.
    fn promote(&mut self, id: TweenId, overshoot: f32, done: &mut Vec<CompletionFn>) {
        let interrupters = match self.tweens.get(id) {
            Some(entry) => collect_interrupters(entry.tween.as_ref()),
            None => return,
        };
        let captured = self.scan_and_cancel(Some(id), &interrupters);
        let Some(entry) = self.tweens.get_mut(id) else {
            return;
        };
        tracing::debug!("tween {:?} promoted from pending", entry.tween.name());
        apply_captured(entry.tween.as_mut(), &interrupters, captured);
        entry.tween.advance(overshoot, done);
    }

    /// Run every interrupter against the whole population (except `skip`),
    /// cancelling matches. Returns the captured world speeds per
    /// interrupter, if any cancelled tween had started.
    fn scan_and_cancel(
        &mut self,
        skip: Option<TweenId>,
        interrupters: &[Interrupter],
    ) -> Vec<Option<Channels>> {
        let mut captured: Vec<Option<Channels>> = vec![None; interrupters.len()];
        for (slot, interrupter) in interrupters.iter().enumerate() {
            // snapshot of ids: cancellation only flags entries, the map
            // itself stays stable while we scan
            let ids: Vec<TweenId> = self.tweens.keys().collect();
            for id in ids {
                if Some(id) == skip {
                    continue;
                }
                let Some(entry) = self.tweens.get_mut(id) else {
                    continue;
                };
                let behavior = entry.behavior;
                let mut speeds = None;
                if entry
                    .tween
                    .check_interruption(&interrupter.key, &mut speeds, behavior)
                {
                    tracing::debug!(
                        "tween {:?} displaced by a new submission",
                        entry.tween.name()
                    );
                    if speeds.is_some() {
                        captured[slot] = speeds;
                    }
                }
            }
        }
        captured
    }

    /// Cancel one submission by handle. The listener is suppressed.
    /// Returns `false` if the id is unknown or the tween already finished.
    pub fn cancel(&mut self, id: TweenId) -> bool {
        match self.tweens.get_mut(id) {
            Some(entry) => entry.tween.cancel(),
            None => false,
        }
    }

    /// Emergency stop: cancel every submitted tween without firing any
    /// listener. Returns whether anything was live.
    pub fn cancel_all(&mut self) -> bool {
        let mut any = false;
        for (_, entry) in self.tweens.iter_mut() {
            if entry.tween.cancel() {
                any = true;
            }
        }
        self.tweens.clear();
        any
    }

    /// Cancel every hierarchy animating `target`, regardless of leaf kind,
    /// honoring each root's child-interruption policy. Returns `false` if
    /// no live tween was touching the target.
    pub fn cancel_for_target(&mut self, target: TargetHandle) -> bool {
        let mut any = false;
        let ids: Vec<TweenId> = self.tweens.keys().collect();
        for id in ids {
            let Some(entry) = self.tweens.get_mut(id) else {
                continue;
            };
            let behavior = entry.behavior;
            if entry.tween.cancel_for_target(target, behavior) {
                any = true;
            }
        }
        self.purge_finished();
        any
    }

    /// Number of running (promoted, unfinished) top-level tweens.
    pub fn active_count(&self) -> usize {
        self.tweens
            .values()
            .filter(|e| matches!(e.phase, Phase::Running) && !e.tween.is_finished())
            .count()
    }

    /// Number of tweens still waiting out a submission delay.
    pub fn pending_count(&self) -> usize {
        self.tweens
            .values()
            .filter(|e| matches!(e.phase, Phase::Pending { .. }) && !e.tween.is_finished())
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.active_count() == 0 && self.pending_count() == 0
    }

    fn purge_finished(&mut self) {
        self.tweens.retain(|_, entry| !entry.tween.is_finished());
    }
}

impl Default for TweenRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_interrupters(tween: &dyn Tween) -> Vec<Interrupter> {
    let mut path = Vec::new();
    let mut out = Vec::new();
    tween.collect_interrupters(&mut path, &mut out);
    out
}

fn apply_captured(
    tween: &mut dyn Tween,
    interrupters: &[Interrupter],
    captured: Vec<Option<Channels>>,
) {
    for (interrupter, speeds) in interrupters.iter().zip(captured) {
        if !interrupter.blendable {
            continue;
        }
        if let Some(speeds) = speeds {
            tween.inherit_speeds(&interrupter.path, &speeds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::{TargetTween, TweenDriver};
    use std::cell::{Cell, RefCell};
    use std::rc::{Rc, Weak};

    struct ScalarDriver {
        target: Weak<RefCell<f32>>,
        handle: TargetHandle,
    }

    impl ScalarDriver {
        fn new(target: &Rc<RefCell<f32>>) -> Self {
            Self {
                target: Rc::downgrade(target),
                handle: TargetHandle::of(target),
            }
        }
    }

    impl TweenDriver for ScalarDriver {
        fn channels(&self) -> usize {
            1
        }
        fn is_live(&self) -> bool {
            self.target.strong_count() > 0
        }
        fn read(&self, out: &mut [f32]) -> bool {
            match self.target.upgrade() {
                Some(cell) => {
                    out[0] = *cell.borrow();
                    true
                }
                None => false,
            }
        }
        fn apply(&mut self, _channel: usize, value: f32) -> bool {
            match self.target.upgrade() {
                Some(cell) => {
                    *cell.borrow_mut() = value;
                    true
                }
                None => false,
            }
        }
        fn target(&self) -> TargetHandle {
            self.handle
        }
    }

    fn scalar(target: &Rc<RefCell<f32>>, end: f32, secs: f32) -> TargetTween<ScalarDriver> {
        TargetTween::new(ScalarDriver::new(target))
            .to(&[end])
            .with_duration(secs)
            .with_easing(Easing::Linear)
    }

    #[test]
    fn test_start_and_step_to_completion() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner.start(scalar(&v, 10.0, 1.0)).unwrap();

        assert_eq!(runner.active_count(), 1);
        runner.step(0.5);
        assert!((*v.borrow() - 5.0).abs() < 1e-5);
        runner.step(0.6);
        assert_eq!(*v.borrow(), 10.0);
        assert_eq!(runner.active_count(), 0);

        // the finished entry is freed on the next step
        runner.step(0.016);
        assert!(runner.is_idle());
    }

    #[test]
    fn test_interruption_cancels_same_kind_same_target() {
        let v = Rc::new(RefCell::new(0.0));
        let fired = Rc::new(Cell::new(false));
        let fired_probe = Rc::clone(&fired);

        let mut runner = TweenRunner::new();
        runner
            .start(
                scalar(&v, 10.0, 1.0).on_complete(move |_| fired_probe.set(true)),
            )
            .unwrap();
        runner.step(0.5);

        // same kind, same target: the first tween dies silently and the
        // replacement starts from the live interpolated value
        runner.start(scalar(&v, 0.0, 1.0)).unwrap();
        assert_eq!(runner.active_count(), 1);

        runner.step(0.5);
        assert!(!fired.get(), "displaced tween's listener must not fire");
        assert!((*v.borrow() - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_no_interruption_across_targets() {
        let v = Rc::new(RefCell::new(0.0));
        let w = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner.start(scalar(&v, 10.0, 1.0)).unwrap();
        runner.start(scalar(&w, 10.0, 1.0)).unwrap();
        assert_eq!(runner.active_count(), 2);
    }

    #[test]
    fn test_exclusivity_invariant() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        for i in 0..5 {
            runner.start(scalar(&v, i as f32, 1.0)).unwrap();
            runner.step(0.05);
        }
        assert_eq!(runner.active_count(), 1);
    }

    #[test]
    fn test_velocity_blends_across_interruption() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner
            .start(scalar(&v, 10.0, 1.0).with_easing(Easing::Smooth))
            .unwrap();

        runner.step(0.5);
        // zero-endpoint quintic at midpoint: speed = 30 * 10 / 16 = 18.75/s
        let before = *v.borrow();

        runner
            .start(scalar(&v, 0.0, 2.0).with_easing(Easing::Smooth))
            .unwrap();

        // sample the replacement's initial rate of change
        let h = 1e-3;
        runner.step(h);
        let after = *v.borrow();
        let rate = (after - before) / h;
        assert!(
            (rate - 18.75).abs() < 0.1,
            "expected ~18.75 units/s, measured {rate}"
        );
    }

    #[test]
    fn test_non_blendable_interruption_starts_cold() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner
            .start(scalar(&v, 10.0, 1.0).with_easing(Easing::Smooth))
            .unwrap();
        runner.step(0.5);
        let before = *v.borrow();

        // linear replacement: no blend, constant configured speed
        runner.start(scalar(&v, 0.0, 1.0)).unwrap();
        runner.step(0.1);
        let rate = (*v.borrow() - before) / 0.1;
        assert!((rate + before).abs() < 0.2, "expected -{before}/s, got {rate}");
    }

    #[test]
    fn test_pending_delay_promotes_with_overshoot() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner.start_after(0.5, scalar(&v, 10.0, 1.0)).unwrap();

        assert_eq!(runner.pending_count(), 1);
        runner.step(0.25);
        assert_eq!(*v.borrow(), 0.0, "pending tween must not touch its target");

        // crosses the delay with 0.15s to spare
        runner.step(0.4);
        assert_eq!(runner.pending_count(), 0);
        assert_eq!(runner.active_count(), 1);
        assert!((*v.borrow() - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_pending_tween_does_not_displace_until_promoted() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner.start(scalar(&v, 10.0, 1.0)).unwrap();
        runner.start_after(0.5, scalar(&v, 0.0, 1.0)).unwrap();

        // the running tween keeps the target while the delay counts down
        runner.step(0.25);
        assert_eq!(runner.active_count(), 1);
        assert!((*v.borrow() - 2.5).abs() < 1e-4);

        // promotion displaces it
        runner.step(0.3);
        assert_eq!(runner.active_count(), 1);
        runner.step(0.0);
        assert_eq!(runner.pending_count(), 0);
    }

    #[test]
    fn test_pending_tween_can_be_interrupted_away() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner.start_after(1.0, scalar(&v, 10.0, 1.0)).unwrap();

        // an immediate submission on the same target removes the pending
        // one before it ever starts
        runner.start(scalar(&v, 5.0, 1.0)).unwrap();
        assert_eq!(runner.pending_count(), 0);
        assert_eq!(runner.active_count(), 1);

        runner.step(1.0);
        runner.step(1.0);
        assert_eq!(*v.borrow(), 5.0);
    }

    #[test]
    fn test_completion_listener_can_resubmit() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        let chained = Rc::clone(&v);
        runner
            .start(scalar(&v, 1.0, 0.5).on_complete(move |r| {
                r.start(scalar(&chained, 2.0, 0.5)).unwrap();
            }))
            .unwrap();

        runner.step(0.5);
        assert_eq!(*v.borrow(), 1.0);
        runner.step(0.5);
        assert_eq!(*v.borrow(), 2.0);
    }

    #[test]
    fn test_cancel_by_id_is_a_reportable_noop_when_stale() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        let id = runner.start(scalar(&v, 10.0, 1.0)).unwrap();

        assert!(runner.cancel(id));
        assert!(!runner.cancel(id));
        runner.step(0.016);
        assert!(!runner.cancel(id));
    }

    #[test]
    fn test_cancel_all_reports_whether_anything_was_live() {
        let v = Rc::new(RefCell::new(0.0));
        let fired = Rc::new(Cell::new(false));
        let probe = Rc::clone(&fired);

        let mut runner = TweenRunner::new();
        assert!(!runner.cancel_all());
        runner
            .start(scalar(&v, 10.0, 1.0).on_complete(move |_| probe.set(true)))
            .unwrap();
        assert!(runner.cancel_all());
        assert!(runner.is_idle());

        runner.step(1.5);
        assert!(!fired.get(), "cancel_all must not fire listeners");
    }

    #[test]
    fn test_cancel_for_target_ignores_other_targets() {
        let v = Rc::new(RefCell::new(0.0));
        let w = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner.start(scalar(&v, 10.0, 1.0)).unwrap();
        runner.start(scalar(&w, 10.0, 1.0)).unwrap();

        assert!(runner.cancel_for_target(TargetHandle::of(&v)));
        assert_eq!(runner.active_count(), 1);
        assert!(!runner.cancel_for_target(TargetHandle::of(&v)));
    }

    #[test]
    fn test_double_submission_is_rejected() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        let mut tween = scalar(&v, 10.0, 1.0);
        tween.mark_attached();
        assert!(matches!(
            runner.start(tween),
            Err(TweenError::AlreadyAttached(_))
        ));
    }

    #[test]
    fn test_dead_target_is_rejected_at_start() {
        let v = Rc::new(RefCell::new(0.0));
        let tween = scalar(&v, 10.0, 1.0);
        drop(v);
        let mut runner = TweenRunner::new();
        assert!(matches!(
            runner.start(tween),
            Err(TweenError::MissingTarget(_))
        ));
    }

    #[test]
    fn test_runner_defaults_fill_unset_config() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::with_defaults(RunnerDefaults {
            easing: Easing::Linear,
            duration: 2.0,
        });
        // no duration, no easing: everything comes from the runner
        runner
            .start(TargetTween::new(ScalarDriver::new(&v)).to(&[10.0]))
            .unwrap();
        runner.step(1.0);
        assert!((*v.borrow() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_duration_tween_completes_in_one_step() {
        let v = Rc::new(RefCell::new(0.0));
        let mut runner = TweenRunner::new();
        runner.start(scalar(&v, 7.0, 0.0)).unwrap();
        runner.step(0.016);
        assert_eq!(*v.borrow(), 7.0);
        assert_eq!(runner.active_count(), 0);
    }
}
