//! Kinetic Tween System
//!
//! Time-based tweens over host-owned targets, with a scheduler that keeps at
//! most one animation hierarchy mutating any given target at a time.
//!
//! # Features
//!
//! - **Easing**: closed-form curves with exact derivatives
//! - **Velocity blending**: an interrupting tween inherits the replaced
//!   tween's instantaneous rate of change, so motion never visibly snaps
//! - **Groups**: sequence and parallel composition with a per-hierarchy
//!   interruption policy
//! - **Scheduler**: a single `step(dt)` per frame drives the population
//!
//! # Example
//!
//! ```rust
//! use kinetic_tween::drivers::{move_to, Translate2};
//! use kinetic_tween::{Easing, TweenRunner};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! struct Sprite {
//!     position: [f32; 2],
//! }
//!
//! impl Translate2 for Sprite {
//!     fn position(&self) -> [f32; 2] {
//!         self.position
//!     }
//!     fn set_position(&mut self, position: [f32; 2]) {
//!         self.position = position;
//!     }
//! }
//!
//! let sprite = Rc::new(RefCell::new(Sprite { position: [0.0, 0.0] }));
//! let mut runner = TweenRunner::new();
//! runner
//!     .start(move_to(&sprite, [100.0, 50.0], 1.0).with_easing(Easing::Smooth))
//!     .unwrap();
//!
//! // once per frame:
//! runner.step(1.0 / 60.0);
//! ```

pub mod drivers;
pub mod easing;
pub mod group;
pub mod runner;
pub mod tween;

pub use easing::Easing;
pub use group::{GroupKind, GroupTween};
pub use runner::{RunnerDefaults, TweenId, TweenRunner};
pub use tween::{
    Channels, ChildInterruption, CompletionFn, InterruptKey, Interrupter, TargetTween, Tween,
    TweenDriver,
};
