//! Concrete leaf tween kinds
//!
//! Each driver pairs a small capability trait the host implements with a
//! per-kind write-back rule (free floats, grid rounding, clamped color
//! channels). Adding a new animatable surface means implementing one trait
//! and one driver, not extending a class hierarchy. Driver types double as
//! interruption kinds: a `MoveDriver` tween and a `ScaleDriver` tween never
//! contend, even on the same target.
//!
//! Targets are held weakly; a tween never keeps a host object alive.

use crate::tween::{TargetTween, TweenDriver};
use kinetic_core::TargetHandle;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Hosts with a freely movable 2D position.
pub trait Translate2 {
    fn position(&self) -> [f32; 2];
    fn set_position(&mut self, position: [f32; 2]);
}

/// Hosts positioned on an integer grid.
pub trait GridTranslate {
    fn cell(&self) -> [i32; 2];
    fn set_cell(&mut self, cell: [i32; 2]);
}

/// Hosts with an opacity in `[0, 1]`.
pub trait Fade {
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);
}

/// Hosts with a 2D scale factor.
pub trait Scale2 {
    fn scale(&self) -> [f32; 2];
    fn set_scale(&mut self, scale: [f32; 2]);
}

/// Hosts with an RGBA color, each channel in `[0, 1]`.
pub trait Tint {
    fn color(&self) -> [f32; 4];
    fn set_color(&mut self, color: [f32; 4]);
}

macro_rules! driver_struct {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<T> {
            target: Weak<RefCell<T>>,
            handle: TargetHandle,
        }

        impl<T> $name<T> {
            pub fn new(target: &Rc<RefCell<T>>) -> Self {
                Self {
                    target: Rc::downgrade(target),
                    handle: TargetHandle::of(target),
                }
            }
        }
    };
}

driver_struct! {
    /// Animates a [`Translate2`] position.
    MoveDriver
}

driver_struct! {
    /// Animates a [`GridTranslate`] position, rounding each channel to the
    /// nearest cell on write.
    GridMoveDriver
}

driver_struct! {
    /// Animates a [`Fade`] alpha, clamped to `[0, 1]` on write.
    FadeDriver
}

driver_struct! {
    /// Animates a [`Scale2`] factor.
    ScaleDriver
}

driver_struct! {
    /// Animates a [`Tint`] color channel-wise, clamped to `[0, 1]` on
    /// write. Plain channel-space interpolation; no color-space conversion.
    TintDriver
}

impl<T: Translate2 + 'static> TweenDriver for MoveDriver<T> {
    fn channels(&self) -> usize {
        2
    }
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
    fn read(&self, out: &mut [f32]) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let p = cell.borrow().position();
                out.copy_from_slice(&p);
                true
            }
            None => false,
        }
    }
    fn apply(&mut self, channel: usize, value: f32) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let mut target = cell.borrow_mut();
                let mut p = target.position();
                p[channel] = value;
                target.set_position(p);
                true
            }
            None => false,
        }
    }
    fn target(&self) -> TargetHandle {
        self.handle
    }
}

impl<T: GridTranslate + 'static> TweenDriver for GridMoveDriver<T> {
    fn channels(&self) -> usize {
        2
    }
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
    fn read(&self, out: &mut [f32]) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let c = cell.borrow().cell();
                out[0] = c[0] as f32;
                out[1] = c[1] as f32;
                true
            }
            None => false,
        }
    }
    fn apply(&mut self, channel: usize, value: f32) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let mut target = cell.borrow_mut();
                let mut c = target.cell();
                c[channel] = value.round() as i32;
                target.set_cell(c);
                true
            }
            None => false,
        }
    }
    fn target(&self) -> TargetHandle {
        self.handle
    }
}

impl<T: Fade + 'static> TweenDriver for FadeDriver<T> {
    fn channels(&self) -> usize {
        1
    }
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
    fn read(&self, out: &mut [f32]) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                out[0] = cell.borrow().alpha();
                true
            }
            None => false,
        }
    }
    fn apply(&mut self, _channel: usize, value: f32) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                cell.borrow_mut().set_alpha(value.clamp(0.0, 1.0));
                true
            }
            None => false,
        }
    }
    fn target(&self) -> TargetHandle {
        self.handle
    }
}

impl<T: Scale2 + 'static> TweenDriver for ScaleDriver<T> {
    fn channels(&self) -> usize {
        2
    }
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
    fn read(&self, out: &mut [f32]) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let s = cell.borrow().scale();
                out.copy_from_slice(&s);
                true
            }
            None => false,
        }
    }
    fn apply(&mut self, channel: usize, value: f32) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let mut target = cell.borrow_mut();
                let mut s = target.scale();
                s[channel] = value;
                target.set_scale(s);
                true
            }
            None => false,
        }
    }
    fn target(&self) -> TargetHandle {
        self.handle
    }
}

impl<T: Tint + 'static> TweenDriver for TintDriver<T> {
    fn channels(&self) -> usize {
        4
    }
    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
    fn read(&self, out: &mut [f32]) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let c = cell.borrow().color();
                out.copy_from_slice(&c);
                true
            }
            None => false,
        }
    }
    fn apply(&mut self, channel: usize, value: f32) -> bool {
        match self.target.upgrade() {
            Some(cell) => {
                let mut target = cell.borrow_mut();
                let mut c = target.color();
                c[channel] = value.clamp(0.0, 1.0);
                target.set_color(c);
                true
            }
            None => false,
        }
    }
    fn target(&self) -> TargetHandle {
        self.handle
    }
}

/// Tween a [`Translate2`] target to `end` over `seconds`.
pub fn move_to<T: Translate2 + 'static>(
    target: &Rc<RefCell<T>>,
    end: [f32; 2],
    seconds: f32,
) -> TargetTween<MoveDriver<T>> {
    TargetTween::new(MoveDriver::new(target))
        .to(&end)
        .with_duration(seconds)
}

/// Tween a [`GridTranslate`] target to `cell` over `seconds`.
pub fn grid_move_to<T: GridTranslate + 'static>(
    target: &Rc<RefCell<T>>,
    cell: [i32; 2],
    seconds: f32,
) -> TargetTween<GridMoveDriver<T>> {
    TargetTween::new(GridMoveDriver::new(target))
        .to(&[cell[0] as f32, cell[1] as f32])
        .with_duration(seconds)
}

/// Tween a [`Fade`] target's alpha to `alpha` over `seconds`.
pub fn fade_to<T: Fade + 'static>(
    target: &Rc<RefCell<T>>,
    alpha: f32,
    seconds: f32,
) -> TargetTween<FadeDriver<T>> {
    TargetTween::new(FadeDriver::new(target))
        .to(&[alpha])
        .with_duration(seconds)
}

/// Tween a [`Scale2`] target to `scale` over `seconds`.
pub fn scale_to<T: Scale2 + 'static>(
    target: &Rc<RefCell<T>>,
    scale: [f32; 2],
    seconds: f32,
) -> TargetTween<ScaleDriver<T>> {
    TargetTween::new(ScaleDriver::new(target))
        .to(&scale)
        .with_duration(seconds)
}

/// Tween a [`Tint`] target's color to `color` over `seconds`.
pub fn tint_to<T: Tint + 'static>(
    target: &Rc<RefCell<T>>,
    color: [f32; 4],
    seconds: f32,
) -> TargetTween<TintDriver<T>> {
    TargetTween::new(TintDriver::new(target))
        .to(&color)
        .with_duration(seconds)
}
