//! Target identity
//!
//! Tweens mutate host-owned objects. Interruption matching needs "same
//! object" semantics, so targets are identified by the address of their
//! shared allocation and never by structural equality.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Opaque identity of an animation target.
///
/// Obtained from the `Rc` the host keeps its object behind. Two handles
/// compare equal iff they were taken from the same allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TargetHandle(usize);

impl TargetHandle {
    /// Identity of a shared target.
    pub fn of<T>(target: &Rc<RefCell<T>>) -> Self {
        Self(Rc::as_ptr(target) as usize)
    }

    /// Identity of a weakly-held target.
    ///
    /// The address stays stable after the target is dropped, so matching
    /// against tweens whose target died keeps working.
    pub fn of_weak<T>(target: &Weak<RefCell<T>>) -> Self {
        Self(Weak::as_ptr(target) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_allocation_same_handle() {
        let a = Rc::new(RefCell::new(1.0f32));
        let b = Rc::clone(&a);
        assert_eq!(TargetHandle::of(&a), TargetHandle::of(&b));
    }

    #[test]
    fn test_distinct_allocations_differ() {
        let a = Rc::new(RefCell::new(1.0f32));
        let b = Rc::new(RefCell::new(1.0f32));
        assert_ne!(TargetHandle::of(&a), TargetHandle::of(&b));
    }

    #[test]
    fn test_weak_handle_matches_strong() {
        let a = Rc::new(RefCell::new(0u32));
        let w = Rc::downgrade(&a);
        assert_eq!(TargetHandle::of(&a), TargetHandle::of_weak(&w));
    }

    #[test]
    fn test_weak_handle_survives_drop() {
        let a = Rc::new(RefCell::new(0u32));
        let handle = TargetHandle::of(&a);
        let w = Rc::downgrade(&a);
        drop(a);
        assert_eq!(handle, TargetHandle::of_weak(&w));
    }
}
