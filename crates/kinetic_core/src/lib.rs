//! Kinetic Core Primitives
//!
//! Foundational pieces shared by the tween machinery:
//!
//! - **Errors**: the configuration-error taxonomy surfaced at submission time
//! - **Target identity**: opaque pointer-identity handles for host objects
//! - **Pooling**: a bounded free list for reusing short-lived instances

pub mod error;
pub mod pool;
pub mod target;

pub use error::{Result, TweenError};
pub use pool::{Pool, Recycle};
pub use target::TargetHandle;
