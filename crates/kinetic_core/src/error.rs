//! Tween configuration error types

use thiserror::Error;

/// Errors raised while validating or submitting tweens.
///
/// Every variant indicates a host bug, not a runtime condition; they are
/// returned synchronously from submission, never deferred to a later step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TweenError {
    /// The target behind a leaf tween was dropped before submission
    #[error("tween {0:?} has no live target")]
    MissingTarget(String),

    /// The tween was already submitted to a runner
    #[error("tween {0:?} is already attached")]
    AlreadyAttached(String),

    /// The tween already belongs to a group and cannot be submitted directly
    #[error("tween {0:?} already has a parent group")]
    AlreadyParented(String),
}

/// Result type for tween configuration operations
pub type Result<T> = std::result::Result<T, TweenError>;
