//! Engine error kinds.

use crate::gesture::GestureKind;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the canvas interaction engine.
///
/// Every variant signals an integration bug upstream of the engine. None of
/// them is expected during normal operation; a manipulator whose touch
/// sequence is aborted is not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Duplicate scrap identity: {0}")]
    DuplicateIdentity(Uuid),
    #[error("Collection is empty: {0}")]
    EmptyCollection(&'static str),
    #[error("Unsupported gesture: {0:?}")]
    UnsupportedGesture(GestureKind),
    #[error("Illegal lifecycle state: {0}")]
    IllegalLifecycleState(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
