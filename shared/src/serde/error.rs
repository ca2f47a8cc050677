use thiserror::Error;

/// Returned when a reader runs out of bytes or meets a value it cannot
/// represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Serde error: buffer truncated or value out of range")]
pub struct SerdeErr;
