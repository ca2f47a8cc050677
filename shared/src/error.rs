use thiserror::Error;

use crate::{
    messages::error::{FrameError, MessageKindsError, MessageQueueError},
    serde::SerdeErr,
    transport::TransportError,
};

/// Any error raised by this crate, for callers that propagate with `?`
/// across several layers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TidewireError {
    /// MessageQueue configuration or capacity error
    #[error("Message queue error: {0}")]
    MessageQueue(#[from] MessageQueueError),

    /// Message registry error
    #[error("Message kinds error: {0}")]
    MessageKinds(#[from] MessageKindsError),

    /// Received packet could not be deframed
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Payload serialization error
    #[error("{0}")]
    Serde(#[from] SerdeErr),

    /// Connection could not be opened
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
