//! # Tidewire Session
//! Host/client sessions over a tidewire transport: peer id assignment,
//! relaying of peer traffic through the host and replication of shared data
//! via a small control protocol.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod control;
mod control_outbox;
mod error;
mod header;
mod network_session;
mod peer;
mod peer_id;
mod session_config;
mod shared_data;

pub use control::ControlMessage;
pub use control_outbox::{ControlOutbox, ControlSlot};
pub use error::{ProtocolViolation, SessionError};
pub use header::{SessionHeader, SessionMessageType, SESSION_HEADER_SIZE};
pub use network_session::{InboundSessionPacket, NetworkSession, SessionType};
pub use peer_id::PeerId;
pub use session_config::{SessionConfig, HOST_COUNTS_AS_CLIENT};
pub use shared_data::{SharedData, SharedDataFactory};
