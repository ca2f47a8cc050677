use thiserror::Error;

use tidewire_shared::TransportError;

use crate::{network_session::SessionType, peer_id::PeerId};

/// Errors returned to the application by NetworkSession operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// host() or join() called on a session that is already running
    #[error("Session is already active as {session_type:?}. Call close() before hosting or joining again")]
    AlreadyActive { session_type: SessionType },

    /// Operation needs a running session
    #[error("Session is not active. Call host() or join() first")]
    NotActive,

    /// Operation is reserved to the host
    #[error("Only the host can perform this operation")]
    NotHost,

    /// Sending before the host assigned a peer id
    #[error("No peer id has been assigned yet. Wait until status() is Open before sending")]
    PeerIdUnassigned,

    /// Connection to the host could not be opened
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// A remote end broke the session protocol. The connection it came from is
/// closed; the rest of the session carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// Packet too short for a session header
    #[error("Packet is too short to hold a session header")]
    MalformedHeader,

    /// Unknown session message type
    #[error("Unknown session message type {value}")]
    UnknownMessageType { value: u8 },

    /// Control payload truncated
    #[error("Control message is truncated")]
    MalformedControl,

    /// Unknown control message type
    #[error("Unknown control message type {value}")]
    UnknownControlType { value: u8 },

    /// Sender claims an id other than the one it was assigned
    #[error("Peer {actual} claimed to be peer {claimed}")]
    SpoofedSource { claimed: i8, actual: PeerId },

    /// Source id is not a valid peer id
    #[error("Invalid source peer id {src}")]
    InvalidSource { src: i8 },

    /// Host-only control message sent by a peer
    #[error("{control} can only be sent by the host, received from peer {src}")]
    HostOnlyControl { control: &'static str, src: i8 },

    /// A peer tried to publish the state of another peer
    #[error("Peer {src} tried to set the state of peer {peer_id}")]
    ForeignPeerState { src: i8, peer_id: i8 },

    /// Peer id carried by a control message is not valid
    #[error("Control message carries invalid peer id {peer_id}")]
    InvalidPeerId { peer_id: i8 },

    /// ToMaster traffic reached a client
    #[error("Received a ToMaster packet, which only the host accepts")]
    UnexpectedToMaster,

    /// Shared data blob could not be deserialized
    #[error("Shared data blob for {target} could not be deserialized")]
    MalformedState { target: String },
}
