//! Packet transport consumed by the MessageQueue and the NetworkSession.
//!
//! Implementations own the socket, latency estimation and ack detection.
//! Everything here is poll based: no call blocks and nothing calls back
//! into the caller from another thread.

mod error;

use std::time::Duration;

pub use error::TransportError;

use crate::types::PacketTag;

/// Lifecycle of a transport connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Undefined,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionStatus {
    pub fn is_open(&self) -> bool {
        *self == ConnectionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        *self == ConnectionStatus::Closed
    }
}

/// One packet handed to `send_tagged`. The transport reports `tag` back
/// through `drain_acks` once the remote end has received it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReliableSubPacket {
    pub tag: PacketTag,
    pub payload: Vec<u8>,
}

impl ReliableSubPacket {
    pub fn new(tag: PacketTag, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }
}

/// A datagram connection to one remote host
pub trait Connection: Send {
    fn status(&self) -> ConnectionStatus;
    /// Sends a packet without delivery tracking
    fn send(&mut self, packet: Vec<u8>);
    /// Next received packet, if any
    fn receive(&mut self) -> Option<Vec<u8>>;
    /// Current round trip estimate
    fn latency(&self) -> Duration;
    fn close(&mut self);
}

/// A connection that can report which packets arrived
pub trait ReliableConnection: Connection {
    /// Sends each sub packet as its own datagram
    fn send_tagged(&mut self, packets: Vec<ReliableSubPacket>);
    /// Tags acknowledged since the previous call
    fn drain_acks(&mut self) -> Vec<PacketTag>;
}

/// Accepts and opens connections
pub trait NetworkService: Send {
    type Connection: ReliableConnection;

    fn set_accepting_connections(&mut self, accepting: bool);
    /// Returns a connection that arrived since the previous call, if any
    fn try_accept_connection(&mut self) -> Option<Self::Connection>;
    fn connect(&mut self, address: &str, port: u16) -> Result<Self::Connection, TransportError>;
}
