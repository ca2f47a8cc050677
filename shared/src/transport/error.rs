use thiserror::Error;

/// Errors raised when opening a transport connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Remote end exists but does not accept connections right now
    #[error("Connection to {address}:{port} was refused. The remote host is not accepting connections")]
    ConnectionRefused { address: String, port: u16 },

    /// Nothing listens at the given address
    #[error("No host is listening at {address}:{port}")]
    Unreachable { address: String, port: u16 },
}
