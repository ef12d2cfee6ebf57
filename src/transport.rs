//! The generic byte-stream transport contract (§6). The engine is generic
//! over `T: Transport` rather than a trait object, so a TCP, TLS, or
//! WebSocket binding costs nothing beyond monomorphization; this crate
//! defines the contract only; implementing a concrete transport is out of
//! scope.

use std::fmt;

/// What happened to the underlying connection, as observed by the engine
/// from the outcome of [`Transport`] calls rather than a separate callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// `open` returned successfully.
    Connected,
    /// `read` returned `0`, or any method returned an error.
    Disconnected,
}

/// A generic ordered, reliable byte stream: TCP, TLS-over-TCP, or a
/// WebSocket carrying the MQTT binary subprotocol all satisfy this.
///
/// Implementations are driven by a single engine task; none of these
/// methods need to be `Sync`, only callable from that one task in sequence.
pub trait Transport: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Establishes the underlying connection. Called once before any
    /// `write`/`read`.
    fn open(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Writes `bytes` in full or fails; partial writes are not surfaced.
    fn write(&mut self, bytes: &[u8]) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Reads at least one byte into `buf`, returning the number read.
    /// `Ok(0)` means the peer closed the connection in an orderly way.
    fn read(&mut self, buf: &mut [u8]) -> impl std::future::Future<Output = Result<usize, Self::Error>> + Send;

    /// Closes the connection. Called at most once; errors are logged, not
    /// propagated, since the connection is going away regardless.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;
}

/// Adapts any `Transport::Error` into the client's [`crate::error::Error`],
/// carrying just the message: the engine doesn't need to distinguish
/// transport implementations, only that the transport failed.
pub(crate) fn map_transport_error<E: fmt::Display>(e: E) -> crate::error::Error {
    crate::error::Error::Transport(e.to_string())
}
