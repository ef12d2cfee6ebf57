//! Error taxonomy for the client (§7 of the specification).
//!
//! Mirrors the shape of the teacher crate's `client::err::Error`: a flat
//! enum, doc comments noting recoverability, and `From` impls bridging
//! the lower-level codec/topic errors into the client-facing type.

use std::fmt;

/// The reason a connection or operation failed, surfaced on the client
/// and on individual `Subscription`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    #[default]
    NoError,
    InvalidProtocolVersion,
    IdRejected,
    ServerUnavailable,
    BadUsernameOrPassword,
    NotAuthorized,
    TransportInvalid,
    ProtocolViolation,
    UnknownError,
}

impl ErrorKind {
    /// Maps a v3/v3.1.1 CONNACK return code (1-5) to its `ErrorKind`.
    pub fn from_connack_return_code(code: u8) -> Self {
        match code {
            0 => Self::NoError,
            1 => Self::InvalidProtocolVersion,
            2 => Self::IdRejected,
            3 => Self::ServerUnavailable,
            4 => Self::BadUsernameOrPassword,
            5 => Self::NotAuthorized,
            _ => Self::UnknownError,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The error type returned by fallible client operations.
#[derive(Debug, Clone)]
pub enum Error {
    /// The transport failed to open, closed unexpectedly, or a write failed.
    ///
    /// Unrecoverable: the connection is being torn down.
    Transport(String),

    /// The peer sent a packet that violates the MQTT specification
    /// (malformed fixed header, illegal flags, unknown topic alias, ...).
    ///
    /// Unrecoverable: the connection is being torn down.
    Protocol(&'static str),

    /// CONNACK carried a non-zero reason/return code.
    ///
    /// Unrecoverable for this connection attempt.
    ConnectRejected(ErrorKind),

    /// The requested topic filter or topic name failed syntactic validation.
    ///
    /// Recoverable: no connection state was touched.
    InvalidTopicFilter,

    /// The requested quality of service is not one of 0, 1, 2.
    ///
    /// Recoverable: no connection state was touched.
    InvalidQoS,

    /// No free packet identifier could be allocated in a full cycle of
    /// `[1, 65535]`.
    ///
    /// Recoverable: no connection state was touched, publish/subscribe
    /// was rejected before reaching the wire.
    IdentifiersExhausted,

    /// The operation requires an active connection.
    ///
    /// Recoverable: no connection state was touched.
    NotConnected,

    /// A configuration property that is only mutable while `Disconnected`
    /// was set while the client was connecting or connected.
    ConfigurationLocked,

    /// A value exceeded what the variable-byte-integer / string / binary
    /// encodings can represent.
    ///
    /// Recoverable: no connection state was touched.
    TooLargeToEncode,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol violation: {msg}"),
            Self::ConnectRejected(kind) => write!(f, "connect rejected: {kind}"),
            Self::InvalidTopicFilter => write!(f, "invalid topic filter"),
            Self::InvalidQoS => write!(f, "invalid quality of service"),
            Self::IdentifiersExhausted => write!(f, "no free packet identifier"),
            Self::NotConnected => write!(f, "client is not connected"),
            Self::ConfigurationLocked => write!(f, "configuration is locked while connected"),
            Self::TooLargeToEncode => write!(f, "value too large to encode"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether the underlying network connection can still be used after
    /// this error. Mirrors `obabec_rust_mqtt::client::err::Error::is_recoverable`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidTopicFilter
                | Self::InvalidQoS
                | Self::IdentifiersExhausted
                | Self::NotConnected
                | Self::ConfigurationLocked
                | Self::TooLargeToEncode
        )
    }

    /// The `ErrorKind` to surface on `Client::error_changed` / `Subscription::state`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::TransportInvalid,
            Self::Protocol(_) => ErrorKind::ProtocolViolation,
            Self::ConnectRejected(kind) => *kind,
            _ => ErrorKind::UnknownError,
        }
    }
}

/// Errors from the wire codec, kept separate from the client-facing
/// [`Error`] so codec unit tests can assert on precise failure reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    MalformedPacket,
    ProtocolViolation,
    UnexpectedEof,
    InvalidUtf8,
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::MalformedPacket => Self::Protocol("malformed packet"),
            DecodeError::ProtocolViolation => Self::Protocol("protocol violation"),
            DecodeError::UnexpectedEof => Self::Protocol("truncated packet"),
            DecodeError::InvalidUtf8 => Self::Protocol("invalid utf-8 string"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    TooLarge,
}

impl From<EncodeError> for Error {
    fn from(_: EncodeError) -> Self {
        Self::TooLargeToEncode
    }
}
