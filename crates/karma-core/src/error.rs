//! Error types for karma operations.
//!
//! Only connection failures are fatal. Storage failures are reported and the
//! caller carries on with zero-defaulted values, and a malformed event is
//! dropped after a warning.

use thiserror::Error;

/// Result type alias for karma operations.
pub type KarmaResult<T> = Result<T, KarmaError>;

/// Main error type for all karma operations.
#[derive(Error, Debug)]
pub enum KarmaError {
    /// Transport or handshake failure. Fatal to the whole process.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading a property failed.
    #[error("Storage read error for '{key}': {message}")]
    StorageRead {
        key: String,
        message: String,
        code: ErrorCode,
    },

    /// Writing or unsetting a property failed.
    #[error("Storage write error for '{key}': {message}")]
    StorageWrite {
        key: String,
        message: String,
        code: ErrorCode,
    },

    /// An inbound event did not have the expected shape.
    #[error("Malformed event: {message}")]
    MalformedEvent { message: String, code: ErrorCode },

    /// The peer sent something we could not make sense of, or refused a request.
    #[error("Protocol error: {message}")]
    Protocol { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Connection (CONN_xxx)
    ConnInvalidEndpoint,
    ConnFailed,
    ConnHandshakeFailed,
    ConnClosed,

    // Storage (STO_xxx)
    StoReadFailed,
    StoWriteFailed,

    // Events (EVT_xxx)
    EvtMalformed,

    // Protocol (PROTO_xxx)
    ProtoInvalidFrame,
    ProtoRequestRejected,

    // Database (DB_xxx)
    DbOperationFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConnInvalidEndpoint => "CONN_001",
            ErrorCode::ConnFailed => "CONN_002",
            ErrorCode::ConnHandshakeFailed => "CONN_003",
            ErrorCode::ConnClosed => "CONN_004",
            ErrorCode::StoReadFailed => "STO_001",
            ErrorCode::StoWriteFailed => "STO_002",
            ErrorCode::EvtMalformed => "EVT_001",
            ErrorCode::ProtoInvalidFrame => "PROTO_001",
            ErrorCode::ProtoRequestRejected => "PROTO_002",
            ErrorCode::DbOperationFailed => "DB_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl KarmaError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnFailed,
            source: None,
        }
    }

    /// Create a connection error for an endpoint descriptor we cannot use.
    pub fn invalid_endpoint(endpoint: impl Into<String>) -> Self {
        Self::Connection {
            message: format!(
                "invalid endpoint '{}', expected unix:/path/to/socket or tcp:host:port",
                endpoint.into()
            ),
            code: ErrorCode::ConnInvalidEndpoint,
            source: None,
        }
    }

    /// Create a handshake error.
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnHandshakeFailed,
            source: None,
        }
    }

    /// The peer closed the connection.
    pub fn connection_closed() -> Self {
        Self::Connection {
            message: "connection closed by peer".to_string(),
            code: ErrorCode::ConnClosed,
            source: None,
        }
    }

    /// Create a storage read error.
    pub fn storage_read(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageRead {
            key: key.into(),
            message: message.into(),
            code: ErrorCode::StoReadFailed,
        }
    }

    /// Create a storage write error.
    pub fn storage_write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageWrite {
            key: key.into(),
            message: message.into(),
            code: ErrorCode::StoWriteFailed,
        }
    }

    /// Create a malformed event error.
    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
            code: ErrorCode::EvtMalformed,
        }
    }

    /// Create a protocol error for an undecodable frame.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            code: ErrorCode::ProtoInvalidFrame,
        }
    }

    /// Create a protocol error for a request the peer refused.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            code: ErrorCode::ProtoRequestRejected,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection { code, .. } => *code,
            Self::StorageRead { code, .. } => *code,
            Self::StorageWrite { code, .. } => *code,
            Self::MalformedEvent { code, .. } => *code,
            Self::Protocol { code, .. } => *code,
            Self::Database { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this error should terminate the process.
    ///
    /// IO failures on the transport surface as `Io`, and a dead socket is
    /// just as fatal as a failed handshake.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Io(_))
    }
}

impl From<rusqlite::Error> for KarmaError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_not_fatal() {
        let read = KarmaError::storage_read("karma_foo", "timeout");
        let write = KarmaError::storage_write("karma_foo", "timeout");
        assert!(!read.is_fatal());
        assert!(!write.is_fatal());
        assert_eq!(read.code(), ErrorCode::StoReadFailed);
        assert!(write.to_string().contains("karma_foo"));
    }

    #[test]
    fn test_connection_errors_are_fatal() {
        assert!(KarmaError::connection("refused").is_fatal());
        assert!(KarmaError::connection_closed().is_fatal());
        assert_eq!(
            KarmaError::invalid_endpoint("ftp:nope").code(),
            ErrorCode::ConnInvalidEndpoint
        );
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::ConnFailed.as_str(), "CONN_002");
        assert_eq!(ErrorCode::EvtMalformed.as_str(), "EVT_001");
        assert_eq!(KarmaError::Configuration("x".into()).code(), ErrorCode::Internal);
    }
}
