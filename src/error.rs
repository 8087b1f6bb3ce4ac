//! Error types for transport, record parsing, decoding and statistics
//!
//! Only `TransportError` is fatal (it aborts startup). Everything else is
//! per-line or per-record: counted, logged and skipped by the pipeline.

#[derive(Debug)]
pub enum TransportError {
    /// The source could not be opened at all
    Open { source: String, reason: std::io::Error },
    Io(std::io::Error),
    /// Outbound write attempted on a replay file
    ReadOnly,
    InvalidAddress(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Open { source, reason } => {
                write!(f, "Cannot open source {}: {}", source, reason)
            }
            TransportError::Io(e) => write!(f, "Transport IO error: {}", e),
            TransportError::ReadOnly => write!(f, "Source is read-only"),
            TransportError::InvalidAddress(addr) => write!(f, "Invalid address: {}", addr),
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug)]
pub enum RecordParseError {
    Json(serde_json::Error),
    /// Valid JSON without a `packet` object
    MissingPacket,
    InvalidByte(String),
    InvalidTimestamp(String),
}

impl From<serde_json::Error> for RecordParseError {
    fn from(err: serde_json::Error) -> Self {
        RecordParseError::Json(err)
    }
}

impl std::fmt::Display for RecordParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordParseError::Json(e) => write!(f, "JSON error: {}", e),
            RecordParseError::MissingPacket => write!(f, "Record has no packet object"),
            RecordParseError::InvalidByte(v) => write!(f, "Invalid payload byte: {:?}", v),
            RecordParseError::InvalidTimestamp(v) => write!(f, "Invalid timestamp: {:?}", v),
        }
    }
}

impl std::error::Error for RecordParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    MalformedPayload {
        variant: &'static str,
        needed: usize,
        got: usize,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MalformedPayload { variant, needed, got } => write!(
                f,
                "Malformed payload for {}: needs {} bytes, got {}",
                variant, needed, got
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    ArityMismatch { expected: usize, got: usize },
    EmptyWindow { slot: usize },
    SlotOutOfRange { slot: usize, arity: usize },
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::ArityMismatch { expected, got } => {
                write!(f, "Sample has {} values, expected {}", got, expected)
            }
            StatsError::EmptyWindow { slot } => write!(f, "Window for slot {} is empty", slot),
            StatsError::SlotOutOfRange { slot, arity } => {
                write!(f, "Slot {} out of range (arity {})", slot, arity)
            }
        }
    }
}

impl std::error::Error for StatsError {}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = DecodeError::MalformedPayload {
            variant: "Doors",
            needed: 1,
            got: 0,
        };
        assert_eq!(err.to_string(), "Malformed payload for Doors: needs 1 bytes, got 0");

        let err = StatsError::ArityMismatch { expected: 8, got: 3 };
        assert_eq!(err.to_string(), "Sample has 3 values, expected 8");

        assert_eq!(TransportError::ReadOnly.to_string(), "Source is read-only");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RecordParseError = json_err.into();
        assert!(matches!(err, RecordParseError::Json(_)));
    }
}
