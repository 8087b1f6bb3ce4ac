//! Raw record normalization from JSON lines to `RawRecord`
//!
//! Input lines look like:
//!
//! ```text
//! {"packet": {"status": "ok", "timestamp": 1200, "payload": ["27", "10", ...],
//!             "length": 8, "id": "4B0", "channel": 0}}
//! ```

use crate::error::RecordParseError;
use serde::Deserialize;
use serde_json::Value;

/// One received CAN message, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub status: String,
    pub timestamp: i64,
    pub payload: Vec<u8>,
    pub length: Option<u64>,
    pub identifier: String,
    pub channel: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    packet: Option<PacketFields>,
}

#[derive(Debug, Deserialize)]
struct PacketFields {
    #[serde(default)]
    status: Value,
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    payload: Option<Vec<Value>>,
    #[serde(default)]
    length: Value,
    #[serde(default)]
    id: Value,
    #[serde(default)]
    channel: Value,
}

impl RawRecord {
    /// Parse a record from one JSON line
    pub fn from_json_line(line: &str) -> Result<Self, RecordParseError> {
        let envelope: Envelope = serde_json::from_str(line.trim())?;
        let packet = envelope.packet.ok_or(RecordParseError::MissingPacket)?;

        let payload = packet
            .payload
            .unwrap_or_default()
            .iter()
            .map(parse_byte)
            .collect::<Result<Vec<u8>, _>>()?;

        Ok(Self {
            status: opaque_text(&packet.status),
            timestamp: parse_timestamp(&packet.timestamp)?,
            payload,
            length: parse_length(&packet.length),
            identifier: opaque_text(&packet.id),
            channel: opaque_text(&packet.channel),
        })
    }

    /// Build a record directly (tests, replay tooling)
    pub fn new(identifier: &str, timestamp: i64, payload: Vec<u8>) -> Self {
        Self {
            status: String::new(),
            timestamp,
            length: Some(payload.len() as u64),
            payload,
            identifier: identifier.to_string(),
            channel: String::new(),
        }
    }

    /// Payload widened for statistics
    pub fn samples(&self) -> Vec<i64> {
        self.payload.iter().map(|&b| i64::from(b)).collect()
    }
}

fn opaque_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Hex byte such as `"1F"`, `"0x1f"` or `"a"`; null or empty means zero
fn parse_byte(value: &Value) -> Result<u8, RecordParseError> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| RecordParseError::InvalidByte(n.to_string())),
        Value::String(s) => {
            let trimmed = s.trim();
            let digits = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
                .unwrap_or(trimmed);
            if digits.is_empty() {
                return Ok(0);
            }

            let padded = if digits.len() % 2 == 1 {
                format!("0{}", digits)
            } else {
                digits.to_string()
            };
            let bytes =
                hex::decode(&padded).map_err(|_| RecordParseError::InvalidByte(s.clone()))?;

            // Leading zero bytes are fine ("000A"), anything wider is not a byte
            match bytes.split_last() {
                Some((&last, rest)) if rest.iter().all(|&b| b == 0) => Ok(last),
                _ => Err(RecordParseError::InvalidByte(s.clone())),
            }
        }
        other => Err(RecordParseError::InvalidByte(other.to_string())),
    }
}

fn parse_timestamp(value: &Value) -> Result<i64, RecordParseError> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| RecordParseError::InvalidTimestamp(n.to_string())),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| RecordParseError::InvalidTimestamp(s.clone())),
        other => Err(RecordParseError::InvalidTimestamp(other.to_string())),
    }
}

fn parse_length(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wheels_line() {
        let line = r#"{"packet":{"status":"ok","timestamp":1200,"payload":["27","10","27","1A","27","0F","27","11"],"length":8,"id":"4B0","channel":1}}"#;

        let record = RawRecord::from_json_line(line).unwrap();
        assert_eq!(record.identifier, "4B0");
        assert_eq!(record.timestamp, 1200);
        assert_eq!(record.payload, vec![0x27, 0x10, 0x27, 0x1A, 0x27, 0x0F, 0x27, 0x11]);
        assert_eq!(record.length, Some(8));
        assert_eq!(record.status, "ok");
        assert_eq!(record.channel, "1");
    }

    #[test]
    fn test_empty_and_null_bytes_are_zero() {
        let line = r#"{"packet":{"timestamp":"55","payload":["", null, "0xff", "a"],"id":"433"}}"#;

        let record = RawRecord::from_json_line(line).unwrap();
        assert_eq!(record.payload, vec![0, 0, 0xFF, 0x0A]);
        assert_eq!(record.timestamp, 55);
        assert_eq!(record.status, "");
        assert_eq!(record.length, None);
    }

    #[test]
    fn test_missing_timestamp_is_zero() {
        let record = RawRecord::from_json_line(r#"{"packet":{"id":"201","payload":[]}}"#).unwrap();
        assert_eq!(record.timestamp, 0);
        assert!(record.payload.is_empty());
    }

    #[test]
    fn test_missing_packet() {
        let err = RawRecord::from_json_line(r#"{"status":"ok"}"#).unwrap_err();
        assert!(matches!(err, RecordParseError::MissingPacket));
    }

    #[test]
    fn test_malformed_json() {
        let err = RawRecord::from_json_line(r#"{"packet": {"id": "#).unwrap_err();
        assert!(matches!(err, RecordParseError::Json(_)));
    }

    #[test]
    fn test_wide_or_invalid_bytes_rejected() {
        let err = RawRecord::from_json_line(r#"{"packet":{"id":"1","payload":["1FF"]}}"#)
            .unwrap_err();
        assert!(matches!(err, RecordParseError::InvalidByte(_)));

        let err = RawRecord::from_json_line(r#"{"packet":{"id":"1","payload":["zz"]}}"#)
            .unwrap_err();
        assert!(matches!(err, RecordParseError::InvalidByte(_)));

        let record =
            RawRecord::from_json_line(r#"{"packet":{"id":"1","payload":["000A"]}}"#).unwrap();
        assert_eq!(record.payload, vec![0x0A]);
    }
}
