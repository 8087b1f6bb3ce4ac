//! Decoding strategies keyed by CAN identifier
//!
//! Each variant is a pure function of the raw record. It reports the typed
//! fields it recognised plus the payload positions it claimed; everything it
//! did not claim stays in the record's residual, in original order.

use super::normalizer::RawRecord;
use crate::error::DecodeError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderVariant {
    Wheels,
    Doors,
    Odometer,
    EngineGas,
    Compass,
    /// Bound to any identifier without a dedicated decoder
    Generic,
}

impl DecoderVariant {
    /// Variants with a fixed identifier
    pub const KNOWN: [DecoderVariant; 5] = [
        DecoderVariant::Wheels,
        DecoderVariant::Doors,
        DecoderVariant::Odometer,
        DecoderVariant::EngineGas,
        DecoderVariant::Compass,
    ];

    pub fn for_identifier(identifier: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|variant| variant.identifier() == Some(identifier))
            .unwrap_or(DecoderVariant::Generic)
    }

    pub fn identifier(&self) -> Option<&'static str> {
        match self {
            DecoderVariant::Wheels => Some("4B0"),
            DecoderVariant::Doors => Some("433"),
            DecoderVariant::Odometer => Some("4F2"),
            DecoderVariant::EngineGas => Some("201"),
            DecoderVariant::Compass => Some("2BA"),
            DecoderVariant::Generic => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DecoderVariant::Wheels => "ABSWheels",
            DecoderVariant::Doors => "Doors",
            DecoderVariant::Odometer => "Odometer",
            DecoderVariant::EngineGas => "EngineGas",
            DecoderVariant::Compass => "Compass",
            DecoderVariant::Generic => "Generic",
        }
    }

    /// Frame width the statistics for this variant are sized to, when fixed
    pub fn frame_width(&self) -> Option<usize> {
        match self {
            DecoderVariant::Wheels | DecoderVariant::EngineGas => Some(8),
            _ => None,
        }
    }

    /// Minimum payload length needed to read every recognised field
    pub fn min_payload(&self) -> usize {
        match self {
            DecoderVariant::Wheels => 8,
            DecoderVariant::Doors => 1,
            DecoderVariant::Odometer => 3,
            DecoderVariant::EngineGas => 7,
            DecoderVariant::Compass => 5,
            DecoderVariant::Generic => 0,
        }
    }

    /// Decode a payload into typed fields and the positions they claimed
    pub fn decode(&self, payload: &[u8]) -> Result<Decoded, DecodeError> {
        if payload.len() < self.min_payload() {
            return Err(DecodeError::MalformedPayload {
                variant: self.name(),
                needed: self.min_payload(),
                got: payload.len(),
            });
        }

        let decoded = match self {
            DecoderVariant::Wheels => {
                let wheel = |i: usize| (f64::from(be16(payload, i)) - 10_000.0) / 100.0;
                Decoded {
                    fields: DecodedFields::Wheels(WheelSpeeds {
                        front_left: wheel(0),
                        front_right: wheel(2),
                        rear_left: wheel(4),
                        rear_right: wheel(6),
                    }),
                    claimed: (0..8).collect(),
                }
            }
            DecoderVariant::Doors => {
                let mask = payload[0];
                let open = Door::BIT_ORDER
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << (i + 3)) != 0)
                    .map(|(_, door)| door)
                    .collect();
                Decoded {
                    fields: DecodedFields::Doors(DoorState { mask, open }),
                    claimed: vec![0],
                }
            }
            // Odometer and Compass expose their fields but keep the whole payload as residual
            DecoderVariant::Odometer => Decoded {
                fields: DecodedFields::Odometer(OdometerReading {
                    range: payload[0],
                    km: be16(payload, 1),
                }),
                claimed: Vec::new(),
            },
            DecoderVariant::EngineGas => Decoded {
                fields: DecodedFields::EngineGas(EngineGasReading {
                    rpm: be16(payload, 0),
                    speed: f64::from(be16(payload, 4)) / 100.0,
                    accelerator: payload[6],
                }),
                claimed: vec![0, 1, 4, 5, 6],
            },
            DecoderVariant::Compass => Decoded {
                fields: DecodedFields::Compass(CompassHeading {
                    heading: payload[4],
                }),
                claimed: Vec::new(),
            },
            DecoderVariant::Generic => Decoded {
                fields: DecodedFields::None,
                claimed: Vec::new(),
            },
        };

        Ok(decoded)
    }

    /// Turn a raw record into a decoded one
    ///
    /// A payload too short for this variant still yields a record: no
    /// recognised fields, the full payload as residual, and the error kept.
    pub fn process(&self, raw: RawRecord) -> DecodedRecord {
        match self.decode(&raw.payload) {
            Ok(Decoded { fields, claimed }) => {
                let residual = raw
                    .payload
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !claimed.contains(i))
                    .map(|(_, &b)| b)
                    .collect();
                DecodedRecord {
                    variant: *self,
                    fields,
                    residual,
                    malformed: None,
                    raw,
                }
            }
            Err(err) => DecodedRecord {
                variant: *self,
                fields: DecodedFields::None,
                residual: raw.payload.clone(),
                malformed: Some(err),
                raw,
            },
        }
    }
}

fn be16(payload: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([payload[offset], payload[offset + 1]])
}

/// Output of a single variant decode
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub fields: DecodedFields,
    /// Payload indices removed from the residual
    pub claimed: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFields {
    Wheels(WheelSpeeds),
    Doors(DoorState),
    Odometer(OdometerReading),
    EngineGas(EngineGasReading),
    Compass(CompassHeading),
    None,
}

/// ABS wheel speeds, offset-encoded with two decimals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSpeeds {
    pub front_left: f64,
    pub front_right: f64,
    pub rear_left: f64,
    pub rear_right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Door {
    Trunk,
    RearRight,
    RearLeft,
    FrontRight,
    FrontLeft,
}

impl Door {
    /// Doors in mask order, starting at bit 3
    pub const BIT_ORDER: [Door; 5] = [
        Door::Trunk,
        Door::RearRight,
        Door::RearLeft,
        Door::FrontRight,
        Door::FrontLeft,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            Door::Trunk => "T",
            Door::RearRight => "RR",
            Door::RearLeft => "RL",
            Door::FrontRight => "FR",
            Door::FrontLeft => "FL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorState {
    pub mask: u8,
    pub open: Vec<Door>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OdometerReading {
    /// Range indicator, unit unknown
    pub range: u8,
    pub km: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineGasReading {
    pub rpm: u16,
    pub speed: f64,
    /// Raw pedal position 0-255
    pub accelerator: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompassHeading {
    pub heading: u8,
}

/// A raw record plus what its variant made of it
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    pub raw: RawRecord,
    pub variant: DecoderVariant,
    pub fields: DecodedFields,
    /// Unclaimed payload bytes, in payload order
    pub residual: Vec<u8>,
    pub malformed: Option<DecodeError>,
}

impl DecodedRecord {
    pub fn identifier(&self) -> &str {
        &self.raw.identifier
    }

    pub fn timestamp(&self) -> i64 {
        self.raw.timestamp
    }

    /// Partial comparison of two records
    ///
    /// Different identifiers are never the same. With matching identifiers the
    /// answer is only defined when both residuals are non-empty, and then it is
    /// residual equality. `None` means "undefined" and callers treat it as not
    /// the same.
    pub fn same_as(&self, other: &DecodedRecord) -> Option<bool> {
        if self.identifier() != other.identifier() {
            return Some(false);
        }
        if !self.residual.is_empty() && !other.residual.is_empty() {
            return Some(self.residual == other.residual);
        }
        None
    }
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}-{}", self.variant.name(), self.identifier())?;

        match &self.fields {
            DecodedFields::Wheels(w) => write!(
                f,
                " f_l={} f_r={} r_l={} r_r={}",
                w.front_left, w.front_right, w.rear_left, w.rear_right
            )?,
            DecodedFields::Doors(d) => {
                let names: Vec<&str> = d.open.iter().map(Door::short_name).collect();
                write!(f, " doors=[{}] {}", names.join(", "), d.mask)?
            }
            DecodedFields::Odometer(o) => write!(f, " range={} km={}", o.range, o.km)?,
            DecodedFields::EngineGas(e) => write!(
                f,
                " rpm={} speed={} accelerator={}",
                e.rpm, e.speed, e.accelerator
            )?,
            DecodedFields::Compass(c) => write!(f, " heading={}", c.heading)?,
            DecodedFields::None => {}
        }

        if self.malformed.is_some() {
            write!(f, " malformed")?;
        }
        if !self.residual.is_empty() {
            write!(f, " unknown={:?}", self.residual)?;
        }
        write!(f, ">")
    }
}
