use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::Read;
use std::str::FromStr;

use axum::http::StatusCode;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/////////////////////////////////////////////// RecordId //////////////////////////////////////////////

/// A store-assigned record identity.
///
/// Identities are 12 opaque bytes rendered as 24 lowercase hex characters.
/// The store mints one when a record is created; every later operation
/// addresses the record by this value and never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; 12]);

impl RecordId {
    /// Creates a RecordId from raw bytes.
    pub fn new(bytes: [u8; 12]) -> Self {
        RecordId(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Generates a random RecordId from the system entropy source.
    pub fn random() -> std::io::Result<RecordId> {
        let mut bytes = [0u8; 12];
        let mut file = File::open("/dev/urandom")?;
        file.read_exact(&mut bytes)?;
        Ok(RecordId(bytes))
    }
}

////////////////////////////////////////////// Hex Codec //////////////////////////////////////////////

const HEX_CHARS: &[u8] = b"0123456789abcdef";

fn encode_hex(input: &[u8]) -> String {
    let mut result = String::with_capacity(input.len() * 2);
    for byte in input {
        result.push(HEX_CHARS[(byte >> 4) as usize] as char);
        result.push(HEX_CHARS[(byte & 0x0F) as usize] as char);
    }
    result
}

fn hex_value(c: char) -> Result<u8, RecordIdParseError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(RecordIdParseError::InvalidHex),
    }
}

////////////////////////////////////////// Display and FromStr ////////////////////////////////////////

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", encode_hex(&self.0))
    }
}

/// Error returned when parsing an invalid record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIdParseError {
    /// The string is not exactly 24 characters.
    InvalidLength,
    /// The string contains a non-hex character.
    InvalidHex,
}

impl Display for RecordIdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RecordIdParseError::InvalidLength => {
                write!(f, "Record id must be exactly 24 hex characters")
            }
            RecordIdParseError::InvalidHex => write!(f, "Record id contains a non-hex character"),
        }
    }
}

impl std::error::Error for RecordIdParseError {}

impl FromStr for RecordId {
    type Err = RecordIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 || !s.is_ascii() {
            return Err(RecordIdParseError::InvalidLength);
        }

        let mut bytes = [0u8; 12];
        let chars: Vec<char> = s.chars().collect();
        for (i, byte) in bytes.iter_mut().enumerate() {
            let hi = hex_value(chars[i * 2])?;
            let lo = hex_value(chars[i * 2 + 1])?;
            *byte = (hi << 4) | lo;
        }
        Ok(RecordId(bytes))
    }
}

//////////////////////////////////////////////// Serde ////////////////////////////////////////////////

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(DeError::custom)
    }
}

/// Parses a record id supplied in a request path.
///
/// The id space is opaque, so a malformed id is indistinguishable from an
/// absent record and maps to the same not-found response.
pub(crate) fn parse_path_id(
    text: &str,
    missing: &'static str,
) -> Result<RecordId, (StatusCode, &'static str)> {
    text.parse().map_err(|_| (StatusCode::NOT_FOUND, missing))
}
