#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use petri_core::{CellCoord, SpeciesId};
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "petri";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "petri:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the organisms placed on the board and the grid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PatternSnapshot {
    /// Number of cell columns contained in the board.
    pub columns: u32,
    /// Number of cell rows contained in the board.
    pub rows: u32,
    /// Organisms composing the pattern captured by the snapshot.
    pub organisms: Vec<PatternOrganism>,
}

impl PatternSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard
    /// transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableSnapshot {
            organisms: self.organisms.clone(),
        };
        let json =
            serde_json::to_vec(&payload).expect("pattern snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, PatternTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PatternTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(PatternTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(PatternTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(PatternTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(PatternTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(PatternTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(PatternTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(PatternTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(PatternTransferError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            organisms: decoded.organisms,
        })
    }
}

/// Organism description captured within a pattern snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PatternOrganism {
    /// Species inhabiting the cell.
    pub species: SpeciesId,
    /// Canonical cell occupied by the organism.
    pub cell: CellCoord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    organisms: Vec<PatternOrganism>,
}

/// Errors that can occur while decoding pattern transfer strings.
#[derive(Debug)]
pub(crate) enum PatternTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for PatternTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "pattern payload was empty"),
            Self::MissingPrefix => write!(f, "pattern string is missing the prefix"),
            Self::MissingVersion => write!(f, "pattern string is missing the version"),
            Self::MissingDimensions => write!(f, "pattern string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "pattern string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "pattern prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "pattern version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode pattern payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse pattern payload: {error}")
            }
        }
    }
}

impl Error for PatternTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), PatternTransferError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| PatternTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| PatternTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| PatternTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(PatternTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_pattern() {
        let snapshot = PatternSnapshot {
            columns: 12,
            rows: 8,
            organisms: Vec::new(),
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:12x8:")));

        let decoded = PatternSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn round_trip_populated_pattern() {
        let organisms = vec![
            PatternOrganism {
                species: SpeciesId::new(0),
                cell: CellCoord::new(5, 7),
            },
            PatternOrganism {
                species: SpeciesId::new(3),
                cell: CellCoord::new(12, 4),
            },
        ];
        let snapshot = PatternSnapshot {
            columns: 20,
            rows: 15,
            organisms,
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:20x15:")));

        let decoded = PatternSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn decode_rejects_foreign_prefixes() {
        let error = PatternSnapshot::decode("life:v1:4x4:e30")
            .expect_err("foreign prefixes must be rejected");
        assert!(matches!(error, PatternTransferError::InvalidPrefix(_)));
    }

    #[test]
    fn decode_rejects_zero_dimensions() {
        let error = PatternSnapshot::decode("petri:v1:0x8:e30")
            .expect_err("zero-area boards must be rejected");
        assert!(matches!(error, PatternTransferError::InvalidDimensions(_)));
    }
}
