//! Decoding of newline-delimited region records.
//!
//! Each input line is one JSON object describing a postal region. The
//! producer of these files has emitted a few shapes over time, all of which
//! decode to the same [`Region`]:
//!
//! - `zip` as an integer or a digit string;
//! - the centre as flat `centerLat`/`centerLng` fields or as a nested
//!   `center` value;
//! - outline vertices as `{"lat": .., "lng": ..}` objects or `[lat, lng]`
//!   pairs, freely mixed within one outline.
//!
//! A missing or `null` outline decodes to an empty one. Unknown fields are
//! ignored.

use geo::{Coord, LineString};
use geozip_core::{Region, Zip, coord_from_pair};
use serde::Deserialize;
use thiserror::Error;

/// Reasons a line could not be decoded into a [`Region`].
#[derive(Debug, Error)]
pub enum MalformedRecordError {
    /// The line is not a JSON object of the expected shape.
    #[error("failed to parse region record at line {line}: {source}")]
    Syntax {
        /// 1-based input line.
        line: u64,
        /// Zip read from the line when one could still be found.
        zip: Option<Zip>,
        /// Source error from `simd_json`.
        #[source]
        source: simd_json::Error,
    },
    /// Neither centre encoding is present.
    #[error("region record at line {line} for zip {zip} has no centre")]
    MissingCenter {
        /// 1-based input line.
        line: u64,
        /// Zip of the record.
        zip: Zip,
    },
    /// The zip is negative, too large or not made of digits.
    #[error("region record at line {line} has invalid zip {raw:?}")]
    InvalidZip {
        /// 1-based input line.
        line: u64,
        /// Zip as it appeared in the input.
        raw: String,
    },
    /// A coordinate decoded to infinity or NaN.
    #[error("region record at line {line} for zip {zip} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// 1-based input line.
        line: u64,
        /// Zip of the record.
        zip: Zip,
    },
}

impl MalformedRecordError {
    /// 1-based line the error was raised for.
    #[must_use]
    pub const fn line(&self) -> u64 {
        match self {
            Self::Syntax { line, .. }
            | Self::MissingCenter { line, .. }
            | Self::InvalidZip { line, .. }
            | Self::NonFiniteCoordinate { line, .. } => *line,
        }
    }

    /// Zip of the offending record, when it could be determined.
    #[must_use]
    pub const fn zip(&self) -> Option<Zip> {
        match self {
            Self::Syntax { zip, .. } => *zip,
            Self::MissingCenter { zip, .. } | Self::NonFiniteCoordinate { zip, .. } => Some(*zip),
            Self::InvalidZip { .. } => None,
        }
    }
}

/// Decode one input line into a [`Region`].
///
/// `line_number` is 1-based and only used for error reporting. Surrounding
/// whitespace, including a trailing `\r`, is ignored.
///
/// # Examples
/// ```
/// use geozip_core::Zip;
/// use geozip_ingest::decode_record;
///
/// let line = r#"{"zip":"10001","centerLat":40.75,"centerLng":-73.99,"outline":[[40.7,-74.0],{"lat":40.8,"lng":-73.9}]}"#;
/// let region = decode_record(line, 1)?;
///
/// assert_eq!(region.zip, Zip::new(10001));
/// assert_eq!(region.center_pair(), [40.75, -73.99]);
/// assert_eq!(region.outline_pairs(), vec![[40.7, -74.0], [40.8, -73.9]]);
/// # Ok::<(), geozip_ingest::MalformedRecordError>(())
/// ```
pub fn decode_record(line: &str, line_number: u64) -> Result<Region, MalformedRecordError> {
    let trimmed = line.trim();
    let mut bytes = trimmed.as_bytes().to_vec();
    let raw: RawRecord = simd_json::from_slice(bytes.as_mut_slice()).map_err(|source| {
        MalformedRecordError::Syntax {
            line: line_number,
            zip: sniff_zip(trimmed),
            source,
        }
    })?;

    let zip = raw.zip.resolve().ok_or_else(|| MalformedRecordError::InvalidZip {
        line: line_number,
        raw: raw.zip.to_string(),
    })?;
    let center = raw.center_pair().ok_or(MalformedRecordError::MissingCenter {
        line: line_number,
        zip,
    })?;
    let outline: Vec<[f64; 2]> = raw
        .outline
        .unwrap_or_default()
        .into_iter()
        .map(RawPoint::into_pair)
        .collect();

    if !is_finite_pair(center) || !outline.iter().copied().all(is_finite_pair) {
        return Err(MalformedRecordError::NonFiniteCoordinate {
            line: line_number,
            zip,
        });
    }

    let coords: Vec<Coord<f64>> = outline.into_iter().map(coord_from_pair).collect();
    Ok(Region::new(
        zip,
        coord_from_pair(center),
        LineString::new(coords),
    ))
}

/// Best-effort zip extraction from a line that failed to decode fully.
fn sniff_zip(line: &str) -> Option<Zip> {
    let mut bytes = line.as_bytes().to_vec();
    let only: ZipOnly = simd_json::from_slice(bytes.as_mut_slice()).ok()?;
    only.zip.resolve()
}

fn is_finite_pair(pair: [f64; 2]) -> bool {
    pair.iter().all(|value| value.is_finite())
}

#[derive(Debug, Deserialize)]
struct ZipOnly {
    zip: RawZip,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    zip: RawZip,
    #[serde(default)]
    center_lat: Option<f64>,
    #[serde(default)]
    center_lng: Option<f64>,
    #[serde(default)]
    center: Option<RawPoint>,
    #[serde(default)]
    outline: Option<Vec<RawPoint>>,
}

impl RawRecord {
    /// Flat fields win over the nested form when both are present.
    fn center_pair(&self) -> Option<[f64; 2]> {
        match (self.center_lat, self.center_lng) {
            (Some(lat), Some(lng)) => Some([lat, lng]),
            _ => self.center.map(RawPoint::into_pair),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawZip {
    Number(i64),
    Text(String),
}

impl RawZip {
    fn resolve(&self) -> Option<Zip> {
        match self {
            Self::Number(value) => u32::try_from(*value).ok().map(Zip::new),
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
                    return None;
                }
                trimmed.parse().ok()
            }
        }
    }
}

impl std::fmt::Display for RawZip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RawPoint {
    Pair([f64; 2]),
    Object {
        #[serde(alias = "Lat", alias = "latitude")]
        lat: f64,
        #[serde(alias = "Lng", alias = "longitude")]
        lng: f64,
    },
}

impl RawPoint {
    const fn into_pair(self) -> [f64; 2] {
        match self {
            Self::Pair(pair) => pair,
            Self::Object { lat, lng } => [lat, lng],
        }
    }
}

#[cfg(test)]
mod tests;
