//! Postal-code regions: the unit of work flowing through ingestion.

use std::{fmt, num::ParseIntError, str::FromStr};

use geo::{Coord, LineString};

/// Postal-code identifier used as the sole store key.
///
/// # Examples
/// ```
/// use geozip_core::Zip;
///
/// let zip: Zip = "10001".parse()?;
/// assert_eq!(zip.get(), 10_001);
/// assert_eq!(zip.to_string(), "10001");
/// # Ok::<(), std::num::ParseIntError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Zip(u32);

impl Zip {
    /// Wrap a raw postal-code number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Return the raw postal-code number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Zip {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Zip> for i64 {
    fn from(zip: Zip) -> Self {
        Self::from(zip.0)
    }
}

impl fmt::Display for Zip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Zip {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One postal code's identifier, centre point and boundary.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`. The outline
/// keeps the exact vertex order it was built with: it is never closed,
/// reordered or deduplicated, and may be empty when the boundary is unknown.
///
/// # Examples
/// ```
/// use geo::{Coord, LineString};
/// use geozip_core::{Region, Zip};
///
/// let region = Region::new(
///     Zip::new(10001),
///     Coord { x: -73.99, y: 40.75 },
///     LineString::new(vec![Coord { x: -74.0, y: 40.7 }, Coord { x: -73.9, y: 40.8 }]),
/// );
///
/// assert_eq!(region.center_pair(), [40.75, -73.99]);
/// assert_eq!(region.outline_pairs(), vec![[40.7, -74.0], [40.8, -73.9]]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Store key.
    pub zip: Zip,
    /// Single centre point.
    pub center: Coord<f64>,
    /// Ordered boundary vertices.
    pub outline: LineString<f64>,
}

impl Region {
    /// Construct a region from its parts.
    #[must_use]
    pub const fn new(zip: Zip, center: Coord<f64>, outline: LineString<f64>) -> Self {
        Self {
            zip,
            center,
            outline,
        }
    }

    /// Build a region from `[lat, lng]` pairs, the canonical wire order.
    #[must_use]
    pub fn from_lat_lng_pairs(zip: Zip, center: [f64; 2], outline: &[[f64; 2]]) -> Self {
        let outline = outline.iter().copied().map(coord_from_pair).collect();
        Self::new(zip, coord_from_pair(center), LineString::new(outline))
    }

    /// Centre as a `[lat, lng]` pair.
    #[must_use]
    pub const fn center_pair(&self) -> [f64; 2] {
        pair_from_coord(self.center)
    }

    /// Outline vertices as `[lat, lng]` pairs in their original order.
    #[must_use]
    pub fn outline_pairs(&self) -> Vec<[f64; 2]> {
        self.outline.coords().copied().map(pair_from_coord).collect()
    }
}

/// Convert a `[lat, lng]` pair into a coordinate.
#[must_use]
pub const fn coord_from_pair([lat, lng]: [f64; 2]) -> Coord<f64> {
    Coord { x: lng, y: lat }
}

/// Convert a coordinate into its `[lat, lng]` pair.
#[must_use]
pub const fn pair_from_coord(coord: Coord<f64>) -> [f64; 2] {
    [coord.y, coord.x]
}
