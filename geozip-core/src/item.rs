//! Canonical stored representation of a region.
//!
//! Every store keeps a region as one document keyed by `Zip`:
//!
//! ```json
//! {"Zip": 10001, "Center": [40.75, -73.99],
//!  "Outline": [{"Lat": 40.7, "Lng": -74.0}, {"Lat": 40.8, "Lng": -73.9}]}
//! ```
//!
//! `Center` is a `[lat, lng]` list and `Outline` is an ordered list of nested
//! point records. Documents may hold further attributes; partial updates only
//! ever touch `Center` and `Outline`. Floats are written in their shortest
//! round-trip form so coordinates survive storage bit-for-bit.

use serde::{Deserialize, Serialize};

use crate::region::{Region, Zip, coord_from_pair};

/// Version of the document layout described in the module docs.
pub const ITEM_SCHEMA_VERSION: i64 = 1;

/// Attribute names used by the stored document.
pub mod attribute {
    /// Key attribute.
    pub const ZIP: &str = "Zip";
    /// Centre attribute.
    pub const CENTER: &str = "Center";
    /// Outline attribute.
    pub const OUTLINE: &str = "Outline";
}

/// One outline vertex as stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutlinePoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Full document written by an insert.
///
/// # Examples
/// ```
/// use geozip_core::{Region, RegionItem, Zip};
///
/// let region = Region::from_lat_lng_pairs(Zip::new(10001), [40.75, -73.99], &[[40.7, -74.0]]);
/// let item = RegionItem::from(&region);
/// let json = item.to_json()?;
///
/// assert_eq!(json, r#"{"Zip":10001,"Center":[40.75,-73.99],"Outline":[{"Lat":40.7,"Lng":-74.0}]}"#);
/// assert_eq!(item.to_region(), region);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegionItem {
    /// Key.
    pub zip: u32,
    /// `[lat, lng]` centre.
    pub center: [f64; 2],
    /// Ordered outline vertices.
    #[serde(default)]
    pub outline: Vec<OutlinePoint>,
}

impl RegionItem {
    /// Store key of the document.
    #[must_use]
    pub const fn key(&self) -> Zip {
        Zip::new(self.zip)
    }

    /// Rebuild the region this document was written from.
    #[must_use]
    pub fn to_region(&self) -> Region {
        let outline = self
            .outline
            .iter()
            .map(|point| coord_from_pair([point.lat, point.lng]))
            .collect();
        Region::new(
            self.key(),
            coord_from_pair(self.center),
            geo::LineString::new(outline),
        )
    }

    /// Serialize the document to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Size in bytes of the compact JSON encoding.
    pub fn encoded_len(&self) -> Result<usize, serde_json::Error> {
        self.to_json().map(|json| json.len())
    }

    /// The attributes an update overwrites.
    #[must_use]
    pub fn patch(&self) -> RegionPatch {
        RegionPatch {
            center: self.center,
            outline: self.outline.clone(),
        }
    }
}

impl From<&Region> for RegionItem {
    fn from(region: &Region) -> Self {
        let outline = region
            .outline
            .coords()
            .map(|coord| OutlinePoint {
                lat: coord.y,
                lng: coord.x,
            })
            .collect();
        Self {
            zip: region.zip.get(),
            center: region.center_pair(),
            outline,
        }
    }
}

/// Partial update touching only `Center` and `Outline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegionPatch {
    /// `[lat, lng]` centre.
    pub center: [f64; 2],
    /// Ordered outline vertices.
    pub outline: Vec<OutlinePoint>,
}

impl RegionPatch {
    /// JSON encoding of the centre attribute.
    pub fn center_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.center)
    }

    /// JSON encoding of the outline attribute.
    pub fn outline_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.outline)
    }
}
