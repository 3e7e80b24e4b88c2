use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// The default spatial reference identifier for bounding boxes.
pub const DEFAULT_SRID: i32 = 4326;

/// A two-dimensional bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    /// The minimum x coordinate.
    pub xmin: f64,

    /// The minimum y coordinate.
    pub ymin: f64,

    /// The maximum x coordinate.
    pub xmax: f64,

    /// The maximum y coordinate.
    pub ymax: f64,
}

impl Bbox {
    /// Creates a new bounding box.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::Bbox;
    ///
    /// let bbox = Bbox::new(10., 10., 20., 20.);
    /// ```
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Bbox {
        Bbox {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Returns this bounding box as a closed WKT polygon ring, optionally
    /// prefixed with an SRID tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::Bbox;
    ///
    /// assert_eq!(
    ///     Bbox::new(0., 0., 1., 1.).to_wkt_polygon(Some(4326)),
    ///     "SRID=4326;POLYGON((0 0,0 1,1 1,1 0,0 0))"
    /// );
    /// ```
    pub fn to_wkt_polygon(&self, srid: Option<i32>) -> String {
        let srid = srid.map(|srid| format!("SRID={srid};")).unwrap_or_default();
        format!(
            "{srid}POLYGON(({xmin} {ymin},{xmin} {ymax},{xmax} {ymax},{xmax} {ymin},{xmin} {ymin}))",
            xmin = self.xmin,
            ymin = self.ymin,
            xmax = self.xmax,
            ymax = self.ymax,
        )
    }
}

impl From<[f64; 4]> for Bbox {
    fn from(coordinates: [f64; 4]) -> Bbox {
        Bbox::new(
            coordinates[0],
            coordinates[1],
            coordinates[2],
            coordinates[3],
        )
    }
}

/// The containment relation between a bounding box and a feature's geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BboxMode {
    /// The bounding box contains the geometry.
    #[default]
    Contains,

    /// The bounding box is within the geometry.
    Within,
}

impl Display for BboxMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contains => f.write_str("contains"),
            Self::Within => f.write_str("within"),
        }
    }
}

impl FromStr for BboxMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<BboxMode> {
        match s {
            "contains" => Ok(Self::Contains),
            "within" => Ok(Self::Within),
            _ => Err(Error::UnknownBboxMode(s.to_string())),
        }
    }
}

/// The shape of a find result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A list of GeoJSON features.
    #[default]
    GeoJson,

    /// A table of raw columns with a designated geometry column.
    Tabular,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GeoJson => f.write_str("geojson"),
            Self::Tabular => f.write_str("tabular"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<OutputFormat> {
        match s {
            "geojson" => Ok(Self::GeoJson),
            "tabular" => Ok(Self::Tabular),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Parameters for finding features in a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    /// A textual filter expression.
    ///
    /// On the local backend this is parsed and evaluated against each
    /// feature's properties. On the remote backend it becomes part of the SQL
    /// WHERE clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// The maximum number of records to return.
    ///
    /// `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_records: Option<u64>,

    /// The shape of the result.
    #[serde(default)]
    pub format: OutputFormat,

    /// An optional bounding-box constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Bbox>,

    /// The containment relation applied to the bounding box.
    #[serde(default)]
    pub bbox_mode: BboxMode,

    /// The SRID of the bounding box.
    ///
    /// It has to match the SRID of the targeted collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox_srid: Option<i32>,
}

impl FindOptions {
    /// Creates a new, empty set of find options.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::FindOptions;
    ///
    /// let options = FindOptions::new();
    /// ```
    pub fn new() -> FindOptions {
        FindOptions {
            bbox_srid: Some(DEFAULT_SRID),
            ..Default::default()
        }
    }

    /// Sets the filter expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::FindOptions;
    ///
    /// let options = FindOptions::new().query("id == 2");
    /// ```
    pub fn query(mut self, query: impl ToString) -> FindOptions {
        self.query = Some(query.to_string());
        self
    }

    /// Sets the maximum number of records to return.
    pub fn max_records(mut self, max_records: u64) -> FindOptions {
        self.max_records = Some(max_records);
        self
    }

    /// Sets the result shape.
    pub fn format(mut self, format: OutputFormat) -> FindOptions {
        self.format = format;
        self
    }

    /// Sets the bounding box.
    pub fn bbox(mut self, bbox: impl Into<Bbox>) -> FindOptions {
        self.bbox = Some(bbox.into());
        self
    }

    /// Sets the bounding-box containment mode.
    pub fn bbox_mode(mut self, bbox_mode: BboxMode) -> FindOptions {
        self.bbox_mode = bbox_mode;
        self
    }

    /// Sets the bounding-box SRID.
    pub fn bbox_srid(mut self, bbox_srid: i32) -> FindOptions {
        self.bbox_srid = Some(bbox_srid);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Bbox, BboxMode, OutputFormat};
    use crate::Error;

    #[test]
    fn wkt_ring_is_closed() {
        let bbox = Bbox::new(10., 10., 20., 20.);
        assert_eq!(
            bbox.to_wkt_polygon(None),
            "POLYGON((10 10,10 20,20 20,20 10,10 10))"
        );
    }

    #[test]
    fn wkt_srid_prefix() {
        let bbox = Bbox::new(-1.5, 0., 0.5, 2.25);
        assert_eq!(
            bbox.to_wkt_polygon(Some(3035)),
            "SRID=3035;POLYGON((-1.5 0,-1.5 2.25,0.5 2.25,0.5 0,-1.5 0))"
        );
    }

    #[test]
    fn parse_bbox_mode() {
        assert_eq!("contains".parse::<BboxMode>().unwrap(), BboxMode::Contains);
        assert_eq!("within".parse::<BboxMode>().unwrap(), BboxMode::Within);
        assert!(matches!(
            "intersects".parse::<BboxMode>().unwrap_err(),
            Error::UnknownBboxMode(_)
        ));
    }

    #[test]
    fn parse_output_format() {
        assert_eq!(
            "geojson".parse::<OutputFormat>().unwrap(),
            OutputFormat::GeoJson
        );
        assert_eq!(
            "tabular".parse::<OutputFormat>().unwrap(),
            OutputFormat::Tabular
        );
        assert!(matches!(
            "geopandas".parse::<OutputFormat>().unwrap_err(),
            Error::UnknownFormat(_)
        ));
    }
}
