use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use geojson::Feature;

/// The column name of the placeholder table returned for empty tabular
/// results.
pub const PLACEHOLDER_COLUMN: &str = "message";

/// The single cell value of the placeholder table.
pub const PLACEHOLDER_MESSAGE: &str = "empty result";

/// A schema for a new collection.
///
/// Maps property names to type descriptors, e.g. `"str"`, `"int"`, or
/// `"float:8.2"`. Property order is preserved and drives column order at
/// collection-creation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// The property type descriptors, by property name.
    pub properties: IndexMap<String, String>,
}

impl Schema {
    /// Creates a new, empty schema.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::Schema;
    ///
    /// let schema = Schema::new().with_property("height", "float:8.2");
    /// ```
    pub fn new() -> Schema {
        Schema::default()
    }

    /// Adds a property to this schema.
    pub fn with_property(mut self, name: impl ToString, descriptor: impl ToString) -> Schema {
        let _ = self
            .properties
            .insert(name.to_string(), descriptor.to_string());
        self
    }
}

/// The result of a find operation, in one of two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureSet {
    /// A list of GeoJSON features.
    GeoJson(Vec<Feature>),

    /// A table of raw columns.
    Table(FeatureTable),
}

impl FeatureSet {
    /// Returns the number of records in this set.
    pub fn len(&self) -> usize {
        match self {
            Self::GeoJson(features) => features.len(),
            Self::Table(table) => table.rows.len(),
        }
    }

    /// Returns true if this set holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the features of this set, if it is in the GeoJSON shape.
    pub fn into_features(self) -> Option<Vec<Feature>> {
        match self {
            Self::GeoJson(features) => Some(features),
            Self::Table(_) => None,
        }
    }
}

/// A lightweight tabular result with a designated geometry column.
///
/// Stands in for the out-of-scope geo-dataframe collaborator: callers hand
/// the columns and rows to whatever tabular library they use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    /// The column names, in SELECT order.
    pub columns: Vec<String>,

    /// The rows, each with one value per column.
    pub rows: Vec<Vec<Value>>,

    /// The name of the geometry column.
    pub geometry_column: String,
}

impl FeatureTable {
    /// Returns the one-row placeholder table used for empty tabular results.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::FeatureTable;
    ///
    /// let table = FeatureTable::placeholder();
    /// assert_eq!(table.rows.len(), 1);
    /// ```
    pub fn placeholder() -> FeatureTable {
        FeatureTable {
            columns: vec![PLACEHOLDER_COLUMN.to_string()],
            rows: vec![vec![Value::String(PLACEHOLDER_MESSAGE.to_string())]],
            geometry_column: "geometry".to_string(),
        }
    }
}
