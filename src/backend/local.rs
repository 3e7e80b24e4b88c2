use crate::{
    Error, Expr, Feature, FeatureSet, FindOptions, Result, Schema, backend::Backend,
};
use geojson::FeatureCollection;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// The default collection directory.
pub const DEFAULT_DIRECTORY: &str = "geodb";

/// A file-backed collection store.
///
/// Each collection is one `<name>.geojson` file under the backend's
/// directory, holding a GeoJSON feature collection. Filters are evaluated in
/// memory against each feature's `id` and properties; bounding boxes and all
/// mutating operations are deliberately unsupported.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    directory: PathBuf,
}

impl LocalBackend {
    /// Creates a new local backend rooted at the given directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::LocalBackend;
    ///
    /// let backend = LocalBackend::new("geodb");
    /// ```
    pub fn new(directory: impl Into<PathBuf>) -> LocalBackend {
        LocalBackend {
            directory: directory.into(),
        }
    }

    /// Returns the collection directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn read_collection(&self, collection: &str) -> Result<FeatureCollection> {
        let path = self.directory.join(format!("{collection}.geojson"));
        if !path.is_file() {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }
        tracing::debug!(path = %path.display(), "reading collection");
        let contents = std::fs::read_to_string(path)?;
        let geojson: geojson::GeoJson = contents.parse().map_err(Box::new)?;
        FeatureCollection::try_from(geojson).map_err(|err| Box::new(err).into())
    }
}

impl Default for LocalBackend {
    fn default() -> LocalBackend {
        LocalBackend::new(DEFAULT_DIRECTORY)
    }
}

impl Backend for LocalBackend {
    async fn find_features(&self, collection: &str, options: &FindOptions) -> Result<FeatureSet> {
        if options.bbox.is_some() {
            return Err(Error::Unsupported("bbox filtering on the local backend"));
        }
        let expr = options
            .query
            .as_deref()
            .map(str::parse::<Expr>)
            .transpose()?;

        // Collection resolution is unconditional; a zero record limit still
        // fails on a missing collection.
        let collection = self.read_collection(collection)?;
        let mut matches = Vec::new();
        if options.max_records != Some(0) {
            for feature in collection.features {
                // An expression that fails to evaluate for this feature is a
                // non-match, not a fatal error.
                let matched = match &expr {
                    Some(expr) => expr.matches(&evaluation_scope(&feature)).unwrap_or(false),
                    None => true,
                };
                if matched {
                    matches.push(feature);
                    if options
                        .max_records
                        .is_some_and(|max_records| matches.len() as u64 >= max_records)
                    {
                        break;
                    }
                }
            }
        }
        Ok(FeatureSet::GeoJson(matches))
    }

    async fn new_collection(&mut self, _: &str, _: &Schema) -> Result<()> {
        Err(Error::Unsupported("new_collection"))
    }

    async fn drop_collection(&mut self, _: &str) -> Result<()> {
        Err(Error::Unsupported("drop_collection"))
    }

    async fn add_features(&mut self, _: &str, _: &[Feature]) -> Result<()> {
        Err(Error::Unsupported("add_features"))
    }
}

/// Builds the evaluation scope for one feature: its `id` (when present)
/// overlaid with its properties.
fn evaluation_scope(feature: &Feature) -> Map<String, Value> {
    let mut scope = Map::new();
    if let Some(id) = &feature.id {
        let id = match id {
            geojson::feature::Id::String(s) => Value::String(s.clone()),
            geojson::feature::Id::Number(n) => Value::Number(n.clone()),
        };
        let _ = scope.insert("id".to_string(), id);
    }
    if let Some(properties) = &feature.properties {
        scope.extend(properties.clone());
    }
    scope
}
