use thiserror::Error;

/// Crate-specific error enum.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A collection with this name already exists.
    #[error("collection already exists: {0}")]
    CollectionExists(String),

    /// No collection with this name was found.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A required feature is not enabled.
    #[error("{0} is not enabled")]
    FeatureNotEnabled(&'static str),

    /// A filter expression could not be evaluated against a feature's
    /// properties.
    #[error("filter evaluation failed: {0}")]
    FilterEvaluation(String),

    /// [geojson::Error]
    #[error(transparent)]
    Geojson(#[from] Box<geojson::Error>),

    /// A filter expression could not be parsed.
    #[error("invalid filter expression: {0}")]
    InvalidFilter(String),

    /// [std::io::Error]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A connection parameter was neither supplied nor present in the
    /// environment.
    #[error("no {name} configured and no {env} environment variable set")]
    MissingCredential {
        /// The configuration field.
        name: &'static str,

        /// The environment variable consulted as a fallback.
        env: &'static str,
    },

    /// Returned when there is not a required field on a feature.
    #[error("no \"{0}\" field on the feature")]
    MissingField(&'static str),

    /// A feature is missing the property that supplies the `name` column.
    #[error("no \"{0}\" property on the feature")]
    MissingProperty(&'static str),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// [tokio_postgres::Error]
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    TokioPostgres(#[from] tokio_postgres::Error),

    /// The bounding-box containment mode is not one of `contains` or
    /// `within`.
    #[error("unknown bbox mode: {0}")]
    UnknownBboxMode(String),

    /// The output format is not one of `geojson` or `tabular`.
    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    /// An operation is deliberately not implemented by a backend.
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),

    /// A schema property type descriptor has no column mapping.
    #[error("unsupported column type: {0}")]
    UnsupportedColumnType(String),
}
