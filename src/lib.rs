//! Uniform access to collections of GeoJSON features.
//!
//! A collection is a named set of geospatial features. Two backends expose
//! the same operation surface over very different execution models:
//!
//! - [LocalBackend] iterates `<name>.geojson` files and evaluates textual
//!   filters in memory with a sandboxed expression matcher.
//! - [PostgresBackend] translates the same filters into SQL predicates and
//!   runs them against a PostGIS database, one table per collection.
//!
//! Backends are selected by driver name through [`Service::create`] and used
//! through the [Backend] trait:
//!
//! ```no_run
//! use geodb::{Backend, FindOptions, Service, ServiceConfig};
//!
//! # tokio_test::block_on(async {
//! let service = Service::create("local", ServiceConfig::default()).await.unwrap();
//! let feature = service
//!     .find_feature("parks", &FindOptions::new().query("id == 2"))
//!     .await
//!     .unwrap();
//! # })
//! ```
//!
//! Results come back as a list of GeoJSON features or as a lightweight
//! [FeatureTable], depending on the requested [OutputFormat].
//!
//! Textual filters are interpolated into SQL predicates on the remote
//! backend. Identifiers and constructed values are escaped, but the filter
//! fragment itself is trusted; do not build it from untrusted input.

mod backend;
mod error;
mod expr;
mod feature;
pub mod filter;
mod find;
#[cfg(feature = "postgres")]
pub mod sql;

#[cfg(feature = "postgres")]
pub use backend::{DEFAULT_PORT, PASSWORD_ENV, PostgresBackend, PostgresConfig, USER_ENV};
pub use {
    backend::{Backend, DEFAULT_DIRECTORY, LocalBackend, Service, ServiceConfig},
    error::Error,
    expr::{ComparisonOp, Expr},
    feature::{
        Feature, FeatureSet, FeatureTable, PLACEHOLDER_COLUMN, PLACEHOLDER_MESSAGE, Schema,
    },
    find::{Bbox, BboxMode, DEFAULT_SRID, FindOptions, OutputFormat},
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
