mod local;
#[cfg(feature = "postgres")]
mod postgres;

use crate::{Feature, FeatureSet, FindOptions, OutputFormat, Result, Schema};
pub use local::{DEFAULT_DIRECTORY, LocalBackend};
#[cfg(feature = "postgres")]
pub use postgres::{DEFAULT_PORT, PASSWORD_ENV, PostgresBackend, PostgresConfig, USER_ENV};
use std::path::PathBuf;

/// The uniform operation surface shared by all backends.
///
/// Backends differ in execution model — the local backend evaluates filters
/// in memory, the remote backend translates them to SQL — but expose the
/// same operations.
pub trait Backend: Send + Sync {
    /// Finds the first feature in a collection that matches the options.
    ///
    /// The default implementation runs [`Backend::find_features`] with a
    /// record limit of one and the GeoJSON result shape.
    fn find_feature(
        &self,
        collection: &str,
        options: &FindOptions,
    ) -> impl Future<Output = Result<Option<Feature>>> + Send {
        async move {
            let mut options = options.clone();
            options.max_records = Some(1);
            options.format = OutputFormat::GeoJson;
            let features = self
                .find_features(collection, &options)
                .await?
                .into_features();
            Ok(features.and_then(|features| features.into_iter().next()))
        }
    }

    /// Finds all features in a collection that match the options, in source
    /// iteration order.
    fn find_features(
        &self,
        collection: &str,
        options: &FindOptions,
    ) -> impl Future<Output = Result<FeatureSet>> + Send;

    /// Creates a new collection from a schema.
    fn new_collection(
        &mut self,
        collection: &str,
        schema: &Schema,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Drops an existing collection.
    fn drop_collection(&mut self, collection: &str) -> impl Future<Output = Result<()>> + Send;

    /// Adds one feature to a collection.
    ///
    /// The default implementation delegates to [`Backend::add_features`].
    fn add_feature(
        &mut self,
        collection: &str,
        feature: &Feature,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.add_features(collection, std::slice::from_ref(feature))
                .await
        }
    }

    /// Adds a batch of features to a collection.
    fn add_features(
        &mut self,
        collection: &str,
        features: &[Feature],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Parameters for constructing a [Service].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// The collection directory for the local backend.
    ///
    /// Defaults to `geodb/` under the current directory.
    pub directory: Option<PathBuf>,

    /// Connection parameters for the remote backend.
    #[cfg(feature = "postgres")]
    pub postgres: PostgresConfig,
}

/// A backend selected by driver name.
///
/// The two variants share the [Backend] contract; callers pick one with
/// [`Service::create`] and use it uniformly.
#[derive(Debug)]
pub enum Service {
    /// A file-backed collection store.
    Local(LocalBackend),

    /// A PostGIS-backed collection store.
    #[cfg(feature = "postgres")]
    Postgres(PostgresBackend),
}

impl Service {
    /// Constructs a backend from a driver name.
    ///
    /// The driver `"local"` selects the local backend; any other name
    /// selects the remote backend, forwarding the connection parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::{Service, ServiceConfig};
    ///
    /// # tokio_test::block_on(async {
    /// let service = Service::create("local", ServiceConfig::default()).await.unwrap();
    /// assert!(matches!(service, Service::Local(_)));
    /// # })
    /// ```
    #[cfg_attr(not(feature = "postgres"), allow(unused_variables))]
    pub async fn create(driver: &str, config: ServiceConfig) -> Result<Service> {
        if driver == "local" {
            Ok(Service::Local(
                config
                    .directory
                    .map(LocalBackend::new)
                    .unwrap_or_default(),
            ))
        } else {
            #[cfg(feature = "postgres")]
            {
                tracing::debug!(driver, "connecting to the remote backend");
                Ok(Service::Postgres(
                    PostgresBackend::connect(config.postgres).await?,
                ))
            }
            #[cfg(not(feature = "postgres"))]
            {
                Err(crate::Error::FeatureNotEnabled("postgres"))
            }
        }
    }
}

impl Backend for Service {
    async fn find_feature(
        &self,
        collection: &str,
        options: &FindOptions,
    ) -> Result<Option<Feature>> {
        match self {
            Self::Local(backend) => backend.find_feature(collection, options).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.find_feature(collection, options).await,
        }
    }

    async fn find_features(&self, collection: &str, options: &FindOptions) -> Result<FeatureSet> {
        match self {
            Self::Local(backend) => backend.find_features(collection, options).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.find_features(collection, options).await,
        }
    }

    async fn new_collection(&mut self, collection: &str, schema: &Schema) -> Result<()> {
        match self {
            Self::Local(backend) => backend.new_collection(collection, schema).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.new_collection(collection, schema).await,
        }
    }

    async fn drop_collection(&mut self, collection: &str) -> Result<()> {
        match self {
            Self::Local(backend) => backend.drop_collection(collection).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.drop_collection(collection).await,
        }
    }

    async fn add_feature(&mut self, collection: &str, feature: &Feature) -> Result<()> {
        match self {
            Self::Local(backend) => backend.add_feature(collection, feature).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.add_feature(collection, feature).await,
        }
    }

    async fn add_features(&mut self, collection: &str, features: &[Feature]) -> Result<()> {
        match self {
            Self::Local(backend) => backend.add_features(collection, features).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(backend) => backend.add_features(collection, features).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Service, ServiceConfig};

    #[tokio::test]
    async fn create_local() {
        let service = Service::create("local", ServiceConfig::default())
            .await
            .unwrap();
        assert!(matches!(service, Service::Local(_)));
    }
}
