use crate::{
    Error, Feature, FeatureSet, FeatureTable, FindOptions, OutputFormat, Result, Schema,
    backend::Backend, filter, sql,
};
use serde_json::Value;
use tokio_postgres::{Client, NoTls, Row, types::Type};

/// The environment variable consulted when no user is configured.
pub const USER_ENV: &str = "PSQL_USER";

/// The environment variable consulted when no password is configured.
pub const PASSWORD_ENV: &str = "PSQL_PASSWD";

/// The default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

/// Connection parameters for [PostgresBackend].
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// The database host.
    pub host: String,

    /// The database port.
    pub port: u16,

    /// The user name.
    ///
    /// Falls back to the [USER_ENV] environment variable.
    pub user: Option<String>,

    /// The password.
    ///
    /// Falls back to the [PASSWORD_ENV] environment variable.
    pub password: Option<String>,

    /// The database name, if not the user's default.
    pub dbname: Option<String>,
}

impl Default for PostgresConfig {
    fn default() -> PostgresConfig {
        PostgresConfig {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            dbname: None,
        }
    }
}

impl PostgresConfig {
    /// Creates a new configuration for the given host.
    ///
    /// # Examples
    ///
    /// ```
    /// use geodb::PostgresConfig;
    ///
    /// let config = PostgresConfig::new("localhost").user("postgres");
    /// ```
    pub fn new(host: impl ToString) -> PostgresConfig {
        PostgresConfig {
            host: host.to_string(),
            ..Default::default()
        }
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> PostgresConfig {
        self.port = port;
        self
    }

    /// Sets the user name.
    pub fn user(mut self, user: impl ToString) -> PostgresConfig {
        self.user = Some(user.to_string());
        self
    }

    /// Sets the password.
    pub fn password(mut self, password: impl ToString) -> PostgresConfig {
        self.password = Some(password.to_string());
        self
    }

    /// Sets the database name.
    pub fn dbname(mut self, dbname: impl ToString) -> PostgresConfig {
        self.dbname = Some(dbname.to_string());
        self
    }
}

/// A PostGIS-backed collection store.
///
/// Holds one database connection for its whole lifetime; dropping the
/// backend closes it. Each collection is one table under the `public` schema
/// inheriting `id`, `properties`, `name`, `geometry`, and `type` from the
/// shared `geodb_master` table.
pub struct PostgresBackend {
    client: Client,
    collections: Vec<String>,
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("collections", &self.collections)
            .finish_non_exhaustive()
    }
}

impl PostgresBackend {
    /// Connects to the database and lists the known collections.
    ///
    /// The connection task is spawned onto the current tokio runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use geodb::{PostgresBackend, PostgresConfig};
    ///
    /// # tokio_test::block_on(async {
    /// let config = PostgresConfig::new("localhost").user("postgres");
    /// let backend = PostgresBackend::connect(config).await.unwrap();
    /// # })
    /// ```
    pub async fn connect(config: PostgresConfig) -> Result<PostgresBackend> {
        let user = config
            .user
            .or_else(|| std::env::var(USER_ENV).ok())
            .ok_or(Error::MissingCredential {
                name: "user",
                env: USER_ENV,
            })?;
        let password = config
            .password
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
            .ok_or(Error::MissingCredential {
                name: "password",
                env: PASSWORD_ENV,
            })?;

        let mut pg_config = tokio_postgres::Config::new();
        let _ = pg_config
            .host(&config.host)
            .port(config.port)
            .user(&user)
            .password(&password);
        if let Some(dbname) = &config.dbname {
            let _ = pg_config.dbname(dbname);
        }
        let (client, connection) = pg_config.connect(NoTls).await?;
        let _ = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!("connection error: {err}");
            }
        });
        PostgresBackend::from_client(client).await
    }

    /// Creates a backend from an already-open client.
    pub async fn from_client(client: Client) -> Result<PostgresBackend> {
        let mut backend = PostgresBackend {
            client,
            collections: Vec::new(),
        };
        backend.collections = backend.list_collections().await?;
        Ok(backend)
    }

    /// Returns the collection names known at construction, kept current
    /// through this backend's own create and drop operations.
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Executes a row-returning statement and returns all rows.
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        tracing::debug!(sql, "querying");
        self.client.query(sql, &[]).await.map_err(Error::from)
    }

    /// Executes a statement and returns the number of rows affected.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        tracing::debug!(sql, "executing");
        self.client.execute(sql, &[]).await.map_err(Error::from)
    }

    /// Reads the SRID of a collection's geometry column from its first row.
    pub async fn srid(&self, collection: &str) -> Result<Option<i32>> {
        let rows = self.query(&sql::collection_srid(collection)).await?;
        rows.first().map(|row| row.try_get(0)).transpose().map_err(Error::from)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let rows = self.query(sql::LIST_COLLECTIONS).await?;
        rows.iter()
            .map(|row| row.try_get(0).map_err(Error::from))
            .collect()
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool> {
        let rows = self.query(&sql::collection_exists(collection)).await?;
        rows.first()
            .map(|row| row.try_get(0))
            .transpose()
            .map_err(Error::from)
            .map(|exists| exists.unwrap_or(false))
    }

    async fn ensure_exists(&self, collection: &str) -> Result<()> {
        if self.collection_exists(collection).await? {
            Ok(())
        } else {
            Err(Error::CollectionNotFound(collection.to_string()))
        }
    }
}

impl Backend for PostgresBackend {
    async fn find_features(&self, collection: &str, options: &FindOptions) -> Result<FeatureSet> {
        self.ensure_exists(collection).await?;
        let predicate = filter::translate(
            options.query.as_deref(),
            options.bbox,
            options.bbox_mode,
            options.format,
            options.bbox_srid,
        );

        match options.format {
            OutputFormat::GeoJson => {
                let statement =
                    sql::select_features_json(collection, &predicate, options.max_records);
                let rows = self.query(&statement).await?;
                let features = rows
                    .iter()
                    .map(|row| {
                        let value: Value = row.try_get(0)?;
                        Ok(serde_json::from_value(value)?)
                    })
                    .collect::<Result<Vec<Feature>>>()?;
                Ok(FeatureSet::GeoJson(features))
            }
            OutputFormat::Tabular => {
                let statement =
                    sql::select_features_rows(collection, &predicate, options.max_records);
                let rows = self.query(&statement).await?;
                if rows.is_empty() {
                    return Ok(FeatureSet::Table(FeatureTable::placeholder()));
                }
                let columns = rows[0]
                    .columns()
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect();
                let rows = rows
                    .iter()
                    .map(|row| {
                        (0..row.columns().len())
                            .map(|index| row_value(row, index))
                            .collect()
                    })
                    .collect();
                Ok(FeatureSet::Table(FeatureTable {
                    columns,
                    rows,
                    geometry_column: "geometry".to_string(),
                }))
            }
        }
    }

    async fn new_collection(&mut self, collection: &str, schema: &Schema) -> Result<()> {
        if self.collection_exists(collection).await? {
            return Err(Error::CollectionExists(collection.to_string()));
        }
        let columns = sql::schema_columns(schema)?;
        let _ = self
            .execute(&sql::create_collection(collection, &columns))
            .await?;
        self.collections.push(collection.to_string());
        Ok(())
    }

    async fn drop_collection(&mut self, collection: &str) -> Result<()> {
        self.ensure_exists(collection).await?;
        let _ = self.execute(&sql::drop_collection(collection)).await?;
        self.collections.retain(|name| name != collection);
        Ok(())
    }

    async fn add_features(&mut self, collection: &str, features: &[Feature]) -> Result<()> {
        // Build every statement up front so a malformed feature fails the
        // batch before any SQL is issued.
        let statements = features
            .iter()
            .map(|feature| sql::insert_feature(collection, feature))
            .collect::<Result<Vec<_>>>()?;
        for statement in statements {
            let _ = self.execute(&statement).await?;
        }
        Ok(())
    }
}

/// Decodes one cell of a raw-column row into a JSON value.
///
/// Columns whose types have no mapping here (PostGIS geometries in
/// particular) come back as null; decoding them is the tabular
/// collaborator's concern.
fn row_value(row: &Row, index: usize) -> Value {
    let column_type = row.columns()[index].type_();
    let value = if *column_type == Type::BOOL {
        row.try_get::<_, bool>(index).map(Value::from)
    } else if *column_type == Type::INT2 {
        row.try_get::<_, i16>(index).map(Value::from)
    } else if *column_type == Type::INT4 {
        row.try_get::<_, i32>(index).map(Value::from)
    } else if *column_type == Type::INT8 {
        row.try_get::<_, i64>(index).map(Value::from)
    } else if *column_type == Type::FLOAT4 {
        row.try_get::<_, f32>(index).map(Value::from)
    } else if *column_type == Type::FLOAT8 {
        row.try_get::<_, f64>(index).map(Value::from)
    } else if *column_type == Type::TEXT || *column_type == Type::VARCHAR || *column_type == Type::NAME
    {
        row.try_get::<_, String>(index).map(Value::from)
    } else if *column_type == Type::JSON || *column_type == Type::JSONB {
        row.try_get::<_, Value>(index)
    } else {
        return Value::Null;
    };
    value.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::PostgresConfig;

    #[test]
    fn config_builder() {
        let config = PostgresConfig::new("db.example.com")
            .port(5433)
            .user("postgres")
            .password("postgres")
            .dbname("geo");
        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 5433);
        assert_eq!(config.user.as_deref(), Some("postgres"));
        assert_eq!(config.dbname.as_deref(), Some("geo"));
    }
}
