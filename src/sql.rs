//! SQL statement construction for the PostGIS backend.
//!
//! Collection names and property names are interpolated as quoted
//! identifiers and constructed values as escaped literals. The filter
//! predicate produced by [`crate::filter::translate`] is interpolated as-is
//! and remains the caller's responsibility.

use crate::{Error, Feature, Result, Schema};
use serde_json::Value;

/// The feature property that supplies the `name` column on insert.
pub const NAME_PROPERTY: &str = "S_NAME";

/// Lists the tables that hold a `properties` column, outside the system
/// schemas.
pub(crate) const LIST_COLLECTIONS: &str = "\
SELECT t.table_name
FROM information_schema.tables t
INNER JOIN information_schema.columns c
    ON c.table_name = t.table_name AND c.table_schema = t.table_schema
WHERE c.column_name = 'properties'
    AND t.table_schema NOT IN ('information_schema', 'pg_catalog')
    AND t.table_type = 'BASE TABLE'
ORDER BY t.table_schema";

/// Quotes an identifier, doubling any embedded double-quotes.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quotes a string literal, doubling any embedded single-quotes.
pub(crate) fn quote_literal(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}

/// Renders a property value as a SQL literal.
///
/// Numbers and booleans are emitted unquoted, nulls become the SQL null
/// literal, and everything else is quoted as a string.
pub(crate) fn literal_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_literal(s),
        other => quote_literal(&other.to_string()),
    }
}

/// Maps a property name and abstract type descriptor to a column
/// declaration.
///
/// # Examples
///
/// ```
/// use geodb::sql::column_definition;
///
/// let column = column_definition("height", "float:8.2").unwrap();
/// assert_eq!(column, "\"height\" numeric(8,2)");
/// ```
pub fn column_definition(name: &str, descriptor: &str) -> Result<String> {
    let name = quote_ident(name);
    if descriptor == "str" {
        Ok(format!(
            "{name} character varying(256) COLLATE pg_catalog.\"default\""
        ))
    } else if descriptor.contains("int") {
        Ok(format!("{name} integer"))
    } else if descriptor.contains("float") {
        let precision = descriptor
            .split_once(':')
            .and_then(|(_, suffix)| suffix.split_once('.'))
            .map(|(precision, scale)| format!("({precision},{scale})"))
            .unwrap_or_default();
        Ok(format!("{name} numeric{precision}"))
    } else {
        Err(Error::UnsupportedColumnType(descriptor.to_string()))
    }
}

/// Selects matching features projected as GeoJSON Feature objects.
pub(crate) fn select_features_json(
    collection: &str,
    predicate: &str,
    max_records: Option<u64>,
) -> String {
    format!(
        "SELECT json_build_object(\
         'type', 'Feature', \
         'properties', properties::json, \
         'geometry', ST_AsGeoJSON(geometry)::json) \
         FROM {} WHERE {predicate}{}",
        quote_ident(collection),
        limit_clause(max_records),
    )
}

/// Selects matching features as raw columns.
pub(crate) fn select_features_rows(
    collection: &str,
    predicate: &str,
    max_records: Option<u64>,
) -> String {
    format!(
        "SELECT * FROM {} WHERE {predicate}{}",
        quote_ident(collection),
        limit_clause(max_records),
    )
}

fn limit_clause(max_records: Option<u64>) -> String {
    max_records
        .map(|max_records| format!(" LIMIT {max_records}"))
        .unwrap_or_default()
}

/// Checks whether a collection table exists under the `public` schema.
pub(crate) fn collection_exists(collection: &str) -> String {
    format!(
        "SELECT EXISTS (\
         SELECT 1 FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_name = {})",
        quote_literal(collection),
    )
}

/// Creates a collection table inheriting `id`, `properties`, `name`,
/// `geometry`, and `type` from the shared master table.
pub(crate) fn create_collection(collection: &str, columns: &[String]) -> String {
    format!(
        "CREATE TABLE public.{} ({}) INHERITS (public.geodb_master)",
        quote_ident(collection),
        columns.join(", "),
    )
}

/// Drops a collection table.
pub(crate) fn drop_collection(collection: &str) -> String {
    format!("DROP TABLE public.{}", quote_ident(collection))
}

/// Reads the SRID of a collection's geometry column from its first row.
pub(crate) fn collection_srid(collection: &str) -> String {
    format!(
        "SELECT ST_SRID(geometry) FROM {} LIMIT 1",
        quote_ident(collection),
    )
}

/// Builds the column declarations for a schema, in property order.
pub(crate) fn schema_columns(schema: &Schema) -> Result<Vec<String>> {
    schema
        .properties
        .iter()
        .map(|(name, descriptor)| column_definition(name, descriptor))
        .collect()
}

/// Builds an INSERT statement for one feature.
///
/// The full properties mapping is stored as a JSON blob, the `name` column
/// is taken from the [NAME_PROPERTY] property, and the geometry column is
/// derived from the feature's GeoJSON geometry.
pub(crate) fn insert_feature(collection: &str, feature: &Feature) -> Result<String> {
    let properties = feature
        .properties
        .as_ref()
        .ok_or(Error::MissingField("properties"))?;
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or(Error::MissingField("geometry"))?;
    let name = match properties.get(NAME_PROPERTY) {
        Some(Value::String(name)) => name.clone(),
        Some(value) => value.to_string(),
        None => return Err(Error::MissingProperty(NAME_PROPERTY)),
    };

    let columns = properties
        .keys()
        .map(|key| quote_ident(&key.to_lowercase()))
        .collect::<Vec<_>>()
        .join(",");
    let values = properties
        .values()
        .map(literal_value)
        .collect::<Vec<_>>()
        .join(",");

    Ok(format!(
        "INSERT INTO {} (properties, name, {columns}, geometry) \
         VALUES ({}, {}, {values}, ST_GeomFromGeoJSON({}))",
        quote_ident(collection),
        quote_literal(&serde_json::to_string(properties)?),
        quote_literal(&name),
        quote_literal(&serde_json::to_string(geometry)?),
    ))
}
