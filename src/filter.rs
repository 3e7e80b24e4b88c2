//! Translation of backend-agnostic filters into SQL predicates.

use crate::{Bbox, BboxMode, OutputFormat};

/// Combines a textual query and an optional bounding-box constraint into a
/// single SQL predicate.
///
/// With the GeoJson output format the query is a key lookup into the JSON
/// `properties` column; with the Tabular format it is passed through
/// unchanged and assumed to already be a valid column predicate. When both a
/// query and a bounding box are present the two predicates are joined with
/// `AND`. With neither, the predicate is the literal `TRUE`.
///
/// # Examples
///
/// ```
/// use geodb::{Bbox, BboxMode, OutputFormat, filter};
///
/// let predicate = filter::translate(
///     None,
///     Some(Bbox::new(0., 0., 1., 1.)),
///     BboxMode::Contains,
///     OutputFormat::GeoJson,
///     Some(4326),
/// );
/// assert!(predicate.starts_with("ST_Contains("));
/// ```
pub fn translate(
    query: Option<&str>,
    bbox: Option<Bbox>,
    bbox_mode: BboxMode,
    format: OutputFormat,
    srid: Option<i32>,
) -> String {
    let bbox_predicate = bbox.map(|bbox| {
        let region = format!("'{}'::geometry", bbox.to_wkt_polygon(srid));
        match bbox_mode {
            BboxMode::Contains => format!("ST_Contains({region}, geometry)"),
            BboxMode::Within => format!("ST_Within({region}, geometry)"),
        }
    });

    match (query, bbox_predicate) {
        (None, None) => "TRUE".to_string(),
        (Some(query), None) => rewrite_query(query, format),
        (None, Some(bbox_predicate)) => bbox_predicate,
        (Some(query), Some(bbox_predicate)) => {
            format!("{} AND {bbox_predicate}", rewrite_query(query, format))
        }
    }
}

fn rewrite_query(query: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::GeoJson => format!("properties->>{query}"),
        OutputFormat::Tabular => query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::translate;
    use crate::{Bbox, BboxMode, OutputFormat};

    #[test]
    fn neither_is_true() {
        let predicate = translate(
            None,
            None,
            BboxMode::Contains,
            OutputFormat::GeoJson,
            None,
        );
        assert_eq!(predicate, "TRUE");
    }

    #[test]
    fn query_only_geojson_is_a_properties_lookup() {
        let predicate = translate(
            Some("'name' = 'park'"),
            None,
            BboxMode::Contains,
            OutputFormat::GeoJson,
            None,
        );
        assert_eq!(predicate, "properties->>'name' = 'park'");
    }

    #[test]
    fn query_only_tabular_passes_through() {
        let predicate = translate(
            Some("height > 3.5"),
            None,
            BboxMode::Contains,
            OutputFormat::Tabular,
            None,
        );
        assert_eq!(predicate, "height > 3.5");
    }

    #[test]
    fn bbox_only() {
        let predicate = translate(
            None,
            Some(Bbox::new(10., 10., 20., 20.)),
            BboxMode::Contains,
            OutputFormat::Tabular,
            Some(4326),
        );
        assert_eq!(
            predicate,
            "ST_Contains('SRID=4326;POLYGON((10 10,10 20,20 20,20 10,10 10))'::geometry, geometry)"
        );
    }

    #[test]
    fn both_are_joined_with_and() {
        let predicate = translate(
            Some("height > 3.5"),
            Some(Bbox::new(0., 0., 1., 1.)),
            BboxMode::Within,
            OutputFormat::Tabular,
            None,
        );
        assert_eq!(
            predicate,
            "height > 3.5 AND ST_Within('POLYGON((0 0,0 1,1 1,1 0,0 0))'::geometry, geometry)"
        );
    }

    #[test]
    fn modes_differ_only_in_the_function_name() {
        let contains = translate(
            None,
            Some(Bbox::new(0., 0., 1., 1.)),
            BboxMode::Contains,
            OutputFormat::GeoJson,
            Some(4326),
        );
        let within = translate(
            None,
            Some(Bbox::new(0., 0., 1., 1.)),
            BboxMode::Within,
            OutputFormat::GeoJson,
            Some(4326),
        );
        assert_eq!(
            contains.replace("ST_Contains", "ST_Within"),
            within
        );
    }
}
