use geodb::{
    Backend, Error, FindOptions, LocalBackend, OutputFormat, Service, ServiceConfig,
};
use rstest::{fixture, rstest};
use std::{io::Write, path::PathBuf};
use tempfile::TempDir;

const PARKS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "id": 1,
            "properties": {"name": "north common", "area": 12.5},
            "geometry": {"type": "Point", "coordinates": [10.0, 50.0]}
        },
        {
            "type": "Feature",
            "id": 2,
            "properties": {"name": "riverside", "area": 3.25},
            "geometry": {"type": "Point", "coordinates": [10.1, 50.1]}
        },
        {
            "type": "Feature",
            "id": 3,
            "properties": {"name": "old orchard", "area": 7.0},
            "geometry": {"type": "Point", "coordinates": [10.2, 50.2]}
        }
    ]
}"#;

struct Fixture {
    backend: LocalBackend,
    _tempdir: TempDir,
}

#[fixture]
fn parks() -> Fixture {
    let tempdir = TempDir::new().unwrap();
    let mut file = std::fs::File::create(tempdir.path().join("parks.geojson")).unwrap();
    file.write_all(PARKS.as_bytes()).unwrap();
    Fixture {
        backend: LocalBackend::new(tempdir.path()),
        _tempdir: tempdir,
    }
}

#[rstest]
#[tokio::test]
async fn find_feature_by_id(parks: Fixture) {
    let feature = parks
        .backend
        .find_feature("parks", &FindOptions::new().query("id == 2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        feature.properties.as_ref().unwrap()["name"],
        "riverside"
    );
}

#[rstest]
#[tokio::test]
async fn find_feature_without_match(parks: Fixture) {
    let feature = parks
        .backend
        .find_feature("parks", &FindOptions::new().query("id == 99"))
        .await
        .unwrap();
    assert!(feature.is_none());
}

#[rstest]
#[tokio::test]
async fn find_features_in_file_order(parks: Fixture) {
    let features = parks
        .backend
        .find_features("parks", &FindOptions::new().query("area > 5"))
        .await
        .unwrap()
        .into_features()
        .unwrap();
    let names: Vec<_> = features
        .iter()
        .map(|feature| feature.properties.as_ref().unwrap()["name"].clone())
        .collect();
    assert_eq!(names, vec!["north common", "old orchard"]);
}

#[rstest]
#[tokio::test]
async fn missing_query_matches_everything(parks: Fixture) {
    let features = parks
        .backend
        .find_features("parks", &FindOptions::new())
        .await
        .unwrap();
    assert_eq!(features.len(), 3);
}

#[rstest]
#[case(0, 0)]
#[case(2, 2)]
#[case(10, 3)]
#[tokio::test]
async fn max_records_caps_the_result(parks: Fixture, #[case] max_records: u64, #[case] len: usize) {
    let features = parks
        .backend
        .find_features("parks", &FindOptions::new().max_records(max_records))
        .await
        .unwrap();
    assert_eq!(features.len(), len);
}

#[rstest]
#[tokio::test]
async fn evaluation_failures_are_non_matches(parks: Fixture) {
    // `depth` is not defined on any feature, so nothing matches, but the
    // operation itself succeeds.
    let features = parks
        .backend
        .find_features("parks", &FindOptions::new().query("depth > 1"))
        .await
        .unwrap();
    assert!(features.is_empty());
}

#[rstest]
#[tokio::test]
async fn bbox_is_unsupported(parks: Fixture) {
    let result = parks
        .backend
        .find_features(
            "parks",
            &FindOptions::new().bbox([10.0, 50.0, 10.2, 50.2]),
        )
        .await;
    assert!(matches!(result.unwrap_err(), Error::Unsupported(_)));
}

#[rstest]
#[tokio::test]
async fn unknown_collection(parks: Fixture) {
    let result = parks
        .backend
        .find_features("reservoirs", &FindOptions::new())
        .await;
    assert!(matches!(result.unwrap_err(), Error::CollectionNotFound(_)));
}

#[rstest]
#[tokio::test]
async fn unknown_collection_with_zero_max_records(parks: Fixture) {
    let result = parks
        .backend
        .find_features("reservoirs", &FindOptions::new().max_records(0))
        .await;
    assert!(matches!(result.unwrap_err(), Error::CollectionNotFound(_)));
}

#[rstest]
#[tokio::test]
async fn mutations_are_unsupported(parks: Fixture) {
    let mut backend = parks.backend.clone();
    assert!(matches!(
        backend
            .new_collection("sites", &geodb::Schema::new())
            .await
            .unwrap_err(),
        Error::Unsupported(_)
    ));
    assert!(matches!(
        backend.drop_collection("parks").await.unwrap_err(),
        Error::Unsupported(_)
    ));
    assert!(matches!(
        backend.add_features("parks", &[]).await.unwrap_err(),
        Error::Unsupported(_)
    ));
}

#[rstest]
#[tokio::test]
async fn format_does_not_change_the_local_shape(parks: Fixture) {
    let features = parks
        .backend
        .find_features(
            "parks",
            &FindOptions::new().format(OutputFormat::Tabular),
        )
        .await
        .unwrap();
    assert!(features.into_features().is_some());
}

#[tokio::test]
async fn factory_selects_the_local_backend() {
    let tempdir = TempDir::new().unwrap();
    let config = ServiceConfig {
        directory: Some(PathBuf::from(tempdir.path())),
        ..Default::default()
    };
    let service = Service::create("local", config).await.unwrap();
    assert!(matches!(service, Service::Local(_)));
}
