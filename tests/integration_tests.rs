use flate2::Compression;
use flate2::write::GzEncoder;
use idealista18_enrich::artifacts::get_dataset;
use idealista18_enrich::config::City;
use idealista18_enrich::enrich::{EnrichOptions, Enricher};
use idealista18_enrich::fetch::{LocalSource, Resource};
use idealista18_enrich::frame::{column_names, f64_values, str_values};
use idealista18_enrich::infra::registry::LocalRegistry;
use idealista18_enrich::services::artifact_registry::METADATA_FILE;
use std::io::Write;
use std::path::Path;

const LISTINGS: &str = "\
ASSETID;PERIOD;PRICE;UNITPRICE;CONSTRUCTEDAREA;LATITUDE;LONGITUDE
A_OUTSIDE;201803;300000;3000;100;40.45;-3.65
A_IN_1;201803;100;1;100;40.41;-3.71
A_IN_2;201803;200;2;100;40.41;-3.705
";

const MARKETING: &str = "\
LOCATIONID;LOCATIONNAME;WKT
0-EU-ES-28-07-001-079-01-001;Palacio;\"POLYGON ((-3.72 40.40, -3.69 40.40, -3.69 40.43, \
-3.72 40.43, -3.72 40.40))\"
";

const CENSUS: &str = "\
CUSEC;WKT
2807901001;\"POLYGON ((-3.72 40.40, -3.70 40.40, -3.70 40.42, -3.72 40.42, -3.72 40.40))\"
";

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn write_resource(source: &LocalSource, resource: Resource, city: &City, text: &str) {
    let path = source.path(resource, city);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, gzip(text)).unwrap();
}

fn dataset_dir(root: &Path, city: &City) -> LocalSource {
    let source = LocalSource::new(root);
    write_resource(&source, Resource::Listings, city, LISTINGS);
    write_resource(&source, Resource::MarketingZones, city, MARKETING);
    write_resource(&source, Resource::CensusSections, city, CENSUS);
    source
}

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let city = City::new("madrid").unwrap();
    let source = dataset_dir(dir.path(), &city);

    let enrichment = Enricher::new(source, EnrichOptions::default())
        .enrich(&city)
        .expect("enrichment failed");
    let frame = &enrichment.frame;

    assert_eq!(frame.height(), 3);
    assert_eq!(enrichment.summary.raw_listings, 3);
    assert_eq!(enrichment.summary.matched_listings, 2);

    let cusec = str_values(frame, "CUSEC").unwrap();
    let section = Some("2807901001".to_string());
    assert_eq!(cusec, vec![None, section.clone(), section]);

    let means = f64_values(frame, "CUSEC_PRICE_mean").unwrap();
    assert_eq!(means, vec![None, Some(150.0), Some(150.0)]);
    assert_eq!(f64_values(frame, "ID_PRICE_mean").unwrap()[0], None);
    assert_eq!(
        f64_values(frame, "ID_PRICE_median").unwrap()[1],
        Some(150.0)
    );

    // original attributes survive the merge
    assert_eq!(
        f64_values(frame, "CONSTRUCTEDAREA").unwrap(),
        vec![Some(100.0); 3]
    );
}

#[test]
fn test_each_city_reads_its_own_resources() {
    let dir = tempfile::tempdir().unwrap();
    let madrid = City::new("Madrid").unwrap();
    let valencia = City::new("VALENCIA").unwrap();
    dataset_dir(dir.path(), &madrid);

    let result = Enricher::new(LocalSource::new(dir.path()), EnrichOptions::default())
        .enrich(&valencia);
    assert!(result.is_err());
}

#[test]
fn test_missing_zone_file_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let city = City::new("madrid").unwrap();
    let source = LocalSource::new(dir.path());
    write_resource(&source, Resource::Listings, &city, LISTINGS);

    let err = Enricher::new(source, EnrichOptions::default())
        .enrich(&city)
        .unwrap_err();
    assert!(format!("{err:#}").contains("Madrid_polygons"));
}

#[tokio::test]
async fn test_dataset_splits_from_local_registry() {
    let root = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();

    for version in ["v0", "v1"] {
        let dir = root.path().join("prices/dataset/splits").join(version);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(METADATA_FILE), r#"{"tags": []}"#).unwrap();
        let rows = if version == "v1" { "60,2\n80,3\n" } else { "1,1\n" };
        let x_train = gzip(&format!("AREA,ROOMS\n{rows}"));
        std::fs::write(dir.join("X_train.csv.gz"), x_train).unwrap();
        std::fs::write(dir.join("X_test.csv.gz"), gzip("AREA,ROOMS\n70,2\n")).unwrap();
        std::fs::write(dir.join("y_train.csv.gz"), gzip("PRICE\n100\n200\n")).unwrap();
        std::fs::write(dir.join("y_test.csv.gz"), gzip("PRICE\n150\n")).unwrap();
    }

    let registry = LocalRegistry::new(root.path());
    let splits = get_dataset(&registry, "prices", "splits:latest", dest.path())
        .await
        .expect("dataset retrieval failed");

    assert_eq!(splits.x_train.height(), 2);
    assert_eq!(column_names(&splits.x_train), vec!["AREA", "ROOMS"]);

    let labels = splits.y_train_values().unwrap();
    let labels: Vec<_> = labels.i64().unwrap().into_iter().collect();
    assert_eq!(labels, vec![Some(100), Some(200)]);
    assert_eq!(splits.y_test_values().unwrap().len(), 1);

    let runs: Vec<_> = std::fs::read_dir(root.path().join("prices/runs"))
        .unwrap()
        .collect();
    assert_eq!(runs.len(), 1);
}
