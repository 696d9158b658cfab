// Dataset driver: format dispatch, regeneration, attribute filtering
use city_mesh::{CityObject, Dataset, DatasetConfig, SurfaceType};
use std::collections::BTreeSet;

const GML_FIXTURE: &str = "tests/data/two_buildings.gml";
const JSON_FIXTURE: &str = "tests/data/cube_and_tin.json";

fn snapshot(dataset: &Dataset) -> Vec<(String, Vec<(SurfaceType, Vec<f32>)>, Vec<f32>)> {
    dataset
        .objects()
        .map(|object| {
            let triangles = object
                .triangle_buffers()
                .map(|(surface_type, buffer)| (surface_type, buffer.to_vec()))
                .collect();
            (object.id.clone(), triangles, object.edges().to_vec())
        })
        .collect()
}

#[test]
fn test_load_dispatches_on_extension() {
    let mut dataset = Dataset::new();

    dataset.load(GML_FIXTURE).expect("gml");
    assert_eq!(dataset.len(), 4);

    dataset.load(JSON_FIXTURE).expect("json");
    assert_eq!(dataset.len(), 3);
    assert!(dataset.object_by_id("BLD_1").is_none());

    let error = dataset.load("tests/data/city.obj").unwrap_err();
    assert!(error.to_string().contains("Unsupported file extension"));
    assert!(dataset.is_empty());
}

#[test]
fn test_regeneration_is_idempotent() {
    for fixture in [GML_FIXTURE, JSON_FIXTURE] {
        let mut dataset = Dataset::new();
        dataset.load(fixture).expect("load");

        dataset.regenerate_geometries();
        let first = snapshot(&dataset);
        dataset.regenerate_geometries();
        let second = snapshot(&dataset);

        assert_eq!(first, second, "{} changed between regenerations", fixture);
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let mut parallel = Dataset::with_config(DatasetConfig::default());
    let mut sequential = Dataset::with_config(DatasetConfig::default().sequential());

    assert!(parallel.config().parallel_regeneration);
    assert!(!sequential.config().parallel_regeneration);

    parallel.load(GML_FIXTURE).expect("load");
    sequential.load(GML_FIXTURE).expect("load");
    parallel.regenerate_geometries();
    sequential.regenerate_geometries();

    assert_eq!(snapshot(&parallel), snapshot(&sequential));
}

#[test]
fn test_buffer_lengths() {
    let mut dataset = Dataset::new();
    dataset.load(GML_FIXTURE).expect("load");
    dataset.regenerate_geometries();

    for object in dataset.objects() {
        for (_, buffer) in object.triangle_buffers() {
            assert_eq!(buffer.len() % 9, 0, "{}", object.id);
        }
        assert_eq!(object.edges().len() % 6, 0, "{}", object.id);
    }
}

#[test]
fn test_emitted_vertices_are_input_points() {
    let mut dataset = Dataset::new();
    dataset.load(JSON_FIXTURE).expect("load");
    dataset.regenerate_geometries();

    for object in dataset.objects() {
        let points: Vec<[f32; 3]> = object.points().map(|p| [p.x, p.y, p.z]).collect();
        for (_, buffer) in object.triangle_buffers() {
            for corner in buffer.chunks_exact(3) {
                assert!(points.contains(&[corner[0], corner[1], corner[2]]), "{}", object.id);
            }
        }
    }
}

#[test]
fn test_every_surface_type_gets_a_buffer() {
    let mut dataset = Dataset::new();
    dataset.load(GML_FIXTURE).expect("load");
    dataset.regenerate_geometries();

    let road = dataset.object_by_id("RD_1").expect("RD_1");
    let surface_types: Vec<SurfaceType> = road.triangle_buffers().map(|(t, _)| t).collect();
    assert_eq!(surface_types, vec![SurfaceType::Undefined]);
    assert!(road.triangles(SurfaceType::Undefined).is_empty());
}

#[test]
fn test_filter_attributes() {
    let config = DatasetConfig::default().with_preserved(["name", "function"]);
    let mut dataset = Dataset::with_config(config);
    dataset.load(GML_FIXTURE).expect("load");

    // Ingestion keeps everything
    let hall = dataset.object_by_id("BLD_1").expect("BLD_1");
    assert_eq!(hall.attributes.len(), 3);

    dataset.filter_attributes();
    let hall = dataset.object_by_id("BLD_1").expect("BLD_1");
    let keys: Vec<&str> = hall.attributes().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["name", "function"]);

    // Geometry is untouched by filtering
    assert_eq!(hall.polygon_count(), 3);
}

#[test]
fn test_empty_preservation_set_keeps_nothing() {
    let mut dataset = Dataset::new();
    dataset.load(JSON_FIXTURE).expect("load");
    assert!(dataset.attributes_to_preserve().is_empty());

    dataset.filter_attributes();
    assert!(dataset.objects().all(|object| object.attributes.is_empty()));

    dataset.load(JSON_FIXTURE).expect("reload");
    dataset.set_attributes_to_preserve(BTreeSet::from(["class".to_string()]));
    dataset.filter_attributes();
    let kept: usize = dataset.objects().map(|object| object.attributes.len()).sum();
    assert_eq!(kept, 1);
}

#[test]
fn test_clear() {
    let mut dataset = Dataset::new();
    dataset.load(GML_FIXTURE).expect("load");
    assert!(!dataset.diagnostics().is_empty());

    dataset.clear();
    assert!(dataset.is_empty());
    assert!(dataset.diagnostics().is_empty());
    assert!(dataset.bounds().is_none());
}

#[test]
fn test_objects_serialize_for_consumers() {
    let mut dataset = Dataset::new();
    dataset.load(JSON_FIXTURE).expect("load");
    dataset.regenerate_geometries();

    let terrain: &CityObject = dataset.object_by_id("terrain").expect("terrain");
    let value = serde_json::to_value(terrain).expect("serialize");

    assert_eq!(value["type"], "TINRelief");
    assert_eq!(value["id"], "terrain");
    assert_eq!(value["triangles_by_type"][""].as_array().map(Vec::len), Some(18));
    assert_eq!(value["edges"].as_array().map(Vec::len), Some(36));
    assert!(value.get("polygons_by_type").is_none());
}
