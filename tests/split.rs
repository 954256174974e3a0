use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::tempdir;

use geojson_prep::partitioner::{self, INDEX_FILENAME, NO_DISTRICT_FILENAME};
use geojson_prep::Error;

fn tree_in(code: &str, name: &str, marker: u64) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [-3.7, 40.4] },
        "properties": {
            "NUM_DTO": code,
            "NBRE_DTO": name,
            "species": "Platanus x hispanica",
            "marker": marker
        }
    })
}

fn stray_tree(marker: u64) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [-3.7, 40.4] },
        "properties": { "species": "Ulmus pumila", "marker": marker }
    })
}

fn write_collection(path: &Path, features: Vec<Value>) {
    let doc = json!({ "type": "FeatureCollection", "features": features });
    fs::write(path, serde_json::to_string(&doc).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn listing(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect()
}

fn markers_of(doc: &Value) -> Vec<u64> {
    doc["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["marker"].as_u64().unwrap())
        .collect()
}

#[test]
fn writes_one_file_per_district_plus_index() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("trees.geojson");
    let out = dir.path().join("districts");
    write_collection(
        &input,
        vec![
            tree_in("02", "Retiro", 1),
            tree_in("01", "Centro", 2),
            tree_in("01", "Centro", 3),
        ],
    );

    let index = partitioner::split_by_district(&input, &out).unwrap();

    assert_eq!(index.total_trees, 3);
    assert_eq!(index.total_districts, 2);
    let expected: BTreeSet<String> = [
        "district_01_Centro.geojson",
        "district_02_Retiro.geojson",
        INDEX_FILENAME,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(listing(&out), expected);

    let centro = read_json(&out.join("district_01_Centro.geojson"));
    assert_eq!(centro["type"], "FeatureCollection");
    assert_eq!(centro["properties"]["district_code"], "01");
    assert_eq!(centro["properties"]["district_name"], "Centro");
    assert_eq!(centro["properties"]["tree_count"], 2);
    assert_eq!(markers_of(&centro), [2, 3]);
    // District features keep their full property set.
    assert_eq!(centro["features"][0]["properties"]["NUM_DTO"], "01");
    assert_eq!(
        centro["features"][0]["properties"]["species"],
        "Platanus x hispanica"
    );

    let on_disk = read_json(&out.join(INDEX_FILENAME));
    assert_eq!(on_disk["total_trees"], 3);
    assert_eq!(on_disk["total_districts"], 2);
    assert_eq!(on_disk["districts"][0]["filename"], "district_01_Centro.geojson");
    assert_eq!(on_disk["districts"][0]["tree_count"], 2);
    assert_eq!(on_disk["districts"][1]["code"], "02");

    // District files are compact, the index is indented for reading.
    let district_raw = fs::read_to_string(out.join("district_01_Centro.geojson")).unwrap();
    assert!(!district_raw.contains('\n'));
    let index_raw = fs::read_to_string(out.join(INDEX_FILENAME)).unwrap();
    assert!(index_raw.contains('\n'));
}

#[test]
fn trees_without_a_district_land_in_the_fallback_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("trees.geojson");
    let out = dir.path().join("districts");
    write_collection(
        &input,
        vec![
            tree_in("01", "Centro", 1),
            stray_tree(2),
            tree_in("  ", "Centro", 3),
        ],
    );

    let index = partitioner::split_by_district(&input, &out).unwrap();

    assert_eq!(index.total_trees, 3);
    assert_eq!(index.total_districts, 1);
    let last = index.districts.last().unwrap();
    assert_eq!(last.code, "00");
    assert_eq!(last.name, "Sin distrito");
    assert_eq!(last.filename, NO_DISTRICT_FILENAME);
    assert_eq!(last.tree_count, 2);

    let fallback = read_json(&out.join(NO_DISTRICT_FILENAME));
    assert_eq!(markers_of(&fallback), [2, 3]);
}

#[test]
fn every_tree_lands_in_exactly_one_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("trees.geojson");
    let out = dir.path().join("districts");
    write_collection(
        &input,
        vec![
            tree_in("01", "Centro", 0),
            tree_in("12", "Usera", 1),
            tree_in("02", "Retiro", 2),
            tree_in("01", "Centro", 3),
            stray_tree(4),
            tree_in("02", "Retiro", 5),
        ],
    );

    let index = partitioner::split_by_district(&input, &out).unwrap();

    let mut seen = Vec::new();
    for entry in &index.districts {
        for marker in markers_of(&read_json(&out.join(&entry.filename))) {
            seen.push(marker);
        }
    }
    seen.sort();
    assert_eq!(seen, (0..6).collect::<Vec<u64>>());

    let counted: usize = index.districts.iter().map(|d| d.tree_count).sum();
    assert_eq!(counted, index.total_trees);
}

#[test]
fn index_entries_are_sorted_by_district() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("trees.geojson");
    let out = dir.path().join("districts");
    write_collection(
        &input,
        vec![
            tree_in("12", "Usera", 0),
            tree_in("01", "Centro", 1),
            tree_in("02", "Retiro", 2),
            stray_tree(3),
        ],
    );

    let index = partitioner::split_by_district(&input, &out).unwrap();

    let codes: Vec<&str> = index.districts.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, ["01", "02", "12", "00"]);
}

#[test]
fn filenames_are_sanitized_and_deduplicated() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("trees.geojson");
    let out = dir.path().join("districts");
    write_collection(
        &input,
        vec![tree_in("07", "A B", 0), tree_in("07", "A/B", 1)],
    );

    let index = partitioner::split_by_district(&input, &out).unwrap();

    let filenames: Vec<&str> = index.districts.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(
        filenames,
        ["district_07_A_B.geojson", "district_07_A_B_2.geojson"]
    );
    assert!(out.join("district_07_A_B.geojson").exists());
    assert!(out.join("district_07_A_B_2.geojson").exists());
}

#[test]
fn missing_input_is_reported() {
    let dir = tempdir().unwrap();
    let err = partitioner::split_by_district(
        &dir.path().join("nope.geojson"),
        &dir.path().join("districts"),
    )
    .unwrap_err();

    assert!(matches!(err, Error::MissingFile(_)));
}

#[test]
fn non_collection_input_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("trees.geojson");
    fs::write(
        &input,
        serde_json::to_string(&tree_in("01", "Centro", 0)).unwrap(),
    )
    .unwrap();

    let err = partitioner::split_by_district(&input, &dir.path().join("districts")).unwrap_err();

    assert!(matches!(err, Error::Format { .. }));
}
