use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;

use crate::document;
use crate::error::{Error, Result};

pub const DISTRICT_CODE_PROPERTY: &str = "NUM_DTO";
pub const DISTRICT_NAME_PROPERTY: &str = "NBRE_DTO";

// Bucket for trees whose properties name no district.
pub const NO_DISTRICT_CODE: &str = "00";
pub const NO_DISTRICT_NAME: &str = "Sin distrito";
pub const NO_DISTRICT_FILENAME: &str = "district_00_sin_distrito.geojson";

pub const INDEX_FILENAME: &str = "districts_index.json";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistrictKey {
    pub code: String,
    pub name: String,
}

impl DistrictKey {
    // Composite form that orders the output files and the index entries.
    fn composite(&self) -> String {
        format!("{}_{}", self.code, self.name)
    }
}

/// One entry of the index document, describing a written district file.
#[derive(Debug, Clone, Serialize)]
pub struct DistrictSummary {
    pub code: String,
    pub name: String,
    pub filename: String,
    pub tree_count: usize,
    pub size_mb: f64,
}

/// The `districts_index.json` document.
#[derive(Debug, Clone, Serialize)]
pub struct DistrictIndex {
    pub total_trees: usize,
    pub total_districts: usize,
    pub districts: Vec<DistrictSummary>,
}

/// Splits a tree dataset into one GeoJSON file per district plus an index,
/// all inside `output_dir`.
pub fn split_by_district(input: &Path, output_dir: &Path) -> Result<DistrictIndex> {
    println!("Reading {}...", input.display());
    let input_bytes = document::file_size(input)?;
    println!("Original size: {:.2} MB", document::megabytes(input_bytes));

    let collection = document::read_feature_collection(input)?;
    let total_trees = collection.features.len();
    println!("Total trees: {}", total_trees);

    println!("\nGrouping trees by district...");
    let (districts, no_district) = group_by_district(collection.features);
    let total_districts = districts.len();

    fs::create_dir_all(output_dir).map_err(|e| Error::Write {
        path: output_dir.to_path_buf(),
        source: e.into(),
    })?;
    println!("Creating files in: {}/", output_dir.display());

    let mut used_filenames = HashSet::new();
    let mut summaries = Vec::new();
    let mut total_saved = 0;

    for (key, features) in districts {
        let filename = claim_filename(
            district_filename(&key.code, &key.name),
            &mut used_filenames,
        );
        let summary = write_district(output_dir, &key.code, &key.name, &filename, features)?;
        total_saved += summary.tree_count;
        println!(
            "  {} - {}: {} trees ({:.2} MB)",
            summary.code, summary.name, summary.tree_count, summary.size_mb
        );
        summaries.push(summary);
    }

    // The no-district bucket always goes last.
    if !no_district.is_empty() {
        let filename = claim_filename(NO_DISTRICT_FILENAME.to_string(), &mut used_filenames);
        let summary = write_district(
            output_dir,
            NO_DISTRICT_CODE,
            NO_DISTRICT_NAME,
            &filename,
            no_district,
        )?;
        total_saved += summary.tree_count;
        println!(
            "  {} - {}: {} trees ({:.2} MB)",
            summary.code, summary.name, summary.tree_count, summary.size_mb
        );
        summaries.push(summary);
    }

    let index = DistrictIndex {
        total_trees,
        total_districts,
        districts: summaries,
    };
    let index_path = output_dir.join(INDEX_FILENAME);
    document::write_pretty(&index_path, &index)?;

    println!("\nSplit complete");
    println!("Files created: {}", index.districts.len());
    println!("Trees saved: {} of {}", total_saved, total_trees);
    println!("Index written: {}", index_path.display());
    report_stats(&index.districts);

    Ok(index)
}

/// Buckets features by their trimmed (code, name) pair; features with either
/// value absent, blank, or not a string land in the trailing no-district
/// list. Districts come back ordered by composite key, and input order is
/// preserved inside every bucket.
pub fn group_by_district(
    features: Vec<Feature>,
) -> (Vec<(DistrictKey, Vec<Feature>)>, Vec<Feature>) {
    let mut buckets: HashMap<DistrictKey, Vec<Feature>> = HashMap::new();
    let mut no_district = Vec::new();

    for feature in features {
        match district_key(&feature) {
            Some(key) => buckets.entry(key).or_default().push(feature),
            None => no_district.push(feature),
        }
    }

    let mut districts: Vec<_> = buckets.into_iter().collect();
    // Composite ties (underscores inside a name) break by code.
    districts.sort_by_key(|(key, _)| (key.composite(), key.code.clone()));
    (districts, no_district)
}

fn district_key(feature: &Feature) -> Option<DistrictKey> {
    let properties = feature.properties.as_ref()?;
    let code = trimmed_string(properties.get(DISTRICT_CODE_PROPERTY))?;
    let name = trimmed_string(properties.get(DISTRICT_NAME_PROPERTY))?;
    Some(DistrictKey { code, name })
}

fn trimmed_string(value: Option<&JsonValue>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Filesystem-safe name for a district file: spaces and path separators
/// become underscores.
pub fn district_filename(code: &str, name: &str) -> String {
    format!("district_{}_{}.geojson", sanitize(code), sanitize(name))
}

fn sanitize(part: &str) -> String {
    part.replace([' ', '/', '\\'], "_")
}

// Names that sanitize to the same file get numeric suffixes, first come
// first served.
fn claim_filename(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let stem = candidate.strip_suffix(".geojson").unwrap_or(&candidate);
    let mut counter = 2;
    loop {
        let next = format!("{}_{}.geojson", stem, counter);
        if used.insert(next.clone()) {
            return next;
        }
        counter += 1;
    }
}

fn write_district(
    output_dir: &Path,
    code: &str,
    name: &str,
    filename: &str,
    features: Vec<Feature>,
) -> Result<DistrictSummary> {
    let tree_count = features.len();

    let mut metadata = JsonObject::new();
    metadata.insert("district_code".to_string(), JsonValue::from(code));
    metadata.insert("district_name".to_string(), JsonValue::from(name));
    metadata.insert("tree_count".to_string(), JsonValue::from(tree_count));
    let mut foreign_members = JsonObject::new();
    foreign_members.insert("properties".to_string(), JsonValue::Object(metadata));

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    };

    let path = output_dir.join(filename);
    let bytes = document::write_compact(&path, &collection)?;

    Ok(DistrictSummary {
        code: code.to_string(),
        name: name.to_string(),
        filename: filename.to_string(),
        tree_count,
        size_mb: document::megabytes(bytes),
    })
}

fn report_stats(districts: &[DistrictSummary]) {
    if districts.is_empty() {
        return;
    }
    let total_mb: f64 = districts.iter().map(|d| d.size_mb).sum();
    println!("Total output size: {:.2} MB", total_mb);
    println!(
        "Average size per district: {:.2} MB",
        total_mb / districts.len() as f64
    );

    println!("\nStatistics:");
    if let Some(largest) = districts.iter().max_by_key(|d| d.tree_count) {
        println!("  Most trees: {} ({})", largest.name, largest.tree_count);
    }
    if let Some(smallest) = districts.iter().min_by_key(|d| d.tree_count) {
        println!("  Fewest trees: {} ({})", smallest.name, smallest.tree_count);
    }
}
