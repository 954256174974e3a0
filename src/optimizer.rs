use std::path::Path;

use geojson::{Feature, FeatureCollection, JsonObject};

use crate::document;
use crate::error::{Error, Result};

/// Properties kept by default: enough for the map popups and the district UI.
pub const DEFAULT_KEEP_FIELDS: &[&str] = &[
    "species",
    "common_name",
    "diameter",
    "height",
    "NBRE_DTO",
    "NBRE_BARRI",
    "CODIGO_ESP",
];

// File size advisories, in megabytes. GitHub rejects files over the hard limit.
const HARD_SIZE_LIMIT_MB: f64 = 100.0;
const SLOW_LOAD_LIMIT_MB: f64 = 50.0;

#[derive(Debug, Clone, Copy)]
pub struct OptimizeSummary {
    pub input_features: usize,
    pub kept_features: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

/// Shrinks a tree dataset: keeps a deterministic sample of the features and
/// projects their properties down to `keep_fields`.
pub fn optimize(
    input: &Path,
    output: &Path,
    keep_ratio: f64,
    keep_fields: &[&str],
) -> Result<OptimizeSummary> {
    if !(keep_ratio > 0.0 && keep_ratio <= 1.0) {
        return Err(Error::InvalidRatio(keep_ratio));
    }

    println!("Reading {}...", input.display());
    let input_bytes = document::file_size(input)?;
    println!("Original size: {:.2} MB", document::megabytes(input_bytes));

    let collection = document::read_feature_collection(input)?;
    let input_features = collection.features.len();
    println!("Total trees: {}", input_features);

    let kept = subsample(collection.features, keep_ratio);
    let features: Vec<Feature> = kept
        .into_iter()
        .map(|feature| project_feature(feature, keep_fields))
        .collect();
    let kept_features = features.len();
    println!("Trees after optimization: {}", kept_features);

    println!("Writing {}...", output.display());
    let optimized = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let output_bytes = document::write_compact(output, &optimized)?;

    let summary = OptimizeSummary {
        input_features,
        kept_features,
        input_bytes,
        output_bytes,
    };
    report(&summary);
    Ok(summary)
}

/// Deterministic stride sample: keeps every feature whose index is a multiple
/// of floor(1 / ratio). Ratio 1.0 keeps the whole sequence.
pub fn subsample(features: Vec<Feature>, keep_ratio: f64) -> Vec<Feature> {
    if keep_ratio >= 1.0 {
        return features;
    }
    let stride = (1.0 / keep_ratio) as usize;
    features
        .into_iter()
        .enumerate()
        .filter(|(index, _)| index % stride == 0)
        .map(|(_, feature)| feature)
        .collect()
}

/// Rebuilds a feature as geometry plus the allow-listed properties, in
/// allow-list order. Everything else (bbox, id, foreign members) is dropped.
pub fn project_feature(feature: Feature, keep_fields: &[&str]) -> Feature {
    let properties = feature.properties.map(|source| {
        let mut kept = JsonObject::new();
        for &field in keep_fields {
            if let Some(value) = source.get(field) {
                kept.insert(field.to_string(), value.clone());
            }
        }
        kept
    });

    Feature {
        bbox: None,
        geometry: feature.geometry,
        id: None,
        properties,
        foreign_members: None,
    }
}

fn report(summary: &OptimizeSummary) {
    let input_mb = document::megabytes(summary.input_bytes);
    let output_mb = document::megabytes(summary.output_bytes);
    let reduction = (input_mb - output_mb) / input_mb * 100.0;
    let kept_percent = if summary.input_features == 0 {
        100.0
    } else {
        summary.kept_features as f64 / summary.input_features as f64 * 100.0
    };

    println!("\nOptimization complete");
    println!("New size: {:.2} MB", output_mb);
    println!("Reduction: {:.1}%", reduction);
    println!(
        "Trees: {} ({:.1}% of the original)",
        summary.kept_features, kept_percent
    );

    if output_mb > HARD_SIZE_LIMIT_MB {
        println!(
            "\nWARNING: the output is still over the {} MB GitHub file limit ({:.2} MB)",
            HARD_SIZE_LIMIT_MB, output_mb
        );
        println!("Consider keeping fewer trees with: --keep-ratio 0.25");
    } else if output_mb > SLOW_LOAD_LIMIT_MB {
        println!(
            "\nThe output ({:.2} MB) will work, but loading will be slow.",
            output_mb
        );
        println!("For better performance consider --keep-ratio 0.5");
    }
}
