use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use geojson::{FeatureCollection, GeoJson};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Loads a feature collection from a GeoJSON file.
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path).map_err(|e| read_error(path, e))?;
    let reader = BufReader::new(file);

    // Parse in two stages so bad JSON and bad GeoJSON shape report as
    // different error classes.
    let value: serde_json::Value = serde_json::from_reader(reader).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let geojson = GeoJson::from_json_value(value).map_err(|e| Error::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(Error::Format {
            path: path.to_path_buf(),
            reason: "expected a FeatureCollection, found a single Feature".to_string(),
        }),
        GeoJson::Geometry(_) => Err(Error::Format {
            path: path.to_path_buf(),
            reason: "expected a FeatureCollection, found a bare Geometry".to_string(),
        }),
    }
}

/// Writes a document as compact JSON and returns the resulting file size in bytes.
pub fn write_compact<T: Serialize>(path: &Path, document: &T) -> Result<u64> {
    write_json(path, document, false)
}

/// Writes a document as indented JSON and returns the resulting file size in bytes.
pub fn write_pretty<T: Serialize>(path: &Path, document: &T) -> Result<u64> {
    write_json(path, document, true)
}

// The document goes to a temp file in the destination directory first and is
// renamed onto the final path once fully written, so a failed run never
// leaves a truncated file behind.
fn write_json<T: Serialize>(path: &Path, document: &T, pretty: bool) -> Result<u64> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| write_error(path, e))?;

    let mut writer = BufWriter::new(tmp.as_file());
    let written = if pretty {
        serde_json::to_writer_pretty(&mut writer, document)
    } else {
        serde_json::to_writer(&mut writer, document)
    };
    written.map_err(|e| write_error(path, e))?;
    writer.flush().map_err(|e| write_error(path, e))?;
    drop(writer);

    tmp.persist(path).map_err(|e| write_error(path, e.error))?;
    file_size(path)
}

/// Returns the size of a file in bytes.
pub fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|e| read_error(path, e))
}

pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

fn read_error(path: &Path, source: io::Error) -> Error {
    if source.kind() == io::ErrorKind::NotFound {
        Error::MissingFile(path.to_path_buf())
    } else {
        Error::Parse {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

fn write_error(
    path: &Path,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> Error {
    Error::Write {
        path: path.to_path_buf(),
        source: source.into(),
    }
}
