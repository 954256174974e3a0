//! Batch tooling for a city tree-inventory GeoJSON: shrink the dataset for
//! web delivery, or split it into one file per district plus an index.

pub mod document;
pub mod error;
pub mod optimizer;
pub mod partitioner;

pub use error::{Error, Result};
pub use optimizer::{optimize, OptimizeSummary, DEFAULT_KEEP_FIELDS};
pub use partitioner::{split_by_district, DistrictIndex, DistrictKey, DistrictSummary};
