use std::path::PathBuf;
use std::process;

use clap::{Arg, Command};

use geojson_prep::optimizer::{self, DEFAULT_KEEP_FIELDS};

fn main() {
    let matches = Command::new("optimize-geojson")
        .version("1.0")
        .about("Shrinks a tree-inventory GeoJSON by dropping unneeded properties and subsampling trees")
        .arg(
            Arg::new("input")
                .long("input")
                .value_name("FILE")
                .default_value("trees.geojson")
                .help("Input GeoJSON file"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("FILE")
                .default_value("trees-data.geojson")
                .help("Output GeoJSON file"),
        )
        .arg(
            Arg::new("keep-ratio")
                .long("keep-ratio")
                .value_name("RATIO")
                .default_value("1.0")
                .value_parser(parse_keep_ratio)
                .help("Fraction of trees to keep, in (0, 1]"),
        )
        .get_matches();

    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output = PathBuf::from(matches.get_one::<String>("output").unwrap());
    let keep_ratio = *matches.get_one::<f64>("keep-ratio").unwrap();

    if let Err(e) = optimizer::optimize(&input, &output, keep_ratio, DEFAULT_KEEP_FIELDS) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_keep_ratio(raw: &str) -> Result<f64, String> {
    let ratio: f64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if ratio > 0.0 && ratio <= 1.0 {
        Ok(ratio)
    } else {
        Err(format!("must be in (0, 1], got {}", ratio))
    }
}
