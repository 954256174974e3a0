use std::path::PathBuf;
use std::process;

use clap::{Arg, Command};

use geojson_prep::partitioner;

fn main() {
    let matches = Command::new("split-by-district")
        .version("1.0")
        .about("Splits a tree-inventory GeoJSON into one file per district plus an index")
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
                .value_name("DIR")
                .default_value("data/districts")
                .help("Directory for the district files and index"),
        )
        .get_matches();

    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output_dir = PathBuf::from(matches.get_one::<String>("output").unwrap());

    if let Err(e) = partitioner::split_by_district(&input, &output_dir) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
