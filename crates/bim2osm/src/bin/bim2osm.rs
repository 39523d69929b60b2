// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use bim2osm::{BimToOsmParser, ConverterConfig};
use clap::Parser;
use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bim2osm", version, about = "Convert an IFC model into OSM indoor primitives")]
struct Args {
    /// IFC file to convert
    input: PathBuf,

    /// Output .osm file; defaults to the input path with an .osm extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Load the file as is, without stripping block comments
    #[arg(long, default_value_t = false)]
    keep_comments: bool,

    /// JSON converter configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConverterConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    if args.keep_comments {
        config = config.with_remove_block_comments(false);
    }

    let mut parser = BimToOsmParser::new(config);
    let output = parser
        .run(&args.input)
        .with_context(|| format!("converting {}", args.input.display()))?;

    for diagnostic in &output.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    let out_path = args
        .output
        .unwrap_or_else(|| args.input.with_extension("osm"));
    let file = fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    output.primitives.write_osm_xml(BufWriter::new(file))?;

    println!(
        "{} -> {} ({} nodes, {} ways)",
        args.input.display(),
        out_path.display(),
        output.primitives.nodes.len(),
        output.primitives.ways.len()
    );
    Ok(())
}
