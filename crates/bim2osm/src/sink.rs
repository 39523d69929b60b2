// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hand-off of converted primitives to a map layer host

use crate::config::ConverterConfig;
use crate::error::Result;
use crate::parser::BimToOsmParser;
use crate::primitives::PrimitiveSet;
use std::path::{Path, PathBuf};

/// Receives the primitives of a converted file as a new layer
pub trait LayerSink {
    fn create_layer(&mut self, name: &str, primitives: PrimitiveSet);
}

/// Sink writing each layer as an OSM XML file into a directory
pub struct OsmFileSink {
    directory: PathBuf,
    written: Vec<PathBuf>,
    errors: Vec<String>,
}

impl OsmFileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            written: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Layers that could not be written
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn write(&self, name: &str, primitives: &PrimitiveSet) -> Result<PathBuf> {
        let path = self.directory.join(format!("{}.osm", name));
        let file = std::io::BufWriter::new(std::fs::File::create(&path)?);
        primitives.write_osm_xml(file)?;
        Ok(path)
    }
}

impl LayerSink for OsmFileSink {
    fn create_layer(&mut self, name: &str, primitives: PrimitiveSet) {
        match self.write(name, &primitives) {
            Ok(path) => self.written.push(path),
            Err(e) => {
                log::error!("Failed to write layer {}: {}", name, e);
                self.errors.push(e.to_string());
            }
        }
    }
}

/// Layer name of an input file: its file stem
pub fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bim2osm".to_string())
}

/// Convert `path` and hand the result to `sink`
///
/// The sink is called exactly once on success and never on failure.
pub fn import_file(path: impl AsRef<Path>, config: &ConverterConfig, sink: &mut dyn LayerSink) -> bool {
    let path = path.as_ref();
    let mut parser = BimToOsmParser::new(config.clone());
    if !parser.parse(path) {
        return false;
    }
    match parser.take_primitives() {
        Some(primitives) => {
            sink.create_layer(&layer_name(path), primitives);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_name_is_file_stem() {
        assert_eq!(layer_name(Path::new("/data/Office Building.ifc")), "Office Building");
        assert_eq!(layer_name(Path::new("/")), "bim2osm");
    }

    #[test]
    fn test_file_sink_writes_xml() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OsmFileSink::new(dir.path());
        let mut set = PrimitiveSet::new();
        set.add_node(1.0, 2.0, Default::default());

        sink.create_layer("level0", set);
        assert_eq!(sink.written(), &[dir.path().join("level0.osm")]);
        let xml = std::fs::read_to_string(dir.path().join("level0.osm")).unwrap();
        assert!(xml.contains("<node id=\"-1\""));
    }

    #[test]
    fn test_failed_import_never_calls_sink() {
        struct Panicking;
        impl LayerSink for Panicking {
            fn create_layer(&mut self, _: &str, _: PrimitiveSet) {
                panic!("sink called for a failed import");
            }
        }
        assert!(!import_file("/nonexistent/model.ifc", &ConverterConfig::default(), &mut Panicking));
    }
}
