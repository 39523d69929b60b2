// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end conversions of the fixture models

use approx::assert_abs_diff_eq;
use bim2osm::{
    import_file, BimToOsmParser, ConvertError, ConverterConfig, DiagnosticKind, FailureReason,
    GeoReference, LayerSink, OutputOptimizer, ParserState, PrimitiveSet, Way,
};
use bim2osm_model::EntityId;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tag<'a>(way: &'a Way, key: &str) -> Option<&'a str> {
    way.tags.get(key).map(String::as_str)
}

fn way_tagged<'a>(set: &'a PrimitiveSet, key: &str, value: &str) -> &'a Way {
    set.ways
        .iter()
        .find(|w| tag(w, key) == Some(value))
        .unwrap_or_else(|| panic!("no way tagged {}={}", key, value))
}

const OFFICE_LAT: f64 = 48.0 + 8.0 / 60.0;
const OFFICE_LON: f64 = 11.0 + 34.0 / 60.0 + 30.0 / 3600.0;

#[test]
fn test_office_converts() {
    let mut parser = BimToOsmParser::new(ConverterConfig::default());
    assert!(parser.parse(fixture("office.ifc")));
    assert_eq!(parser.state(), &ParserState::Done);

    let set = parser.primitives().unwrap();
    assert_eq!(set.ways.len(), 4);
    assert_eq!(set.nodes.len(), 17);

    let wall = way_tagged(set, "indoor", "wall");
    assert!(wall.is_closed());
    assert_eq!(wall.nodes.len(), 5);
    assert_eq!(tag(wall, "level"), Some("1"));

    let slab = way_tagged(set, "indoor", "area");
    assert_eq!(tag(slab, "level"), Some("0"));
    assert!(slab.is_closed());

    let kitchen = way_tagged(set, "name", "Kitchen");
    assert_eq!(tag(kitchen, "indoor"), Some("room"));
    assert_eq!(tag(kitchen, "level"), Some("0"));

    // aggregated into the upper storey
    let meeting = way_tagged(set, "name", "Meeting");
    assert_eq!(tag(meeting, "indoor"), Some("room"));
    assert_eq!(tag(meeting, "level"), Some("1"));
    assert!(meeting.is_closed());

    let door = set
        .nodes
        .iter()
        .find(|n| n.tags.get("door").map(String::as_str) == Some("yes"))
        .unwrap();
    assert_eq!(door.tags.get("indoor").map(String::as_str), Some("door"));
    assert_abs_diff_eq!(door.lat, OFFICE_LAT, epsilon = 1e-9);
    assert!(door.lon > OFFICE_LON);
}

#[test]
fn test_office_geometry_is_projected_from_the_site() {
    let mut parser = BimToOsmParser::new(ConverterConfig::default());
    let output = parser.run(fixture("office.ifc")).unwrap();
    assert_abs_diff_eq!(output.origin.lat, OFFICE_LAT, epsilon = 1e-12);
    assert_abs_diff_eq!(output.origin.lon, OFFICE_LON, epsilon = 1e-12);

    // first wall corner lies 0.1 m south of the site origin
    let wall = way_tagged(&output.primitives, "indoor", "wall");
    let corner = output.primitives.node(wall.nodes[0]).unwrap();
    let south = (0.1f64 / 6_378_137.0).to_degrees();
    assert_abs_diff_eq!(corner.lat, OFFICE_LAT - south, epsilon = 1e-12);
    assert_abs_diff_eq!(corner.lon, OFFICE_LON, epsilon = 1e-12);
}

#[test]
fn test_office_diagnostics() {
    let mut parser = BimToOsmParser::new(ConverterConfig::default());
    assert!(parser.parse(fixture("office.ifc")));

    let diagnostics = parser.diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::NoUsableRepresentation);
    assert_eq!(diagnostics[0].entity, Some(EntityId(500)));
    assert_eq!(diagnostics[1].kind, DiagnosticKind::MalformedGeometry);
    assert_eq!(diagnostics[1].entity, Some(EntityId(600)));
}

#[test]
fn test_configured_origin_wins() {
    let config = ConverterConfig::default().with_origin(GeoReference::new(1.0, 2.0));
    let output = BimToOsmParser::new(config)
        .run(fixture("office.ifc"))
        .unwrap();
    assert_eq!(output.origin, GeoReference::new(1.0, 2.0));
}

#[test]
fn test_unsupported_schema_fails() {
    let mut parser = BimToOsmParser::new(ConverterConfig::default());
    assert!(!parser.parse(fixture("unsupported_schema.ifc")));
    assert_eq!(
        parser.state(),
        &ParserState::Failed(FailureReason::UnsupportedSchema("IFC2X2_FINAL".to_string()))
    );
    assert!(parser.primitives().is_none());
}

#[test]
fn test_missing_site_fails() {
    let mut parser = BimToOsmParser::new(ConverterConfig::default());
    assert!(matches!(
        parser.run(fixture("no_site.ifc")),
        Err(ConvertError::MissingRootElement)
    ));
    assert_eq!(
        parser.state(),
        &ParserState::Failed(FailureReason::MissingRootElement)
    );
}

#[test]
fn test_block_comments_are_stripped() {
    let path = fixture("commented.ifc");
    let source = std::fs::read_to_string(&path).unwrap();

    let mut parser = BimToOsmParser::new(ConverterConfig::default());
    assert!(parser.parse(&path));
    let set = parser.primitives().unwrap();
    assert_eq!(set.ways.len(), 1);
    assert_eq!(set.nodes.len(), 2);
    assert!(!set.ways[0].is_closed());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), source);
}

#[test]
fn test_kept_block_comments_break_loading() {
    let config = ConverterConfig::default().with_remove_block_comments(false);
    let mut parser = BimToOsmParser::new(config);
    assert!(!parser.parse(fixture("commented.ifc")));
    assert!(matches!(
        parser.state(),
        ParserState::Failed(FailureReason::Load(_))
    ));
}

#[test]
fn test_parser_can_be_reused() {
    let mut parser = BimToOsmParser::new(ConverterConfig::default());
    assert!(parser.parse(fixture("office.ifc")));
    assert!(!parser.parse(fixture("no_site.ifc")));
    assert!(parser.primitives().is_none());
    assert!(parser.diagnostics().is_empty());

    assert!(parser.parse(fixture("commented.ifc")));
    assert_eq!(parser.state(), &ParserState::Done);
    assert!(parser.diagnostics().is_empty());
}

#[test]
fn test_output_is_already_optimized() {
    let config = ConverterConfig::default();
    let output = BimToOsmParser::new(config.clone())
        .run(fixture("office.ifc"))
        .unwrap();
    let again = OutputOptimizer::new(config.merge_tolerance).optimize(output.primitives.clone());
    assert_eq!(again, output.primitives);
}

#[test]
fn test_osm_xml_output() {
    let output = BimToOsmParser::new(ConverterConfig::default())
        .run(fixture("office.ifc"))
        .unwrap();
    let xml = output.primitives.to_osm_xml().unwrap();
    assert!(xml.contains("<osm version=\"0.6\" generator=\"bim2osm\">"));
    assert!(xml.contains("<tag k=\"name\" v=\"Kitchen\"/>"));
    assert_eq!(xml.matches("<way ").count(), 4);
    assert_eq!(xml.matches("<node ").count(), 17);
}

#[derive(Default)]
struct RecordingSink {
    layers: Vec<(String, usize)>,
}

impl LayerSink for RecordingSink {
    fn create_layer(&mut self, name: &str, primitives: PrimitiveSet) {
        self.layers.push((name.to_string(), primitives.ways.len()));
    }
}

#[test]
fn test_import_calls_sink_once() {
    let mut sink = RecordingSink::default();
    assert!(import_file(fixture("office.ifc"), &ConverterConfig::default(), &mut sink));
    assert_eq!(sink.layers, vec![("office".to_string(), 4)]);

    assert!(!import_file(fixture("no_site.ifc"), &ConverterConfig::default(), &mut sink));
    assert_eq!(sink.layers.len(), 1);
}
