// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map primitives and OSM XML output

use crate::error::{ConvertError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Primitive id; new objects are negative
pub type PrimitiveId = i64;

/// Key/value tags, ordered by key
pub type Tags = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub id: PrimitiveId,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Way {
    pub id: PrimitiveId,
    pub nodes: Vec<PrimitiveId>,
    pub tags: Tags,
}

impl Way {
    /// First and last node refs are the same node
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.nodes.first() == self.nodes.last()
    }
}

/// Nodes and ways produced by one conversion
///
/// Ids are allocated from one negative counter, so they are unique across
/// nodes and ways of a set.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PrimitiveSet {
    pub nodes: Vec<Node>,
    pub ways: Vec<Way>,
    #[serde(skip)]
    last_id: PrimitiveId,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> PrimitiveId {
        self.last_id -= 1;
        self.last_id
    }

    pub fn add_node(&mut self, lat: f64, lon: f64, tags: Tags) -> PrimitiveId {
        let id = self.next_id();
        self.nodes.push(Node { id, lat, lon, tags });
        id
    }

    pub fn add_way(&mut self, nodes: Vec<PrimitiveId>, tags: Tags) -> PrimitiveId {
        let id = self.next_id();
        self.ways.push(Way { id, nodes, tags });
        id
    }

    pub fn node(&self, id: PrimitiveId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.ways.is_empty()
    }

    /// Replace the contents, keeping the id counter
    pub(crate) fn replace(&mut self, nodes: Vec<Node>, ways: Vec<Way>) {
        self.nodes = nodes;
        self.ways = ways;
    }

    /// Write the set as an OSM XML 0.6 document
    pub fn write_osm_xml<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(ConvertError::xml)?;

        let mut osm = BytesStart::new("osm");
        osm.push_attribute(("version", "0.6"));
        osm.push_attribute(("generator", "bim2osm"));
        writer.write_event(Event::Start(osm)).map_err(ConvertError::xml)?;

        for node in &self.nodes {
            let id = node.id.to_string();
            let lat = format!("{:.9}", node.lat);
            let lon = format!("{:.9}", node.lon);
            let mut element = BytesStart::new("node");
            element.push_attribute(("id", id.as_str()));
            element.push_attribute(("action", "modify"));
            element.push_attribute(("visible", "true"));
            element.push_attribute(("lat", lat.as_str()));
            element.push_attribute(("lon", lon.as_str()));
            write_element(&mut writer, element, "node", &[], &node.tags)?;
        }

        for way in &self.ways {
            let id = way.id.to_string();
            let mut element = BytesStart::new("way");
            element.push_attribute(("id", id.as_str()));
            element.push_attribute(("action", "modify"));
            element.push_attribute(("visible", "true"));
            write_element(&mut writer, element, "way", &way.nodes, &way.tags)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("osm")))
            .map_err(ConvertError::xml)?;
        writer.into_inner().flush()?;
        Ok(())
    }

    /// OSM XML 0.6 document as a string
    pub fn to_osm_xml(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_osm_xml(&mut buffer)?;
        String::from_utf8(buffer).map_err(ConvertError::xml)
    }
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: BytesStart<'_>,
    name: &str,
    node_refs: &[PrimitiveId],
    tags: &Tags,
) -> Result<()> {
    if node_refs.is_empty() && tags.is_empty() {
        return writer
            .write_event(Event::Empty(element))
            .map_err(ConvertError::xml);
    }

    writer.write_event(Event::Start(element)).map_err(ConvertError::xml)?;
    for node_ref in node_refs {
        let node_ref = node_ref.to_string();
        let mut nd = BytesStart::new("nd");
        nd.push_attribute(("ref", node_ref.as_str()));
        writer.write_event(Event::Empty(nd)).map_err(ConvertError::xml)?;
    }
    for (key, value) in tags {
        let mut tag = BytesStart::new("tag");
        tag.push_attribute(("k", key.as_str()));
        tag.push_attribute(("v", value.as_str()));
        writer.write_event(Event::Empty(tag)).map_err(ConvertError::xml)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(ConvertError::xml)
}
