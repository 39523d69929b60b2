// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion orchestrator
//!
//! [`BimToOsmParser`] runs the pipeline stages in order and records where
//! it is in [`ParserState`]:
//!
//! ```text
//! Idle -> Optimizing -> Loading -> Resolving -> Extracting -> Transforming
//!      -> BuildingPrimitives -> OutputOptimizing -> Done
//! ```
//!
//! Any fatal error moves the parser to `Failed` and leaves no primitive set.

use crate::catalog::{BimObject, PreparedBimObject3D, Shape};
use crate::config::{ConverterConfig, GeoReference};
use crate::error::{ConvertError, Diagnostic, DiagnosticKind, Result};
use crate::extract::{Outline, OutlineRouter};
use crate::input::{InputOptimizer, OptimizedInput};
use crate::optimize::OutputOptimizer;
use crate::placement::{
    describe, project, site_geo_reference, true_north, PlacementResolver, WorkingFrame,
};
use crate::primitives::{PrimitiveId, PrimitiveSet};
use crate::representation::{ShapeRepresentationIdentity, ShapeRepresentationResolver};
use bim2osm_geometry::Point3D;
use bim2osm_model::{DecodedEntity, IfcModel, IfcParser, IfcSchema, IfcType, ParseError};
use bim2osm_parser::StepParser;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Why a conversion stopped
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    UnsupportedSchema(String),
    MissingRootElement,
    Io(String),
    Load(String),
    Config(String),
    Output(String),
}

impl From<&ConvertError> for FailureReason {
    fn from(err: &ConvertError) -> Self {
        match err {
            ConvertError::UnsupportedSchema(schema) => FailureReason::UnsupportedSchema(schema.clone()),
            ConvertError::MissingRootElement => FailureReason::MissingRootElement,
            ConvertError::Io(e) => FailureReason::Io(e.to_string()),
            ConvertError::Load(e) => FailureReason::Load(e.to_string()),
            ConvertError::Config(message) => FailureReason::Config(message.clone()),
            other => FailureReason::Output(other.to_string()),
        }
    }
}

/// Pipeline stage of a [`BimToOsmParser`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ParserState {
    Idle,
    Optimizing,
    Loading,
    Resolving,
    Extracting,
    Transforming,
    BuildingPrimitives,
    OutputOptimizing,
    Done,
    Failed(FailureReason),
}

/// Result of a successful conversion
#[derive(Clone, Debug, Serialize)]
pub struct ConversionOutput {
    pub primitives: PrimitiveSet,
    pub diagnostics: Vec<Diagnostic>,
    pub schema: IfcSchema,
    /// Geographic position of the working frame origin
    pub origin: GeoReference,
}

/// Element with the representation it will be drawn from
struct ResolvedElement {
    entity: Arc<DecodedEntity>,
    kind: BimObject,
    identity: ShapeRepresentationIdentity,
}

struct ExtractedElement {
    entity: Arc<DecodedEntity>,
    kind: BimObject,
    outline: Outline,
}

/// Converts IFC files into OSM primitive sets
///
/// One parser may convert several files in turn; each call starts from
/// [`ParserState::Idle`] with fresh buffers.
pub struct BimToOsmParser {
    config: ConverterConfig,
    loader: Arc<dyn IfcParser>,
    router: OutlineRouter,
    state: ParserState,
    primitives: Option<PrimitiveSet>,
    diagnostics: Vec<Diagnostic>,
}

impl BimToOsmParser {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            loader: Arc::new(StepParser::new()),
            router: OutlineRouter::with_default_processors(),
            state: ParserState::Idle,
            primitives: None,
            diagnostics: Vec::new(),
        }
    }

    /// Replace the STEP loader
    pub fn with_loader(mut self, loader: Arc<dyn IfcParser>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Primitives of the last successful conversion
    pub fn primitives(&self) -> Option<&PrimitiveSet> {
        self.primitives.as_ref()
    }

    pub fn take_primitives(&mut self) -> Option<PrimitiveSet> {
        self.primitives.take()
    }

    /// Non-fatal problems of the last conversion
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Convert `path`; `false` on any fatal error
    pub fn parse(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.run(path) {
            Ok(output) => {
                self.primitives = Some(output.primitives);
                true
            }
            Err(e) => {
                log::error!("Failed to convert {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Convert `path`, returning the error of a failed conversion
    ///
    /// Unlike [`Self::parse`] the primitive set is handed to the caller and
    /// not kept in the parser.
    pub fn run(&mut self, path: impl AsRef<Path>) -> Result<ConversionOutput> {
        let path = path.as_ref();
        self.reset();

        match self.convert(path) {
            Ok(output) => {
                self.enter(ParserState::Done);
                log::info!(
                    "Converted {}: {} nodes, {} ways, {} diagnostics",
                    path.display(),
                    output.primitives.nodes.len(),
                    output.primitives.ways.len(),
                    output.diagnostics.len()
                );
                Ok(output)
            }
            Err(e) => {
                self.enter(ParserState::Failed(FailureReason::from(&e)));
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.primitives = None;
        self.diagnostics.clear();
    }

    fn enter(&mut self, state: ParserState) {
        log::debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Record a per-element error; fatal errors are passed back
    fn skip(&mut self, entity: &DecodedEntity, err: ConvertError) -> Result<()> {
        match Diagnostic::from_error(entity.id, &err) {
            Some(diagnostic) => {
                self.diagnose(diagnostic);
                Ok(())
            }
            None => Err(err),
        }
    }

    fn convert(&mut self, path: &Path) -> Result<ConversionOutput> {
        self.config.validate()?;

        let input = self.optimize_input(path)?;
        let (model, schema) = self.load(&input)?;
        drop(input);

        let model = model.as_ref();
        let site = self.find_site(model)?;
        let resolved = self.resolve(model);
        let extracted = self.extract(model, resolved)?;
        let (objects, origin) = self.transform(model, &site, extracted)?;
        let primitives = self.build_primitives(&origin, &objects);
        let primitives = self.optimize_output(primitives);

        Ok(ConversionOutput {
            primitives,
            diagnostics: self.diagnostics.clone(),
            schema,
            origin,
        })
    }

    // ------------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------------

    fn optimize_input(&mut self, path: &Path) -> Result<OptimizedInput> {
        self.enter(ParserState::Optimizing);
        InputOptimizer::optimize_file(&self.config, path)
    }

    /// Read the sanitized copy through the loader
    fn load(&mut self, input: &OptimizedInput) -> Result<(Arc<dyn IfcModel>, IfcSchema)> {
        self.enter(ParserState::Loading);
        let content = input.read_to_string()?;

        let model = self.loader.parse(&content).map_err(|e| match e {
            ParseError::UnsupportedSchema(ids) => ConvertError::UnsupportedSchema(ids),
            e => ConvertError::Load(e),
        })?;
        let metadata = model.metadata();
        let schema = metadata.schema().ok_or_else(|| {
            ConvertError::UnsupportedSchema(metadata.schema_identifiers.join(", "))
        })?;
        log::debug!(
            "Loaded {:?} model with {} entities",
            schema,
            model.resolver().entity_count()
        );
        Ok((model, schema))
    }

    fn find_site(&mut self, model: &dyn IfcModel) -> Result<Arc<DecodedEntity>> {
        self.enter(ParserState::Resolving);
        model
            .resolver()
            .entities_by_type(&IfcType::IfcSite)
            .into_iter()
            .next()
            .ok_or(ConvertError::MissingRootElement)
    }

    /// Classified elements with a usable representation, in id order
    fn resolve(&mut self, model: &dyn IfcModel) -> Vec<ResolvedElement> {
        let resolver = model.resolver();
        let mut candidates: Vec<Arc<DecodedEntity>> = BimObject::ALL
            .iter()
            .flat_map(|kind| kind.source_types())
            .flat_map(|ifc_type| resolver.entities_by_type(&ifc_type))
            .collect();
        candidates.sort_by_key(|e| e.id);
        candidates.dedup_by_key(|e| e.id);

        let mut resolved = Vec::with_capacity(candidates.len());
        for entity in candidates {
            let Some(kind) = BimObject::classify(&entity.ifc_type) else {
                continue;
            };
            match ShapeRepresentationResolver::resolve(resolver, &entity) {
                Some(identity) => resolved.push(ResolvedElement {
                    entity,
                    kind,
                    identity,
                }),
                None => self.diagnose(Diagnostic::new(
                    Some(entity.id),
                    DiagnosticKind::NoUsableRepresentation,
                    format!("{} has no usable shape representation", entity.ifc_type),
                )),
            }
        }

        log::debug!("Resolved {} elements", resolved.len());
        resolved
    }

    fn extract(
        &mut self,
        model: &dyn IfcModel,
        resolved: Vec<ResolvedElement>,
    ) -> Result<Vec<ExtractedElement>> {
        self.enter(ParserState::Extracting);
        let resolver = model.resolver();
        let units = model.units();

        let mut extracted = Vec::with_capacity(resolved.len());
        for element in resolved {
            let outline = resolver
                .get(element.identity.representation)
                .ok_or_else(|| {
                    ConvertError::malformed(element.identity.representation, "missing representation")
                })
                .and_then(|rep| {
                    self.router
                        .extract(resolver, &rep, units, self.config.curve_segments)
                });
            match outline {
                Ok(outline) => extracted.push(ExtractedElement {
                    entity: element.entity,
                    kind: element.kind,
                    outline,
                }),
                Err(e) => self.skip(&element.entity, e)?,
            }
        }

        log::debug!("Extracted {} outlines", extracted.len());
        Ok(extracted)
    }

    fn transform(
        &mut self,
        model: &dyn IfcModel,
        site: &DecodedEntity,
        extracted: Vec<ExtractedElement>,
    ) -> Result<(Vec<PreparedBimObject3D>, GeoReference)> {
        self.enter(ParserState::Transforming);
        let resolver = model.resolver();
        let north = true_north(resolver);
        let mut placements = PlacementResolver::new(resolver, model.units());

        let frame = match placements.object_transform(site) {
            Ok(site_transform) => match WorkingFrame::new(&site_transform, north) {
                Ok(frame) => frame,
                Err(e) => {
                    self.diagnose(Diagnostic::new(
                        Some(site.id),
                        DiagnosticKind::SingularSitePlacement,
                        format!("site placement is not invertible: {}", e),
                    ));
                    WorkingFrame::unanchored(north)
                }
            },
            Err(e) => {
                self.skip(site, e)?;
                WorkingFrame::unanchored(north)
            }
        };

        let origin = self.georeference(site);

        let mut objects = Vec::with_capacity(extracted.len());
        for element in extracted {
            let entity = &element.entity;
            let transform = placements
                .object_transform(entity)
                .and_then(|global| frame.element_transform(entity.id, &global));
            let transform = match transform {
                Ok(transform) => transform,
                Err(e) => {
                    self.skip(entity, e)?;
                    continue;
                }
            };

            log::trace!("{} placed by {}", entity.id, describe(&transform));

            let outline = element.outline.transformed(&transform);
            objects.push(PreparedBimObject3D {
                kind: element.kind,
                source: entity.id,
                level: model.spatial().level_of(entity.id).unwrap_or(0),
                name: element_name(entity),
                outline: outline.points,
                closed: outline.closed,
            });
        }

        log::debug!(
            "Placed {} objects ({} placements cached)",
            objects.len(),
            placements.cached()
        );
        Ok((objects, origin))
    }

    /// Configured origin, else the site reference, else (0, 0)
    fn georeference(&mut self, site: &DecodedEntity) -> GeoReference {
        if let Some(origin) = self.config.origin {
            return origin;
        }
        match site_geo_reference(site) {
            Some(origin) => origin,
            None => {
                self.diagnose(Diagnostic::new(
                    Some(site.id),
                    DiagnosticKind::MissingGeoReference,
                    "site has no reference latitude/longitude, using (0, 0)",
                ));
                GeoReference::default()
            }
        }
    }

    fn build_primitives(&mut self, origin: &GeoReference, objects: &[PreparedBimObject3D]) -> PrimitiveSet {
        self.enter(ParserState::BuildingPrimitives);
        let mut set = PrimitiveSet::new();
        for object in objects {
            emit(&mut set, origin, object);
        }
        set
    }

    fn optimize_output(&mut self, set: PrimitiveSet) -> PrimitiveSet {
        self.enter(ParserState::OutputOptimizing);
        OutputOptimizer::new(self.config.merge_tolerance).optimize(set)
    }
}

/// `LongName` of a space, falling back to `Name`
fn element_name(entity: &DecodedEntity) -> Option<String> {
    let long_name = match entity.ifc_type {
        // IfcSpace.LongName
        IfcType::IfcSpace => entity.get_string(7),
        _ => None,
    };
    long_name
        .or_else(|| entity.get_string(2))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Add the nodes and way of one object
fn emit(set: &mut PrimitiveSet, origin: &GeoReference, object: &PreparedBimObject3D) {
    let tags = object.tags();
    let add = |set: &mut PrimitiveSet, point: &Point3D| -> PrimitiveId {
        let (lat, lon) = project(origin, point);
        set.add_node(lat, lon, Default::default())
    };

    match object.kind.shape() {
        Shape::Point => {
            let (lat, lon) = project(origin, &object.centroid());
            set.add_node(lat, lon, tags);
        }
        Shape::Line if !object.closed => {
            let nodes = object.outline.iter().map(|p| add(set, p)).collect();
            set.add_way(nodes, tags);
        }
        Shape::Line | Shape::Area => {
            let ring = match object.outline.as_slice() {
                [first, rest @ .., last] if object.closed && !rest.is_empty() && first == last => {
                    &object.outline[..object.outline.len() - 1]
                }
                points => points,
            };
            let mut nodes: Vec<PrimitiveId> = ring.iter().map(|p| add(set, p)).collect();
            if let Some(first) = nodes.first().copied() {
                nodes.push(first);
            }
            set.add_way(nodes, tags);
        }
    }
}
