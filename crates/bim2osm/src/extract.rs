// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outline extraction
//!
//! Routes representation items to processors by entity type. Processors
//! work in raw file units; [`OutlineRouter::extract`] scales the result to
//! meters.

use crate::error::{ConvertError, Result};
use crate::placement::{axis2_placement, cartesian_point, follow, follow_optional, transformation_operator};
use bim2osm_geometry::{Point3D, Transform3D, SINGULAR_EPSILON};
use bim2osm_model::{AttributeValue, DecodedEntity, EntityResolver, IfcType, UnitContext};
use rustc_hash::FxHashMap;
use std::f64::consts::TAU;
use std::sync::Arc;

/// Deepest chain of clipping results and mapped items followed
const MAX_NESTING: usize = 32;

/// Points closer than this are the same point
const POINT_EPSILON: f64 = 1e-9;

/// Flat outline of one representation item, element-local
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    pub points: Vec<Point3D>,
    /// Ring whose last point repeats the first
    pub closed: bool,
}

impl Outline {
    /// Closed ring; the closing point is added when missing
    pub fn ring(mut points: Vec<Point3D>) -> Self {
        let needs_closing = match (points.first(), points.last()) {
            (Some(first), Some(last)) => points.len() == 1 || (first - last).norm() > POINT_EPSILON,
            _ => false,
        };
        if needs_closing {
            let first = points[0];
            points.push(first);
        }
        Self {
            points,
            closed: true,
        }
    }

    /// Polyline, closed when it ends where it starts
    pub fn open(points: Vec<Point3D>) -> Self {
        let closed = points.len() >= 4
            && match (points.first(), points.last()) {
                (Some(first), Some(last)) => (first - last).norm() <= POINT_EPSILON,
                _ => false,
            };
        Self { points, closed }
    }

    pub fn transformed(mut self, t: &Transform3D) -> Self {
        self.points.iter_mut().for_each(|p| t.apply(p));
        self
    }

    pub fn scaled(mut self, k: f64) -> Self {
        self.points.iter_mut().for_each(|p| p.coords *= k);
        self
    }
}

/// Axis-aligned rectangle ring at height `z`
fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64, z: f64) -> Outline {
    Outline::ring(vec![
        Point3D::new(min_x, min_y, z),
        Point3D::new(max_x, min_y, z),
        Point3D::new(max_x, max_y, z),
        Point3D::new(min_x, max_y, z),
    ])
}

/// State shared by the processors of one extraction
pub struct ExtractContext<'a> {
    pub router: &'a OutlineRouter,
    pub resolver: &'a dyn EntityResolver,
    /// Raw plane angle to radians
    pub angle_factor: f64,
    /// Segments of a full circle
    pub curve_segments: usize,
    depth: usize,
}

impl<'a> ExtractContext<'a> {
    pub fn new(
        router: &'a OutlineRouter,
        resolver: &'a dyn EntityResolver,
        units: UnitContext,
        curve_segments: usize,
    ) -> Self {
        Self {
            router,
            resolver,
            angle_factor: units.angle.to_radians(),
            curve_segments: curve_segments.max(3),
            depth: 0,
        }
    }

    /// Context one nesting level down
    fn nested(&self, entity: &DecodedEntity) -> Result<ExtractContext<'a>> {
        if self.depth >= MAX_NESTING {
            return Err(ConvertError::malformed(entity.id, "representation nesting too deep"));
        }
        Ok(ExtractContext {
            router: self.router,
            resolver: self.resolver,
            angle_factor: self.angle_factor,
            curve_segments: self.curve_segments,
            depth: self.depth + 1,
        })
    }

    /// Route one item through the processors
    pub fn process(&self, item: &DecodedEntity) -> Result<Outline> {
        self.router.process_item(item, self)
    }
}

/// Outline processor trait
///
/// Each processor handles one or more representation item types.
pub trait OutlineProcessor: Send + Sync {
    /// Outline of `item` in raw file units
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline>;

    /// Get supported IFC types
    fn supported_types(&self) -> Vec<IfcType>;
}

/// Routes representation items to registered processors
pub struct OutlineRouter {
    processors: FxHashMap<IfcType, Arc<dyn OutlineProcessor>>,
}

impl OutlineRouter {
    /// Create new router without any processors registered
    pub fn new() -> Self {
        Self {
            processors: FxHashMap::default(),
        }
    }

    /// Router with every built-in processor
    pub fn with_default_processors() -> Self {
        let mut router = Self::new();
        router.register(Arc::new(ExtrudedAreaSolidProcessor));
        router.register(Arc::new(ClippingProcessor));
        router.register(Arc::new(FacetedBrepProcessor));
        router.register(Arc::new(BoundingBoxProcessor));
        router.register(Arc::new(PolylineProcessor));
        router.register(Arc::new(TrimmedCurveProcessor));
        router.register(Arc::new(MappedItemProcessor));
        router
    }

    pub fn register(&mut self, processor: Arc<dyn OutlineProcessor>) {
        for ifc_type in processor.supported_types() {
            self.processors.insert(ifc_type, Arc::clone(&processor));
        }
    }

    pub fn has_processor(&self, ifc_type: &IfcType) -> bool {
        self.processors.contains_key(ifc_type)
    }

    /// Process a single representation item (raw units)
    pub fn process_item(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        let processor = self.processors.get(&item.ifc_type).ok_or_else(|| {
            ConvertError::malformed(item.id, format!("unsupported item {}", item.ifc_type))
        })?;
        processor.process(item, ctx)
    }

    /// Outline of the first usable item of an `IfcShapeRepresentation` (raw units)
    ///
    /// Items without a processor are skipped. When no item yields an outline
    /// the first processing error is returned.
    pub fn representation_outline(
        &self,
        representation: &DecodedEntity,
        ctx: &ExtractContext<'_>,
    ) -> Result<Outline> {
        // IfcShapeRepresentation.Items
        let items = representation
            .get(3)
            .map(|a| ctx.resolver.resolve_ref_list(a))
            .unwrap_or_default();

        let mut first_error = None;
        for item in items.iter().filter(|i| self.has_processor(&i.ifc_type)) {
            match self.process_item(item, ctx) {
                Ok(outline) if !outline.points.is_empty() => return Ok(outline),
                Ok(_) => {}
                Err(e) => {
                    log::trace!("Item {} of {} skipped: {}", item.id, representation.id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        Err(first_error.unwrap_or_else(|| {
            ConvertError::malformed(representation.id, "no supported representation items")
        }))
    }

    /// Element-local outline of a representation, in meters
    pub fn extract(
        &self,
        resolver: &dyn EntityResolver,
        representation: &DecodedEntity,
        units: UnitContext,
        curve_segments: usize,
    ) -> Result<Outline> {
        let ctx = ExtractContext::new(self, resolver, units, curve_segments);
        let outline = self.representation_outline(representation, &ctx)?;
        Ok(outline.scaled(units.length.to_meters()))
    }
}

impl Default for OutlineRouter {
    fn default() -> Self {
        Self::with_default_processors()
    }
}

// ============================================================================
// Swept solids
// ============================================================================

/// `IfcExtrudedAreaSolid`: profile outline placed by `Position`
pub struct ExtrudedAreaSolidProcessor;

impl ExtrudedAreaSolidProcessor {
    fn profile_outline(&self, profile: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        match profile.ifc_type {
            IfcType::IfcRectangleProfileDef => {
                // IfcRectangleProfileDef(ProfileType, ProfileName, Position, XDim, YDim)
                let x = positive(profile, 3, "XDim")? / 2.0;
                let y = positive(profile, 4, "YDim")? / 2.0;
                let position = profile_position(profile, ctx)?;
                Ok(rectangle(-x, -y, x, y, 0.0).transformed(&position))
            }
            IfcType::IfcCircleProfileDef => {
                // IfcCircleProfileDef(ProfileType, ProfileName, Position, Radius)
                let radius = positive(profile, 3, "Radius")?;
                let position = profile_position(profile, ctx)?;
                let points = (0..ctx.curve_segments)
                    .map(|i| {
                        let angle = TAU * i as f64 / ctx.curve_segments as f64;
                        Point3D::new(radius * angle.cos(), radius * angle.sin(), 0.0)
                    })
                    .collect();
                Ok(Outline::ring(points).transformed(&position))
            }
            IfcType::IfcArbitraryClosedProfileDef => {
                // IfcArbitraryClosedProfileDef(ProfileType, ProfileName, OuterCurve)
                let curve = follow(ctx.resolver, profile, 2, "OuterCurve")?;
                let outline = ctx.process(&curve)?;
                Ok(Outline::ring(outline.points))
            }
            _ => Err(ConvertError::malformed(
                profile.id,
                format!("unsupported profile {}", profile.ifc_type),
            )),
        }
    }
}

impl OutlineProcessor for ExtrudedAreaSolidProcessor {
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        // IfcExtrudedAreaSolid(SweptArea, Position, ExtrudedDirection, Depth)
        let profile = follow(ctx.resolver, item, 0, "SweptArea")?;
        let outline = self.profile_outline(&profile, ctx)?;

        match follow_optional(ctx.resolver, item, 1, "Position")? {
            Some(position) => Ok(outline.transformed(&axis2_placement(ctx.resolver, &position)?)),
            None => Ok(outline),
        }
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcExtrudedAreaSolid]
    }
}

fn positive(entity: &DecodedEntity, index: usize, what: &str) -> Result<f64> {
    entity
        .get_float(index)
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| ConvertError::malformed(entity.id, format!("invalid {}", what)))
}

fn profile_position(profile: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Transform3D> {
    match follow_optional(ctx.resolver, profile, 2, "profile Position")? {
        Some(position) => axis2_placement(ctx.resolver, &position),
        None => Ok(Transform3D::identity()),
    }
}

/// `IfcBooleanClippingResult` / `IfcBooleanResult`: outline of the first operand
pub struct ClippingProcessor;

impl OutlineProcessor for ClippingProcessor {
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        // IfcBooleanResult(Operator, FirstOperand, SecondOperand)
        let operand = follow(ctx.resolver, item, 1, "FirstOperand")?;
        ctx.nested(item)?.process(&operand)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcBooleanClippingResult, IfcType::IfcBooleanResult]
    }
}

// ============================================================================
// Boundary and box representations
// ============================================================================

/// `IfcFacetedBrep`: axis-aligned footprint of all face vertices
pub struct FacetedBrepProcessor;

impl FacetedBrepProcessor {
    fn collect_points(&self, brep: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Vec<Point3D>> {
        let resolver = ctx.resolver;
        // IfcFacetedBrep.Outer -> IfcClosedShell.CfsFaces
        let shell = follow(resolver, brep, 0, "Outer")?;
        let faces = shell
            .get(0)
            .map(|a| resolver.resolve_ref_list(a))
            .ok_or_else(|| ConvertError::malformed(shell.id, "missing CfsFaces"))?;

        let mut points = Vec::new();
        for face in &faces {
            // IfcFace.Bounds -> IfcFaceBound.Bound -> IfcPolyLoop.Polygon
            let bounds = face.get(0).map(|a| resolver.resolve_ref_list(a)).unwrap_or_default();
            for bound in &bounds {
                let poly_loop = follow(resolver, bound, 0, "Bound")?;
                let polygon = poly_loop
                    .get(0)
                    .map(|a| resolver.resolve_ref_list(a))
                    .ok_or_else(|| ConvertError::malformed(poly_loop.id, "missing Polygon"))?;
                for point in &polygon {
                    points.push(cartesian_point(point)?);
                }
            }
        }
        Ok(points)
    }
}

impl OutlineProcessor for FacetedBrepProcessor {
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        let points = self.collect_points(item, ctx)?;
        let Some(first) = points.first() else {
            return Err(ConvertError::malformed(item.id, "brep without vertices"));
        };

        let (mut min, mut max) = (*first, *first);
        for p in &points {
            min = min.inf(p);
            max = max.sup(p);
        }
        Ok(rectangle(min.x, min.y, max.x, max.y, min.z))
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcFacetedBrep]
    }
}

/// `IfcBoundingBox(Corner, XDim, YDim, ZDim)`: footprint at the corner height
pub struct BoundingBoxProcessor;

impl OutlineProcessor for BoundingBoxProcessor {
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        let corner = cartesian_point(&*follow(ctx.resolver, item, 0, "Corner")?)?;
        let x = positive(item, 1, "XDim")?;
        let y = positive(item, 2, "YDim")?;
        Ok(rectangle(corner.x, corner.y, corner.x + x, corner.y + y, corner.z))
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcBoundingBox]
    }
}

// ============================================================================
// Curves
// ============================================================================

/// `IfcPolyline(Points)`
pub struct PolylineProcessor;

impl OutlineProcessor for PolylineProcessor {
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        let points = item
            .get(0)
            .map(|a| ctx.resolver.resolve_ref_list(a))
            .ok_or_else(|| ConvertError::malformed(item.id, "missing Points"))?;
        if points.len() < 2 {
            return Err(ConvertError::malformed(item.id, "polyline with fewer than 2 points"));
        }
        let points = points
            .iter()
            .map(|p| cartesian_point(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Outline::open(points))
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcPolyline]
    }
}

/// `IfcTrimmedCurve` over an `IfcCircle`, approximated by chords
pub struct TrimmedCurveProcessor;

impl TrimmedCurveProcessor {
    /// Trim angle in radians from a trimming select list
    ///
    /// Parameter values win over points, as the master representation is
    /// rarely set.
    fn trim_angle(
        &self,
        curve: &DecodedEntity,
        trim: &[AttributeValue],
        circle: &Transform3D,
        ctx: &ExtractContext<'_>,
    ) -> Result<f64> {
        let parameter = trim.iter().find_map(|v| match v {
            AttributeValue::TypedValue(name, _) if name.eq_ignore_ascii_case("IFCPARAMETERVALUE") => {
                v.as_float()
            }
            _ => None,
        });
        if let Some(parameter) = parameter {
            return Ok(parameter * ctx.angle_factor);
        }

        let point = trim
            .iter()
            .find_map(|v| ctx.resolver.resolve_ref(v))
            .ok_or_else(|| ConvertError::malformed(curve.id, "unsupported trimming select"))?;
        let point = cartesian_point(&point)?;
        let local = circle
            .inverse()
            .map_err(|e| ConvertError::from_geometry(curve.id, e))?
            .applied(&point);
        Ok(local.y.atan2(local.x))
    }
}

impl OutlineProcessor for TrimmedCurveProcessor {
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        // IfcTrimmedCurve(BasisCurve, Trim1, Trim2, SenseAgreement, MasterRepresentation)
        let basis = follow(ctx.resolver, item, 0, "BasisCurve")?;
        if basis.ifc_type != IfcType::IfcCircle {
            return Err(ConvertError::malformed(
                item.id,
                format!("unsupported basis curve {}", basis.ifc_type),
            ));
        }
        // IfcCircle(Position, Radius)
        let position = axis2_placement(ctx.resolver, &*follow(ctx.resolver, &basis, 0, "Position")?)?;
        let radius = positive(&basis, 1, "Radius")?;

        let trim1 = item
            .get_list(1)
            .ok_or_else(|| ConvertError::malformed(item.id, "missing Trim1"))?;
        let trim2 = item
            .get_list(2)
            .ok_or_else(|| ConvertError::malformed(item.id, "missing Trim2"))?;
        let start = self.trim_angle(item, trim1, &position, ctx)?;
        let end = self.trim_angle(item, trim2, &position, ctx)?;

        let sense = item.get_enum(3).map_or(true, |s| s.eq_ignore_ascii_case("T"));
        let sweep = if sense {
            let s = (end - start).rem_euclid(TAU);
            if s < POINT_EPSILON { TAU } else { s }
        } else {
            let s = (start - end).rem_euclid(TAU);
            -(if s < POINT_EPSILON { TAU } else { s })
        };

        let segments = ((ctx.curve_segments as f64 * sweep.abs() / TAU - POINT_EPSILON).ceil() as usize).max(1);
        let points = (0..=segments)
            .map(|i| {
                let angle = start + sweep * i as f64 / segments as f64;
                Point3D::new(radius * angle.cos(), radius * angle.sin(), 0.0)
            })
            .collect();
        Ok(Outline::open(points).transformed(&position))
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcTrimmedCurve]
    }
}

// ============================================================================
// Mapped items
// ============================================================================

/// `IfcMappedItem(MappingSource, MappingTarget)`
///
/// The mapped representation is placed by `MappingTarget ∘ MappingOrigin`.
pub struct MappedItemProcessor;

impl OutlineProcessor for MappedItemProcessor {
    fn process(&self, item: &DecodedEntity, ctx: &ExtractContext<'_>) -> Result<Outline> {
        let resolver = ctx.resolver;
        // IfcRepresentationMap(MappingOrigin, MappedRepresentation)
        let source = follow(resolver, item, 0, "MappingSource")?;
        let origin = axis2_placement(resolver, &*follow(resolver, &source, 0, "MappingOrigin")?)?;
        let representation = follow(resolver, &source, 1, "MappedRepresentation")?;
        let target = transformation_operator(resolver, &*follow(resolver, item, 1, "MappingTarget")?)?;

        let transform = target.then(&origin);
        if transform.rotation.det().abs() < SINGULAR_EPSILON {
            return Err(ConvertError::SingularMatrix { entity: item.id });
        }

        let nested = ctx.nested(item)?;
        let outline = ctx.router.representation_outline(&representation, &nested)?;
        Ok(outline.transformed(&transform))
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcMappedItem]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bim2osm_model::{EntityId, IfcModel, LengthUnit, PlaneAngleUnit};
    use bim2osm_parser::ParsedModel;

    fn model(data: &str) -> ParsedModel {
        let content = format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{}\nENDSEC;\nEND-ISO-10303-21;\n",
            data
        );
        ParsedModel::parse(&content).unwrap()
    }

    fn extract(model: &ParsedModel, rep: u32, units: UnitContext) -> Result<Outline> {
        let router = OutlineRouter::with_default_processors();
        let rep = model.resolver().get(EntityId(rep)).unwrap();
        router.extract(model.resolver(), &rep, units, 16)
    }

    #[test]
    fn test_rectangle_extrusion_in_millimeters() {
        let model = model(
            "#1=IFCCARTESIANPOINT((1000.,500.));
#2=IFCAXIS2PLACEMENT2D(#1,$);
#3=IFCRECTANGLEPROFILEDEF(.AREA.,$,#2,4000.,200.);
#4=IFCCARTESIANPOINT((0.,0.,0.));
#5=IFCAXIS2PLACEMENT3D(#4,$,$);
#6=IFCDIRECTION((0.,0.,1.));
#7=IFCEXTRUDEDAREASOLID(#3,#5,#6,3000.);
#8=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#7));",
        );
        let units = UnitContext::new(LengthUnit::MM, PlaneAngleUnit::RAD);
        let outline = extract(&model, 8, units).unwrap();

        assert!(outline.closed);
        assert_eq!(outline.points.len(), 5);
        assert_abs_diff_eq!(outline.points[0], Point3D::new(-1.0, 0.4, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(outline.points[2], Point3D::new(3.0, 0.6, 0.0), epsilon = 1e-12);
        assert_eq!(outline.points[0], outline.points[4]);
    }

    #[test]
    fn test_circle_profile_uses_curve_segments() {
        let model = model(
            "#1=IFCCIRCLEPROFILEDEF(.AREA.,$,$,0.5);
#2=IFCEXTRUDEDAREASOLID(#1,$,$,3.);
#3=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#2));",
        );
        let outline = extract(&model, 3, UnitContext::default()).unwrap();
        assert_eq!(outline.points.len(), 17);
        for p in &outline.points {
            assert_abs_diff_eq!(p.coords.norm(), 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_clipping_uses_first_operand() {
        let model = model(
            "#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCCARTESIANPOINT((5.,0.));
#3=IFCCARTESIANPOINT((5.,1.));
#4=IFCPOLYLINE((#1,#2,#3,#1));
#5=IFCARBITRARYCLOSEDPROFILEDEF(.AREA.,$,#4);
#6=IFCEXTRUDEDAREASOLID(#5,$,$,3.);
#7=IFCBOOLEANCLIPPINGRESULT(.DIFFERENCE.,#6,#4);
#8=IFCBOOLEANCLIPPINGRESULT(.DIFFERENCE.,#7,#4);
#9=IFCSHAPEREPRESENTATION($,'Body','Clipping',(#8));",
        );
        let outline = extract(&model, 9, UnitContext::default()).unwrap();
        assert!(outline.closed);
        assert_eq!(outline.points.len(), 4);
        assert_eq!(outline.points[1], Point3D::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_brep_footprint_at_min_z() {
        let model = model(
            "#1=IFCCARTESIANPOINT((0.,0.,1.));
#2=IFCCARTESIANPOINT((2.,0.,1.));
#3=IFCCARTESIANPOINT((2.,3.,4.));
#4=IFCCARTESIANPOINT((-1.,3.,4.));
#5=IFCPOLYLOOP((#1,#2,#3));
#6=IFCPOLYLOOP((#1,#3,#4));
#7=IFCFACEOUTERBOUND(#5,.T.);
#8=IFCFACEBOUND(#6,.T.);
#9=IFCFACE((#7));
#10=IFCFACE((#8));
#11=IFCCLOSEDSHELL((#9,#10));
#12=IFCFACETEDBREP(#11);
#13=IFCSHAPEREPRESENTATION($,'Body','Brep',(#12));",
        );
        let outline = extract(&model, 13, UnitContext::default()).unwrap();
        assert_eq!(
            outline.points,
            vec![
                Point3D::new(-1.0, 0.0, 1.0),
                Point3D::new(2.0, 0.0, 1.0),
                Point3D::new(2.0, 3.0, 1.0),
                Point3D::new(-1.0, 3.0, 1.0),
                Point3D::new(-1.0, 0.0, 1.0),
            ]
        );
    }

    #[test]
    fn test_bounding_box() {
        let model = model(
            "#1=IFCCARTESIANPOINT((1.,2.,0.5));
#2=IFCBOUNDINGBOX(#1,3.,1.,2.);
#3=IFCSHAPEREPRESENTATION($,'Box','BoundingBox',(#2));",
        );
        let outline = extract(&model, 3, UnitContext::default()).unwrap();
        assert_eq!(outline.points[2], Point3D::new(4.0, 3.0, 0.5));
    }

    #[test]
    fn test_axis_polyline_is_open() {
        let model = model(
            "#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCCARTESIANPOINT((4.,0.));
#3=IFCPOLYLINE((#1,#2));
#4=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#3));",
        );
        let outline = extract(&model, 4, UnitContext::default()).unwrap();
        assert!(!outline.closed);
        assert_eq!(outline.points.len(), 2);
    }

    #[test]
    fn test_trimmed_circle_in_degrees() {
        let model = model(
            "#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCAXIS2PLACEMENT2D(#1,$);
#3=IFCCIRCLE(#2,2.);
#4=IFCTRIMMEDCURVE(#3,(IFCPARAMETERVALUE(0.)),(IFCPARAMETERVALUE(90.)),.T.,.PARAMETER.);
#5=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#4));",
        );
        let units = UnitContext::new(LengthUnit::M, PlaneAngleUnit::DEG);
        let outline = extract(&model, 5, units).unwrap();
        // a quarter of 16 segments
        assert_eq!(outline.points.len(), 5);
        assert_abs_diff_eq!(outline.points[0], Point3D::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(outline.points[4], Point3D::new(0.0, 2.0, 0.0), epsilon = 1e-12);
    }

    const MAPPED: &str = "#1=IFCCARTESIANPOINT((0.,0.));
#2=IFCCARTESIANPOINT((1.,0.));
#3=IFCPOLYLINE((#1,#2));
#4=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#3));
#5=IFCCARTESIANPOINT((0.,0.,0.));
#6=IFCAXIS2PLACEMENT3D(#5,$,$);
#7=IFCREPRESENTATIONMAP(#6,#4);
#8=IFCCARTESIANPOINT((10.,0.,0.));";

    #[test]
    fn test_mapped_item_applies_target() {
        let model = model(&format!(
            "{}\n#9=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#8,3.,$);
#10=IFCMAPPEDITEM(#7,#9);
#11=IFCSHAPEREPRESENTATION($,'Body','MappedRepresentation',(#10));",
            MAPPED
        ));
        let outline = extract(&model, 11, UnitContext::default()).unwrap();
        assert_eq!(
            outline.points,
            vec![Point3D::new(10.0, 0.0, 0.0), Point3D::new(13.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn test_zero_scale_mapping_is_singular() {
        let model = model(&format!(
            "{}\n#9=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#8,0.,$);
#10=IFCMAPPEDITEM(#7,#9);
#11=IFCSHAPEREPRESENTATION($,'Body','MappedRepresentation',(#10));",
            MAPPED
        ));
        assert!(matches!(
            extract(&model, 11, UnitContext::default()),
            Err(ConvertError::SingularMatrix { entity: EntityId(10) })
        ));
    }

    #[test]
    fn test_broken_attribute_walk_is_malformed() {
        let model = model(
            "#1=IFCEXTRUDEDAREASOLID($,$,$,3.);
#2=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#1));",
        );
        assert!(matches!(
            extract(&model, 2, UnitContext::default()),
            Err(ConvertError::MalformedGeometry { entity: EntityId(1), .. })
        ));
    }
}
