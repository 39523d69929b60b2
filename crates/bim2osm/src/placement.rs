// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinate transform stage
//!
//! Turns `IfcLocalPlacement` chains into [`Transform3D`]s, anchors them at
//! the site, and projects working-frame meters to latitude/longitude.

use crate::config::GeoReference;
use crate::error::{ConvertError, Result};
use bim2osm_geometry::{
    Matrix3D, ParserMath, Point3D, Transform3D, Vector3D, SINGULAR_EPSILON,
};
use bim2osm_model::{
    AttributeValue, DecodedEntity, EntityId, EntityResolver, IfcType, UnitContext,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// WGS84 equatorial radius in meters
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Longest placement chain followed before assuming a cycle
const MAX_CHAIN_DEPTH: usize = 256;

/// Latitude bound of the parallel used for longitude scaling
const MAX_PROJECTED_LAT: f64 = 89.9;

// ============================================================================
// Placement entities (raw file units)
// ============================================================================

/// `IfcCartesianPoint.Coordinates`; 2D points get z = 0
pub fn cartesian_point(entity: &DecodedEntity) -> Result<Point3D> {
    if entity.ifc_type != IfcType::IfcCartesianPoint {
        return Err(ConvertError::malformed(
            entity.id,
            format!("expected IFCCARTESIANPOINT, found {}", entity.ifc_type),
        ));
    }
    let coords = entity
        .get_floats(0)
        .filter(|c| (2..=3).contains(&c.len()))
        .ok_or_else(|| ConvertError::malformed(entity.id, "invalid point coordinates"))?;
    Ok(Point3D::new(
        coords[0],
        coords[1],
        coords.get(2).copied().unwrap_or(0.0),
    ))
}

/// `IfcDirection.DirectionRatios`; 2D directions get z = 0
pub fn direction(entity: &DecodedEntity) -> Result<Vector3D> {
    if entity.ifc_type != IfcType::IfcDirection {
        return Err(ConvertError::malformed(
            entity.id,
            format!("expected IFCDIRECTION, found {}", entity.ifc_type),
        ));
    }
    let ratios = entity
        .get_floats(0)
        .filter(|c| (2..=3).contains(&c.len()))
        .ok_or_else(|| ConvertError::malformed(entity.id, "invalid direction ratios"))?;
    Ok(Vector3D::new(
        ratios[0],
        ratios[1],
        ratios.get(2).copied().unwrap_or(0.0),
    ))
}

/// Follow a mandatory reference attribute
pub fn follow(
    resolver: &dyn EntityResolver,
    entity: &DecodedEntity,
    index: usize,
    what: &str,
) -> Result<Arc<DecodedEntity>> {
    entity
        .get(index)
        .and_then(|a| resolver.resolve_ref(a))
        .ok_or_else(|| ConvertError::malformed(entity.id, format!("missing {}", what)))
}

/// Follow an optional reference attribute; `$` gives `None`, a dangling
/// reference is an error
pub fn follow_optional(
    resolver: &dyn EntityResolver,
    entity: &DecodedEntity,
    index: usize,
    what: &str,
) -> Result<Option<Arc<DecodedEntity>>> {
    match entity.get(index) {
        None | Some(AttributeValue::Null) | Some(AttributeValue::Derived) => Ok(None),
        Some(attr) => resolver
            .resolve_ref(attr)
            .map(Some)
            .ok_or_else(|| ConvertError::malformed(entity.id, format!("invalid {}", what))),
    }
}

fn optional_direction(
    resolver: &dyn EntityResolver,
    entity: &DecodedEntity,
    index: usize,
    what: &str,
) -> Result<Option<Vector3D>> {
    follow_optional(resolver, entity, index, what)?
        .map(|d| direction(&d))
        .transpose()
}

/// `IfcAxis2Placement3D(Location, Axis, RefDirection)` or
/// `IfcAxis2Placement2D(Location, RefDirection)` as a transform
pub fn axis2_placement(
    resolver: &dyn EntityResolver,
    placement: &DecodedEntity,
) -> Result<Transform3D> {
    let location = cartesian_point(&*follow(resolver, placement, 0, "Location")?)?;

    let basis = match placement.ifc_type {
        IfcType::IfcAxis2Placement3D => {
            let axis = optional_direction(resolver, placement, 1, "Axis")?;
            let ref_direction = optional_direction(resolver, placement, 2, "RefDirection")?;
            ParserMath::basis_from_axes(axis, ref_direction)
        }
        IfcType::IfcAxis2Placement2D => {
            let ref_direction = optional_direction(resolver, placement, 1, "RefDirection")?;
            ParserMath::basis_from_axes(None, ref_direction)
        }
        _ => {
            return Err(ConvertError::malformed(
                placement.id,
                format!("unsupported placement {}", placement.ifc_type),
            ))
        }
    }
    .map_err(|e| ConvertError::from_geometry(placement.id, e))?;

    Ok(Transform3D::new(basis, location.coords))
}

/// `IfcCartesianTransformationOperator3D(Axis1, Axis2, LocalOrigin, Scale, Axis3)`
///
/// Non-uniform operators use their first scale factor.
pub fn transformation_operator(
    resolver: &dyn EntityResolver,
    operator: &DecodedEntity,
) -> Result<Transform3D> {
    if !matches!(
        operator.ifc_type,
        IfcType::IfcCartesianTransformationOperator3D
            | IfcType::IfcCartesianTransformationOperator3DnonUniform
    ) {
        return Err(ConvertError::malformed(
            operator.id,
            format!("unsupported mapping target {}", operator.ifc_type),
        ));
    }

    let axis1 = optional_direction(resolver, operator, 0, "Axis1")?;
    let axis3 = optional_direction(resolver, operator, 4, "Axis3")?;
    let origin = cartesian_point(&*follow(resolver, operator, 2, "LocalOrigin")?)?;
    let scale = operator.get_float(3).unwrap_or(1.0);

    let mut basis = ParserMath::basis_from_axes(axis3, axis1)
        .map_err(|e| ConvertError::from_geometry(operator.id, e))?;
    basis.multiply(scale);

    Ok(Transform3D::new(basis, origin.coords))
}

// ============================================================================
// Placement chains
// ============================================================================

/// Resolves object placements to transforms in the model frame (meters)
///
/// Transforms are memoized per placement id for the lifetime of the
/// resolver, which is one conversion.
pub struct PlacementResolver<'a> {
    resolver: &'a dyn EntityResolver,
    length_factor: f64,
    cache: FxHashMap<EntityId, Transform3D>,
}

impl<'a> PlacementResolver<'a> {
    pub fn new(resolver: &'a dyn EntityResolver, units: UnitContext) -> Self {
        Self {
            resolver,
            length_factor: units.length.to_meters(),
            cache: FxHashMap::default(),
        }
    }

    /// Number of memoized placements
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Transform of a product's `ObjectPlacement` (attribute 5)
    ///
    /// A product without placement sits at the model origin.
    pub fn object_transform(&mut self, product: &DecodedEntity) -> Result<Transform3D> {
        match product.get_ref(5) {
            Some(placement) => self.placement_transform(placement),
            None => Ok(Transform3D::identity()),
        }
    }

    /// Global transform of an `IfcLocalPlacement`
    pub fn placement_transform(&mut self, placement: EntityId) -> Result<Transform3D> {
        if let Some(cached) = self.cache.get(&placement) {
            return Ok(*cached);
        }

        // Walk up to the first cached ancestor or the root
        let mut chain: Vec<Arc<DecodedEntity>> = Vec::new();
        let mut next = Some(placement);
        let mut base = Transform3D::identity();
        while let Some(id) = next {
            if let Some(cached) = self.cache.get(&id) {
                base = *cached;
                break;
            }
            if chain.iter().any(|p| p.id == id) || chain.len() >= MAX_CHAIN_DEPTH {
                return Err(ConvertError::malformed(
                    placement,
                    format!("placement chain revisits {}", id),
                ));
            }
            let entity = self
                .resolver
                .get(id)
                .ok_or_else(|| ConvertError::malformed(placement, format!("missing placement {}", id)))?;
            if entity.ifc_type != IfcType::IfcLocalPlacement {
                return Err(ConvertError::malformed(
                    id,
                    format!("unsupported placement {}", entity.ifc_type),
                ));
            }
            next = entity.get_ref(0);
            chain.push(entity);
        }

        // Compose root-first: global = parent ∘ local
        let mut global = base;
        for entity in chain.iter().rev() {
            let relative = follow(self.resolver, entity, 1, "RelativePlacement")?;
            let local = axis2_placement(self.resolver, &relative)?;
            let local = Transform3D::new(local.rotation, local.translation * self.length_factor);
            global = global.then(&local);
            self.cache.insert(entity.id, global);
        }

        Ok(global)
    }
}

/// Model frame to working frame (site origin, x east, y north)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkingFrame {
    pub to_working: Transform3D,
}

impl WorkingFrame {
    /// Frame anchored at `site` and turned so `true_north` points along +Y
    ///
    /// `true_north` is given in the model frame. Fails when the site basis
    /// cannot be inverted.
    pub fn new(site: &Transform3D, true_north: Option<Vector3D>) -> bim2osm_geometry::Result<Self> {
        let site_inverse = site.inverse()?;
        let mut north = true_north.unwrap_or_else(Vector3D::y);
        site_inverse.rotation.transform(&mut north);
        let rotation = ParserMath::rotation_matrix_z(ParserMath::angle_to_north(north.x, north.y));
        Ok(Self {
            to_working: Transform3D::from_rotation(rotation).then(&site_inverse),
        })
    }

    /// Frame that only applies the north rotation
    pub fn unanchored(true_north: Option<Vector3D>) -> Self {
        let north = true_north.unwrap_or_else(Vector3D::y);
        let rotation = ParserMath::rotation_matrix_z(ParserMath::angle_to_north(north.x, north.y));
        Self {
            to_working: Transform3D::from_rotation(rotation),
        }
    }

    /// Element-local to working frame
    ///
    /// Fails with `SingularMatrix` when the composed basis is flat.
    pub fn element_transform(&self, element: EntityId, global: &Transform3D) -> Result<Transform3D> {
        let transform = self.to_working.then(global);
        if transform.rotation.det().abs() < SINGULAR_EPSILON {
            return Err(ConvertError::SingularMatrix { entity: element });
        }
        Ok(transform)
    }
}

/// `TrueNorth` of the first model context that declares one
pub fn true_north(resolver: &dyn EntityResolver) -> Option<Vector3D> {
    resolver
        .entities_by_type(&IfcType::IfcGeometricRepresentationContext)
        .iter()
        .find_map(|context| {
            // IfcGeometricRepresentationContext.TrueNorth
            let north = context.get(5).and_then(|a| resolver.resolve_ref(a))?;
            direction(&north).ok()
        })
        .filter(|n| n.x.hypot(n.y) > 1e-12)
}

// ============================================================================
// Geographic reference
// ============================================================================

/// Decimal degrees of an `IfcCompoundPlaneAngleMeasure`
/// (degrees, minutes, seconds, optional millionths of a second)
pub fn compound_angle(values: &[AttributeValue]) -> Option<f64> {
    let parts: Vec<f64> = values
        .iter()
        .map(|v| v.as_float())
        .collect::<Option<_>>()?;
    if !(3..=4).contains(&parts.len()) {
        return None;
    }
    let millionths = parts.get(3).copied().unwrap_or(0.0);
    Some(parts[0] + parts[1] / 60.0 + (parts[2] + millionths / 1e6) / 3600.0)
}

/// `RefLatitude` / `RefLongitude` of a site (attributes 9 and 10)
pub fn site_geo_reference(site: &DecodedEntity) -> Option<GeoReference> {
    let lat = compound_angle(site.get_list(9)?)?;
    let lon = compound_angle(site.get_list(10)?)?;
    Some(GeoReference::new(lat, lon))
}

/// Local equirectangular projection of working-frame meters around `origin`
pub fn project(origin: &GeoReference, point: &Point3D) -> (f64, f64) {
    let lat = origin.lat + (point.y / EARTH_RADIUS).to_degrees();
    let parallel = origin.lat.clamp(-MAX_PROJECTED_LAT, MAX_PROJECTED_LAT);
    let lon = origin.lon + (point.x / (EARTH_RADIUS * parallel.to_radians().cos())).to_degrees();
    (lat, lon)
}

/// Matrix with the basis of `t` for debugging output
pub fn describe(t: &Transform3D) -> String {
    let m: &Matrix3D = &t.rotation;
    format!(
        "[{:.3} {:.3} {:.3}; {:.3} {:.3} {:.3}; {:.3} {:.3} {:.3}] + ({:.3}, {:.3}, {:.3})",
        m.get(0, 0),
        m.get(0, 1),
        m.get(0, 2),
        m.get(1, 0),
        m.get(1, 1),
        m.get(1, 2),
        m.get(2, 0),
        m.get(2, 1),
        m.get(2, 2),
        t.translation.x,
        t.translation.y,
        t.translation.z
    )
}
