// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit catalog extraction from `IFCUNITASSIGNMENT`

use bim2osm_model::{
    AttributeValue, DecodedEntity, EntityResolver, IfcType, LengthUnit, PlaneAngleUnit,
    UnitContext,
};

enum UnitKind {
    Length(LengthUnit),
    Angle(PlaneAngleUnit),
}

/// Extract length and plane angle units of the first project
///
/// Missing assignments keep the defaults (meters, radians). Units outside
/// the supported catalog are logged and ignored.
pub fn extract_unit_context(resolver: &dyn EntityResolver) -> UnitContext {
    let mut context = UnitContext::default();

    let Some(project) = resolver.entities_by_type(&IfcType::IfcProject).into_iter().next() else {
        return context;
    };

    // IFCPROJECT.UnitsInContext
    let Some(assignment) = project.get(8).and_then(|a| resolver.resolve_ref(a)) else {
        return context;
    };

    // IFCUNITASSIGNMENT.Units
    let Some(units) = assignment.get(0) else {
        return context;
    };

    for unit in resolver.resolve_ref_list(units) {
        match classify_unit(&unit, resolver) {
            Some(UnitKind::Length(length)) => context.length = length,
            Some(UnitKind::Angle(angle)) => context.angle = angle,
            None => {}
        }
    }

    context
}

fn classify_unit(unit: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<UnitKind> {
    match unit.ifc_type {
        IfcType::IfcSIUnit => classify_si_unit(unit),
        IfcType::IfcConversionBasedUnit => classify_conversion_unit(unit, resolver),
        _ => None,
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn classify_si_unit(unit: &DecodedEntity) -> Option<UnitKind> {
    let prefix = unit.get_enum(2);
    match (unit.get_enum(1)?, unit.get_enum(3)?) {
        ("LENGTHUNIT", "METRE") => match LengthUnit::from_si_prefix(prefix) {
            Some(length) => Some(UnitKind::Length(length)),
            None => {
                log::warn!(
                    "Unsupported length unit prefix {:?} on {}, using meters",
                    prefix,
                    unit.id
                );
                None
            }
        },
        ("PLANEANGLEUNIT", "RADIAN") if prefix.is_none() => {
            Some(UnitKind::Angle(PlaneAngleUnit::RAD))
        }
        ("PLANEANGLEUNIT", name) => {
            log::warn!("Unsupported plane angle unit {} on {}", name, unit.id);
            None
        }
        _ => None,
    }
}

/// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
fn classify_conversion_unit(
    unit: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Option<UnitKind> {
    let unit_type = unit.get_enum(1)?;
    let name = unit.get_string(2).unwrap_or_default();

    match unit_type {
        "PLANEANGLEUNIT" => {
            if name.eq_ignore_ascii_case("DEGREE") || is_degree_factor(unit, resolver) {
                Some(UnitKind::Angle(PlaneAngleUnit::DEG))
            } else {
                log::warn!("Unsupported plane angle unit '{}' on {}", name, unit.id);
                None
            }
        }
        "LENGTHUNIT" => {
            log::warn!(
                "Unsupported length unit '{}' on {}, using meters",
                name,
                unit.id
            );
            None
        }
        _ => None,
    }
}

/// IFCMEASUREWITHUNIT(ValueComponent, UnitComponent) holding pi/180
fn is_degree_factor(unit: &DecodedEntity, resolver: &dyn EntityResolver) -> bool {
    let Some(factor) = unit.get(3).and_then(|a| resolver.resolve_ref(a)) else {
        return false;
    };
    if factor.ifc_type != IfcType::IfcMeasureWithUnit {
        return false;
    }
    factor
        .get(0)
        .and_then(measure_value)
        .is_some_and(|v| (v - std::f64::consts::PI / 180.0).abs() < 1e-6)
}

fn measure_value(attr: &AttributeValue) -> Option<f64> {
    match attr {
        AttributeValue::Float(f) => Some(*f),
        AttributeValue::Integer(i) => Some(*i as f64),
        AttributeValue::TypedValue(_, args) => args.first().and_then(measure_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::scanner::parse_header;

    fn units_of(data: &str) -> UnitContext {
        let content = format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{}\nENDSEC;\nEND-ISO-10303-21;\n",
            data
        );
        let header = parse_header(&content).unwrap();
        let resolver = ResolverImpl::load(&content, header.data_offset).unwrap();
        extract_unit_context(&resolver)
    }

    #[test]
    fn test_defaults_without_project() {
        assert_eq!(units_of(""), UnitContext::default());
    }

    #[test]
    fn test_millimetre_and_degree() {
        let units = units_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3,#4));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCCONVERSIONBASEDUNIT(#5,.PLANEANGLEUNIT.,'DEGREE',#6);
#5=IFCDIMENSIONALEXPONENTS(0,0,0,0,0,0,0);
#6=IFCMEASUREWITHUNIT(IFCPLANEANGLEMEASURE(0.0174532925199433),#7);
#7=IFCSIUNIT(*,.PLANEANGLEUNIT.,$,.RADIAN.);",
        );
        assert_eq!(units.length, LengthUnit::MM);
        assert_eq!(units.angle, PlaneAngleUnit::DEG);
    }

    #[test]
    fn test_degree_detected_by_factor() {
        let units = units_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#4));
#4=IFCCONVERSIONBASEDUNIT($,.PLANEANGLEUNIT.,'grad',#6);
#6=IFCMEASUREWITHUNIT(IFCPLANEANGLEMEASURE(0.017453292519943295),$);",
        );
        assert_eq!(units.angle, PlaneAngleUnit::DEG);
    }

    #[test]
    fn test_unsupported_length_keeps_meters() {
        let units = units_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.KILO.,.METRE.);",
        );
        assert_eq!(units.length, LengthUnit::M);
    }
}
