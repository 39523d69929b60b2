// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ParsedModel - loaded IFC model

use crate::resolver::ResolverImpl;
use crate::scanner::{parse_header, HeaderInfo};
use crate::spatial::SpatialQueryImpl;
use crate::units::extract_unit_context;

use bim2osm_model::{
    EntityResolver, IfcModel, ModelMetadata, ParseError, Result, SpatialQuery, UnitContext,
};

/// Parsed IFC model implementing the `IfcModel` trait
pub struct ParsedModel {
    resolver: ResolverImpl,
    spatial: SpatialQueryImpl,
    units: UnitContext,
    metadata: ModelMetadata,
}

impl ParsedModel {
    /// Parse IFC content and create a model
    pub fn parse(content: &str) -> Result<Self> {
        let header = parse_header(content)?;
        Self::load(content, header)
    }

    /// Like [`ParsedModel::parse`], but a header naming no supported schema
    /// fails before the DATA section is decoded
    pub fn parse_supported(content: &str) -> Result<Self> {
        let header = parse_header(content)?;
        if header.metadata.schema().is_none() {
            return Err(ParseError::UnsupportedSchema(
                header.metadata.schema_identifiers.join(", "),
            ));
        }
        Self::load(content, header)
    }

    fn load(content: &str, header: HeaderInfo) -> Result<Self> {
        let resolver = ResolverImpl::load(content, header.data_offset)?;
        let units = extract_unit_context(&resolver);
        let spatial = SpatialQueryImpl::build(&resolver);

        Ok(Self {
            resolver,
            spatial,
            units,
            metadata: header.metadata,
        })
    }

    /// Concrete resolver, for callers that need more than the trait
    pub fn arena(&self) -> &ResolverImpl {
        &self.resolver
    }
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        &self.resolver
    }

    fn spatial(&self) -> &dyn SpatialQuery {
        &self.spatial
    }

    fn units(&self) -> UnitContext {
        self.units
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
