// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ParsedModel - Main IFC model implementation

use crate::properties::PropertyReaderImpl;
use crate::resolver::ResolverImpl;
use crate::scanner::{has_data_section, has_step_marker, parse_header};

use ifc_energy_model::{
    EntityResolver, IfcModel, ModelMetadata, ParseError, PropertyReader, Result,
};
use std::sync::Arc;

/// Parsed IFC model implementing the `IfcModel` trait
///
/// Gives access to entities and their properties through trait objects.
pub struct ParsedModel {
    /// Entity resolver for lookups
    resolver: Arc<ResolverImpl>,
    /// Property reader
    properties: Arc<PropertyReaderImpl>,
    /// File metadata
    metadata: ModelMetadata,
}

impl ParsedModel {
    /// Parse IFC content and create a model
    ///
    /// Fails when the content is not a STEP Part 21 file, has no data
    /// section, or declares a schema other than IFC.
    pub fn parse(content: &str) -> Result<Self> {
        if !has_step_marker(content) {
            return Err(ParseError::format("missing ISO-10303-21 marker"));
        }
        if !has_data_section(content) {
            return Err(ParseError::format("missing DATA section"));
        }

        let header = parse_header(content);
        if header.schema_version.is_empty() {
            return Err(ParseError::header("missing FILE_SCHEMA"));
        }
        if !header.schema_version.to_ascii_uppercase().starts_with("IFC") {
            return Err(ParseError::UnsupportedSchema(header.schema_version));
        }

        let resolver = Arc::new(ResolverImpl::new(content.to_string()));

        let properties = Arc::new(PropertyReaderImpl::new(resolver.clone()));

        let metadata = ModelMetadata {
            schema_version: header.schema_version,
            originating_system: header.originating_system,
            preprocessor_version: header.preprocessor_version,
            file_name: header.file_name,
            author: header.author,
            organization: header.organization,
            timestamp: header.timestamp,
        };

        Ok(Self {
            resolver,
            properties,
            metadata,
        })
    }
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        self.resolver.as_ref()
    }

    fn properties(&self) -> &dyn PropertyReader {
        self.properties.as_ref()
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
