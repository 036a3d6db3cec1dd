// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for IFC parsing
//!
//! These traits define the main abstractions for working with IFC data.

use crate::{EntityResolver, ModelMetadata, PropertyReader, Result};
use std::sync::Arc;

/// Main parsing interface - entry point for parsing IFC content
///
/// Implementations of this trait parse IFC file content and return a model
/// that can be queried through the trait interfaces below.
///
/// # Example
///
/// ```ignore
/// use ifc_energy_model::{IfcParser, IfcModel};
///
/// let parser: Box<dyn IfcParser> = get_parser();
/// let model = parser.parse(ifc_content)?;
/// println!("Schema: {}", model.metadata().schema_version);
/// ```
pub trait IfcParser: Send + Sync {
    /// Parse IFC content and return a model
    ///
    /// # Arguments
    /// * `content` - The IFC file content as a string
    ///
    /// # Returns
    /// An `Arc<dyn IfcModel>` on success, or a `ParseError` if the content is
    /// not a well-formed IFC STEP file
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>>;
}

/// Core model interface - read-only access to a parsed IFC model
///
/// The model is thread-safe (`Send + Sync`) so independent requests can each
/// hold their own model on any thread.
pub trait IfcModel: Send + Sync {
    /// Get entity resolver for entity lookups and reference resolution
    fn resolver(&self) -> &dyn EntityResolver;

    /// Get property reader for accessing property sets and quantities
    ///
    /// The property reader provides access to IfcPropertySet and
    /// IfcElementQuantity data associated with entities.
    fn properties(&self) -> &dyn PropertyReader;

    /// Get file metadata (schema version, originating system, etc.)
    fn metadata(&self) -> &ModelMetadata;
}
