// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Energy Model - Trait definitions and shared types for IFC building models
//!
//! This crate provides the abstractions the energy calculator uses to read
//! IFC (Industry Foundation Classes) files. Parser backends implement the
//! traits; consumers only ever see the trait objects.
//!
//! # Architecture
//!
//! - [`IfcParser`] - Entry point for parsing IFC content
//! - [`IfcModel`] - Read-only access to a parsed IFC model
//! - [`EntityResolver`] - Entity lookup by id and by type
//! - [`PropertyReader`] - Access to property sets and quantities
//!
//! # Example
//!
//! ```ignore
//! use ifc_energy_model::{IfcParser, IfcModel, IfcType};
//!
//! let model = parser.parse(ifc_content)?;
//! for space in model.resolver().entities_by_type(&IfcType::IfcSpace) {
//!     let quantities = model.properties().quantities(space.id);
//!     println!("{} has {} quantities", space.id, quantities.len());
//! }
//! ```

pub mod error;
pub mod properties;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use properties::*;
pub use resolver::*;
pub use traits::*;
pub use types::*;
