// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Energy Parser - STEP parser for IFC building models
//!
//! This crate provides a fast, memory-efficient parser for IFC (STEP) files.
//! It implements the traits defined in `ifc-energy-model`.
//!
//! # Features
//!
//! - **Fast tokenization** using `nom` combinators
//! - **SIMD-accelerated scanning** using `memchr`
//! - **Lazy entity decoding** - only parse entities when needed
//! - **Arc-based caching** - efficient memory sharing
//!
//! # Example
//!
//! ```ignore
//! use ifc_energy_parser::StepParser;
//! use ifc_energy_model::IfcParser;
//!
//! let model = StepParser::new().parse(ifc_content)?;
//! let spaces = model.resolver().find_by_type_name("IFCSPACE");
//! println!("Found {} spaces", spaces.len());
//! ```

mod model;
mod properties;
mod resolver;
mod scanner;
mod tokenizer;

pub use model::ParsedModel;
pub use properties::coerce_value;
pub use scanner::{parse_header, EntityScanner, HeaderInfo};
pub use tokenizer::{decode_step_string, parse_entity, Token};

use ifc_energy_model::{IfcModel, IfcParser, Result};
use std::sync::Arc;

/// Main STEP/IFC parser implementing `IfcParser` trait
#[derive(Default)]
pub struct StepParser;

impl StepParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }
}

impl IfcParser for StepParser {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>> {
        ParsedModel::parse(content).map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Quick parse function for simple use cases
pub fn parse(content: &str) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().parse(content)
}
