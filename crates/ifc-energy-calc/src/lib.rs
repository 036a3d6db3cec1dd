// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Energy Calc - building data extraction and electricity estimation
//!
//! Reads an IFC model through `ifc-energy-parser`, extracts spaces,
//! envelope elements and building systems, and estimates annual electricity
//! consumption with retrofit recommendations.
//!
//! # Example
//!
//! ```ignore
//! use ifc_energy_calc::{process_upload, BenchmarkEstimator};
//!
//! let bytes = std::fs::read("office.ifc")?;
//! let response = process_upload("office.ifc", &bytes, &BenchmarkEstimator)?;
//! println!(
//!     "{:.0} kWh/year",
//!     response.electricity_consumption.total_annual_consumption
//! );
//! ```

pub mod attributes;
pub mod error;
pub mod estimator;
pub mod extractor;
pub mod pipeline;
pub mod reader;
pub mod records;
pub mod remote;
pub mod response;

pub use attributes::AttributeResolver;
pub use error::{EnergyError, Result};
pub use estimator::{estimate, BenchmarkEstimator, ConsumptionEstimator};
pub use extractor::{extract_building_data, fallback_area, BuildingDataExtractor};
pub use pipeline::{analyze_file, check_file_name, process_upload, process_upload_in};
pub use reader::{Category, ModelReader};
pub use records::*;
pub use remote::{
    CompletionClient, OpenAiChatClient, RemoteConfigError, RemoteError, RemoteEstimator,
    RemoteEstimatorConfig,
};
pub use response::{AnalysisResponse, CalculationResponse, TARIFF_JOD_PER_KWH};
