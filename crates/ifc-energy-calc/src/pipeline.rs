// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Upload pipeline: file-type gate, staging, extraction, estimation

use crate::error::{EnergyError, Result};
use crate::estimator::ConsumptionEstimator;
use crate::extractor::extract_building_data;
use crate::reader::ModelReader;
use crate::response::CalculationResponse;
use log::info;
use std::io::Write;
use std::path::Path;

pub const IFC_EXTENSION: &str = ".ifc";

/// Reject uploads whose name does not end in `.ifc`
pub fn check_file_name(file_name: &str) -> Result<()> {
    if file_name.to_ascii_lowercase().ends_with(IFC_EXTENSION) {
        Ok(())
    } else {
        Err(EnergyError::invalid_input(format!(
            "File must be an IFC file, got '{}'",
            file_name
        )))
    }
}

/// Extract and estimate an IFC file on disk
pub fn analyze_file(path: &Path, estimator: &dyn ConsumptionEstimator) -> Result<CalculationResponse> {
    let reader = ModelReader::open(path)?;
    let building_data = extract_building_data(&reader);
    info!(
        "Extracted {} spaces, {:.1} m² floor area",
        building_data.spaces.len(),
        building_data.total_floor_area
    );
    let consumption = estimator.estimate(&building_data);
    info!(
        "Estimated {:.0} kWh/year ({})",
        consumption.total_annual_consumption, consumption.calculation_method
    );
    Ok(CalculationResponse::new(building_data, consumption))
}

/// Process an uploaded file, staging it in the system temp directory
pub fn process_upload(
    file_name: &str,
    content: &[u8],
    estimator: &dyn ConsumptionEstimator,
) -> Result<CalculationResponse> {
    process_upload_in(&std::env::temp_dir(), file_name, content, estimator)
}

/// Process an uploaded file, staging it in `temp_dir`
///
/// The staged copy is removed when this returns, whatever the outcome.
pub fn process_upload_in(
    temp_dir: &Path,
    file_name: &str,
    content: &[u8],
    estimator: &dyn ConsumptionEstimator,
) -> Result<CalculationResponse> {
    check_file_name(file_name)?;

    let mut staged = tempfile::Builder::new()
        .prefix("ifc-energy-")
        .suffix(IFC_EXTENSION)
        .tempfile_in(temp_dir)?;
    staged.write_all(content)?;
    staged.flush()?;

    info!("Extracting data from IFC file: {}", file_name);
    analyze_file(staged.path(), estimator)
}
