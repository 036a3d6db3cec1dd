// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for extraction and estimation

use crate::remote::RemoteError;
use ifc_energy_model::{EntityId, ParseError};
use thiserror::Error;

/// Result type alias for calculator operations
pub type Result<T> = std::result::Result<T, EnergyError>;

/// Errors raised while turning an IFC file into a consumption estimate
///
/// Only `UnreadableModel`, `InvalidInput` and `Io` ever reach a caller.
/// `MalformedEntity` and `EstimationTransport` describe problems that are
/// logged and recovered from inside the pipeline.
#[derive(Error, Debug)]
pub enum EnergyError {
    /// The file could not be read or is not a well-formed IFC STEP file
    #[error("Unreadable building model: {0}")]
    UnreadableModel(#[from] ParseError),

    /// The upload was rejected before extraction started
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One entity carried an attribute that could not be used
    #[error("Malformed entity {entity}: {reason}")]
    MalformedEntity { entity: EntityId, reason: String },

    /// The remote estimator failed; the local estimate is used instead
    #[error("Remote estimator failed: {0}")]
    EstimationTransport(#[from] RemoteError),

    /// Staging the upload failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnergyError {
    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EnergyError::InvalidInput(msg.into())
    }

    /// Create a new malformed entity error
    pub fn malformed(entity: EntityId, reason: impl Into<String>) -> Self {
        EnergyError::MalformedEntity {
            entity,
            reason: reason.into(),
        }
    }

    /// Whether the error must be reported to the caller
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EnergyError::UnreadableModel(_) | EnergyError::InvalidInput(_) | EnergyError::Io(_)
        )
    }
}
