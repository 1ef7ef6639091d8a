use std::fs;

use crate::error::NuanceError;
use crate::types::{FeatureDigest, Parameters};

/// Load a feature digest produced by the external analysis collaborator.
/// The core trusts the digest's invariants (positive tempo, strictly
/// increasing beat times) and does not re-validate them.
pub fn load_digest_from_file(filepath: &str) -> Result<FeatureDigest, NuanceError> {
    let text = fs::read_to_string(filepath)
        .map_err(|e| NuanceError::Analysis(format!("cannot read digest {}: {}", filepath, e)))?;
    serde_json::from_str(&text)
        .map_err(|e| NuanceError::Analysis(format!("cannot parse digest {}: {}", filepath, e)))
}

/// Load run parameters from a JSON file. Missing fields fall back to the
/// defaults; values are passed through unclamped.
pub fn load_params_from_file(filepath: &str) -> Result<Parameters, NuanceError> {
    let text = fs::read_to_string(filepath)
        .map_err(|e| NuanceError::Config(format!("cannot read parameters {}: {}", filepath, e)))?;
    serde_json::from_str(&text)
        .map_err(|e| NuanceError::Config(format!("cannot parse parameters {}: {}", filepath, e)))
}
