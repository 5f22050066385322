// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ComputeFile, RawComputeFile};
use crate::errors::Result;

/// Read and deserialize a compute file without semantic validation.
///
/// Use [`load_and_validate`] to also check event sources and manifest DAGs.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawComputeFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawComputeFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "compute file parsed");

    Ok(config)
}

/// Load a compute file and validate it.
///
/// Checks that:
/// - exactly one event source is configured,
/// - manifest ids are unique within each event,
/// - dependencies stay inside their event and form a DAG,
/// - queue and profile are set.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ComputeFile> {
    let raw_config = load_from_path(&path)?;
    let config = ComputeFile::try_from(raw_config)?;
    Ok(config)
}

/// `Compute.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Compute.toml")
}
