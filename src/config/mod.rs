// src/config/mod.rs

//! Compute definitions loaded from TOML.
//!
//! - [`model`] holds the raw and validated data model.
//! - [`loader`] reads files from disk.
//! - [`validate`] turns a raw file into a [`ComputeFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ComputeFile, ComputeSection, EventSource, RangeSection, RawComputeFile};
pub use validate::validate_raw_compute;
