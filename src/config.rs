//! Configuration for the level-analysis pipeline.
//!
//! All parameters of a `levels` run live in [`LevelsConfig`]: the two spin
//! channel files, the target atom pair, the orbital basis ordering, and the
//! display settings. The configuration is filled from command-line flags on
//! top of defaults, which in turn may come from the INI settings file (see
//! [`settings`](crate::settings)).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Number of orbital labels the d-block pipeline expects.
pub const BASIS_SIZE: usize = 5;

/// Error type for configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The basis specification does not contain exactly [`BASIS_SIZE`] labels
    #[error("need exactly {expected} basis labels, got {found}")]
    BasisCount {
        /// Required label count
        expected: usize,
        /// Labels actually supplied
        found: usize,
    },
    /// A required parameter was not supplied
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Complete configuration for one `levels` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelsConfig {
    /// Spin-up hopping output file
    pub up_file: PathBuf,
    /// Spin-down hopping output file
    pub down_file: PathBuf,
    /// Target atom pair, e.g. "Cr1-Cr1"
    pub pair: String,
    /// Ordered orbital labels for the on-site block rows/columns
    pub basis: Vec<String>,
    /// Diagonalize `(H + Hᵗ)/2` instead of the raw block
    pub symmetrize: bool,
    /// Decimal places for energies in the report
    pub decimals: usize,
    /// Percentage threshold for the dominant-orbital column
    pub dominant_threshold: f64,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            up_file: PathBuf::from("out1.dat"),
            down_file: PathBuf::from("out2.dat"),
            pair: String::new(),
            basis: parse_basis_spec("dz2,dxz,dyz,dx2,dxy"),
            symmetrize: true,
            decimals: 6,
            dominant_threshold: 10.0,
        }
    }
}

impl LevelsConfig {
    /// Checks the invariants a run depends on: a target pair must be given
    /// and the basis must have exactly [`BASIS_SIZE`] labels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pair.trim().is_empty() {
            return Err(ConfigError::MissingParameter("--pair"));
        }
        if self.basis.len() != BASIS_SIZE {
            return Err(ConfigError::BasisCount {
                expected: BASIS_SIZE,
                found: self.basis.len(),
            });
        }
        Ok(())
    }
}

/// Splits a basis specification like `"dz2,dxz,dyz,dx2,dxy"` (commas and/or
/// whitespace) into trimmed labels.
pub fn parse_basis_spec(spec: &str) -> Vec<String> {
    spec.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
