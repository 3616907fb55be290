//! End-to-end level-analysis pipeline.
//!
//! Reads both spin channel files, locates the on-site hopping block for the
//! requested atom pair in each, diagonalizes the two blocks, pairs the
//! resulting levels across channels by maximum eigenvector overlap, and
//! renders the three report tables. Apart from the two whole-file reads the
//! pipeline is pure; the two channels are analyzed independently and share
//! no state.

use crate::analysis::{analyze_block, AnalysisError, AnalysisResult};
use crate::config::{ConfigError, LevelsConfig};
use crate::locator::find_onsite_block;
use crate::pairing::{pair_by_overlap, Pairing, PairingError};
use crate::report;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for the level-analysis pipeline.
#[derive(Error, Debug)]
pub enum LevelsError {
    /// A channel file could not be read
    #[error("cannot read '{path}': {source}")]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// Configuration invariants violated before any file was touched
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No complete on-site block for the pair in the named file
    #[error("on-site block '{pair}' not found in '{path}'")]
    BlockNotFound {
        /// Atom pair that was searched for
        pair: String,
        /// File that was searched
        path: PathBuf,
    },
    /// Shape or label mismatch during diagonalization
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Eigenvector sets could not be paired
    #[error(transparent)]
    Pairing(#[from] PairingError),
}

/// Everything a finished `levels` run produced.
#[derive(Debug, Clone)]
pub struct LevelsReport {
    /// Spin-up channel analysis
    pub up: AnalysisResult,
    /// Spin-down channel analysis
    pub down: AnalysisResult,
    /// Cross-spin level assignment
    pub pairing: Pairing,
}

/// Runs the full pipeline for one configuration.
pub fn run(config: &LevelsConfig) -> Result<LevelsReport, LevelsError> {
    config.validate()?;

    let up = analyze_channel(&config.up_file, config)?;
    let down = analyze_channel(&config.down_file, config)?;

    let pairing = pair_by_overlap(&up.eigenvectors, &down.eigenvectors)?;
    info!(
        "paired {} levels with total squared overlap {:.6}",
        pairing.assignment.len(),
        pairing.score
    );

    Ok(LevelsReport { up, down, pairing })
}

/// Renders the two per-spin tables and the combined table as one report.
pub fn render(report: &LevelsReport, config: &LevelsConfig) -> String {
    let mut out = String::new();
    out.push_str(&report::per_spin_table(
        "up",
        &report.up,
        config.dominant_threshold,
        config.decimals,
    ));
    out.push_str(&report::per_spin_table(
        "down",
        &report.down,
        config.dominant_threshold,
        config.decimals,
    ));
    out.push_str(&report::combined_table(
        &report.up,
        &report.down,
        &report.pairing,
        config.dominant_threshold,
        config.decimals,
    ));
    out
}

fn analyze_channel(path: &Path, config: &LevelsConfig) -> Result<AnalysisResult, LevelsError> {
    let content = fs::read_to_string(path).map_err(|source| LevelsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let lines: Vec<&str> = content.lines().collect();
    let block = find_onsite_block(&lines, &config.pair).ok_or_else(|| LevelsError::BlockNotFound {
        pair: config.pair.clone(),
        path: path.to_path_buf(),
    })?;
    info!(
        "located {}x{} on-site block for '{}' in {}",
        block.nrows(),
        block.ncols(),
        config.pair,
        path.display()
    );
    Ok(analyze_block(&block, &config.basis, config.symmetrize)?)
}
