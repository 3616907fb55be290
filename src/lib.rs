#![deny(missing_docs)]

//! cflevels - On-site crystal-field levels from tight-binding hopping output
//!
//! cflevels digs the on-site Hamiltonian block for one atom pair out of
//! Wannier90-style hopping listings, diagonalizes it per spin channel, and
//! reports orbital-resolved energy levels together with a spin-averaged
//! combination in which up and down levels are matched by maximum
//! eigenvector overlap.
//!
//! # Overview
//!
//! Spin-polarized tight-binding runs without spin-orbit coupling produce one
//! hopping listing per spin channel. The on-site block of a transition-metal
//! site is the crystal-field Hamiltonian of its d shell: its eigenvalues are
//! the level energies and the squared eigenvector components give the
//! orbital character of each level. Because the two channels are
//! diagonalized independently, levels with the same index need not match
//! physically; cflevels pairs them through the assignment that maximizes the
//! total squared eigenvector overlap before averaging.
//!
//! # Pipeline
//!
//! ```text
//! hopping listing (up)  --locator-->  H_up  --analysis-->  levels (up)   \
//!                                                                         pairing --> combined table
//! hopping listing (dn)  --locator-->  H_dn  --analysis-->  levels (dn)  /
//! ```
//!
//! # Input Format
//!
//! Hopping listings are line-oriented blocks:
//!
//! ```text
//! Hopping <a|H|b> between Cr1 (000) <--> Cr1 (000) in sphere # 0 with radius 0.0000
//! Radius vector is:  0.00000000  0.00000000  0.00000000
//!   -1.2345  0.0123  ...
//!   ...
//! ```
//!
//! Only the header/radius-vector/matrix grammar is assumed, so both full
//! output files and pre-filtered excerpts work. Fortran `D` exponents are
//! accepted everywhere.
//!
//! # Quick Start
//!
//! ```no_run
//! use cflevels::config::LevelsConfig;
//! use cflevels::levels;
//!
//! fn main() -> Result<(), cflevels::levels::LevelsError> {
//!     let config = LevelsConfig {
//!         pair: "Cr1-Cr1".to_string(),
//!         ..LevelsConfig::default()
//!     };
//!     let report = levels::run(&config)?;
//!     print!("{}", levels::render(&report, &config));
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`numeric`](numeric/index.html) - Fortran-tolerant float scanning
//! - [`locator`](locator/index.html) - on-site block location
//! - [`analysis`](analysis/index.html) - diagonalization and orbital characters
//! - [`pairing`](pairing/index.html) - cross-spin level assignment
//! - [`report`](report/index.html) - table rendering
//! - [`levels`](levels/index.html) - end-to-end pipeline
//! - [`config`](config/index.html) - run configuration
//! - [`settings`](settings/index.html) - INI-based defaults
//! - [`relabel`](relabel/index.html) - atom-index relabeling and extraction
//! - [`survey`](survey/index.html) - whole-file hopping survey

pub mod analysis;
pub mod config;
/// End-to-end pipeline
pub mod levels;
pub mod locator;
/// Fortran-tolerant numeric token scanning
pub mod numeric;
pub mod pairing;
/// Atom-index relabeling and per-pair extraction
pub mod relabel;
pub mod report;
/// INI-based default settings
pub mod settings;
/// Whole-file hopping survey
pub mod survey;

pub use analysis::AnalysisResult;
pub use config::LevelsConfig;
