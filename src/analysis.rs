//! On-site Hamiltonian diagonalization and orbital-character extraction.
//!
//! Given the raw N×N hopping block for one spin channel, this module builds
//! the matrix that is actually diagonalized (by default the symmetric part
//! `(H + Hᵗ)/2`), solves the symmetric eigenproblem, and reduces each
//! eigenvector to per-orbital character fractions. Two diagnostics are
//! reported alongside: the largest antisymmetric residual `max |H − Hᵗ|`,
//! which measures how far the raw block is from Hermitian, and the largest
//! off-diagonal magnitude of the diagonalized matrix, which measures how far
//! the chosen basis is from the crystal-field eigenbasis.
//!
//! Eigenvalues are sorted ascending with their eigenvector columns permuted
//! consistently; the underlying solver does not guarantee an order.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Error type for Hamiltonian analysis.
///
/// These are contract violations by the caller (shape or label mismatches),
/// not data-quality issues, and surface immediately.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The hopping block is not a square matrix
    #[error("Hamiltonian block is not square: {rows}x{cols}")]
    NotSquare {
        /// Number of rows in the offending block
        rows: usize,
        /// Number of columns in the offending block
        cols: usize,
    },
    /// The basis label count does not match the block dimension
    #[error("basis has {labels} labels but the block dimension is {dim}")]
    BasisMismatch {
        /// Block dimension N
        dim: usize,
        /// Number of basis labels supplied
        labels: usize,
    },
}

/// Type alias for analysis operation results
type Result<T> = std::result::Result<T, AnalysisError>;

/// Diagonalization result for one spin channel.
///
/// Constructed once per spin per invocation and immutable afterwards.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Raw hopping block as harvested from the output file
    pub hamiltonian: DMatrix<f64>,
    /// Matrix that was diagonalized: `(H + Hᵗ)/2`, or `H` when
    /// symmetrization is disabled
    pub h_used: DMatrix<f64>,
    /// Largest entry of `|H − Hᵗ|`
    pub max_antisym: f64,
    /// Largest off-diagonal magnitude of `h_used`
    pub max_offdiag: f64,
    /// Eigenvalues sorted ascending
    pub energies: DVector<f64>,
    /// Orthonormal eigenvectors, one column per level, ordered like
    /// `energies`
    pub eigenvectors: DMatrix<f64>,
    /// Orbital characters: `characters[(i, j)]` is the fractional weight of
    /// basis orbital `i` in level `j`; every column sums to 1
    pub characters: DMatrix<f64>,
    /// Basis orbital labels, one per row of the block
    pub basis: Vec<String>,
}

/// Diagonalizes one on-site hopping block and extracts per-level orbital
/// characters.
///
/// # Arguments
///
/// * `h` - Square real hopping block
/// * `basis` - Orbital labels, one per basis function; the length must equal
///   the block dimension
/// * `symmetrize` - Diagonalize `(H + Hᵗ)/2` when true, `H` unchanged when
///   false
///
/// # Errors
///
/// Returns [`AnalysisError::NotSquare`] or [`AnalysisError::BasisMismatch`]
/// on shape violations. Both indicate caller bugs rather than bad input
/// files, so there is no recovery path.
///
/// # Examples
///
/// ```
/// use cflevels::analysis::analyze_block;
/// use nalgebra::DMatrix;
///
/// let h = DMatrix::from_row_slice(2, 2, &[1.0, 0.2, 0.2, 2.0]);
/// let basis = vec!["dxy".to_string(), "dyz".to_string()];
/// let result = analyze_block(&h, &basis, true).unwrap();
/// assert!(result.energies[0] <= result.energies[1]);
/// ```
pub fn analyze_block(h: &DMatrix<f64>, basis: &[String], symmetrize: bool) -> Result<AnalysisResult> {
    let n = h.nrows();
    if h.ncols() != n {
        return Err(AnalysisError::NotSquare {
            rows: n,
            cols: h.ncols(),
        });
    }
    if basis.len() != n {
        return Err(AnalysisError::BasisMismatch {
            dim: n,
            labels: basis.len(),
        });
    }

    let h_t = h.transpose();
    let h_used = if symmetrize {
        (h + &h_t) * 0.5
    } else {
        h.clone()
    };

    let max_antisym = (h - &h_t).iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let mut max_offdiag = 0.0_f64;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                max_offdiag = max_offdiag.max(h_used[(i, j)].abs());
            }
        }
    }

    let eigen = h_used.clone().symmetric_eigen();

    // Ascending energy order; the solver returns eigenpairs unordered.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let energies = DVector::from_fn(n, |i, _| eigen.eigenvalues[order[i]]);
    let mut eigenvectors = DMatrix::from_fn(n, n, |i, j| eigen.eigenvectors[(i, order[j])]);

    // Renormalize each column; the solver output is already unit-norm, this
    // guards against accumulated rounding.
    for j in 0..n {
        let norm = eigenvectors.column(j).norm();
        if norm > 0.0 {
            for i in 0..n {
                eigenvectors[(i, j)] /= norm;
            }
        }
    }

    let mut characters = DMatrix::from_fn(n, n, |i, j| {
        let v = eigenvectors[(i, j)];
        v * v
    });
    for j in 0..n {
        let total: f64 = characters.column(j).sum();
        if total > 0.0 {
            for i in 0..n {
                characters[(i, j)] /= total;
            }
        }
    }

    Ok(AnalysisResult {
        hamiltonian: h.clone(),
        h_used,
        max_antisym,
        max_offdiag,
        energies,
        eigenvectors,
        characters,
        basis: basis.to_vec(),
    })
}
