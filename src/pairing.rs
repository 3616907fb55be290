//! Cross-spin level pairing by eigenvector overlap maximization.
//!
//! Without spin-orbit coupling the up and down channels are diagonalized
//! independently, so "level 3 of the up channel" and "level 3 of the down
//! channel" need not describe the same orbital composition. Since both
//! channels share one orbital basis, the eigenvector columns are directly
//! comparable, and the physically matching partner of an up level is the
//! down level with the largest squared overlap. This module finds the
//! assignment maximizing the total squared overlap over all levels at once.
//!
//! The search enumerates all N! permutations. That is a deliberate tradeoff,
//! not an oversight: the block dimension is the d-orbital manifold (N = 5,
//! 120 permutations), so exhaustive search is cheaper than anything smarter.
//! A build targeting larger blocks should substitute a maximum-weight
//! bipartite matching (Hungarian) algorithm behind the same contract:
//! maximize total squared overlap, return both the assignment and the
//! overlap matrix.

use nalgebra::DMatrix;
use thiserror::Error;

/// Error type for pairing operations.
#[derive(Error, Debug)]
pub enum PairingError {
    /// The two eigenvector sets do not live in the same basis
    #[error("eigenvector sets have mismatched shapes: {up_rows}x{up_cols} vs {dn_rows}x{dn_cols}")]
    ShapeMismatch {
        /// Row count of the up-channel eigenvector matrix
        up_rows: usize,
        /// Column count of the up-channel eigenvector matrix
        up_cols: usize,
        /// Row count of the down-channel eigenvector matrix
        dn_rows: usize,
        /// Column count of the down-channel eigenvector matrix
        dn_cols: usize,
    },
}

/// Optimal assignment of down-channel levels to up-channel levels.
#[derive(Debug, Clone)]
pub struct Pairing {
    /// `assignment[i]` is the down-channel level paired with up-channel
    /// level `i`
    pub assignment: Vec<usize>,
    /// Squared overlap magnitudes: `overlap_sq[(i, j)] = |⟨up_i|dn_j⟩|²`
    pub overlap_sq: DMatrix<f64>,
    /// Total squared overlap of the selected assignment
    pub score: f64,
}

/// Pairs the levels of two spin channels by maximizing the total squared
/// eigenvector overlap.
///
/// Both arguments hold one eigenvector per column, expressed in the same
/// orbital basis. Ties between assignments are not broken specially: the
/// first permutation reaching the best score (in lexicographic enumeration
/// order) wins. Ties do not occur for physically distinct levels.
///
/// # Errors
///
/// Returns [`PairingError::ShapeMismatch`] when the two matrices differ in
/// shape; like the analyzer's shape errors this is a caller bug.
///
/// # Examples
///
/// ```
/// use cflevels::pairing::pair_by_overlap;
/// use nalgebra::DMatrix;
///
/// let up = DMatrix::<f64>::identity(3, 3);
/// let pairing = pair_by_overlap(&up, &up).unwrap();
/// assert_eq!(pairing.assignment, vec![0, 1, 2]);
/// ```
pub fn pair_by_overlap(
    evecs_up: &DMatrix<f64>,
    evecs_dn: &DMatrix<f64>,
) -> Result<Pairing, PairingError> {
    if evecs_up.shape() != evecs_dn.shape() {
        return Err(PairingError::ShapeMismatch {
            up_rows: evecs_up.nrows(),
            up_cols: evecs_up.ncols(),
            dn_rows: evecs_dn.nrows(),
            dn_cols: evecs_dn.ncols(),
        });
    }

    let overlap = evecs_up.transpose() * evecs_dn;
    let overlap_sq = overlap.map(|v| v * v);

    let n = overlap_sq.ncols();
    let mut best_perm = Vec::new();
    let mut best_score = -1.0;
    let mut current = Vec::with_capacity(n);
    let mut used = vec![false; n];
    search_permutations(
        &overlap_sq,
        n,
        &mut current,
        &mut used,
        0.0,
        &mut best_perm,
        &mut best_score,
    );

    Ok(Pairing {
        assignment: best_perm,
        overlap_sq,
        score: best_score,
    })
}

/// Depth-first enumeration of all assignments in lexicographic order,
/// keeping the first one reaching the maximal score.
fn search_permutations(
    s2: &DMatrix<f64>,
    n: usize,
    current: &mut Vec<usize>,
    used: &mut [bool],
    score: f64,
    best_perm: &mut Vec<usize>,
    best_score: &mut f64,
) {
    if current.len() == n {
        if score > *best_score {
            *best_score = score;
            best_perm.clear();
            best_perm.extend_from_slice(current);
        }
        return;
    }
    let i = current.len();
    for j in 0..n {
        if used[j] {
            continue;
        }
        used[j] = true;
        current.push(j);
        search_permutations(s2, n, current, used, score + s2[(i, j)], best_perm, best_score);
        current.pop();
        used[j] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sets_pair_as_identity() {
        let up = DMatrix::from_row_slice(
            3,
            3,
            &[
                0.8, -0.6, 0.0, //
                0.6, 0.8, 0.0, //
                0.0, 0.0, 1.0,
            ],
        );
        let pairing = pair_by_overlap(&up, &up).unwrap();
        assert_eq!(pairing.assignment, vec![0, 1, 2]);
        assert!((pairing.score - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_swapped_columns_pair_crosswise() {
        let up = DMatrix::<f64>::identity(2, 2);
        let dn = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let pairing = pair_by_overlap(&up, &dn).unwrap();
        assert_eq!(pairing.assignment, vec![1, 0]);
        assert!((pairing.score - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_two_by_two_score() {
        // Overlap-squared matrix [[0.9, 0.1], [0.2, 0.8]]: identity scores
        // 1.7, the swap scores 0.3.
        let up = DMatrix::<f64>::identity(2, 2);
        let dn = DMatrix::from_row_slice(
            2,
            2,
            &[0.9_f64.sqrt(), 0.1_f64.sqrt(), 0.2_f64.sqrt(), 0.8_f64.sqrt()],
        );
        let pairing = pair_by_overlap(&up, &dn).unwrap();
        assert!((pairing.overlap_sq[(0, 0)] - 0.9).abs() < 1e-12);
        assert!((pairing.overlap_sq[(0, 1)] - 0.1).abs() < 1e-12);
        assert!((pairing.overlap_sq[(1, 0)] - 0.2).abs() < 1e-12);
        assert!((pairing.overlap_sq[(1, 1)] - 0.8).abs() < 1e-12);
        assert_eq!(pairing.assignment, vec![0, 1]);
        assert!((pairing.score - 1.7).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let up = DMatrix::<f64>::identity(2, 2);
        let dn = DMatrix::<f64>::identity(3, 3);
        assert!(matches!(
            pair_by_overlap(&up, &dn),
            Err(PairingError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_full_five_level_permutation() {
        // Down channel is the up channel with columns rotated by one; the
        // best assignment must undo the rotation.
        let up = DMatrix::<f64>::identity(5, 5);
        let dn = DMatrix::from_fn(5, 5, |i, j| if i == (j + 1) % 5 { 1.0 } else { 0.0 });
        let pairing = pair_by_overlap(&up, &dn).unwrap();
        assert_eq!(pairing.assignment, vec![4, 0, 1, 2, 3]);
        assert!((pairing.score - 5.0).abs() < 1e-12);
    }
}
