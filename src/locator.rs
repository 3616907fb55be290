//! On-site hopping block location inside tight-binding output text.
//!
//! Wannier90-style hopping listings announce each block with a header line of
//! the form
//!
//! ```text
//! Hopping <a|H|b> between Cr1 (000) <--> Cr1 (000) in sphere # 0 with radius 0.0000
//! ```
//!
//! followed (for the on-site case) by a `Radius vector is: x y z` line and
//! then N rows of N whitespace-separated reals. The same atom pair reappears
//! many times at different sphere indices, so matching the pair label alone
//! is not enough: only sphere 0 together with a near-zero radius vector
//! identifies the on-site block.
//!
//! The scan is implemented as an explicit state machine with four states:
//!
//! ```text
//! SeekingHeader -> AwaitingRadiusVector -> AwaitingFirstRow -> AccumulatingRows
//! ```
//!
//! Every rejection (missing or malformed radius vector, non-zero
//! displacement, wrong row length, truncated block) transitions back to
//! `SeekingHeader` with the cursor placed on the line after the rejected
//! header, so a near-match never hides a later genuine match and the scan
//! never restarts from the top of the file. The locator works the same on a
//! full output file and on a pre-filtered excerpt: it assumes nothing beyond
//! the header/radius-vector/matrix grammar.

use crate::numeric::{normalize_fortran_exponent, scan_floats, FLOAT_PATTERN};
use lazy_static::lazy_static;
use log::debug;
use nalgebra::DMatrix;
use regex::Regex;

/// Components of any radius vector must stay below this bound for the block
/// to count as on-site.
pub const ONSITE_TOLERANCE: f64 = 1e-8;

lazy_static! {
    static ref HEADER_RE: Regex = Regex::new(&format!(
        r"(?i)^Hopping\s*<a\|H\|b>\s*between\s+(?P<a>\S+)\s*\(.*?\)\s*<-->\s*(?P<b>\S+)\s*\(.*?\)\s*in\s*sphere\s*#\s*(?P<sphere>\d+).*?radius\s*(?P<radius>{0})",
        *FLOAT_PATTERN
    ))
    .unwrap();
    static ref RADIUS_VEC_RE: Regex = Regex::new(&format!(
        r"(?i)^Radius\s+vector\s+is:\s*(?P<x>{0})\s+(?P<y>{0})\s+(?P<z>{0})\s*$",
        *FLOAT_PATTERN
    ))
    .unwrap();
}

/// Parsed fields of one hopping block header line.
#[derive(Debug, Clone, PartialEq)]
pub struct HoppingHeader {
    /// First atom label, e.g. "Cr1"
    pub atom_a: String,
    /// Second atom label, e.g. "Se3"
    pub atom_b: String,
    /// Coordination sphere index; 0 for the on-site sphere
    pub sphere: usize,
    /// Declared distance between the two sites
    pub radius: f64,
}

/// Parses a hopping block header line, or returns `None` if the line does
/// not start with the header grammar.
pub fn parse_header(line: &str) -> Option<HoppingHeader> {
    let caps = HEADER_RE.captures(line)?;
    let sphere = caps["sphere"].parse().ok()?;
    let radius = normalize_fortran_exponent(&caps["radius"]).parse().ok()?;
    Some(HoppingHeader {
        atom_a: caps["a"].to_string(),
        atom_b: caps["b"].to_string(),
        sphere,
        radius,
    })
}

/// Parses a `Radius vector is: x y z` line into its three components.
pub fn parse_radius_vector(line: &str) -> Option<[f64; 3]> {
    let caps = RADIUS_VEC_RE.captures(line)?;
    let mut v = [0.0; 3];
    for (slot, name) in v.iter_mut().zip(["x", "y", "z"]) {
        *slot = normalize_fortran_exponent(&caps[name]).parse().ok()?;
    }
    Some(v)
}

/// True iff every component of the displacement is below [`ONSITE_TOLERANCE`].
pub fn is_nearly_zero(v: &[f64; 3]) -> bool {
    v.iter().all(|c| c.abs() < ONSITE_TOLERANCE)
}

/// Compares an atom-pair target string like `"Cr1-Cr1"` against two header
/// atom labels, ignoring case, whitespace, and the order of the two atoms.
///
/// # Examples
///
/// ```
/// use cflevels::locator::pair_matches;
///
/// assert!(pair_matches("cr1-cr1", "Cr1", "Cr1"));
/// assert!(pair_matches("Cr1-Se3", "Se3", "Cr1"));
/// assert!(!pair_matches("Cr1-Se3", "Cr1", "Se4"));
/// ```
pub fn pair_matches(target: &str, atom_a: &str, atom_b: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    };
    let target = normalize(target);
    target == normalize(&format!("{}-{}", atom_a, atom_b))
        || target == normalize(&format!("{}-{}", atom_b, atom_a))
}

/// Scanner states; see the module documentation for the transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Looking for a header whose pair label and sphere index match
    SeekingHeader,
    /// Header accepted; next non-blank line must be a near-zero radius vector
    AwaitingRadiusVector,
    /// Radius vector accepted; next numeric line fixes the block dimension
    AwaitingFirstRow,
    /// Collecting rows until the declared dimension is reached
    AccumulatingRows,
}

/// Locates the on-site hopping block for `pair` and returns it as an N×N
/// matrix, or `None` if no complete on-site block exists in `lines`.
///
/// A candidate is the first matching header (right pair, sphere 0) together
/// with whatever follows it. Candidates are rejected without giving up on the
/// pair: the scan resumes on the line after the rejected header, so duplicate
/// pair labels at non-zero sphere indices and truncated blocks are skipped
/// over rather than treated as terminal failures.
pub fn find_onsite_block(lines: &[&str], pair: &str) -> Option<DMatrix<f64>> {
    let mut state = ScanState::SeekingHeader;
    let mut idx = 0;
    let mut header_idx = 0;
    let mut dim = 0;
    let mut rows: Vec<Vec<f64>> = Vec::new();

    loop {
        if idx >= lines.len() {
            if state == ScanState::SeekingHeader {
                return None;
            }
            // Ran out of lines mid-candidate: reject and rescan the tail.
            state = ScanState::SeekingHeader;
            idx = header_idx + 1;
            rows.clear();
            continue;
        }
        let line = lines[idx];

        match state {
            ScanState::SeekingHeader => {
                if let Some(header) = parse_header(line) {
                    if pair_matches(pair, &header.atom_a, &header.atom_b) && header.sphere == 0 {
                        debug!(
                            "candidate on-site header for {}-{} at line {}",
                            header.atom_a, header.atom_b, idx
                        );
                        header_idx = idx;
                        state = ScanState::AwaitingRadiusVector;
                    }
                }
                idx += 1;
            }
            ScanState::AwaitingRadiusVector => {
                if line.trim().is_empty() {
                    idx += 1;
                    continue;
                }
                match parse_radius_vector(line) {
                    Some(v) if is_nearly_zero(&v) => {
                        state = ScanState::AwaitingFirstRow;
                        idx += 1;
                    }
                    _ => {
                        debug!("rejecting candidate at line {}: no on-site radius vector", header_idx);
                        state = ScanState::SeekingHeader;
                        idx = header_idx + 1;
                    }
                }
            }
            ScanState::AwaitingFirstRow => {
                if line.trim().is_empty() {
                    idx += 1;
                    continue;
                }
                match scan_floats(line) {
                    Some(first) => {
                        dim = first.len();
                        rows.clear();
                        rows.push(first);
                        if rows.len() == dim {
                            return Some(rows_to_matrix(&rows, dim));
                        }
                        state = ScanState::AccumulatingRows;
                        idx += 1;
                    }
                    None => {
                        debug!("rejecting candidate at line {}: no numeric rows", header_idx);
                        state = ScanState::SeekingHeader;
                        idx = header_idx + 1;
                    }
                }
            }
            ScanState::AccumulatingRows => {
                match scan_floats(line) {
                    Some(row) if row.len() == dim => {
                        rows.push(row);
                        if rows.len() == dim {
                            return Some(rows_to_matrix(&rows, dim));
                        }
                        idx += 1;
                    }
                    _ => {
                        debug!(
                            "rejecting candidate at line {}: got {} of {} rows",
                            header_idx,
                            rows.len(),
                            dim
                        );
                        state = ScanState::SeekingHeader;
                        idx = header_idx + 1;
                        rows.clear();
                    }
                }
            }
        }
    }
}

fn rows_to_matrix(rows: &[Vec<f64>], dim: usize) -> DMatrix<f64> {
    DMatrix::from_fn(dim, dim, |i, j| rows[i][j])
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Hopping <a|H|b> between Cr1 (000) <--> Cr1 (000) in sphere # 0 with radius 0.0000";

    #[test]
    fn test_parse_header_fields() {
        let header = parse_header(HEADER).unwrap();
        assert_eq!(header.atom_a, "Cr1");
        assert_eq!(header.atom_b, "Cr1");
        assert_eq!(header.sphere, 0);
        assert_eq!(header.radius, 0.0);
    }

    #[test]
    fn test_parse_header_nonzero_sphere() {
        let line = "Hopping <a|H|b> between Cr1 (000) <--> Se3 (001) in sphere # 4 with radius 5.1250";
        let header = parse_header(line).unwrap();
        assert_eq!(header.sphere, 4);
        assert!((header.radius - 5.125).abs() < 1e-12);
    }

    #[test]
    fn test_parse_header_rejects_other_lines() {
        assert!(parse_header("Radius vector is: 0.0 0.0 0.0").is_none());
        assert!(parse_header("  0.5 0.1 0.0").is_none());
    }

    #[test]
    fn test_parse_radius_vector() {
        let v = parse_radius_vector("Radius vector is:  0.0000  -0.0000  0.0000").unwrap();
        assert!(is_nearly_zero(&v));
        let v = parse_radius_vector("Radius vector is: 1.0D-02 0.0 0.0").unwrap();
        assert!(!is_nearly_zero(&v));
    }

    #[test]
    fn test_pair_matching_order_and_case() {
        assert!(pair_matches("cr1-cr1", "Cr1", "Cr1"));
        assert!(pair_matches("A-B", "B", "A"));
        assert!(pair_matches(" Cr1 - Se3 ", "Se3", "Cr1"));
        assert!(!pair_matches("Cr1-Cr2", "Cr1", "Cr1"));
    }

    #[test]
    fn test_locates_simple_block() {
        let lines = vec![
            HEADER,
            "Radius vector is: 0.0 0.0 0.0",
            " 1.0 0.5",
            " 0.5 2.0",
        ];
        let m = find_onsite_block(&lines, "Cr1-Cr1").unwrap();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m[(0, 1)], 0.5);
        assert_eq!(m[(1, 1)], 2.0);
    }

    #[test]
    fn test_skips_nonzero_sphere_then_finds_onsite() {
        let lines = vec![
            "Hopping <a|H|b> between Cr1 (000) <--> Cr1 (010) in sphere # 2 with radius 3.5",
            "Radius vector is: 0.0 3.5 0.0",
            " 0.1 0.0",
            " 0.0 0.1",
            "",
            HEADER,
            "Radius vector is: 0.0 0.0 0.0",
            " 9.0 0.0",
            " 0.0 9.0",
        ];
        let m = find_onsite_block(&lines, "Cr1-Cr1").unwrap();
        assert_eq!(m[(0, 0)], 9.0);
    }

    #[test]
    fn test_rejects_nonzero_radius_vector() {
        let lines = vec![
            HEADER,
            "Radius vector is: 0.0 1.0E-7 0.0",
            " 1.0 0.0",
            " 0.0 1.0",
        ];
        assert!(find_onsite_block(&lines, "Cr1-Cr1").is_none());
    }

    #[test]
    fn test_rejects_truncated_block_but_finds_later_one() {
        let lines = vec![
            HEADER,
            "Radius vector is: 0.0 0.0 0.0",
            " 1.0 0.0 0.0",
            " 0.0 1.0 0.0",
            "",
            HEADER,
            "Radius vector is: 0.0 0.0 0.0",
            " 4.0 0.0",
            " 0.0 4.0",
        ];
        let m = find_onsite_block(&lines, "Cr1-Cr1").unwrap();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m[(0, 0)], 4.0);
    }

    #[test]
    fn test_row_length_mismatch_rejects_candidate() {
        let lines = vec![
            HEADER,
            "Radius vector is: 0.0 0.0 0.0",
            " 1.0 0.0",
            " 0.0 1.0 2.0",
        ];
        assert!(find_onsite_block(&lines, "Cr1-Cr1").is_none());
    }

    #[test]
    fn test_one_by_one_block() {
        let lines = vec![HEADER, "Radius vector is: 0.0 0.0 0.0", " -3.25"];
        let m = find_onsite_block(&lines, "Cr1-Cr1").unwrap();
        assert_eq!(m.nrows(), 1);
        assert_eq!(m[(0, 0)], -3.25);
    }
}
