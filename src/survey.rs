//! Whole-file hopping survey grouped by neighbor distance.
//!
//! Where the locator hunts for one specific on-site block, the survey walks
//! every hopping block in a file (any sphere index) and reduces each to
//! three numbers: the cleaned pair label, the header radius, and the largest
//! absolute matrix entry. Blocks are then grouped by radius so that shells
//! of neighbors at similar distances read as one group, with a configurable
//! gap deciding where a new group starts.
//!
//! The block walk is deliberately loose: it tolerates blank separators, the
//! lone `--` separators that `grep -A` leaves between extracted sections,
//! and back-to-back headers with no matrix in between.

use crate::numeric::{normalize_fortran_exponent, scan_floats, FLOAT_PATTERN};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Comparison slack when deciding whether two distances fall in one group.
const DISTANCE_EPS: f64 = 1e-9;

lazy_static! {
    static ref SURVEY_HEADER_RE: Regex = Regex::new(&format!(
        r"(?i)^Hopping\s+<a\|H\|b>\s+between\s+(?P<pair>.+?)\s+in\s+sphere\s+#\s*(?P<sphere>\d+)\s+with\s+radius\s+(?P<radius>{0})(?:\s+--\s*\d+:)?\s*$",
        *FLOAT_PATTERN
    ))
    .unwrap();
    static ref SITE_ANNOTATION_RE: Regex = Regex::new(r"\s*\([^)]*\)").unwrap();
    static ref ARROW_SPACING_RE: Regex = Regex::new(r"\s*<-->\s*").unwrap();
}

/// Error type for survey runs.
#[derive(Error, Debug)]
pub enum SurveyError {
    /// The surveyed file could not be read
    #[error("cannot read '{path}': {source}")]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// One hopping block as harvested by the survey walk.
#[derive(Debug, Clone)]
pub struct SurveyBlock {
    /// Cleaned pair label, e.g. "Cr1<-->Se3"
    pub pair: String,
    /// Declared neighbor distance from the header
    pub radius: f64,
    /// Raw matrix lines collected after the radius-vector marker
    pub matrix_lines: Vec<String>,
}

/// One reduced survey entry.
#[derive(Debug, Clone)]
pub struct SurveyRow {
    /// Cleaned pair label
    pub pair: String,
    /// Largest absolute matrix entry of the block
    pub hopping: f64,
    /// Declared neighbor distance
    pub distance: f64,
}

/// Drops parenthesized site annotations and normalizes arrow spacing, so
/// `"Cr1 (000) <--> Se3 (011)"` becomes `"Cr1<-->Se3"`.
pub fn clean_pair_label(raw: &str) -> String {
    let stripped = SITE_ANNOTATION_RE.replace_all(raw, "");
    ARROW_SPACING_RE.replace_all(&stripped, "<-->").trim().to_string()
}

/// Walks all hopping blocks of a file.
///
/// A block is flushed when a new header, a blank line, or a lone `--`
/// separator is seen; headers with no matrix lines in between produce no
/// block.
pub fn parse_blocks(lines: &[&str]) -> Vec<SurveyBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<SurveyBlock> = None;
    let mut after_radius_vec = false;

    for line in lines {
        if let Some(caps) = SURVEY_HEADER_RE.captures(line) {
            if let Some(block) = current.take() {
                if !block.matrix_lines.is_empty() {
                    blocks.push(block);
                }
            }
            let radius = match normalize_fortran_exponent(&caps["radius"]).parse() {
                Ok(r) => r,
                Err(_) => continue,
            };
            current = Some(SurveyBlock {
                pair: clean_pair_label(caps["pair"].trim()),
                radius,
                matrix_lines: Vec::new(),
            });
            after_radius_vec = false;
            continue;
        }

        if current.is_none() {
            continue;
        }

        let trimmed = line.trim();
        if trimmed.to_lowercase().starts_with("radius vector is:") {
            after_radius_vec = true;
            continue;
        }
        if trimmed.is_empty() || trimmed == "--" {
            // A separator only ends a block that already has matrix lines;
            // blank lines between the radius vector and the first row keep
            // the block alive.
            let flush = current.as_ref().map_or(false, |b| !b.matrix_lines.is_empty());
            if flush {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
            }
            continue;
        }
        if after_radius_vec && scan_floats(line).is_some() {
            if let Some(block) = current.as_mut() {
                block.matrix_lines.push((*line).to_string());
            }
        }
    }

    if let Some(block) = current {
        if !block.matrix_lines.is_empty() {
            blocks.push(block);
        }
    }
    blocks
}

/// Largest absolute numeric value over a set of matrix lines.
pub fn max_abs_from_lines(lines: &[String]) -> f64 {
    lines
        .iter()
        .filter_map(|line| scan_floats(line))
        .flatten()
        .fold(0.0_f64, |m, v| m.max(v.abs()))
}

/// Groups survey rows by distance.
///
/// Rows are sorted ascending by distance; a new group starts only when the
/// gap to the previous distance exceeds `gap` (plus a fixed comparison
/// slack).
pub fn group_by_distance(mut rows: Vec<SurveyRow>, gap: f64) -> Vec<Vec<SurveyRow>> {
    rows.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let mut groups: Vec<Vec<SurveyRow>> = Vec::new();
    let mut last_distance: Option<f64> = None;
    for row in rows {
        let starts_new_group = match last_distance {
            Some(d) => row.distance - d > gap + DISTANCE_EPS,
            None => true,
        };
        last_distance = Some(row.distance);
        if starts_new_group {
            groups.push(Vec::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(row);
        }
    }
    groups
}

/// Surveys one file and renders the grouped report.
pub fn run_survey(path: &Path, gap: f64) -> Result<String, SurveyError> {
    let content = fs::read_to_string(path).map_err(|source| SurveyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let lines: Vec<&str> = content.lines().collect();
    let blocks = parse_blocks(&lines);
    info!("surveyed {} hopping blocks in {}", blocks.len(), path.display());

    let rows: Vec<SurveyRow> = blocks
        .iter()
        .map(|b| SurveyRow {
            pair: b.pair.clone(),
            hopping: max_abs_from_lines(&b.matrix_lines),
            distance: b.radius,
        })
        .collect();

    Ok(render_groups(&group_by_distance(rows, gap)))
}

fn render_groups(groups: &[Vec<SurveyRow>]) -> String {
    let mut out = String::new();
    for (gi, group) in groups.iter().enumerate() {
        let dmin = group.iter().map(|r| r.distance).fold(f64::INFINITY, f64::min);
        let dmax = group.iter().map(|r| r.distance).fold(f64::NEG_INFINITY, f64::max);
        out.push_str(&format!(
            "=== Distance group {}  [{:.6} .. {:.6}] ===\n",
            gi + 1,
            dmin,
            dmax
        ));
        out.push_str(&format!("{:<40}\t{:>12}\t{:>12}\n", "PAIR", "HOPPING", "DISTANCE"));

        let mut sorted: Vec<&SurveyRow> = group.iter().collect();
        sorted.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(b.hopping.total_cmp(&a.hopping))
        });
        for row in sorted {
            out.push_str(&format!(
                "{:<40}\t{:>12.6}\t{:>12.6}\n",
                row.pair, row.hopping, row.distance
            ));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_pair_label() {
        assert_eq!(clean_pair_label("Cr1 (000) <--> Se3 (011)"), "Cr1<-->Se3");
        assert_eq!(clean_pair_label("Cr1(000)<-->Cr2(000)"), "Cr1<-->Cr2");
    }

    #[test]
    fn test_parse_blocks_with_separators() {
        let lines = vec![
            "Hopping <a|H|b> between Cr1 (000) <--> Cr1 (000) in sphere # 0 with radius 0.0",
            "Radius vector is: 0.0 0.0 0.0",
            " 1.0 0.5",
            " 0.5 -3.0",
            "--",
            "Hopping <a|H|b> between Cr1 (000) <--> Se3 (001) in sphere # 1 with radius 2.5",
            "Radius vector is: 0.0 0.0 2.5",
            " 0.2 0.1",
            " 0.1 0.2",
        ];
        let blocks = parse_blocks(&lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].pair, "Cr1<-->Cr1");
        assert_eq!(blocks[0].matrix_lines.len(), 2);
        assert!((max_abs_from_lines(&blocks[0].matrix_lines) - 3.0).abs() < 1e-12);
        assert_eq!(blocks[1].pair, "Cr1<-->Se3");
        assert!((blocks[1].radius - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_back_to_back_headers_drop_empty_block() {
        let lines = vec![
            "Hopping <a|H|b> between Cr1 (000) <--> Cr1 (000) in sphere # 0 with radius 0.0",
            "Hopping <a|H|b> between Cr1 (000) <--> Cr2 (000) in sphere # 1 with radius 3.0",
            "Radius vector is: 3.0 0.0 0.0",
            " 0.7",
        ];
        let blocks = parse_blocks(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].pair, "Cr1<-->Cr2");
    }

    #[test]
    fn test_group_by_distance_gap() {
        let row = |d: f64| SurveyRow {
            pair: String::new(),
            hopping: 0.0,
            distance: d,
        };
        let groups = group_by_distance(vec![row(7.1), row(0.0), row(2.0), row(3.9), row(6.5)], 2.0);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(groups[1].len(), 2);
    }
}
