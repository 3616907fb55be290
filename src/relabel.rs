//! Atom-index relabeling and per-pair section extraction.
//!
//! Raw tight-binding output names sites generically (`atom  0`, `atom  1`,
//! ...), while the rest of this crate works with element-prefixed labels
//! (`Cr1`, `Se3`). Given an ordered element→count mapping such as
//! `Cr=8,Se=16`, this module rewrites the generic tokens in place: the first
//! mapping entry consumes the first block of global indices, the second the
//! next block, and so on, so `atom  0` through `atom  7` become `Cr1`..`Cr8`
//! and `atom  8` onwards become `Se1`..`Se16`.
//!
//! The replaced token includes the trailing separator (`atom  7 `), so
//! `atom  1 ` can never clobber the prefix of `atom  10 `.
//!
//! Optionally the relabeled output is split into per-element-pair excerpt
//! files (`hop.Cr-Se.dat`), each holding the matching header lines plus the
//! block lines after them, with `--` separators between non-adjacent
//! sections. The locator accepts those excerpts as-is.

use log::{info, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lines kept after each matching header when extracting pair sections
/// (radius vector plus the five rows of a d-block, and the trailing blank).
const EXTRACT_CONTEXT_LINES: usize = 7;

/// Error type for relabeling operations.
#[derive(Error, Debug)]
pub enum RelabelError {
    /// A file could not be read or written
    #[error("cannot access '{path}': {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The element-count specification is malformed
    #[error("invalid element spec '{0}': expected entries like Cr=8,Se=16")]
    BadElementSpec(String),
}

/// Parses an ordered element-count specification like `"Cr=8,Se=16"`.
///
/// Order matters: it determines which global index range each element
/// consumes.
pub fn parse_element_counts(spec: &str) -> Result<Vec<(String, usize)>, RelabelError> {
    let mut elements = Vec::new();
    for entry in spec.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (element, count) = entry
            .split_once('=')
            .ok_or_else(|| RelabelError::BadElementSpec(spec.to_string()))?;
        let element = element.trim();
        let count: usize = count
            .trim()
            .parse()
            .map_err(|_| RelabelError::BadElementSpec(spec.to_string()))?;
        if element.is_empty() || count == 0 {
            return Err(RelabelError::BadElementSpec(spec.to_string()));
        }
        elements.push((element.to_string(), count));
    }
    if elements.is_empty() {
        return Err(RelabelError::BadElementSpec(spec.to_string()));
    }
    Ok(elements)
}

/// Rewrites `atom  <k>` tokens into element-prefixed labels.
pub fn relabel_content(content: &str, elements: &[(String, usize)]) -> String {
    let mut result = content.to_string();
    let mut global_index = 0;
    for (element, count) in elements {
        for i in 0..*count {
            let generic = format!("atom  {} ", global_index);
            let labeled = format!("{}{} ", element, i + 1);
            result = result.replace(&generic, &labeled);
            global_index += 1;
        }
    }
    result
}

/// Extracts the sections whose header matches the `el1`/`el2` element pair.
///
/// Mirrors `grep -A7` output: each matching line plus the following
/// [`EXTRACT_CONTEXT_LINES`] lines, with a `--` separator between
/// non-adjacent sections. Returns an empty string when nothing matches.
pub fn extract_pair_section(content: &str, el1: &str, el2: &str) -> String {
    let pattern = format!(
        r"{}[0-9]+\s*\(000\)<-->{}[0-9]+",
        regex::escape(el1),
        regex::escape(el2)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return String::new(),
    };

    let lines: Vec<&str> = content.lines().collect();
    let mut out = String::new();
    // One past the last emitted line, or None before the first match.
    let mut emitted_to: Option<usize> = None;
    for (i, line) in lines.iter().enumerate() {
        if !re.is_match(line) {
            continue;
        }
        let end = (i + EXTRACT_CONTEXT_LINES + 1).min(lines.len());
        let start = match emitted_to {
            // Contiguous with the previous section: no separator.
            Some(prev) if i <= prev => prev,
            Some(_) => {
                out.push_str("--\n");
                i
            }
            None => i,
        };
        for l in &lines[start..end] {
            out.push_str(l);
            out.push('\n');
        }
        emitted_to = Some(end.max(emitted_to.unwrap_or(0)));
    }
    out
}

/// Relabels one file in place and optionally writes the per-pair excerpt
/// files next to it.
pub fn run_relabel(
    path: &Path,
    elements: &[(String, usize)],
    extract: bool,
) -> Result<(), RelabelError> {
    let content = fs::read_to_string(path).map_err(|source| RelabelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let relabeled = relabel_content(&content, elements);
    fs::write(path, &relabeled).map_err(|source| RelabelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("relabeled atom indices in {}", path.display());

    if !extract {
        return Ok(());
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    for (el1, _) in elements {
        for (el2, _) in elements {
            let section = extract_pair_section(&relabeled, el1, el2);
            let out_path = dir.join(format!("hop.{}-{}.dat", el1, el2));
            if section.is_empty() {
                warn!("no {}-{} hopping sections found", el1, el2);
            }
            fs::write(&out_path, section).map_err(|source| RelabelError::Io {
                path: out_path.clone(),
                source,
            })?;
        }
    }
    Ok(())
}
