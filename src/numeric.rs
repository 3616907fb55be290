//! Numeric token scanning for tight-binding output lines.
//!
//! Hopping listings produced by legacy Fortran codes mix plain decimals,
//! exponential notation, and Fortran double-precision exponent markers
//! (`1.5D-03`) on the same line, with irregular column widths. This module
//! isolates all of that behind two functions so that format quirks never
//! reach the linear-algebra layer:
//!
//! - [`normalize_fortran_exponent`]: rewrites `D`/`d` exponent markers to `E`
//! - [`scan_floats`]: extracts every floating-point token from one line
//!
//! Both are pure functions with no side effects.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Shared floating-point sub-pattern: 1.23, -0.032, .5, 7, 1.2e-4, 3.1D+02.
    /// Bare integers are accepted because sphere indices and integer-valued
    /// matrix entries appear without a decimal point in some outputs.
    pub(crate) static ref FLOAT_PATTERN: String =
        r"[-+]?(?:\d+\.\d*|\.\d+|\d+)(?:[eEdD][-+]?\d+)?".to_string();

    static ref FLOAT_RE: Regex = Regex::new(&FLOAT_PATTERN).unwrap();
}

/// Rewrites Fortran double-precision exponent markers (`D`/`d`) to `E` so the
/// token can be handled by the standard float parser.
///
/// # Examples
///
/// ```
/// use cflevels::numeric::normalize_fortran_exponent;
///
/// assert_eq!(normalize_fortran_exponent("1.5D-03"), "1.5E-03");
/// assert_eq!(normalize_fortran_exponent("-2.0d+01"), "-2.0E+01");
/// assert_eq!(normalize_fortran_exponent("0.25"), "0.25");
/// ```
pub fn normalize_fortran_exponent(token: &str) -> String {
    token.replace(['D', 'd'], "E")
}

/// Extracts the ordered sequence of floating-point values contained in one
/// line of text.
///
/// Returns `None` if the line contains no numeric tokens, or if any token
/// fails to convert after exponent normalization. A single bad token rejects
/// the whole line: a matrix row with a corrupted entry must never be accepted
/// with the remaining entries silently shifted into the wrong columns.
///
/// # Examples
///
/// ```
/// use cflevels::numeric::scan_floats;
///
/// let row = scan_floats("  0.1250  -0.0032  1.5D-03").unwrap();
/// assert_eq!(row.len(), 3);
/// assert!((row[2] - 1.5e-3).abs() < 1e-12);
///
/// assert!(scan_floats("no numbers here").is_none());
/// ```
pub fn scan_floats(line: &str) -> Option<Vec<f64>> {
    let mut values = Vec::new();
    for token in FLOAT_RE.find_iter(line.trim()) {
        match normalize_fortran_exponent(token.as_str()).parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) => return None,
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
