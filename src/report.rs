//! Tabular text reports for per-spin and spin-averaged level listings.
//!
//! Output is a transient human-readable report; nothing here is meant to be
//! machine-parsed. Column widths are computed from the rendered cells so the
//! tables stay aligned for any basis labels and decimal settings.

use crate::analysis::AnalysisResult;
use crate::pairing::Pairing;

/// Builds the per-spin table for one channel, preceded by the
/// symmetry diagnostics line.
///
/// Each row lists the 1-based level index, the level energy, the percentage
/// contribution of every basis orbital (entries below `pct_threshold` are
/// shown as 0.0), and a short description of the dominant orbitals.
pub fn per_spin_table(
    spin_label: &str,
    result: &AnalysisResult,
    pct_threshold: f64,
    decimals: usize,
) -> String {
    let headers = table_headers(&result.basis, pct_threshold);
    let n = result.energies.len();
    let mut rows = Vec::with_capacity(n);
    for level in 0..n {
        let perc: Vec<f64> = (0..result.basis.len())
            .map(|orb| 100.0 * result.characters[(orb, level)])
            .collect();
        rows.push(level_row(level, result.energies[level], &perc, &result.basis, pct_threshold, decimals));
    }

    let mut out = String::new();
    out.push_str(&format!("\n=== {} spin ===\n", spin_label));
    out.push_str(&format!(
        "Max |off-diagonal| = {:.3e} ; max |H - H^T| = {:.3e}\n",
        result.max_offdiag, result.max_antisym
    ));
    out.push_str(&render_table(&headers, &rows));
    out
}

/// Builds the combined table over overlap-paired states.
///
/// For each pair the energy is the mean of the two channel energies and the
/// orbital percentages are the mean of the two channel percentage vectors.
pub fn combined_table(
    res_up: &AnalysisResult,
    res_dn: &AnalysisResult,
    pairing: &Pairing,
    pct_threshold: f64,
    decimals: usize,
) -> String {
    let basis = &res_up.basis;
    let headers = table_headers(basis, pct_threshold);
    let mut rows = Vec::with_capacity(pairing.assignment.len());
    for (i_up, &j_dn) in pairing.assignment.iter().enumerate() {
        let energy = 0.5 * (res_up.energies[i_up] + res_dn.energies[j_dn]);
        let perc: Vec<f64> = (0..basis.len())
            .map(|orb| {
                50.0 * (res_up.characters[(orb, i_up)] + res_dn.characters[(orb, j_dn)])
            })
            .collect();
        rows.push(level_row(i_up, energy, &perc, basis, pct_threshold, decimals));
    }

    let mut out = String::new();
    out.push_str("\n=== Combined (spin-averaged over overlap-paired states) ===\n");
    out.push_str(&render_table(&headers, &rows));
    out.push_str(
        "Note: Energy = (E_up+E_dn)/2 ; characters = average of up/down percentages for the paired states.\n",
    );
    out
}

/// Describes the orbitals contributing at least `thr` percent to one level,
/// falling back to the single largest contributor when none reach the
/// threshold.
pub fn dominant_desc(basis: &[String], perc: &[f64], thr: f64) -> String {
    let mut picked: Vec<usize> = (0..perc.len()).filter(|&j| perc[j] >= thr).collect();
    if picked.is_empty() {
        let mut argmax = 0;
        for j in 1..perc.len() {
            if perc[j] > perc[argmax] {
                argmax = j;
            }
        }
        picked.push(argmax);
    }
    picked
        .iter()
        .map(|&j| format!("{}~{:.1}%", basis[j], perc[j]))
        .collect::<Vec<_>>()
        .join(", ")
}

fn table_headers(basis: &[String], pct_threshold: f64) -> Vec<String> {
    let mut headers = vec!["Level".to_string(), "Energy (eV)".to_string()];
    headers.extend(basis.iter().map(|b| format!("{} (%)", b)));
    headers.push(format!("Dominant (>={}%)", pct_threshold as i64));
    headers
}

fn level_row(
    level: usize,
    energy: f64,
    perc: &[f64],
    basis: &[String],
    pct_threshold: f64,
    decimals: usize,
) -> Vec<String> {
    let mut row = vec![
        format!("{}", level + 1),
        format!("{:.*}", decimals, energy),
    ];
    for &p in perc {
        if p >= pct_threshold {
            row.push(format!("{:.1}", p));
        } else {
            row.push("0.0".to_string());
        }
    }
    row.push(dominant_desc(basis, perc, pct_threshold));
    row
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }
    let line = "-".repeat(widths.iter().sum::<usize>() + 3 * (widths.len().saturating_sub(1)));

    let mut out = String::new();
    out.push_str(&line);
    out.push('\n');
    out.push_str(&format_row(headers, &widths));
    out.push('\n');
    out.push_str(&line);
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row, &widths));
        out.push('\n');
    }
    out.push_str(&line);
    out.push('\n');
    out
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = w))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_block;
    use crate::pairing::pair_by_overlap;
    use nalgebra::DMatrix;

    fn two_level_result() -> AnalysisResult {
        let h = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);
        let basis = vec!["dxy".to_string(), "dyz".to_string()];
        analyze_block(&h, &basis, true).unwrap()
    }

    #[test]
    fn test_dominant_desc_threshold_and_fallback() {
        let basis = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let desc = dominant_desc(&basis, &[60.0, 35.0, 5.0], 10.0);
        assert_eq!(desc, "a~60.0%, b~35.0%");
        // Nothing reaches the threshold: report the single largest.
        let desc = dominant_desc(&basis, &[4.0, 3.0, 2.0], 10.0);
        assert_eq!(desc, "a~4.0%");
    }

    #[test]
    fn test_per_spin_table_contents() {
        let result = two_level_result();
        let table = per_spin_table("up", &result, 10.0, 4);
        assert!(table.contains("=== up spin ==="));
        assert!(table.contains("1.0000"));
        assert!(table.contains("2.0000"));
        assert!(table.contains("dxy (%)"));
        assert!(table.contains("dxy~100.0%"));
    }

    #[test]
    fn test_combined_table_averages_energies() {
        let result = two_level_result();
        let pairing = pair_by_overlap(&result.eigenvectors, &result.eigenvectors).unwrap();
        let table = combined_table(&result, &result, &pairing, 10.0, 4);
        // up == down, so the averaged energies equal the per-spin ones.
        assert!(table.contains("1.0000"));
        assert!(table.contains("2.0000"));
        assert!(table.contains("Combined"));
    }
}
