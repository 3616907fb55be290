use cflevels::analysis::analyze_block;
use cflevels::config::LevelsConfig;
use cflevels::levels::{self, LevelsError};
use cflevels::locator::find_onsite_block;
use cflevels::pairing::pair_by_overlap;
use std::fs;
use std::path::PathBuf;

fn write_channel_file(name: &str, diag: &[f64]) -> PathBuf {
    let n = diag.len();
    let mut content = String::from(
        "Hopping <a|H|b> between Cr1 (000) <--> Cr1 (000) in sphere # 0 with radius 0.0000\n",
    );
    content.push_str("Radius vector is:  0.00000000  0.00000000  0.00000000\n");
    for i in 0..n {
        let row: Vec<String> = (0..n)
            .map(|j| format!("{:.6}", if i == j { diag[i] } else { 0.0 }))
            .collect();
        content.push_str(&format!("  {}\n", row.join("  ")));
    }
    let path = std::env::temp_dir().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_pipeline_pairs_reordered_levels() {
    // Up channel: orbital k sits at energy k+1. Down channel: the same
    // orbitals in reversed energy order. Pairing must match levels by
    // orbital content, so every averaged energy becomes 3.0.
    let up_path = write_channel_file("cflevels_up_test.dat", &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let down_path = write_channel_file("cflevels_down_test.dat", &[5.0, 4.0, 3.0, 2.0, 1.0]);

    let config = LevelsConfig {
        up_file: up_path.clone(),
        down_file: down_path.clone(),
        pair: "Cr1-Cr1".to_string(),
        ..LevelsConfig::default()
    };

    let report = levels::run(&config).unwrap();
    for i in 0..5 {
        assert!((report.up.energies[i] - (i + 1) as f64).abs() < 1e-10);
        assert!((report.down.energies[i] - (i + 1) as f64).abs() < 1e-10);
    }
    assert_eq!(report.pairing.assignment, vec![4, 3, 2, 1, 0]);
    assert!((report.pairing.score - 5.0).abs() < 1e-10);

    let rendered = levels::render(&report, &config);
    assert!(rendered.contains("=== up spin ==="));
    assert!(rendered.contains("=== down spin ==="));
    // Every combined level averages to (k + (6-k))/2 = 3.
    assert!(rendered.matches("3.000000").count() >= 5);

    fs::remove_file(&up_path).unwrap();
    fs::remove_file(&down_path).unwrap();
}

#[test]
fn test_identity_block_end_to_end() {
    let content = "Hopping <a|H|b> between Fe1 (000) <--> Fe1 (000) in sphere # 0 with radius 0.0000\n\
                   Radius vector is: 0.0 0.0 0.0\n 1.0 0.0\n 0.0 1.0\n";
    let lines: Vec<&str> = content.lines().collect();
    let matrix = find_onsite_block(&lines, "Fe1-Fe1").unwrap();
    assert_eq!(matrix.nrows(), 2);

    let basis = vec!["dxy".to_string(), "dyz".to_string()];
    let result = analyze_block(&matrix, &basis, true).unwrap();
    assert!((result.energies[0] - 1.0).abs() < 1e-12);
    assert!((result.energies[1] - 1.0).abs() < 1e-12);
    for level in 0..2 {
        let max_char = (0..2)
            .map(|orb| result.characters[(orb, level)])
            .fold(0.0_f64, f64::max);
        assert!((max_char - 1.0).abs() < 1e-12);
    }

    let pairing = pair_by_overlap(&result.eigenvectors, &result.eigenvectors).unwrap();
    assert_eq!(pairing.assignment, vec![0, 1]);
}

#[test]
fn test_missing_file_is_io_error() {
    let config = LevelsConfig {
        up_file: PathBuf::from("cflevels_no_such_file.dat"),
        pair: "Cr1-Cr1".to_string(),
        ..LevelsConfig::default()
    };
    assert!(matches!(levels::run(&config), Err(LevelsError::Io { .. })));
}

#[test]
fn test_absent_block_is_reported_with_pair_and_file() {
    let up_path = write_channel_file("cflevels_wrong_pair_test.dat", &[1.0; 5]);
    let config = LevelsConfig {
        up_file: up_path.clone(),
        down_file: up_path.clone(),
        pair: "Ni1-Ni1".to_string(),
        ..LevelsConfig::default()
    };
    match levels::run(&config) {
        Err(LevelsError::BlockNotFound { pair, path }) => {
            assert_eq!(pair, "Ni1-Ni1");
            assert_eq!(path, up_path);
        }
        other => panic!("expected BlockNotFound, got {:?}", other),
    }
    fs::remove_file(&up_path).unwrap();
}

#[test]
fn test_wrong_basis_count_fails_before_reading_files() {
    let config = LevelsConfig {
        pair: "Cr1-Cr1".to_string(),
        basis: vec!["dxy".to_string()],
        up_file: PathBuf::from("cflevels_never_read.dat"),
        down_file: PathBuf::from("cflevels_never_read.dat"),
        ..LevelsConfig::default()
    };
    assert!(matches!(levels::run(&config), Err(LevelsError::Config(_))));
}
