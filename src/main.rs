//! cflevels command-line interface.
//!
//! Three commands cover the workflow from raw tight-binding output to the
//! spin-averaged level report:
//!
//! 1. **Relabeling** (`cflevels relabel out.dat --elements Cr=8,Se=16`):
//!    rewrites generic `atom  <k>` tokens into element-prefixed labels, and
//!    with `--extract` also writes per-element-pair excerpt files.
//!
//! 2. **Survey** (`cflevels survey out.dat [--gap G]`): lists every hopping
//!    block grouped by neighbor distance, largest matrix entry first, to
//!    help choose which pairs are worth analyzing.
//!
//! 3. **Levels** (`cflevels levels --pair Cr1-Cr1 [--up F] [--down F] ...`):
//!    the main pipeline — locates the on-site block in both spin files,
//!    diagonalizes, and prints the per-spin and combined tables.
//!
//! Exit status is nonzero when an input file is missing, the basis does not
//! have exactly five labels, or the on-site block cannot be located in
//! either spin file.

use cflevels::config::{parse_basis_spec, LevelsConfig};
use cflevels::relabel;
use cflevels::settings::Settings;
use cflevels::{levels, survey};
use std::env;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    // Initialize console logger for all commands
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stdout)
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    if args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(0);
    }

    let settings = Settings::load();
    let command = &args[1];

    match command.as_str() {
        "levels" => run_levels(&args[0], &args[2..], &settings),
        "relabel" => run_relabel(&args[0], &args[2..]),
        "survey" => run_survey(&args[0], &args[2..], &settings),
        _ => {
            eprintln!("Error: Unknown command: {}", command);
            print_usage(&args[0]);
            process::exit(1);
        }
    }
}

fn run_levels(program: &str, args: &[String], settings: &Settings) {
    let mut config = LevelsConfig {
        up_file: PathBuf::from(&settings.up_file),
        down_file: PathBuf::from(&settings.down_file),
        basis: parse_basis_spec(&settings.basis),
        decimals: settings.decimals,
        dominant_threshold: settings.dominant_threshold,
        ..LevelsConfig::default()
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--up" => config.up_file = PathBuf::from(required_value(program, &mut iter, "--up")),
            "--down" => {
                config.down_file = PathBuf::from(required_value(program, &mut iter, "--down"))
            }
            "--pair" => config.pair = required_value(program, &mut iter, "--pair"),
            "--basis" => {
                config.basis = parse_basis_spec(&required_value(program, &mut iter, "--basis"))
            }
            "--no-sym" => config.symmetrize = false,
            "--decimals" => {
                config.decimals = parse_flag_value(program, &required_value(program, &mut iter, "--decimals"), "--decimals")
            }
            "--dom-thr" => {
                config.dominant_threshold = parse_flag_value(program, &required_value(program, &mut iter, "--dom-thr"), "--dom-thr")
            }
            other => unknown_flag(program, other),
        }
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    for path in [&config.up_file, &config.down_file] {
        if !path.is_file() {
            eprintln!("Error: {} not found", path.display());
            process::exit(1);
        }
    }

    match levels::run(&config) {
        Ok(report) => print!("{}", levels::render(&report, &config)),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_relabel(program: &str, args: &[String]) {
    let mut file: Option<PathBuf> = None;
    let mut elements_spec: Option<String> = None;
    let mut extract = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--elements" => elements_spec = Some(required_value(program, &mut iter, "--elements")),
            "--extract" => extract = true,
            other if !other.starts_with('-') && file.is_none() => {
                file = Some(PathBuf::from(other))
            }
            other => unknown_flag(program, other),
        }
    }

    let Some(file) = file else {
        eprintln!("Error: Missing file argument");
        eprintln!("Usage: {} relabel <file> --elements Cr=8,Se=16 [--extract]", program);
        process::exit(1);
    };
    let Some(elements_spec) = elements_spec else {
        eprintln!("Error: Missing --elements specification");
        process::exit(1);
    };

    let elements = match relabel::parse_element_counts(&elements_spec) {
        Ok(elements) => elements,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if !file.is_file() {
        eprintln!("Error: {} not found", file.display());
        process::exit(1);
    }

    match relabel::run_relabel(&file, &elements, extract) {
        Ok(()) => println!("Processing of '{}' completed successfully.", file.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_survey(program: &str, args: &[String], settings: &Settings) {
    let mut file: Option<PathBuf> = None;
    let mut gap = settings.survey_gap;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--gap" => gap = parse_flag_value(program, &required_value(program, &mut iter, "--gap"), "--gap"),
            other if !other.starts_with('-') && file.is_none() => {
                file = Some(PathBuf::from(other))
            }
            other => unknown_flag(program, other),
        }
    }

    let Some(file) = file else {
        eprintln!("Error: Missing file argument");
        eprintln!("Usage: {} survey <file> [--gap G]", program);
        process::exit(1);
    };
    if !file.is_file() {
        eprintln!("Error: {} not found", file.display());
        process::exit(1);
    }

    match survey::run_survey(Path::new(&file), gap) {
        Ok(report) => print!("{}", report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Consumes the value following a flag, or exits with a usage error.
fn required_value(program: &str, iter: &mut std::slice::Iter<'_, String>, flag: &str) -> String {
    match iter.next() {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires a value", flag);
            print_usage(program);
            process::exit(1);
        }
    }
}

/// Parses a flag value, or exits with a usage error.
fn parse_flag_value<T: std::str::FromStr>(program: &str, value: &str, flag: &str) -> T {
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("Error: Invalid value '{}' for {}", value, flag);
            print_usage(program);
            process::exit(1);
        }
    }
}

fn unknown_flag(program: &str, flag: &str) -> ! {
    eprintln!("Error: Unknown argument: {}", flag);
    print_usage(program);
    process::exit(1);
}

fn print_usage(program: &str) {
    println!("cflevels - on-site crystal-field levels from tight-binding hopping output");
    println!();
    println!("Usage:");
    println!("  {} levels --pair A-B [options]     Analyze the on-site block of an atom pair", program);
    println!("  {} relabel <file> --elements SPEC  Rewrite 'atom  N' tokens to element labels", program);
    println!("  {} survey <file> [--gap G]         List hopping blocks grouped by distance", program);
    println!();
    println!("Options for 'levels':");
    println!("  --up <file>        Spin-up file (default: out1.dat)");
    println!("  --down <file>      Spin-down file (default: out2.dat)");
    println!("  --pair <A-B>       Atom pair like \"Cr1-Cr1\" (required)");
    println!("  --basis <labels>   5 labels for the d-block order (default: dz2,dxz,dyz,dx2,dxy)");
    println!("  --no-sym           Disable (H+H^T)/2 symmetrization");
    println!("  --decimals <n>     Energy decimal places (default: 6)");
    println!("  --dom-thr <p>      Dominant-character threshold in percent (default: 10)");
    println!();
    println!("Options for 'relabel':");
    println!("  --elements <SPEC>  Ordered element counts like Cr=8,Se=16 (required)");
    println!("  --extract          Also write per-pair excerpt files (hop.E1-E2.dat)");
    println!();
    println!("Defaults can be overridden in cflevels.cfg; see the settings module docs.");
}
