//! CLI wiring (SPEC_FULL.md Sec 4.K): argument parsing, logging setup,
//! file I/O, and driving the library end to end. Everything non-trivial
//! lives in `sb2dot`'s library modules; `main` itself only wires them
//! together, matching the teacher's `run(args: &Config) -> Result<(), Error>`
//! split between `main.rs`-style wiring and `lib.rs` logic.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{App, Arg};
use failure::Error;
use log::{error, info};

use sb2dot::config::Config;
use sb2dot::{dot, opnames, profile};

fn parse_args() -> Config {
    let matches = App::new("sb2dot")
        .version("0.1.0")
        .author("Willi Ballenthin <wilbal1087@gmail.com>")
        .about("decodes a compiled sandbox profile into per-operation decision graphs")
        .arg(
            Arg::with_name("ops-file")
                .help("path to the operation-names text file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("profile-file")
                .help("path to the compiled binary sandbox profile")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("out-dir")
                .long("out-dir")
                .takes_value(true)
                .help("directory to write .dot files into (default: current directory)"),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("increase logging verbosity (-v, -vv)"),
        )
        .get_matches();

    let expand = |s: &str| shellexpand::tilde(s).into_owned();

    Config {
        ops_path: PathBuf::from(expand(matches.value_of("ops-file").unwrap())),
        profile_path: PathBuf::from(expand(matches.value_of("profile-file").unwrap())),
        out_dir: PathBuf::from(expand(matches.value_of("out-dir").unwrap_or("."))),
        verbosity: matches.occurrences_of("v"),
    }
}

fn run(config: &Config) -> Result<(), Error> {
    let op_names = opnames::load(&config.ops_path)?;
    info!("loaded {} operation names", op_names.len());

    let blob = fs::read(&config.profile_path)?;
    let display_name = config
        .profile_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.profile_path.to_string_lossy().into_owned());

    let profiles = profile::decode(&blob, &op_names, &display_name)?;

    fs::create_dir_all(&config.out_dir)?;
    for p in &profiles {
        for group in &p.groups {
            let path = dot::write(&p.graph, &p.name, group, &config.out_dir)?;
            info!("generating {}", path.display());
        }
    }

    Ok(())
}

fn main() {
    better_panic::install();
    let config = parse_args();
    sb2dot::logging::init(config.verbosity);

    if let Err(e) = run(&config) {
        error!("{}", e);
        process::exit(1);
    }
}
