//! Component 4.L (ambient): CLI configuration, in the spirit of the
//! teacher's pre-workspace-split `Config::from_args`
//! (`examples/mewbak-Lancelot/src/lib.rs`), adapted to `clap`'s builder API
//! (SPEC_FULL.md Sec 4.K) instead of raw `env::Args`.

use std::path::PathBuf;

/// Parsed CLI configuration: `sb2dot <ops-file> <profile-file> [--out-dir
/// DIR] [-v...]` (spec.md Sec 6).
pub struct Config {
    pub ops_path: PathBuf,
    pub profile_path: PathBuf,
    pub out_dir: PathBuf,
    pub verbosity: u64,
}
