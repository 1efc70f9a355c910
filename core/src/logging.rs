//! Component 4.I (ambient): logging setup. Mirrors the teacher's
//! `fern`/`chrono` pairing (see `examples/mewbak-Lancelot/core/src/test.rs`'s
//! `init_logging`), generalized from a fixed debug level to a CLI
//! verbosity knob.

use log::LevelFilter;

/// `0` = Info, `1` = Debug, `2+` = Trace -- the common `-v`/`-vv` CLI
/// convention (SPEC_FULL.md Sec 4.K).
pub fn init(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{:5}] {} {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                if level == LevelFilter::Trace { record.target() } else { "" },
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .expect("failed to configure logging");
}
