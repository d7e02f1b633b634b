use std::io::Write;

use env_logger::{Builder, Target, fmt::Formatter};
use log::{Level, LevelFilter};

/// Installs a compact, level-tagged logger on stderr. `RUST_LOG` still takes precedence
/// over `level` if it is set. Calling this twice is harmless; the second call is ignored.
pub fn build_logger_for_level(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .write_style(env_logger::WriteStyle::Never)
        .format(|buf: &mut Formatter, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                buf.timestamp_millis(),
                level_tag(record.level()),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    let _ = builder.try_init();
}

/// Like [`build_logger_for_level`] but raises `default` by one level per `-v`.
pub fn build_logger_for_verbosity(default: LevelFilter, verbosity: usize) {
    let levels = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];

    let start = levels.iter().position(|&l| l == default).unwrap_or(2);
    let level = levels[(start + verbosity).min(levels.len() - 1)];
    build_logger_for_level(level);
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
