use log::{Level, LevelFilter};
use env_logger::{Builder, Env, fmt::Color};
use std::io::Write;

/// Thin wrapper around `env_logger`. Verbosity is driven by the number of
/// `-v` occurrences on the command line, and may be overriden at runtime
/// through the `HAPLD_LOG` environment variable.
pub struct Logger;

impl Logger {

    /// Build and register the global logger.
    ///
    /// # Panics
    /// If a global logger was already set (i.e. `init` was called twice).
    pub fn init(verbosity: u8) {
        let env = Env::default().filter("HAPLD_LOG");
        Builder::new()
            .filter_level(Self::u8_to_loglevel(verbosity))
            .format(|buf, record| {
                // Errors carry a traceback to their emission site.
                let traceback = match record.level() {
                    Level::Error => format!(
                        "(@ {}:{}) ",
                        record.file().unwrap_or("unknown"),
                        record.line().unwrap_or(0)
                    ),
                    _ => String::new(),
                };

                let mut level_style = buf.style();
                level_style.set_bold(true).set_color(match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn  => Color::Yellow,
                    Level::Info  => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan,
                });

                writeln!(
                    buf,
                    "[{} {: <5} {}] {traceback}{}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    level_style.value(record.level()),
                    record.target(),
                    record.args()
                )
            })
            .parse_env(env)
            .init();
    }

    fn u8_to_loglevel(verbosity: u8) -> LevelFilter {
        match verbosity {
            0           => LevelFilter::Error,
            1           => LevelFilter::Warn,
            2           => LevelFilter::Info,
            3           => LevelFilter::Debug,
            4..=u8::MAX => LevelFilter::Trace,
        }
    }

    /// Reassign the maximum log level after initialization.
    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::u8_to_loglevel(verbosity));
    }
}
