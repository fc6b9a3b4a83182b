use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes every record to stderr behind a coloured level tag.
#[derive(Debug)]
pub struct StderrLogger {
    level: LevelFilter,
}

static LOGGER: once_cell::sync::OnceCell<StderrLogger> = once_cell::sync::OnceCell::new();

impl StderrLogger {
    /// Maps the number of `-v` flags onto a level: none shows warnings only,
    /// each flag after that reveals one more level.
    pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Installs the logger globally. Later calls only adjust the max level.
    pub fn install(level: LevelFilter) {
        let logger = LOGGER.get_or_init(|| StderrLogger { level });

        // Fails only if a logger is already installed, which is fine
        let _ = log::set_logger(logger);
        log::set_max_level(level);
    }

    fn tag(level: Level) -> colored::ColoredString {
        match level {
            Level::Error => "error".red().bold(),
            Level::Warn => "warning".yellow().bold(),
            Level::Info => "info".green(),
            Level::Debug => "debug".blue(),
            Level::Trace => "trace".dimmed(),
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!(
            "{}{} {}",
            Self::tag(record.level()),
            format!("[{}]", record.target()).dimmed(),
            record.args()
        );
    }

    fn flush(&self) {}
}
