use log::{set_boxed_logger, set_max_level, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{stdout, Write};
use std::thread;

/// Plain `println!`/`eprintln!` logger, no external backend. Mirrors the
/// teacher's `CliLogger` minus the progress-bar machinery: this tool runs
/// once and prints a result, it never has a long-lived download to show
/// progress for.
pub struct CliLogger {
    all: bool,
    level: LevelFilter,
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) || (!self.all && !record.target().starts_with("fmtsel")) {
            return;
        }

        if self.level >= LevelFilter::Debug {
            self.extended(record);
        } else if record.level() > Level::Warn {
            self.normal(record);
        } else {
            self.error(record);
        }
    }

    fn flush(&self) {
        let _ = stdout().flush();
    }
}

impl CliLogger {
    pub fn new(all: bool, level: LevelFilter) -> Self {
        Self { all, level }
    }

    pub fn init(all: bool, level: LevelFilter) -> Result<(), SetLoggerError> {
        set_max_level(level);
        set_boxed_logger(Box::new(CliLogger::new(all, level)))
    }

    fn extended(&self, record: &Record) {
        println!(
            "[{}] {} ({}) {}",
            record.level(),
            record.target(),
            format!("{:?}", thread::current().id())
                .replace("ThreadId(", "")
                .replace(')', ""),
            record.args()
        )
    }

    fn normal(&self, record: &Record) {
        println!(":: {}", record.args())
    }

    fn error(&self, record: &Record) {
        eprintln!(":: {}", record.args())
    }
}
