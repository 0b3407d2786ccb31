//! Logging setup and log file maintenance.

mod logging;

pub use logging::{remove_log_files, setup_logging, LogFile};
