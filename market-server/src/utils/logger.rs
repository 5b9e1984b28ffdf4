//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the filter is built from the
//! configured level. With a log directory the output goes to a daily
//! rolling file instead of stdout; `json` switches to one JSON object per
//! line.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger with optional file output
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>, json: bool) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if (log_path.exists() || std::fs::create_dir_all(log_path).is_ok())
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "market-server");
            let subscriber = subscriber.with_ansi(false).with_writer(file_appender);
            // try_init: tests may install a subscriber more than once
            if json {
                let _ = subscriber.json().try_init();
            } else {
                let _ = subscriber.try_init();
            }
            return;
        }
    }

    if json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

fn default_filter(level: &str) -> String {
    format!("market_server={level},tower_http={level}")
}
