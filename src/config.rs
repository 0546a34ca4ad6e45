use chrono::{FixedOffset, Offset, Utc};

/// Largest UTC offset a real time zone uses, in minutes
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub file_logs: bool,
    pub log_dir: String,
    /// Where midnight falls for streak calendar days
    pub utc_offset_minutes: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            file_logs: false,
            log_dir: "./logs".to_string(),
            utc_offset_minutes: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let log_level = lookup("RUST_LOG").unwrap_or(defaults.log_level);

        let file_logs = lookup("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.file_logs);

        let log_dir = lookup("LOG_DIR").unwrap_or(defaults.log_dir);

        let utc_offset_minutes = lookup("PROGRESS_UTC_OFFSET_MINUTES")
            .and_then(|value| value.trim().parse::<i32>().ok())
            .filter(|minutes| minutes.abs() <= MAX_UTC_OFFSET_MINUTES)
            .unwrap_or(defaults.utc_offset_minutes);

        Self {
            log_level,
            file_logs,
            log_dir,
            utc_offset_minutes,
        }
    }

    pub fn day_offset(&self) -> FixedOffset {
        let minutes = self
            .utc_offset_minutes
            .clamp(-MAX_UTC_OFFSET_MINUTES, MAX_UTC_OFFSET_MINUTES);
        FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
