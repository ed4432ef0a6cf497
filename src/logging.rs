//! Structured logging module for Bio-Next
//!
//! Writes logs to a per-day file (BIONEXT_LOG_DIR, default ./logs) with
//! categories:
//! - SESSION: Session lifecycle
//! - RELAY: Outbound completion calls
//! - DETECTOR: Analysis-need classification
//! - PROJECT: Auto-created project records
//! - ERROR: Errors and failed round trips

use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Log categories for structured logging
#[derive(Debug, Clone, Copy)]
pub enum LogCategory {
    Session,  // Session lifecycle (start, clear)
    Relay,    // Outbound completion calls
    Detector, // Analysis-need classification results
    Project,  // Project auto-creation
    Error,    // Errors and failed round trips
}

impl LogCategory {
    fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Session => "SESSION",
            LogCategory::Relay => "RELAY",
            LogCategory::Detector => "DETECTOR",
            LogCategory::Project => "PROJECT",
            LogCategory::Error => "ERROR",
        }
    }
}

/// Global log file handle
static LOG_FILE: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

/// Get the log directory path
fn get_log_dir() -> PathBuf {
    std::env::var("BIONEXT_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

/// Get today's log file path
fn get_log_file_path() -> PathBuf {
    let today = Local::now().format("%Y-%m-%d").to_string();
    get_log_dir().join(format!("bionext-{}.log", today))
}

/// Initialize the logging system - creates log directory if needed
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = get_log_dir();

    // Create log directory if it doesn't exist
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)?;
    }

    // Store the current log file path
    let log_path = get_log_file_path();
    *LOG_FILE.lock().unwrap() = Some(log_path);

    // Log startup
    log(LogCategory::Session, None, "Bio-Next logging initialized");

    Ok(())
}

/// Build the per-line session prefix. Session ids arrive from clients and
/// may be arbitrary UTF-8, so truncation counts chars, not bytes.
fn session_context(session_id: Option<&str>) -> String {
    session_id
        .map(|id| format!("session={} | ", id.chars().take(8).collect::<String>()))
        .unwrap_or_default()
}

/// Log a message with category and optional session context
pub fn log(category: LogCategory, session_id: Option<&str>, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let session_context = session_context(session_id);

    let log_line = format!(
        "[{}] [{}] {}{}\n",
        timestamp,
        category.as_str(),
        session_context,
        message
    );

    // Always print to console (for dev)
    print!("{}", log_line);

    // Write to file
    let log_path = get_log_file_path();
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(log_line.as_bytes());
    }
}

/// Log a session lifecycle event
pub fn log_session(session_id: Option<&str>, message: &str) {
    log(LogCategory::Session, session_id, message);
}

/// Log an outbound relay call event
pub fn log_relay(session_id: Option<&str>, message: &str) {
    log(LogCategory::Relay, session_id, message);
}

/// Log an analysis-detection event
pub fn log_detector(session_id: Option<&str>, message: &str) {
    log(LogCategory::Detector, session_id, message);
}

/// Log a project creation event
pub fn log_project(session_id: Option<&str>, message: &str) {
    log(LogCategory::Project, session_id, message);
}

/// Log an error
pub fn log_error(session_id: Option<&str>, message: &str) {
    log(LogCategory::Error, session_id, message);
}

/// Clean up old log files (keep last 7 days)
pub fn cleanup_old_logs() -> Result<usize, Box<dyn std::error::Error>> {
    let log_dir = get_log_dir();
    let mut deleted = 0;

    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - chrono::Duration::days(7);

    for entry in fs::read_dir(&log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                let modified_time: chrono::DateTime<Utc> = modified.into();
                if modified_time < cutoff {
                    if fs::remove_file(&path).is_ok() {
                        deleted += 1;
                    }
                }
            }
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_context_truncates_long_ids() {
        let context = session_context(Some("0a1b2c3d-4e5f-6789"));
        assert_eq!(context, "session=0a1b2c3d | ");
    }

    #[test]
    fn test_session_context_handles_multibyte_ids() {
        // Client-supplied ids may be arbitrary UTF-8; truncation must not
        // land inside a multi-byte char.
        let context = session_context(Some("日本語セッション識別子"));
        assert_eq!(context, "session=日本語セッション識 | ");
    }

    #[test]
    fn test_session_context_keeps_short_ids_whole() {
        assert_eq!(session_context(Some("s-1")), "session=s-1 | ");
        assert_eq!(session_context(None), "");
    }

    #[test]
    fn test_log_with_multibyte_session_id_does_not_panic() {
        log(LogCategory::Session, Some("日本語セッション"), "hello");
    }
}
