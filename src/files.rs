//! File attachment descriptors and validation.
//!
//! Only metadata crosses this boundary: the model sees a textual manifest of
//! name and size, never the bytes. Durable upload storage is an external
//! collaborator's concern.

use serde::{Deserialize, Serialize};

use crate::config::Config;

const BYTES_PER_UNIT: f64 = 1024.0;
const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Metadata for a user-attached file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}

/// Format a byte count as a human-readable size ("1.5 MB").
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / BYTES_PER_UNIT.ln()).floor() as usize;
    let exponent = exponent.min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / BYTES_PER_UNIT.powi(exponent as i32);

    // Two decimals with trailing zeros dropped: "1.5 KB", not "1.50 KB".
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", trimmed, SIZE_UNITS[exponent])
}

/// Extension of a filename including the leading dot, or "" when there is none.
pub fn file_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(index) => &filename[index..],
        None => "",
    }
}

/// Check an attachment against the configured size limit and extension
/// allow-list. Returns a user-facing description of the problem on failure.
pub fn validate_attachment(file: &FileAttachment, config: &Config) -> Result<(), String> {
    if file.size > config.max_file_size {
        return Err(format!(
            "File size exceeds the limit ({})",
            format_file_size(config.max_file_size)
        ));
    }

    if config.allowed_extensions.iter().any(|ext| ext == "*") {
        return Ok(());
    }

    let extension = file_extension(&file.name).to_lowercase();
    if !config.allowed_extensions.contains(&extension) {
        return Err(format!(
            "Unsupported file type: {}. Supported types: {}",
            file_extension(&file.name),
            config.allowed_extensions.join(", ")
        ));
    }

    Ok(())
}

/// Summarize attachments for the prompt: `"<name> (<size> MB)"`, comma-joined,
/// with the size in megabytes formatted to two decimals.
pub fn format_manifest(files: &[FileAttachment]) -> String {
    files
        .iter()
        .map(|file| {
            format!(
                "{} ({:.2} MB)",
                file.name,
                file.size as f64 / (BYTES_PER_UNIT * BYTES_PER_UNIT)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(allowed: &[&str]) -> Config {
        Config {
            api_base_url: "http://localhost".to_string(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            request_timeout: Duration::from_secs(30),
            max_file_size: 1024 * 1024, // 1 MB for tests
            allowed_extensions: allowed.iter().map(|s| s.to_string()).collect(),
            environment: "development".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(104_857_600), "100 MB");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("reads.fastq"), ".fastq");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
    }

    #[test]
    fn test_validate_rejects_oversized_file() {
        let config = test_config(&["*"]);
        let file = FileAttachment::new("huge.bam", 2 * 1024 * 1024, "application/octet-stream");

        let error = validate_attachment(&file, &config).unwrap_err();
        assert!(error.contains("exceeds the limit"));
        assert!(error.contains("1 MB"));
    }

    #[test]
    fn test_validate_extension_allow_list() {
        let config = test_config(&[".csv", ".vcf"]);

        let allowed = FileAttachment::new("variants.VCF", 100, "text/plain");
        assert!(validate_attachment(&allowed, &config).is_ok());

        let rejected = FileAttachment::new("notes.docx", 100, "application/msword");
        assert!(validate_attachment(&rejected, &config)
            .unwrap_err()
            .contains("Unsupported file type"));
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let config = test_config(&["*"]);
        let file = FileAttachment::new("anything.xyz", 100, "application/octet-stream");
        assert!(validate_attachment(&file, &config).is_ok());
    }

    #[test]
    fn test_format_manifest() {
        let files = vec![
            FileAttachment::new("reads.fastq", 1_048_576, "text/plain"),
            FileAttachment::new("counts.csv", 524_288, "text/csv"),
        ];

        assert_eq!(
            format_manifest(&files),
            "reads.fastq (1.00 MB), counts.csv (0.50 MB)"
        );
    }
}
