//! Configuration loader for Counsel.
//!
//! Reads `config.toml` from the data directory (`~/.counsel/` in production)
//! and deserializes it into [`CounselConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use counsel_types::config::CounselConfig;

/// Resolve the data directory from `COUNSEL_DATA_DIR`, falling back to
/// `~/.counsel`.
pub fn data_dir() -> PathBuf {
    match std::env::var("COUNSEL_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".counsel")
        }
    }
}

/// Load application configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`CounselConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> CounselConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return CounselConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return CounselConfig::default();
        }
    };

    match toml::from_str::<CounselConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            CounselConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.assistant.base_url, "https://api.openai.com/v1");
        assert_eq!(config.storage.bucket, "legal-documents");
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[assistant]
base_url = "http://localhost:9000/v1"
model = "gpt-4o-mini"

[storage]
base_url = "http://localhost:9001"
bucket = "test-documents"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.assistant.base_url, "http://localhost:9000/v1");
        assert_eq!(config.assistant.model, "gpt-4o-mini");
        assert_eq!(config.storage.bucket, "test-documents");
        // Untouched section keeps its default.
        assert_eq!(config.payment.base_url, "https://api.paystack.co");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.assistant.model, "gpt-4o");
    }
}
