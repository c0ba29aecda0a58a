//! Application configuration types.
//!
//! Deserialized from `{data_dir}/config.toml`. Every section has defaults so
//! a missing or partial file still yields a runnable configuration. Secrets
//! (API keys) never live here; they come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CounselConfig {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// External assistant service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// API base URL.
    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,
    /// Model backing the assistant.
    #[serde(default = "default_assistant_model")]
    pub model: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_base_url(),
            model: default_assistant_model(),
        }
    }
}

fn default_assistant_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_assistant_model() -> String {
    "gpt-4o".to_string()
}

/// Object store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage service base URL. Empty means uploads are disabled.
    #[serde(default)]
    pub base_url: String,
    /// Bucket holding uploaded documents.
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bucket: default_bucket(),
        }
    }
}

fn default_bucket() -> String {
    "legal-documents".to_string()
}

/// Payment provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Provider API base URL.
    #[serde(default = "default_payment_base_url")]
    pub base_url: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: default_payment_base_url(),
        }
    }
}

fn default_payment_base_url() -> String {
    "https://api.paystack.co".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CounselConfig::default();
        assert_eq!(config.assistant.base_url, "https://api.openai.com/v1");
        assert_eq!(config.storage.bucket, "legal-documents");
        assert_eq!(config.payment.base_url, "https://api.paystack.co");
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: CounselConfig = toml::from_str(
            r#"
[assistant]
model = "gpt-4o-mini"
"#,
        )
        .unwrap();
        assert_eq!(config.assistant.model, "gpt-4o-mini");
        assert_eq!(config.assistant.base_url, "https://api.openai.com/v1");
        assert_eq!(config.storage.bucket, "legal-documents");
    }
}
