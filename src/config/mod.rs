// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::UrlError;
use crate::signing::CryptoUrl;

/// Signer configuration, usually loaded from YAML
///
/// ```yaml
/// security_key: ${THUMBOR_SECURITY_KEY}
/// server_url: https://thumbor.example.com
/// legacy: false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Shared secret configured on the Thumbor server
    pub security_key: String,

    /// Server base URL prepended to generated paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Generate legacy encrypted URLs by default
    #[serde(default)]
    pub legacy: bool,
}

impl SignerConfig {
    pub fn new(security_key: impl Into<String>) -> Self {
        Self {
            security_key: security_key.into(),
            server_url: None,
            legacy: false,
        }
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });

        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.security_key.is_empty() {
            return Err("security_key cannot be empty".to_string());
        }

        if let Some(ref url) = self.server_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!(
                    "server_url '{}' must start with http:// or https://",
                    url
                ));
            }
        }

        Ok(())
    }

    /// Build the signer for this configuration
    pub fn crypto_url(&self) -> Result<CryptoUrl, UrlError> {
        CryptoUrl::new(self.security_key.as_bytes())
    }

    /// Prefix a generated path with `server_url`, if configured
    pub fn absolute_url(&self, path: &str) -> String {
        match self.server_url {
            Some(ref base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}
