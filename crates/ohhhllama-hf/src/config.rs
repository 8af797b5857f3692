//! Public configuration for the metadata client.

use std::time::Duration;

/// Configuration for the `HuggingFace` metadata client.
///
/// # Example
///
/// ```
/// use ohhhllama_hf::HfClientConfig;
/// use std::time::Duration;
///
/// let config = HfClientConfig::new()
///     .with_timeout(Duration::from_secs(60))
///     .with_token(Some("hf_xxx".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct HfClientConfig {
    /// Site root; API and raw-file URLs are built under it.
    pub(crate) base_url: String,
    pub(crate) user_agent: String,
    pub(crate) timeout: Duration,
    /// Optional token for gated or private repositories.
    pub(crate) token: Option<String>,
}

impl Default for HfClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://huggingface.co".to_string(),
            user_agent: concat!("ohhhllama-hf/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            token: None,
        }
    }
}

impl HfClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the site root. Defaults to `https://huggingface.co`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HfClientConfig::default();
        assert_eq!(config.base_url, "https://huggingface.co");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.token.is_none());
        assert!(config.user_agent.starts_with("ohhhllama-hf/"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = HfClientConfig::new()
            .with_base_url("http://localhost:9999")
            .with_timeout(Duration::from_secs(5))
            .with_token(Some("secret".to_string()));
        assert_eq!(config.base_url(), "http://localhost:9999");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = HfClientConfig::new().with_token(Some("  ".to_string()));
        assert!(config.token.is_none());
    }
}
