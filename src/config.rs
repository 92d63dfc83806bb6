// src/config.rs
// =============================================================================
// Knobs for one extraction run: who we say we are, how long we wait, and
// how much of a page we are willing to read.
// =============================================================================

use std::time::Duration;

use anyhow::{bail, Result};

/// Identity sent with every request, the document GET and the image HEAD alike.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; LinkDB/1.0)";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HEAD_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// 2 MiB is far more than any <head> needs
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub user_agent: String,
    /// Deadline for the document GET, redirects included
    pub fetch_timeout: Duration,
    /// Deadline for the image reachability HEAD
    pub head_timeout: Duration,
    pub max_redirects: usize,
    /// Bytes past this are dropped and the prefix is parsed as-is
    pub max_body_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            head_timeout: DEFAULT_HEAD_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ExtractorConfig {
    /// Rejects settings that would make every run fail or hang.
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            bail!("user agent must not be empty");
        }
        if self.fetch_timeout.is_zero() {
            bail!("fetch timeout must be greater than zero");
        }
        if self.head_timeout.is_zero() {
            bail!("head timeout must be greater than zero");
        }
        if self.max_body_bytes == 0 {
            bail!("body size limit must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.user_agent, "Mozilla/5.0 (compatible; LinkDB/1.0)");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ExtractorConfig {
            head_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let config = ExtractorConfig {
            max_body_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
