//! Service configuration
//!
//! Where the content API lives, which key to send, and how long each class of
//! response stays cached.

use std::time::Duration;

/// Environment variable the CLI reads the content API base URL from
pub const API_URL_ENV: &str = "CMS_API_URL";

/// Environment variable the CLI reads the content API key from
pub const API_KEY_ENV: &str = "CMS_API_KEY";

/// Base URL used when none is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Configuration for the merchant service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Root of the content API, without a trailing slash
    pub base_url: String,
    /// API key sent with every request, if any
    pub api_key: Option<String>,
    /// TTL for merchant list pages
    pub list_ttl: Duration,
    /// TTL for single merchant records
    pub detail_ttl: Duration,
    /// TTL for merchant counts
    pub count_ttl: Duration,
    /// TTL for assembled menus
    pub menu_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            list_ttl: Duration::from_secs(300),   // 5 minutes
            detail_ttl: Duration::from_secs(600), // 10 minutes
            count_ttl: Duration::from_secs(300),  // 5 minutes
            menu_ttl: Duration::from_secs(300),   // 5 minutes
        }
    }
}

impl ServiceConfig {
    /// Sets the API base URL; empty values keep the current one
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !trimmed.is_empty() {
            self.base_url = trimmed.to_string();
        }
        self
    }

    /// Sets the API key; an empty key means no key
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }
}
