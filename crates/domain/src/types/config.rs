//! Configuration structures
//!
//! One explicit [`FaxConfig`] is constructed per process and passed by
//! reference into every component constructor; nothing reads ambient global
//! state. Secret fields are redacted from `Debug` output so a logged config
//! never leaks credentials.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DB_POOL_SIZE, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_RETRY_COUNT,
    DEFAULT_WEBHOOK_BIND_ADDR, WEBHOOK_PATH,
};
use crate::errors::FaxError;

/// How the provider client authenticates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// HTTP Basic with API key and secret.
    #[default]
    Basic,
    /// Bearer token obtained out of band.
    Oauth,
}

impl AuthMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Oauth => "oauth",
        }
    }
}

impl FromStr for AuthMethod {
    type Err = FaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "oauth" => Ok(Self::Oauth),
            other => Err(FaxError::Config(format!("unknown auth method: {other}"))),
        }
    }
}

/// Provider API region; selects the base URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Auto-routed global endpoint.
    #[default]
    Global,
    /// US East Coast.
    Use1,
    /// Europe.
    Eu1,
    /// South America.
    Sae1,
    /// South East Asia 1.
    Apse1,
    /// South East Asia 2.
    Apse2,
}

impl Region {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Use1 => "use1",
            Self::Eu1 => "eu1",
            Self::Sae1 => "sae1",
            Self::Apse1 => "apse1",
            Self::Apse2 => "apse2",
        }
    }

    /// Base URL for the region; the global endpoint has no region prefix.
    pub fn base_url(self) -> String {
        match self {
            Self::Global => "https://fax.api.sinch.com".to_string(),
            regional => format!("https://{}.fax.api.sinch.com", regional.as_str()),
        }
    }
}

impl FromStr for Region {
    type Err = FaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "use1" => Ok(Self::Use1),
            "eu1" => Ok(Self::Eu1),
            "sae1" => Ok(Self::Sae1),
            "apse1" => Ok(Self::Apse1),
            "apse2" => Ok(Self::Apse2),
            other => Err(FaxError::Config(format!("unknown region: {other}"))),
        }
    }
}

/// Resolved per-installation configuration.
///
/// Every field is optional in serialized form; missing fields take the
/// [`Default`] values so partial config files stay valid.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaxConfig {
    /// Module master switch.
    pub enabled: bool,
    /// Provider project ID from the dashboard.
    pub project_id: String,
    /// Provider service ID (optional, fax-to-email features only).
    pub service_id: String,
    pub auth_method: AuthMethod,
    /// API key for Basic auth.
    pub api_key: String,
    /// API secret for Basic auth; encrypted at rest, redacted in Debug.
    pub api_secret: String,
    /// Bearer token for OAuth auth; encrypted at rest, redacted in Debug.
    pub oauth_token: String,
    pub region: Region,
    /// Reserved for inbound webhook validation; encrypted at rest.
    pub webhook_secret: String,
    /// Where fax content files are stored.
    pub file_storage_path: String,
    /// Automatically store inbound fax content.
    pub auto_receive: bool,
    /// Provider-side redelivery attempts for outbound sends.
    pub default_retry_count: u32,
    /// Refresh in-flight statuses when listing faxes.
    pub enable_status_polling: bool,
    /// Serve the inbound webhook endpoint.
    pub enable_webhooks: bool,
    /// Poll the provider for new inbound faxes.
    pub enable_incoming_polling: bool,
    /// Externally reachable base address of this deployment, used to build
    /// the callback URL. Private/loopback addresses suppress callbacks.
    pub site_address: String,
    /// Listen address for the webhook server.
    pub webhook_bind_addr: String,
    /// Seconds between scheduled incoming polls.
    pub poll_interval_secs: u64,
    /// SQLCipher database file.
    pub database_path: String,
    pub database_pool_size: u32,
}

impl Default for FaxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: String::new(),
            service_id: String::new(),
            auth_method: AuthMethod::Basic,
            api_key: String::new(),
            api_secret: String::new(),
            oauth_token: String::new(),
            region: Region::Global,
            webhook_secret: String::new(),
            file_storage_path: String::new(),
            auto_receive: true,
            default_retry_count: DEFAULT_RETRY_COUNT,
            enable_status_polling: false,
            enable_webhooks: true,
            enable_incoming_polling: false,
            site_address: String::new(),
            webhook_bind_addr: DEFAULT_WEBHOOK_BIND_ADDR.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            database_path: String::new(),
            database_pool_size: DEFAULT_DB_POOL_SIZE,
        }
    }
}

impl FaxConfig {
    /// Whether credentials are complete for the selected auth method.
    pub fn is_configured(&self) -> bool {
        !self.project_id.is_empty()
            && match self.auth_method {
                AuthMethod::Basic => !self.api_key.is_empty() && !self.api_secret.is_empty(),
                AuthMethod::Oauth => !self.oauth_token.is_empty(),
            }
    }

    /// Whether the configured site address is one the provider can reach.
    ///
    /// Matches the address against the private/loopback pattern
    /// (`localhost`, `127.0.0.1`, `192.168.*`, `10.*`, `172.16-31.*`) as a
    /// substring test; any hit suppresses callbacks.
    pub fn has_public_callback_url(&self) -> bool {
        !self.site_address.is_empty() && !matches_private_address(&self.site_address)
    }

    /// Callback URL attached to outbound sends, only when publicly reachable.
    pub fn default_callback_url(&self) -> Option<String> {
        self.has_public_callback_url()
            .then(|| format!("{}{}", self.site_address.trim_end_matches('/'), WEBHOOK_PATH))
    }
}

// Redact secrets; everything else is fair game for logs.
impl fmt::Debug for FaxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaxConfig")
            .field("enabled", &self.enabled)
            .field("project_id", &self.project_id)
            .field("service_id", &self.service_id)
            .field("auth_method", &self.auth_method)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("oauth_token", &"<redacted>")
            .field("region", &self.region)
            .field("webhook_secret", &"<redacted>")
            .field("file_storage_path", &self.file_storage_path)
            .field("auto_receive", &self.auto_receive)
            .field("default_retry_count", &self.default_retry_count)
            .field("enable_status_polling", &self.enable_status_polling)
            .field("enable_webhooks", &self.enable_webhooks)
            .field("enable_incoming_polling", &self.enable_incoming_polling)
            .field("site_address", &self.site_address)
            .field("webhook_bind_addr", &self.webhook_bind_addr)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("database_path", &self.database_path)
            .field("database_pool_size", &self.database_pool_size)
            .finish()
    }
}

/// Substring test for private/loopback addresses, mirroring the pattern
/// `localhost|127\.0\.0\.1|192\.168\.|10\.|172\.(1[6-9]|2[0-9]|3[01])\.`.
fn matches_private_address(addr: &str) -> bool {
    if addr.contains("localhost")
        || addr.contains("127.0.0.1")
        || addr.contains("192.168.")
        || addr.contains("10.")
    {
        return true;
    }
    (16u8..=31).any(|octet| addr.contains(&format!("172.{octet}.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_config() -> FaxConfig {
        FaxConfig {
            enabled: true,
            project_id: "proj-1".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            ..FaxConfig::default()
        }
    }

    #[test]
    fn configured_requires_credentials_for_selected_method() {
        let mut config = basic_config();
        assert!(config.is_configured());

        config.api_secret.clear();
        assert!(!config.is_configured());

        config.auth_method = AuthMethod::Oauth;
        assert!(!config.is_configured());
        config.oauth_token = "token".to_string();
        assert!(config.is_configured());

        config.project_id.clear();
        assert!(!config.is_configured());
    }

    #[test]
    fn private_addresses_suppress_the_callback_url() {
        let mut config = basic_config();
        for addr in [
            "http://localhost/emr",
            "https://127.0.0.1:8443",
            "https://192.168.1.20",
            "https://10.0.0.5",
            "https://172.16.0.9",
            "https://172.31.255.1",
        ] {
            config.site_address = addr.to_string();
            assert!(!config.has_public_callback_url(), "{addr} should be private");
            assert!(config.default_callback_url().is_none());
        }
    }

    #[test]
    fn public_address_yields_webhook_callback() {
        let mut config = basic_config();
        config.site_address = "https://emr.example.org".to_string();
        assert!(config.has_public_callback_url());
        assert_eq!(
            config.default_callback_url().as_deref(),
            Some("https://emr.example.org/fax/webhook")
        );

        // Trailing slash folds into the path.
        config.site_address = "https://emr.example.org/".to_string();
        assert_eq!(
            config.default_callback_url().as_deref(),
            Some("https://emr.example.org/fax/webhook")
        );
    }

    #[test]
    fn mid_range_172_subnets_are_not_private() {
        let mut config = basic_config();
        config.site_address = "https://172.15.0.1".to_string();
        assert!(config.has_public_callback_url());
        config.site_address = "https://172.32.0.1".to_string();
        assert!(config.has_public_callback_url());
    }

    #[test]
    fn empty_site_address_is_not_public() {
        let config = basic_config();
        assert!(!config.has_public_callback_url());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = basic_config();
        config.api_secret = "s3cr3t-value".to_string();
        config.oauth_token = "tok-sensitive".to_string();
        config.webhook_secret = "hook-sensitive".to_string();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cr3t-value"), "api_secret leaked: {rendered}");
        assert!(!rendered.contains("tok-sensitive"));
        assert!(!rendered.contains("hook-sensitive"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn region_base_urls() {
        assert_eq!(Region::Global.base_url(), "https://fax.api.sinch.com");
        assert_eq!(Region::Eu1.base_url(), "https://eu1.fax.api.sinch.com");
        assert_eq!("use1".parse::<Region>().ok(), Some(Region::Use1));
        assert!("moon1".parse::<Region>().is_err());
    }
}
