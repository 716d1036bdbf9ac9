//! Configuration types for the Zoho CRM SDK.

use crate::error::ZohoError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default CRM API version segment.
pub const DEFAULT_API_VERSION: &str = "v7";

/// Zoho data center a CRM account lives in.
///
/// Each data center serves the API and the OAuth accounts server from its own
/// domain; an access token issued by one data center is rejected by the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Region {
    #[default]
    Us,
    Eu,
    In,
    Au,
    Jp,
    Cn,
    Ca,
}

impl Region {
    /// Public API domain of the data center.
    pub fn api_domain(&self) -> &'static str {
        match self {
            Self::Us => "https://www.zohoapis.com",
            Self::Eu => "https://www.zohoapis.eu",
            Self::In => "https://www.zohoapis.in",
            Self::Au => "https://www.zohoapis.com.au",
            Self::Jp => "https://www.zohoapis.jp",
            Self::Cn => "https://www.zohoapis.com.cn",
            Self::Ca => "https://www.zohoapis.ca",
        }
    }

    /// OAuth accounts domain of the data center.
    pub fn accounts_domain(&self) -> &'static str {
        match self {
            Self::Us => "https://accounts.zoho.com",
            Self::Eu => "https://accounts.zoho.eu",
            Self::In => "https://accounts.zoho.in",
            Self::Au => "https://accounts.zoho.com.au",
            Self::Jp => "https://accounts.zoho.jp",
            Self::Cn => "https://accounts.zoho.com.cn",
            Self::Ca => "https://accounts.zohocloud.ca",
        }
    }
}

impl FromStr for Region {
    type Err = ZohoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" | "com" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            "in" => Ok(Self::In),
            "au" | "com.au" => Ok(Self::Au),
            "jp" => Ok(Self::Jp),
            "cn" | "com.cn" => Ok(Self::Cn),
            "ca" => Ok(Self::Ca),
            other => Err(ZohoError::Config(format!("Unknown Zoho region: {}", other))),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Us => "us",
            Self::Eu => "eu",
            Self::In => "in",
            Self::Au => "au",
            Self::Jp => "jp",
            Self::Cn => "cn",
            Self::Ca => "ca",
        };
        f.write_str(name)
    }
}

/// Configuration for the Zoho CRM client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Initial access token, if one was issued ahead of startup.
    pub access_token: Option<String>,
    /// Long-lived refresh token exchanged for new access tokens.
    pub refresh_token: Option<String>,
    /// OAuth client ID.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Base URL for CRM data calls.
    pub api_domain: String,
    /// Base URL for OAuth calls.
    pub accounts_domain: String,
    /// API version segment, e.g. `v7`.
    pub api_version: String,
    /// Request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration pointing at the given data center, without credentials.
    pub fn new(region: Region) -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            client_id: None,
            client_secret: None,
            api_domain: region.api_domain().to_string(),
            accounts_domain: region.accounts_domain().to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: None,
        }
    }

    /// Path prefix placed between the API domain and a request path.
    pub fn api_prefix(&self) -> String {
        format!("crm/{}", self.api_version.trim_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Region::default())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            match value {
                Some(v) if !v.is_empty() => "<set>",
                _ => "<unset>",
            }
        }

        f.debug_struct("ClientConfig")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("client_id", &redact(&self.client_id))
            .field("client_secret", &redact(&self.client_secret))
            .field("api_domain", &self.api_domain)
            .field("accounts_domain", &self.accounts_domain)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}
