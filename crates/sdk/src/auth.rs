//! OAuth access token refresh.

use crate::error::{ZohoError, ZohoResult};
use crate::session::{Session, SessionUpdate};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    api_domain: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Exchanges the refresh token for new access tokens and records them in the
/// session.
#[derive(Debug)]
pub struct TokenManager {
    client: Client,
    session: Arc<Session>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(client: Client, session: Arc<Session>) -> Self {
        Self {
            client,
            session,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Obtain a fresh access token unconditionally.
    ///
    /// Fails with [`ZohoError::Config`] before touching the network when the
    /// refresh token, client ID or client secret is missing.
    pub async fn refresh(&self) -> ZohoResult<String> {
        let snapshot = self.session.get();

        let refresh_token = non_empty(&snapshot.refresh_token);
        let client_id = non_empty(&snapshot.client_id);
        let client_secret = non_empty(&snapshot.client_secret);

        let (refresh_token, client_id, client_secret) =
            match (refresh_token, client_id, client_secret) {
                (Some(rt), Some(id), Some(secret)) => (rt, id, secret),
                (rt, id, secret) => {
                    let missing: Vec<&str> = [
                        ("REFRESH_TOKEN", rt.is_none()),
                        ("CLIENT_ID", id.is_none()),
                        ("CLIENT_SECRET", secret.is_none()),
                    ]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                    return Err(ZohoError::Config(format!(
                        "Missing required credentials for token refresh: {}",
                        missing.join(", ")
                    )));
                }
            };

        let url = format!(
            "{}/oauth/v2/token",
            snapshot.accounts_domain.trim_end_matches('/')
        );
        debug!(url = %url, "Refreshing access token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let token: TokenResponse = match serde_json::from_str(&text) {
            Ok(token) => token,
            Err(_) => {
                warn!(status = status.as_u16(), "Token endpoint returned a non-JSON body");
                return Err(ZohoError::Authentication(format!(
                    "Token endpoint returned {}: {}",
                    status.as_u16(),
                    text
                )));
            }
        };

        if let Some(error) = token.error {
            warn!(error = %error, "Token refresh rejected");
            return Err(ZohoError::Authentication(format!(
                "Token refresh failed: {}",
                error
            )));
        }

        if !status.is_success() {
            return Err(ZohoError::Authentication(format!(
                "Token endpoint returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ZohoError::Authentication("Token response did not include an access token".into())
            })?;

        info!(
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            api_domain = token.api_domain.as_deref(),
            "Access token refreshed"
        );

        self.session.update(SessionUpdate {
            access_token: Some(access_token.clone()),
            api_domain: token.api_domain.filter(|d| !d.is_empty()),
        });

        Ok(access_token)
    }

    /// Refresh unless another caller already replaced `observed`.
    ///
    /// `observed` is the token the caller last saw (`None` if the session had
    /// none). Concurrent callers queue on one lock; whoever gets there after a
    /// successful refresh picks up the new token instead of issuing another.
    pub async fn refresh_if_stale(&self, observed: Option<&str>) -> ZohoResult<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token() {
            if observed != Some(current.as_str()) {
                debug!("Access token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        self.refresh().await
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
