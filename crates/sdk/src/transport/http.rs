//! Authenticated HTTP dispatch for the Zoho CRM API.

use crate::auth::TokenManager;
use crate::config::ClientConfig;
use crate::error::{response_detail, ZohoError, ZohoResult};
use crate::request::ApiRequest;
use crate::session::Session;
use reqwest::{header, Client, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Attempts per dispatch: the original call plus one retry after a 401.
const MAX_ATTEMPTS: u32 = 2;

/// Authorization scheme expected by the CRM API.
const AUTH_SCHEME: &str = "Zoho-oauthtoken";

/// HTTP transport that signs every request with the session's access token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    session: Arc<Session>,
    tokens: Arc<TokenManager>,
    api_prefix: String,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: &ClientConfig) -> ZohoResult<Self> {
        Url::parse(&config.api_domain)?;
        Url::parse(&config.accounts_domain)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let session = Arc::new(Session::new(config));
        let tokens = Arc::new(TokenManager::new(client.clone(), session.clone()));

        Ok(Self {
            client,
            session,
            tokens,
            api_prefix: config.api_prefix(),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Build the target URL of a request against the given API domain.
    fn build_url(&self, api_domain: &str, request: &ApiRequest) -> ZohoResult<Url> {
        if has_dot_segment(&request.path) {
            return Err(ZohoError::Config(format!(
                "Request path {:?} contains a dot segment",
                request.path
            )));
        }

        let mut url = Url::parse(&format!(
            "{}/{}/{}",
            api_domain.trim_end_matches('/'),
            self.api_prefix,
            request.path.trim_start_matches('/')
        ))?;

        if let Some(query) = request.query.as_ref().filter(|q| !q.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Send one authenticated request and normalize its response.
    ///
    /// Refreshes the access token first when the session has none, and once
    /// more if the API answers 401. A second 401 is returned as
    /// [`ZohoError::Authentication`].
    pub async fn dispatch(&self, request: &ApiRequest) -> ZohoResult<Value> {
        let mut rejected = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let snapshot = self.session.get();
            let token = match snapshot.token() {
                Some(token) => token.to_string(),
                None => self.tokens.refresh_if_stale(None).await?,
            };
            // A refresh may have moved the account to another data center.
            let api_domain = self.session.get().api_domain;

            let url = self.build_url(&api_domain, request)?;
            debug!(method = %request.method, url = %url, attempt, "Zoho API request");

            let mut builder = self
                .client
                .request(request.method.clone(), url)
                .header(header::AUTHORIZATION, format!("{} {}", AUTH_SCHEME, token));
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Self::read_response(response).await;
            }

            rejected = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to read 401 response body");
                    format!("(response body unreadable: {})", e)
                }
            };
            if attempt < MAX_ATTEMPTS {
                warn!(path = %request.path, "Access token rejected, refreshing");
                self.tokens.refresh_if_stale(Some(&token)).await?;
            }
        }

        warn!(path = %request.path, "Access token rejected after refresh");
        Err(ZohoError::Authentication(format!(
            "Zoho API rejected the access token after refresh (401): {}",
            response_detail(&rejected)
        )))
    }

    /// Turn a non-401 response into a result value.
    async fn read_response(response: Response) -> ZohoResult<Value> {
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(json!({ "status": "success", "message": "No content" }));
        }

        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Zoho API returned an error");
            return Err(ZohoError::from_response(status.as_u16(), &text));
        }

        if text.is_empty() {
            return Ok(json!({ "status": "success" }));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// True when any segment of `path` would be resolved away by URL parsing,
/// including the percent-encoded spellings of `.` and `..`.
fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
