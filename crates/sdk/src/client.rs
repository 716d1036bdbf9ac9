//! Main client for the Zoho CRM SDK.

use crate::auth::TokenManager;
use crate::config::{ClientConfig, Region, DEFAULT_API_VERSION};
use crate::error::ZohoResult;
use crate::request::ApiRequest;
use crate::session::Session;
use crate::transport::HttpTransport;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Client for the Zoho CRM REST API.
///
/// Cloning is cheap; clones share one session, so a token refreshed through
/// one clone is used by all of them.
#[derive(Debug, Clone)]
pub struct ZohoClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl ZohoClient {
    /// Create a new client builder.
    pub fn builder() -> ZohoClientBuilder {
        ZohoClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> ZohoResult<Self> {
        let http = HttpTransport::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared session state.
    pub fn session(&self) -> &Arc<Session> {
        self.http.session()
    }

    /// Token manager bound to this client's session.
    pub fn tokens(&self) -> &TokenManager {
        self.http.tokens()
    }

    /// Perform one authenticated API call.
    pub async fn dispatch(&self, request: ApiRequest) -> ZohoResult<Value> {
        self.http.dispatch(&request).await
    }

    /// Execute a GET request.
    pub async fn get(&self, path: &str) -> ZohoResult<Value> {
        self.dispatch(ApiRequest::get(path)).await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> ZohoResult<Value> {
        self.dispatch(ApiRequest::post(path).body(body)).await
    }

    /// Execute a PUT request with a JSON body.
    pub async fn put(&self, path: &str, body: Value) -> ZohoResult<Value> {
        self.dispatch(ApiRequest::put(path).body(body)).await
    }

    /// Execute a DELETE request.
    pub async fn delete(&self, path: &str) -> ZohoResult<Value> {
        self.dispatch(ApiRequest::delete(path)).await
    }
}

/// Builder for creating a ZohoClient.
pub struct ZohoClientBuilder {
    region: Region,
    access_token: Option<String>,
    refresh_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    api_domain: Option<String>,
    accounts_domain: Option<String>,
    api_version: String,
    timeout: Option<Duration>,
}

impl ZohoClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            region: Region::default(),
            access_token: None,
            refresh_token: None,
            client_id: None,
            client_secret: None,
            api_domain: None,
            accounts_domain: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: None,
        }
    }

    /// Set the data center used for default domains.
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Set an initial access token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the refresh token.
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Set the OAuth client ID.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Set the OAuth client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Override the API domain of the region.
    pub fn api_domain(mut self, domain: impl Into<String>) -> Self {
        self.api_domain = Some(domain.into());
        self
    }

    /// Override the accounts domain of the region.
    pub fn accounts_domain(mut self, domain: impl Into<String>) -> Self {
        self.accounts_domain = Some(domain.into());
        self
    }

    /// Set the API version segment (default `v7`).
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> ZohoResult<ZohoClient> {
        let config = ClientConfig {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            client_id: self.client_id,
            client_secret: self.client_secret,
            api_domain: self
                .api_domain
                .unwrap_or_else(|| self.region.api_domain().to_string()),
            accounts_domain: self
                .accounts_domain
                .unwrap_or_else(|| self.region.accounts_domain().to_string()),
            api_version: self.api_version,
            timeout: self.timeout,
        };

        ZohoClient::from_config(config)
    }
}

impl Default for ZohoClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builder_uses_region_defaults() {
        let client = ZohoClient::builder().region(Region::Jp).build().unwrap();

        assert_eq!(client.config().api_domain, "https://www.zohoapis.jp");
        assert_eq!(client.config().accounts_domain, "https://accounts.zoho.jp");
        assert_eq!(client.session().get().api_domain, "https://www.zohoapis.jp");
    }

    #[test]
    fn test_builder_overrides() {
        let client = ZohoClient::builder()
            .region(Region::Eu)
            .api_domain("https://sandbox.zohoapis.eu")
            .api_version("v6")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(client.config().api_domain, "https://sandbox.zohoapis.eu");
        assert_eq!(client.config().accounts_domain, "https://accounts.zoho.eu");
        assert_eq!(client.config().api_prefix(), "crm/v6");
        assert_eq!(client.config().timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_clones_share_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "fresh" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ZohoClient::builder()
            .accounts_domain(server.uri())
            .refresh_token("rt")
            .client_id("id")
            .client_secret("secret")
            .build()
            .unwrap();
        let clone = client.clone();

        client.tokens().refresh().await.unwrap();
        assert_eq!(clone.session().access_token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_get_leads_end_to_end() {
        let server = MockServer::start().await;
        let leads = serde_json::json!([{ "id": "1" }, { "id": "2" }]);

        Mock::given(method("GET"))
            .and(path("/crm/v7/Leads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(leads.clone()))
            .mount(&server)
            .await;

        let client = ZohoClient::builder()
            .api_domain(server.uri())
            .access_token("tok")
            .build()
            .unwrap();

        assert_eq!(client.get("Leads").await.unwrap(), leads);
    }
}
