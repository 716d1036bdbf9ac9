//! Shared credential and endpoint state.

use crate::config::ClientConfig;
use std::sync::{PoisonError, RwLock};

/// Point-in-time copy of the session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_domain: String,
    pub accounts_domain: String,
}

impl SessionSnapshot {
    /// Access token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("has_access_token", &self.token().is_some())
            .field("api_domain", &self.api_domain)
            .field("accounts_domain", &self.accounts_domain)
            .finish_non_exhaustive()
    }
}

/// Fields the token manager may overwrite after startup.
///
/// Everything else in the session is fixed for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub access_token: Option<String>,
    pub api_domain: Option<String>,
}

/// Credentials and domains shared by every request of one client.
#[derive(Debug)]
pub struct Session {
    state: RwLock<SessionSnapshot>,
}

impl Session {
    /// Build the session from client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Self::from_snapshot(SessionSnapshot {
            access_token: config.access_token.clone(),
            refresh_token: config.refresh_token.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_domain: config.api_domain.clone(),
            accounts_domain: config.accounts_domain.clone(),
        })
    }

    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> SessionSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge the given fields into the session. No validation is performed.
    pub fn update(&self, update: SessionUpdate) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = update.access_token {
            state.access_token = Some(token);
        }
        if let Some(domain) = update.api_domain {
            state.api_domain = domain;
        }
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.get().token().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Region;

    #[test]
    fn test_session_from_config() {
        let mut config = ClientConfig::new(Region::Eu);
        config.refresh_token = Some("rt".to_string());

        let session = Session::new(&config);
        let snapshot = session.get();

        assert_eq!(snapshot.refresh_token.as_deref(), Some("rt"));
        assert_eq!(snapshot.api_domain, "https://www.zohoapis.eu");
        assert_eq!(snapshot.accounts_domain, "https://accounts.zoho.eu");
        assert!(snapshot.token().is_none());
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let session = Session::new(&ClientConfig::default());

        session.update(SessionUpdate {
            access_token: Some("fresh".to_string()),
            api_domain: None,
        });
        assert_eq!(session.access_token().as_deref(), Some("fresh"));
        assert_eq!(session.get().api_domain, "https://www.zohoapis.com");

        session.update(SessionUpdate {
            access_token: None,
            api_domain: Some("https://www.zohoapis.eu".to_string()),
        });
        let snapshot = session.get();
        assert_eq!(snapshot.token(), Some("fresh"));
        assert_eq!(snapshot.api_domain, "https://www.zohoapis.eu");
    }

    #[test]
    fn test_empty_token_is_absent() {
        let mut config = ClientConfig::default();
        config.access_token = Some(String::new());

        let session = Session::new(&config);
        assert!(session.access_token().is_none());
    }
}
