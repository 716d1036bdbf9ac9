//! # Zoho CRM SDK
//!
//! Client/session layer for the Zoho CRM REST API: OAuth refresh, authenticated
//! request dispatch with automatic re-authentication, and response
//! normalization.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zoho_crm_sdk::{ApiRequest, Region, ZohoClient, ZohoResult};
//!
//! #[tokio::main]
//! async fn main() -> ZohoResult<()> {
//!     let client = ZohoClient::builder()
//!         .region(Region::Eu)
//!         .refresh_token("1000.xxxx")
//!         .client_id("1000.CLIENT")
//!         .client_secret("secret")
//!         .build()?;
//!
//!     // The first call obtains an access token on its own.
//!     let leads = client
//!         .dispatch(ApiRequest::get("Leads").query("per_page", 10))
//!         .await?;
//!     println!("{}", leads);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod session;
pub mod transport;

pub use auth::TokenManager;
pub use client::{ZohoClient, ZohoClientBuilder};
pub use config::{ClientConfig, Region};
pub use error::{ErrorKind, ZohoError, ZohoResult};
pub use request::ApiRequest;
pub use session::{Session, SessionSnapshot, SessionUpdate};

// Re-exported so callers can name request methods without depending on reqwest.
pub use reqwest::Method;
