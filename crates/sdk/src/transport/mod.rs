//! Transport layer for the Zoho CRM SDK.

pub mod http;

pub use http::HttpTransport;
