// MCP (Model Context Protocol) server exposing Zoho CRM to agent clients

pub mod format;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
