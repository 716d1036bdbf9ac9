// Standalone MCP server binary

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use zoho_crm_mcp::server::McpServer;
use zoho_crm_mcp::tools::{register_all, ToolRegistry};
use zoho_crm_sdk::{Region, ZohoClient};

#[derive(Parser, Debug)]
#[command(name = "zoho-crm-mcp")]
#[command(about = "Zoho CRM tools for MCP clients, served over stdio", long_about = None)]
struct Args {
    /// Initial OAuth access token
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// OAuth refresh token used to mint new access tokens
    #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,

    /// OAuth client ID
    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Data center: us, eu, in, au, jp, cn or ca
    #[arg(long, env = "ZOHO_REGION", default_value = "us")]
    region: Region,

    /// Override the region's API domain
    #[arg(long, env = "API_DOMAIN")]
    api_domain: Option<String>,

    /// Override the region's accounts domain
    #[arg(long, env = "ACCOUNTS_DOMAIN")]
    accounts_domain: Option<String>,

    /// CRM API version segment
    #[arg(long, env = "ZOHO_API_VERSION", default_value = "v7")]
    api_version: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "ZOHO_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

impl Args {
    fn client(self) -> Result<ZohoClient> {
        let mut builder = ZohoClient::builder()
            .region(self.region)
            .api_version(self.api_version);

        if let Some(token) = self.access_token {
            builder = builder.access_token(token);
        }
        if let Some(token) = self.refresh_token {
            builder = builder.refresh_token(token);
        }
        if let Some(id) = self.client_id {
            builder = builder.client_id(id);
        }
        if let Some(secret) = self.client_secret {
            builder = builder.client_secret(secret);
        }
        if let Some(domain) = self.api_domain {
            builder = builder.api_domain(domain);
        }
        if let Some(domain) = self.accounts_domain {
            builder = builder.accounts_domain(domain);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build().context("Invalid Zoho CRM configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Zoho CRM MCP server starting...");

    let client = args.client()?;
    {
        let config = client.config();
        tracing::info!(
            api_domain = %config.api_domain,
            accounts_domain = %config.accounts_domain,
            api_version = %config.api_version,
            "Using Zoho CRM endpoint"
        );
        if config.access_token.is_none() && config.refresh_token.is_none() {
            tracing::warn!(
                "Neither ACCESS_TOKEN nor REFRESH_TOKEN is set; tool calls will fail until credentials are provided"
            );
        }
    }

    let mut registry = ToolRegistry::new();
    register_all(&mut registry, &client);

    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    server.start().await?;

    Ok(())
}
