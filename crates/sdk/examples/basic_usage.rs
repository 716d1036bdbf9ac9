//! Basic SDK usage example.
//!
//! Refreshes an access token from the credentials in the environment and lists
//! the first page of leads.
//!
//! Run with: cargo run --example basic_usage

use zoho_crm_sdk::{ApiRequest, Region, ZohoClient, ZohoResult};

#[tokio::main]
async fn main() -> ZohoResult<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let region: Region = std::env::var("ZOHO_REGION")
        .unwrap_or_else(|_| "us".to_string())
        .parse()?;

    let client = ZohoClient::builder()
        .region(region)
        .refresh_token(std::env::var("REFRESH_TOKEN").unwrap_or_default())
        .client_id(std::env::var("CLIENT_ID").unwrap_or_default())
        .client_secret(std::env::var("CLIENT_SECRET").unwrap_or_default())
        .build()?;

    println!("Listing leads...");
    let response = client
        .dispatch(
            ApiRequest::get("Leads")
                .query("fields", "Last_Name,Email,Company")
                .query("per_page", 5),
        )
        .await?;

    if let Some(leads) = response["data"].as_array() {
        for lead in leads {
            println!(
                "  {} <{}> at {}",
                lead["Last_Name"].as_str().unwrap_or("-"),
                lead["Email"].as_str().unwrap_or("-"),
                lead["Company"].as_str().unwrap_or("-")
            );
        }
    }

    println!("More records: {}", response["info"]["more_records"]);

    Ok(())
}
