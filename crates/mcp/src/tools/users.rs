// User and organization tools

use super::{page_property, parse_args, path_segment, per_page_property};
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_enum, json_schema_object, json_schema_string, Tool};
use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use zoho_crm_sdk::{ApiRequest, ZohoClient};

const USER_TYPES: &[&str] = &[
    "AllUsers",
    "ActiveUsers",
    "DeactiveUsers",
    "ConfirmedUsers",
    "NotConfirmedUsers",
    "DeletedUsers",
    "ActiveConfirmedUsers",
    "AdminUsers",
    "ActiveConfirmedAdmins",
    "CurrentUser",
];

/// Tool to list CRM users
pub struct GetUsersTool {
    client: ZohoClient,
}

impl GetUsersTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetUsersArgs {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for GetUsersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_users".to_string(),
            description: "List users of the CRM organization".to_string(),
            input_schema: json_schema_object(
                json!({
                    "type": json_schema_enum(USER_TYPES, "Which users to list (default: AllUsers)"),
                    "page": page_property(),
                    "per_page": per_page_property()
                }),
                vec![],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetUsersArgs = parse_args("get_users", arguments)?;

        let request = ApiRequest::get("users")
            .query_opt("type", args.kind)
            .query_opt("page", args.page)
            .query_opt("per_page", args.per_page);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to fetch one user
pub struct GetUserTool {
    client: ZohoClient,
}

impl GetUserTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetUserArgs {
    user_id: String,
}

#[async_trait::async_trait]
impl Tool for GetUserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_user".to_string(),
            description: "Get a CRM user by ID".to_string(),
            input_schema: json_schema_object(
                json!({ "user_id": json_schema_string("ID of the user") }),
                vec!["user_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetUserArgs = parse_args("get_user", arguments)?;
        let user_id = path_segment("user_id", &args.user_id)?;

        Ok(self
            .client
            .dispatch(ApiRequest::get(format!("users/{}", user_id)))
            .await?)
    }
}

/// Tool to fetch the user the credentials belong to
pub struct GetCurrentUserTool {
    client: ZohoClient,
}

impl GetCurrentUserTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetCurrentUserTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_user".to_string(),
            description: "Get the CRM user the server is authenticated as".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value> {
        let request = ApiRequest::get("users").query("type", "CurrentUser");
        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to fetch organization details
pub struct GetOrganizationTool {
    client: ZohoClient,
}

impl GetOrganizationTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetOrganizationTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_organization".to_string(),
            description: "Get details of the CRM organization: name, time zone, currency and licensing".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value> {
        Ok(self.client.dispatch(ApiRequest::get("org")).await?)
    }
}
