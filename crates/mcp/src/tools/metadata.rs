// Metadata tools: modules, fields, layouts, custom views and related lists

use super::{module_property, parse_args, path_segment};
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_enum, json_schema_object, json_schema_string, Tool};
use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use zoho_crm_sdk::{ApiRequest, ZohoClient};

#[derive(Debug, Deserialize)]
struct ModuleArgs {
    module: String,
}

/// Schema shared by the per-module settings tools.
fn module_schema(name: &str, description: &str) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json_schema_object(json!({ "module": module_property() }), vec!["module"]),
        annotations: None,
    }
}

/// Tool to list the modules of the organization
pub struct GetModulesTool {
    client: ZohoClient,
}

impl GetModulesTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetModulesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_modules".to_string(),
            description: "List the CRM modules available in the organization, with their API names".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
            annotations: None,
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<Value> {
        Ok(self.client.dispatch(ApiRequest::get("settings/modules")).await?)
    }
}

/// Tool to describe one module
pub struct GetModuleTool {
    client: ZohoClient,
}

impl GetModuleTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetModuleTool {
    fn schema(&self) -> ToolSchema {
        module_schema("get_module", "Get the metadata of a single CRM module")
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: ModuleArgs = parse_args("get_module", arguments)?;
        let module = path_segment("module", &args.module)?;

        Ok(self
            .client
            .dispatch(ApiRequest::get(format!("settings/modules/{}", module)))
            .await?)
    }
}

/// Tool to list the fields of a module
pub struct GetFieldsTool {
    client: ZohoClient,
}

impl GetFieldsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetFieldsArgs {
    module: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetFieldsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_fields".to_string(),
            description: "List the fields of a CRM module: API names, data types, picklist values and mandatory flags".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "type": json_schema_enum(&["all", "unused"], "Restrict to unused fields")
                }),
                vec!["module"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetFieldsArgs = parse_args("get_fields", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get("settings/fields")
            .query("module", module)
            .query_opt("type", args.kind);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to list the layouts of a module
pub struct GetLayoutsTool {
    client: ZohoClient,
}

impl GetLayoutsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetLayoutsTool {
    fn schema(&self) -> ToolSchema {
        module_schema("get_layouts", "List the page layouts of a CRM module")
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: ModuleArgs = parse_args("get_layouts", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get("settings/layouts").query("module", module);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to list the custom views of a module
pub struct GetCustomViewsTool {
    client: ZohoClient,
}

impl GetCustomViewsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetCustomViewsTool {
    fn schema(&self) -> ToolSchema {
        module_schema(
            "get_custom_views",
            "List the custom views of a CRM module; their IDs can be passed as cvid to get_records",
        )
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: ModuleArgs = parse_args("get_custom_views", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get("settings/custom_views").query("module", module);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to list the related lists of a module
pub struct GetRelatedListsTool {
    client: ZohoClient,
}

impl GetRelatedListsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetRelatedListsTool {
    fn schema(&self) -> ToolSchema {
        let mut schema = module_schema(
            "get_related_lists",
            "List the related lists of a CRM module; use their api_name with get_related_records",
        );
        schema.input_schema["properties"]["module"] =
            json_schema_string("API name of the parent module, e.g. Accounts");
        schema
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: ModuleArgs = parse_args("get_related_lists", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get("settings/related_lists").query("module", module);

        Ok(self.client.dispatch(request).await?)
    }
}
