// Tag tools

use super::{check_batch, module_property, parse_args, path_segment};
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_array, json_schema_boolean, json_schema_object, json_schema_string, Tool, ToolAccess};
use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use zoho_crm_sdk::{ApiRequest, ZohoClient};

/// Tool to list the tags defined for a module
pub struct GetTagsTool {
    client: ZohoClient,
}

impl GetTagsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetTagsArgs {
    module: String,
}

#[async_trait::async_trait]
impl Tool for GetTagsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_tags".to_string(),
            description: "List the tags defined for a CRM module".to_string(),
            input_schema: json_schema_object(json!({ "module": module_property() }), vec!["module"]),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetTagsArgs = parse_args("get_tags", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get("settings/tags").query("module", module);

        Ok(self.client.dispatch(request).await?)
    }
}

#[derive(Debug, Deserialize)]
struct TagRecordsArgs {
    module: String,
    record_ids: Vec<String>,
    tag_names: Vec<String>,
    #[serde(default)]
    over_write: Option<bool>,
}

impl TagRecordsArgs {
    fn into_request(self, action: &str) -> Result<ApiRequest> {
        let module = path_segment("module", &self.module)?;
        check_batch("record_ids", &self.record_ids)?;
        check_batch("tag_names", &self.tag_names)?;

        let tags: Vec<Value> = self
            .tag_names
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();
        let mut body = json!({ "tags": tags, "ids": self.record_ids });
        if let Some(over_write) = self.over_write {
            body["over_write"] = json!(over_write);
        }

        Ok(ApiRequest::post(format!("{}/actions/{}", module, action)).body(body))
    }
}

fn tag_records_schema(name: &str, description: &str, with_over_write: bool) -> ToolSchema {
    let mut properties = json!({
        "module": module_property(),
        "record_ids": json_schema_array(json_schema_string("Record ID"), "Records to tag"),
        "tag_names": json_schema_array(json_schema_string("Tag name"), "Tags to apply")
    });
    if with_over_write {
        properties["over_write"] =
            json_schema_boolean("Replace the records' existing tags instead of adding to them");
    }

    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json_schema_object(properties, vec!["module", "record_ids", "tag_names"]),
        annotations: None,
    }
}

/// Tool to add tags to records
pub struct AddTagsTool {
    client: ZohoClient,
}

impl AddTagsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for AddTagsTool {
    fn schema(&self) -> ToolSchema {
        tag_records_schema(
            "add_tags",
            "Add tags to CRM records; unknown tag names are created",
            true,
        )
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: TagRecordsArgs = parse_args("add_tags", arguments)?;
        Ok(self.client.dispatch(args.into_request("add_tags")?).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to remove tags from records
pub struct RemoveTagsTool {
    client: ZohoClient,
}

impl RemoveTagsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for RemoveTagsTool {
    fn schema(&self) -> ToolSchema {
        tag_records_schema("remove_tags", "Remove tags from CRM records", false)
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let mut args: TagRecordsArgs = parse_args("remove_tags", arguments)?;
        args.over_write = None;
        Ok(self.client.dispatch(args.into_request("remove_tags")?).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}
