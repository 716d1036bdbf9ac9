// Related list tools

use super::{
    check_batch, fields_property, module_property, page_property, parse_args, path_segment,
    per_page_property,
};
use crate::protocol::ToolSchema;
use crate::tools::{
    json_schema_array, json_schema_object, json_schema_record, json_schema_string, Tool,
    ToolAccess,
};
use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use zoho_crm_sdk::{ApiRequest, ZohoClient};

fn related_list_property() -> Value {
    json_schema_string("API name of the related list, e.g. Contacts, Deals, Notes (see get_related_lists)")
}

/// `<module>/<record_id>/<related_list>` after validating each segment.
fn related_path(module: &str, record_id: &str, related_list: &str) -> Result<String> {
    Ok(format!(
        "{}/{}/{}",
        path_segment("module", module)?,
        path_segment("record_id", record_id)?,
        path_segment("related_list", related_list)?
    ))
}

/// Tool to list the records of a related list
pub struct GetRelatedRecordsTool {
    client: ZohoClient,
}

impl GetRelatedRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetRelatedRecordsArgs {
    module: String,
    record_id: String,
    related_list: String,
    fields: String,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for GetRelatedRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_related_records".to_string(),
            description: "List the records in a related list of a CRM record, e.g. the Contacts of an Account".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "record_id": json_schema_string("ID of the parent record"),
                    "related_list": related_list_property(),
                    "fields": fields_property(),
                    "page": page_property(),
                    "per_page": per_page_property()
                }),
                vec!["module", "record_id", "related_list", "fields"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetRelatedRecordsArgs = parse_args("get_related_records", arguments)?;
        let path = related_path(&args.module, &args.record_id, &args.related_list)?;

        let request = ApiRequest::get(path)
            .query("fields", args.fields)
            .query_opt("page", args.page)
            .query_opt("per_page", args.per_page);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to link records into a related list or update the relation
pub struct UpdateRelatedRecordsTool {
    client: ZohoClient,
}

impl UpdateRelatedRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateRelatedRecordsArgs {
    module: String,
    record_id: String,
    related_list: String,
    records: Vec<Map<String, Value>>,
}

#[async_trait::async_trait]
impl Tool for UpdateRelatedRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "update_related_records".to_string(),
            description: "Associate records with a CRM record through a related list, or update relation fields. Each entry needs the related record's `id`.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "record_id": json_schema_string("ID of the parent record"),
                    "related_list": related_list_property(),
                    "records": json_schema_array(json_schema_record("Related record `id` plus relation fields"), "Related records to link or update")
                }),
                vec!["module", "record_id", "related_list", "records"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: UpdateRelatedRecordsArgs = parse_args("update_related_records", arguments)?;
        let path = related_path(&args.module, &args.record_id, &args.related_list)?;
        check_batch("records", &args.records)?;
        if let Some(index) = args.records.iter().position(|r| !r.contains_key("id")) {
            bail!("records[{}] is missing its id", index);
        }

        let request = ApiRequest::put(path).body(json!({ "data": args.records }));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to remove a record from a related list
pub struct DelinkRelatedRecordTool {
    client: ZohoClient,
}

impl DelinkRelatedRecordTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DelinkRelatedRecordArgs {
    module: String,
    record_id: String,
    related_list: String,
    related_record_id: String,
}

#[async_trait::async_trait]
impl Tool for DelinkRelatedRecordTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delink_related_record".to_string(),
            description: "Remove the association between a CRM record and one record of its related list. Neither record is deleted.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "record_id": json_schema_string("ID of the parent record"),
                    "related_list": related_list_property(),
                    "related_record_id": json_schema_string("ID of the related record to unlink")
                }),
                vec!["module", "record_id", "related_list", "related_record_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: DelinkRelatedRecordArgs = parse_args("delink_related_record", arguments)?;
        let path = related_path(&args.module, &args.record_id, &args.related_list)?;
        let related_id = path_segment("related_record_id", &args.related_record_id)?;

        let request = ApiRequest::delete(format!("{}/{}", path, related_id));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Destructive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::client_for;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_related_records_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v7/Accounts/10/Contacts"))
            .and(query_param("fields", "Last_Name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "id": "11" }] })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = GetRelatedRecordsTool::new(client_for(&server));
        let result = tool
            .execute(json!({
                "module": "Accounts",
                "record_id": "10",
                "related_list": "Contacts",
                "fields": "Last_Name"
            }))
            .await
            .unwrap();

        assert_eq!(result["data"][0]["id"], "11");
    }

    #[tokio::test]
    async fn test_update_related_records_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/crm/v7/Contacts/5/Campaigns"))
            .and(body_json(json!({ "data": [{ "id": "8", "Member_Status": "Responded" }] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = UpdateRelatedRecordsTool::new(client_for(&server));
        tool.execute(json!({
            "module": "Contacts",
            "record_id": "5",
            "related_list": "Campaigns",
            "records": [{ "id": "8", "Member_Status": "Responded" }]
        }))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_delink_related_record() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/crm/v7/Accounts/10/Contacts/11"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "code": "SUCCESS" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = DelinkRelatedRecordTool::new(client_for(&server));
        let result = tool
            .execute(json!({
                "module": "Accounts",
                "record_id": "10",
                "related_list": "Contacts",
                "related_record_id": "11"
            }))
            .await
            .unwrap();

        assert_eq!(result["data"][0]["code"], "SUCCESS");
    }
}
