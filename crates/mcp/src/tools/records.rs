// Record tools: read, create, update, upsert, delete and convert CRM records

use super::{
    check_batch, fields_property, module_property, page_property, parse_args, path_segment,
    per_page_property, trigger_property,
};
use crate::protocol::ToolSchema;
use crate::tools::{
    json_schema_array, json_schema_boolean, json_schema_enum, json_schema_object,
    json_schema_record, json_schema_string, Tool, ToolAccess,
};
use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use zoho_crm_sdk::{ApiRequest, ZohoClient};

/// Build the `{data, trigger}` body used by record writes.
fn records_body(records: Vec<Map<String, Value>>, trigger: Option<Vec<String>>) -> Value {
    let mut body = json!({ "data": records });
    if let Some(trigger) = trigger {
        body["trigger"] = json!(trigger);
    }
    body
}

/// Tool to list records of a module
pub struct GetRecordsTool {
    client: ZohoClient,
}

impl GetRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetRecordsArgs {
    module: String,
    fields: String,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
    #[serde(default)]
    page_token: Option<String>,
    #[serde(default)]
    sort_by: Option<String>,
    #[serde(default)]
    sort_order: Option<String>,
    #[serde(default)]
    cvid: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_records".to_string(),
            description: "List records of a CRM module, one page at a time. The response `info` block reports `more_records` and the `next_page_token` for pages past 2000 records.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "fields": fields_property(),
                    "page": page_property(),
                    "per_page": per_page_property(),
                    "page_token": json_schema_string("Token from a previous page, for records beyond the first 2000"),
                    "sort_by": json_schema_enum(&["id", "Created_Time", "Modified_Time"], "Field to sort by"),
                    "sort_order": json_schema_enum(&["asc", "desc"], "Sort direction"),
                    "cvid": json_schema_string("Custom view ID to list records from")
                }),
                vec!["module", "fields"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetRecordsArgs = parse_args("get_records", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get(module)
            .query("fields", args.fields)
            .query_opt("page", args.page)
            .query_opt("per_page", args.per_page)
            .query_opt("page_token", args.page_token)
            .query_opt("sort_by", args.sort_by)
            .query_opt("sort_order", args.sort_order)
            .query_opt("cvid", args.cvid);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to fetch one record by ID
pub struct GetRecordTool {
    client: ZohoClient,
}

impl GetRecordTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetRecordArgs {
    module: String,
    record_id: String,
    #[serde(default)]
    fields: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetRecordTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_record".to_string(),
            description: "Get a single CRM record by its ID".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "record_id": json_schema_string("ID of the record"),
                    "fields": fields_property()
                }),
                vec!["module", "record_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetRecordArgs = parse_args("get_record", arguments)?;
        let module = path_segment("module", &args.module)?;
        let record_id = path_segment("record_id", &args.record_id)?;

        let request = ApiRequest::get(format!("{}/{}", module, record_id))
            .query_opt("fields", args.fields);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to insert records
pub struct CreateRecordsTool {
    client: ZohoClient,
}

impl CreateRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct WriteRecordsArgs {
    module: String,
    records: Vec<Map<String, Value>>,
    #[serde(default)]
    trigger: Option<Vec<String>>,
}

#[async_trait::async_trait]
impl Tool for CreateRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_records".to_string(),
            description: "Insert up to 100 records into a CRM module. Each record is an object keyed by field API name.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "records": json_schema_array(json_schema_record("Field API name to value"), "Records to insert"),
                    "trigger": trigger_property()
                }),
                vec!["module", "records"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: WriteRecordsArgs = parse_args("create_records", arguments)?;
        let module = path_segment("module", &args.module)?;
        check_batch("records", &args.records)?;

        let request = ApiRequest::post(module).body(records_body(args.records, args.trigger));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to update several records, each identified by its `id` field
pub struct UpdateRecordsTool {
    client: ZohoClient,
}

impl UpdateRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for UpdateRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "update_records".to_string(),
            description: "Update up to 100 records of a CRM module. Every record must include its `id`.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "records": json_schema_array(json_schema_record("Record with `id` and the fields to change"), "Records to update"),
                    "trigger": trigger_property()
                }),
                vec!["module", "records"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: WriteRecordsArgs = parse_args("update_records", arguments)?;
        let module = path_segment("module", &args.module)?;
        check_batch("records", &args.records)?;
        if let Some(index) = args.records.iter().position(|r| !r.contains_key("id")) {
            bail!("records[{}] is missing its id", index);
        }

        let request = ApiRequest::put(module).body(records_body(args.records, args.trigger));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to update one record by ID
pub struct UpdateRecordTool {
    client: ZohoClient,
}

impl UpdateRecordTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateRecordArgs {
    module: String,
    record_id: String,
    record: Map<String, Value>,
    #[serde(default)]
    trigger: Option<Vec<String>>,
}

#[async_trait::async_trait]
impl Tool for UpdateRecordTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "update_record".to_string(),
            description: "Update fields of a single CRM record".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "record_id": json_schema_string("ID of the record"),
                    "record": json_schema_record("Field API name to new value"),
                    "trigger": trigger_property()
                }),
                vec!["module", "record_id", "record"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: UpdateRecordArgs = parse_args("update_record", arguments)?;
        let module = path_segment("module", &args.module)?;
        let record_id = path_segment("record_id", &args.record_id)?;

        let request = ApiRequest::put(format!("{}/{}", module, record_id))
            .body(records_body(vec![args.record], args.trigger));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to delete records by ID
pub struct DeleteRecordsTool {
    client: ZohoClient,
}

impl DeleteRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteRecordsArgs {
    module: String,
    ids: Vec<String>,
    #[serde(default)]
    wf_trigger: Option<bool>,
}

#[async_trait::async_trait]
impl Tool for DeleteRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_records".to_string(),
            description: "Delete up to 100 records of a CRM module. Deleted records move to the recycle bin.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "ids": json_schema_array(json_schema_string("Record ID"), "IDs of the records to delete"),
                    "wf_trigger": json_schema_boolean("Run workflow rules on delete (default: true)")
                }),
                vec!["module", "ids"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: DeleteRecordsArgs = parse_args("delete_records", arguments)?;
        let module = path_segment("module", &args.module)?;
        check_batch("ids", &args.ids)?;

        let request = ApiRequest::delete(module)
            .query("ids", args.ids.join(","))
            .query_opt("wf_trigger", args.wf_trigger);

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Destructive
    }
}

/// Tool to insert or update records matched on duplicate-check fields
pub struct UpsertRecordsTool {
    client: ZohoClient,
}

impl UpsertRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct UpsertRecordsArgs {
    module: String,
    records: Vec<Map<String, Value>>,
    #[serde(default)]
    duplicate_check_fields: Option<Vec<String>>,
    #[serde(default)]
    trigger: Option<Vec<String>>,
}

#[async_trait::async_trait]
impl Tool for UpsertRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "upsert_records".to_string(),
            description: "Insert records, or update the existing ones that match on the duplicate-check fields".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "records": json_schema_array(json_schema_record("Field API name to value"), "Records to upsert"),
                    "duplicate_check_fields": json_schema_array(json_schema_string("Field API name"), "Fields used to find existing records; defaults to the module's unique fields"),
                    "trigger": trigger_property()
                }),
                vec!["module", "records"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: UpsertRecordsArgs = parse_args("upsert_records", arguments)?;
        let module = path_segment("module", &args.module)?;
        check_batch("records", &args.records)?;

        let mut body = records_body(args.records, args.trigger);
        if let Some(fields) = args.duplicate_check_fields {
            body["duplicate_check_fields"] = json!(fields);
        }
        let request = ApiRequest::post(format!("{}/upsert", module)).body(body);

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to list deleted records
pub struct GetDeletedRecordsTool {
    client: ZohoClient,
}

impl GetDeletedRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetDeletedRecordsArgs {
    module: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for GetDeletedRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_deleted_records".to_string(),
            description: "List records deleted from a CRM module".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "type": json_schema_enum(&["all", "recycle", "permanent"], "Which deleted records to list (default: all)"),
                    "page": page_property(),
                    "per_page": per_page_property()
                }),
                vec!["module"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetDeletedRecordsArgs = parse_args("get_deleted_records", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get(format!("{}/deleted", module))
            .query_opt("type", args.kind)
            .query_opt("page", args.page)
            .query_opt("per_page", args.per_page);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to count records of a module
pub struct GetRecordCountTool {
    client: ZohoClient,
}

impl GetRecordCountTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetRecordCountArgs {
    module: String,
    #[serde(default)]
    criteria: Option<String>,
    #[serde(default)]
    cvid: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GetRecordCountTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_record_count".to_string(),
            description: "Count the records of a CRM module, optionally within a custom view or matching criteria".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "criteria": json_schema_string("Search criteria, e.g. (Lead_Status:equals:Contacted)"),
                    "cvid": json_schema_string("Custom view ID")
                }),
                vec!["module"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetRecordCountArgs = parse_args("get_record_count", arguments)?;
        let module = path_segment("module", &args.module)?;

        let request = ApiRequest::get(format!("{}/actions/count", module))
            .query_opt("criteria", args.criteria)
            .query_opt("cvid", args.cvid);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to convert a lead into a contact, account and optionally a deal
pub struct ConvertLeadTool {
    client: ZohoClient,
}

impl ConvertLeadTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ConvertLeadArgs {
    lead_id: String,
    #[serde(default)]
    overwrite: Option<bool>,
    #[serde(default)]
    notify_lead_owner: Option<bool>,
    #[serde(default)]
    notify_new_entity_owner: Option<bool>,
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    contact_id: Option<String>,
    #[serde(default)]
    assign_to: Option<String>,
    #[serde(default)]
    deal: Option<Map<String, Value>>,
}

#[async_trait::async_trait]
impl Tool for ConvertLeadTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "convert_lead".to_string(),
            description: "Convert a lead into a contact and account, optionally creating a deal".to_string(),
            input_schema: json_schema_object(
                json!({
                    "lead_id": json_schema_string("ID of the lead to convert"),
                    "overwrite": json_schema_boolean("Overwrite matching account/contact data with lead data"),
                    "notify_lead_owner": json_schema_boolean("Notify the lead owner"),
                    "notify_new_entity_owner": json_schema_boolean("Notify the owner of the new records"),
                    "account_id": json_schema_string("Existing account to associate the contact with"),
                    "contact_id": json_schema_string("Existing contact to merge the lead into"),
                    "assign_to": json_schema_string("User ID to own the new records"),
                    "deal": json_schema_record("Deal to create, e.g. {\"Deal_Name\": ..., \"Closing_Date\": ..., \"Stage\": ...}")
                }),
                vec!["lead_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: ConvertLeadArgs = parse_args("convert_lead", arguments)?;
        let lead_id = path_segment("lead_id", &args.lead_id)?;

        let mut conversion = Map::new();
        if let Some(overwrite) = args.overwrite {
            conversion.insert("overwrite".into(), json!(overwrite));
        }
        if let Some(notify) = args.notify_lead_owner {
            conversion.insert("notify_lead_owner".into(), json!(notify));
        }
        if let Some(notify) = args.notify_new_entity_owner {
            conversion.insert("notify_new_entity_owner".into(), json!(notify));
        }
        if let Some(id) = args.account_id {
            conversion.insert("Accounts".into(), json!({ "id": id }));
        }
        if let Some(id) = args.contact_id {
            conversion.insert("Contacts".into(), json!({ "id": id }));
        }
        if let Some(id) = args.assign_to {
            conversion.insert("assign_to".into(), json!({ "id": id }));
        }
        if let Some(deal) = args.deal {
            conversion.insert("Deals".into(), Value::Object(deal));
        }

        let request = ApiRequest::post(format!("Leads/{}/actions/convert", lead_id))
            .body(json!({ "data": [conversion] }));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}
