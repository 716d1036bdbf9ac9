// Note tools

use super::{module_property, page_property, parse_args, path_segment, per_page_property};
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, json_schema_string, Tool, ToolAccess};
use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use zoho_crm_sdk::{ApiRequest, ZohoClient};

/// Fields requested when the caller does not name any.
const DEFAULT_NOTE_FIELDS: &str = "Note_Title,Note_Content,Owner,Created_Time,Modified_Time";

/// Tool to list the notes attached to a record
pub struct GetNotesTool {
    client: ZohoClient,
}

impl GetNotesTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct GetNotesArgs {
    module: String,
    record_id: String,
    #[serde(default)]
    fields: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for GetNotesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_notes".to_string(),
            description: "List the notes attached to a CRM record".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "record_id": json_schema_string("ID of the record"),
                    "fields": json_schema_string(&format!("Comma-separated note fields (default: {})", DEFAULT_NOTE_FIELDS)),
                    "page": page_property(),
                    "per_page": per_page_property()
                }),
                vec!["module", "record_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: GetNotesArgs = parse_args("get_notes", arguments)?;
        let module = path_segment("module", &args.module)?;
        let record_id = path_segment("record_id", &args.record_id)?;

        let request = ApiRequest::get(format!("{}/{}/Notes", module, record_id))
            .query(
                "fields",
                args.fields.as_deref().unwrap_or(DEFAULT_NOTE_FIELDS),
            )
            .query_opt("page", args.page)
            .query_opt("per_page", args.per_page);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to attach a note to a record
pub struct CreateNoteTool {
    client: ZohoClient,
}

impl CreateNoteTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct CreateNoteArgs {
    module: String,
    record_id: String,
    #[serde(default)]
    note_title: Option<String>,
    note_content: String,
}

#[async_trait::async_trait]
impl Tool for CreateNoteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_note".to_string(),
            description: "Attach a note to a CRM record".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "record_id": json_schema_string("ID of the record"),
                    "note_title": json_schema_string("Title of the note"),
                    "note_content": json_schema_string("Body of the note")
                }),
                vec!["module", "record_id", "note_content"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: CreateNoteArgs = parse_args("create_note", arguments)?;
        let module = path_segment("module", &args.module)?;
        let record_id = path_segment("record_id", &args.record_id)?;

        let mut note = Map::new();
        if let Some(title) = args.note_title {
            note.insert("Note_Title".into(), json!(title));
        }
        note.insert("Note_Content".into(), json!(args.note_content));

        let request = ApiRequest::post(format!("{}/{}/Notes", module, record_id))
            .body(json!({ "data": [note] }));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to edit a note
pub struct UpdateNoteTool {
    client: ZohoClient,
}

impl UpdateNoteTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateNoteArgs {
    note_id: String,
    #[serde(default)]
    note_title: Option<String>,
    #[serde(default)]
    note_content: Option<String>,
}

#[async_trait::async_trait]
impl Tool for UpdateNoteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "update_note".to_string(),
            description: "Change the title or content of a note".to_string(),
            input_schema: json_schema_object(
                json!({
                    "note_id": json_schema_string("ID of the note"),
                    "note_title": json_schema_string("New title"),
                    "note_content": json_schema_string("New body")
                }),
                vec!["note_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: UpdateNoteArgs = parse_args("update_note", arguments)?;
        let note_id = path_segment("note_id", &args.note_id)?;

        let mut note = Map::new();
        if let Some(title) = args.note_title {
            note.insert("Note_Title".into(), json!(title));
        }
        if let Some(content) = args.note_content {
            note.insert("Note_Content".into(), json!(content));
        }
        if note.is_empty() {
            bail!("update_note needs note_title or note_content");
        }

        let request = ApiRequest::put(format!("Notes/{}", note_id)).body(json!({ "data": [note] }));

        Ok(self.client.dispatch(request).await?)
    }

    fn access(&self) -> ToolAccess {
        ToolAccess::Write
    }
}

/// Tool to delete a note
pub struct DeleteNoteTool {
    client: ZohoClient,
}

impl DeleteNoteTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteNoteArgs {
    note_id: String,
}

#[async_trait::async_trait]
impl Tool for DeleteNoteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_note".to_string(),
            description: "Delete a note".to_string(),
            input_schema: json_schema_object(
                json!({ "note_id": json_schema_string("ID of the note") }),
                vec!["note_id"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: DeleteNoteArgs = parse_args("delete_note", arguments)?;
        let note_id = path_segment("note_id", &args.note_id)?;

        Ok(self
            .client
            .dispatch(ApiRequest::delete(format!("Notes/{}", note_id)))
            .await?)
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
    async fn test_get_notes_uses_default_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v7/Leads/3/Notes"))
            .and(query_param("fields", DEFAULT_NOTE_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = GetNotesTool::new(client_for(&server));
        tool.execute(json!({ "module": "Leads", "record_id": "3" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_note_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/crm/v7/Deals/4/Notes"))
            .and(body_json(json!({
                "data": [{ "Note_Title": "Call", "Note_Content": "Left a voicemail" }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": [{ "code": "SUCCESS" }] })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CreateNoteTool::new(client_for(&server));
        tool.execute(json!({
            "module": "Deals",
            "record_id": "4",
            "note_title": "Call",
            "note_content": "Left a voicemail"
        }))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_update_note_requires_a_change() {
        let server = MockServer::start().await;
        let tool = UpdateNoteTool::new(client_for(&server));

        let err = tool.execute(json!({ "note_id": "1" })).await.unwrap_err();
        assert!(err.to_string().contains("note_title or note_content"));
    }

    #[tokio::test]
    async fn test_delete_note() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/crm/v7/Notes/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "code": "SUCCESS" }] })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = DeleteNoteTool::new(client_for(&server));
        tool.execute(json!({ "note_id": "12" })).await.unwrap();
    }
}
