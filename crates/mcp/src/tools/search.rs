// Search tools: criteria search and COQL queries

use super::{fields_property, module_property, page_property, parse_args, path_segment, per_page_property};
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_boolean, json_schema_object, json_schema_string, Tool};
use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use zoho_crm_sdk::{ApiRequest, ZohoClient};

/// Tool to search records by criteria, email, phone or keyword
pub struct SearchRecordsTool {
    client: ZohoClient,
}

impl SearchRecordsTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct SearchRecordsArgs {
    module: String,
    #[serde(default)]
    criteria: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    fields: Option<String>,
    #[serde(default)]
    converted: Option<bool>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
}

#[async_trait::async_trait]
impl Tool for SearchRecordsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_records".to_string(),
            description: "Search records of a CRM module. Provide one of criteria, email, phone or word.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "module": module_property(),
                    "criteria": json_schema_string("Criteria expression, e.g. ((Last_Name:equals:Doe)and(City:starts_with:Ber))"),
                    "email": json_schema_string("Match on any email field"),
                    "phone": json_schema_string("Match on any phone field"),
                    "word": json_schema_string("Keyword matched across text fields"),
                    "fields": fields_property(),
                    "converted": json_schema_boolean("Include converted records (Leads only)"),
                    "page": page_property(),
                    "per_page": per_page_property()
                }),
                vec!["module"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: SearchRecordsArgs = parse_args("search_records", arguments)?;
        let module = path_segment("module", &args.module)?;

        if args.criteria.is_none() && args.email.is_none() && args.phone.is_none() && args.word.is_none() {
            bail!("search_records needs one of criteria, email, phone or word");
        }

        let request = ApiRequest::get(format!("{}/search", module))
            .query_opt("criteria", args.criteria)
            .query_opt("email", args.email)
            .query_opt("phone", args.phone)
            .query_opt("word", args.word)
            .query_opt("fields", args.fields)
            .query_opt("converted", args.converted)
            .query_opt("page", args.page)
            .query_opt("per_page", args.per_page);

        Ok(self.client.dispatch(request).await?)
    }
}

/// Tool to run a COQL select query
pub struct CoqlQueryTool {
    client: ZohoClient,
}

impl CoqlQueryTool {
    pub fn new(client: ZohoClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct CoqlQueryArgs {
    select_query: String,
}

#[async_trait::async_trait]
impl Tool for CoqlQueryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "execute_coql_query".to_string(),
            description: "Run a COQL (CRM Object Query Language) SELECT query. A WHERE clause is required; use LIMIT offset, count to page (max 2000 rows per query).".to_string(),
            input_schema: json_schema_object(
                json!({
                    "select_query": json_schema_string("e.g. select Last_Name, Email from Leads where Lead_Source = 'Web' limit 50")
                }),
                vec!["select_query"],
            ),
            annotations: None,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<Value> {
        let args: CoqlQueryArgs = parse_args("execute_coql_query", arguments)?;
        let query = args.select_query.trim();

        if !query
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("select"))
        {
            bail!("Only SELECT statements are supported by COQL");
        }

        let request = ApiRequest::post("coql").body(json!({ "select_query": query }));

        Ok(self.client.dispatch(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::client_for;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_by_email() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v7/Contacts/search"))
            .and(query_param("email", "jane@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "id": "9" }] })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = SearchRecordsTool::new(client_for(&server));
        let result = tool
            .execute(json!({ "module": "Contacts", "email": "jane@example.com" }))
            .await
            .unwrap();

        assert_eq!(result["data"][0]["id"], "9");
    }

    #[tokio::test]
    async fn test_search_with_no_matches_returns_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/crm/v7/Leads/search"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let tool = SearchRecordsTool::new(client_for(&server));
        let result = tool
            .execute(json!({ "module": "Leads", "word": "nobody" }))
            .await
            .unwrap();

        assert_eq!(result, json!({ "status": "success", "message": "No content" }));
    }

    #[tokio::test]
    async fn test_search_requires_a_filter() {
        let server = MockServer::start().await;
        let tool = SearchRecordsTool::new(client_for(&server));

        assert!(tool.execute(json!({ "module": "Leads" })).await.is_err());
    }

    #[tokio::test]
    async fn test_coql_query() {
        let server = MockServer::start().await;
        let query = "select Last_Name from Leads where Last_Name is not null limit 2";

        Mock::given(method("POST"))
            .and(path("/crm/v7/coql"))
            .and(body_json(json!({ "select_query": query })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "Last_Name": "Doe", "id": "1" }],
                "info": { "count": 1, "more_records": false }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CoqlQueryTool::new(client_for(&server));
        let result = tool.execute(json!({ "select_query": query })).await.unwrap();

        assert_eq!(result["info"]["count"], 1);
    }

    #[tokio::test]
    async fn test_coql_rejects_non_select() {
        let server = MockServer::start().await;
        let tool = CoqlQueryTool::new(client_for(&server));

        let err = tool
            .execute(json!({ "select_query": "delete from Leads" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SELECT"));
    }
}
