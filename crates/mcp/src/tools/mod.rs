pub mod metadata;
pub mod notes;
pub mod records;
pub mod related;
pub mod search;
pub mod tags;
pub mod users;
mod registry;

pub use metadata::{
    GetCustomViewsTool, GetFieldsTool, GetLayoutsTool, GetModuleTool, GetModulesTool,
    GetRelatedListsTool,
};
pub use notes::{CreateNoteTool, DeleteNoteTool, GetNotesTool, UpdateNoteTool};
pub use records::{
    ConvertLeadTool, CreateRecordsTool, DeleteRecordsTool, GetDeletedRecordsTool,
    GetRecordCountTool, GetRecordTool, GetRecordsTool, UpdateRecordTool, UpdateRecordsTool,
    UpsertRecordsTool,
};
pub use registry::{
    json_schema_array, json_schema_boolean, json_schema_enum, json_schema_integer,
    json_schema_object, json_schema_record, json_schema_string, Tool, ToolAccess, ToolRegistry,
};
pub use related::{DelinkRelatedRecordTool, GetRelatedRecordsTool, UpdateRelatedRecordsTool};
pub use search::{CoqlQueryTool, SearchRecordsTool};
pub use tags::{AddTagsTool, GetTagsTool, RemoveTagsTool};
pub use users::{GetCurrentUserTool, GetOrganizationTool, GetUserTool, GetUsersTool};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use zoho_crm_sdk::ZohoClient;

/// Largest batch the CRM accepts in one insert/update/delete call.
pub(crate) const MAX_BATCH: usize = 100;

/// Register every Zoho CRM tool against one client.
pub fn register_all(registry: &mut ToolRegistry, client: &ZohoClient) {
    // Records
    registry.register(Arc::new(GetRecordsTool::new(client.clone())));
    registry.register(Arc::new(GetRecordTool::new(client.clone())));
    registry.register(Arc::new(CreateRecordsTool::new(client.clone())));
    registry.register(Arc::new(UpdateRecordsTool::new(client.clone())));
    registry.register(Arc::new(UpdateRecordTool::new(client.clone())));
    registry.register(Arc::new(DeleteRecordsTool::new(client.clone())));
    registry.register(Arc::new(UpsertRecordsTool::new(client.clone())));
    registry.register(Arc::new(GetDeletedRecordsTool::new(client.clone())));
    registry.register(Arc::new(GetRecordCountTool::new(client.clone())));
    registry.register(Arc::new(ConvertLeadTool::new(client.clone())));

    // Search
    registry.register(Arc::new(SearchRecordsTool::new(client.clone())));
    registry.register(Arc::new(CoqlQueryTool::new(client.clone())));

    // Metadata
    registry.register(Arc::new(GetModulesTool::new(client.clone())));
    registry.register(Arc::new(GetModuleTool::new(client.clone())));
    registry.register(Arc::new(GetFieldsTool::new(client.clone())));
    registry.register(Arc::new(GetLayoutsTool::new(client.clone())));
    registry.register(Arc::new(GetCustomViewsTool::new(client.clone())));
    registry.register(Arc::new(GetRelatedListsTool::new(client.clone())));

    // Related lists
    registry.register(Arc::new(GetRelatedRecordsTool::new(client.clone())));
    registry.register(Arc::new(UpdateRelatedRecordsTool::new(client.clone())));
    registry.register(Arc::new(DelinkRelatedRecordTool::new(client.clone())));

    // Notes
    registry.register(Arc::new(GetNotesTool::new(client.clone())));
    registry.register(Arc::new(CreateNoteTool::new(client.clone())));
    registry.register(Arc::new(UpdateNoteTool::new(client.clone())));
    registry.register(Arc::new(DeleteNoteTool::new(client.clone())));

    // Tags
    registry.register(Arc::new(GetTagsTool::new(client.clone())));
    registry.register(Arc::new(AddTagsTool::new(client.clone())));
    registry.register(Arc::new(RemoveTagsTool::new(client.clone())));

    // Users and organization
    registry.register(Arc::new(GetUsersTool::new(client.clone())));
    registry.register(Arc::new(GetUserTool::new(client.clone())));
    registry.register(Arc::new(GetCurrentUserTool::new(client.clone())));
    registry.register(Arc::new(GetOrganizationTool::new(client.clone())));
}

/// Deserialize tool arguments, treating missing arguments as an empty object.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).with_context(|| format!("Invalid arguments for {}", tool))
}

/// Validate a value interpolated into a request path.
///
/// Dot segments and percent escapes are refused along with separators, since
/// URL parsing would resolve them and move the request off the API prefix.
pub(crate) fn path_segment<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(|c: char| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
    {
        bail!("{} must be a single non-empty path segment, got {:?}", field, value);
    }
    Ok(value)
}

/// Validate the size of a record batch.
pub(crate) fn check_batch<T>(field: &str, items: &[T]) -> Result<()> {
    if items.is_empty() {
        bail!("{} must contain at least one entry", field);
    }
    if items.len() > MAX_BATCH {
        bail!("{} accepts at most {} entries, got {}", field, MAX_BATCH, items.len());
    }
    Ok(())
}

pub(crate) fn module_property() -> Value {
    json_schema_string("API name of the CRM module, e.g. Leads, Contacts, Accounts, Deals")
}

pub(crate) fn fields_property() -> Value {
    json_schema_string("Comma-separated field API names to return, e.g. Last_Name,Email")
}

pub(crate) fn page_property() -> Value {
    json_schema_integer("Page number, starting at 1")
}

pub(crate) fn per_page_property() -> Value {
    json_schema_integer("Records per page (max 200)")
}

pub(crate) fn trigger_property() -> Value {
    json_schema_array(
        json_schema_enum(&["workflow", "approval", "blueprint"], "Automation to run"),
        "Automations to trigger; omit for the CRM default, pass [] to run none",
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("module", " Leads ").unwrap(), "Leads");
        assert!(path_segment("module", "").is_err());
        assert!(path_segment("module", "Leads/123").is_err());
        assert!(path_segment("record_id", "1?x=1").is_err());
        assert!(path_segment("module", "..").is_err());
        assert!(path_segment("module", ".").is_err());
        assert!(path_segment("module", "%2e%2e").is_err());
        assert!(path_segment("module", "Leads\\..").is_err());
        assert_eq!(path_segment("record_id", "4150868000001").unwrap(), "4150868000001");
    }

    #[test]
    fn test_check_batch() {
        assert!(check_batch::<u8>("records", &[]).is_err());
        assert!(check_batch("records", &[1]).is_ok());
        assert!(check_batch("records", &vec![0; MAX_BATCH + 1]).is_err());
    }

    #[test]
    fn test_parse_args_null_is_empty_object() {
        #[derive(serde::Deserialize)]
        struct Args {
            #[serde(default)]
            page: Option<u32>,
        }

        let args: Args = parse_args("get_modules", Value::Null).unwrap();
        assert!(args.page.is_none());

        let err = parse_args::<Args>("get_modules", serde_json::json!({ "page": "x" }))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Invalid arguments for get_modules"));
    }

    #[test]
    fn test_register_all() {
        let client = ZohoClient::builder().access_token("t").build().unwrap();
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &client);

        assert_eq!(registry.len(), 32);
        for name in ["get_records", "execute_coql_query", "delete_note", "get_organization"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        let delete = registry
            .list_schemas()
            .into_iter()
            .find(|s| s.name == "delete_records")
            .unwrap();
        assert_eq!(delete.annotations.unwrap().destructive_hint, Some(true));
    }
}
