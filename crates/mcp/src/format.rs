// Rendering of tool outcomes into MCP tool results

use crate::protocol::CallToolResult;
use serde_json::Value;
use std::fmt;

/// Longest text, in characters, returned from a single tool call.
pub const MAX_RESPONSE_CHARS: usize = 100_000;

/// Appended to responses cut at [`MAX_RESPONSE_CHARS`].
pub const TRUNCATION_NOTICE: &str = "\n\n... [Response truncated at 100000 characters. \
Use pagination (page, per_page, page_token) or narrower fields/criteria to retrieve smaller result sets.]";

/// Render a successful payload as indented JSON, truncated if too long.
pub fn format_result(data: &Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    CallToolResult::text(truncate(text))
}

/// Render any failure as an error tool result.
///
/// Uses the alternate form so an `anyhow` chain keeps its causes.
pub fn map_error<E: fmt::Display + ?Sized>(error: &E) -> CallToolResult {
    CallToolResult::error(format!("{:#}", error))
}

fn truncate(mut text: String) -> String {
    if let Some((cut, _)) = text.char_indices().nth(MAX_RESPONSE_CHARS) {
        text.truncate(cut);
        text.push_str(TRUNCATION_NOTICE);
    }
    text
}
