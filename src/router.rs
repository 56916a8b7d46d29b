//! Routing of raw model output into a typed action.
//!
//! Language models rarely emit a bare JSON object on request; completions
//! arrive wrapped in prose, code fences, or nothing at all. [`route`] runs a
//! fixed two-step parse over the completion and classifies it as a plain
//! answer, an explicit no-op, or a named tool call. It is a total function:
//! malformed output is never an error, it is a plain-text answer.

use regex::Regex;
use serde_json::{Map, Value};

/// The typed result of routing one completion.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedAction {
    /// The model answered in natural language; the original text, unchanged.
    PlainText(String),
    /// The model explicitly declined to act (`"function": "none"`).
    NoOp,
    /// The model requested a named tool with keyword arguments.
    ToolCall {
        name: String,
        arguments: Map<String, Value>,
    },
}

impl RoutedAction {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RoutedAction::PlainText(_) => "plain_text",
            RoutedAction::NoOp => "no_op",
            RoutedAction::ToolCall { .. } => "tool_call",
        }
    }
}

/// Classifies a raw completion, first match wins:
///
/// 1. Parse the whole trimmed text (minus a surrounding code fence, if any)
///    as a JSON object.
/// 2. Failing that, find the first flat `{... "function" ...}` substring and
///    parse that.
/// 3. With an object in hand, read `function`: missing or empty means the
///    model answered in prose, `"none"` is a no-op, anything else is a tool
///    call whose `arguments` default to the empty map.
///
/// Anything that falls out of the state machine returns the input unchanged.
pub fn route(raw: &str) -> RoutedAction {
    let trimmed = raw.trim();
    let candidate = strip_code_fence(trimmed).unwrap_or(trimmed);

    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => map,
        _ => match find_flat_function_object(raw) {
            Some(map) => map,
            None => return RoutedAction::PlainText(raw.to_string()),
        },
    };

    let name = match object.get("function").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name,
        _ => return RoutedAction::PlainText(raw.to_string()),
    };

    if name == "none" {
        return RoutedAction::NoOp;
    }

    // A non-object `arguments` value fails closed to the empty map.
    let arguments = match object.get("arguments") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    RoutedAction::ToolCall {
        name: name.to_string(),
        arguments,
    }
}

/// Returns the body of a markdown code fence wrapping the entire text.
fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Drop the opening line, which may carry a language hint.
    let (_, body) = rest.split_once('\n')?;
    let body = body.trim_end().strip_suffix("```")?;
    Some(body.trim())
}

/// Finds the first flat JSON object (no nested braces) carrying a
/// `"function"` key and parses it.
fn find_flat_function_object(raw: &str) -> Option<Map<String, Value>> {
    let Ok(pattern) = Regex::new(r#"\{[^{}]*"function"[^{}]*\}"#) else {
        return None;
    };
    let candidate = pattern.find(raw)?;
    match serde_json::from_str::<Value>(candidate.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_call(raw: &str) -> (String, Map<String, Value>) {
        match route(raw) {
            RoutedAction::ToolCall { name, arguments } => (name, arguments),
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn whole_output_as_json_object_routes_to_tool_call() {
        let raw = r#"{"function": "search_arxiv", "arguments": {"query": "au:Hinton"}}"#;
        let (name, arguments) = tool_call(raw);
        assert_eq!(name, "search_arxiv");
        assert_eq!(arguments["query"], "au:Hinton");
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let raw = "\n  {\"function\": \"search_arxiv\", \"arguments\": {\"query\": \"all:qubits\"}}  \n";
        let (name, arguments) = tool_call(raw);
        assert_eq!(name, "search_arxiv");
        assert_eq!(arguments["query"], "all:qubits");
    }

    #[test]
    fn code_fenced_envelope_routes_to_tool_call() {
        let raw = "```json\n{\"function\": \"search_arxiv\", \"arguments\": {\"query\": \"ti:transformer\"}}\n```";
        let (name, arguments) = tool_call(raw);
        assert_eq!(name, "search_arxiv");
        assert_eq!(arguments["query"], "ti:transformer");
    }

    #[test]
    fn flat_envelope_embedded_in_prose_is_found() {
        let raw = r#"Sure, calling the tool now: {"function": "none"} as requested."#;
        assert_eq!(route(raw), RoutedAction::NoOp);
    }

    #[test]
    fn prose_without_json_returns_plain_text_byte_for_byte() {
        let raw = "Hi, how can I help?  ";
        assert_eq!(route(raw), RoutedAction::PlainText(raw.to_string()));
    }

    #[test]
    fn object_without_function_key_is_plain_text() {
        let raw = r#"{"answer": "42"}"#;
        assert_eq!(route(raw), RoutedAction::PlainText(raw.to_string()));
    }

    #[test]
    fn empty_function_name_is_plain_text() {
        let raw = r#"{"function": "", "arguments": {}}"#;
        assert_eq!(route(raw), RoutedAction::PlainText(raw.to_string()));
    }

    #[test]
    fn non_string_function_value_is_plain_text() {
        let raw = r#"{"function": 3}"#;
        assert_eq!(route(raw), RoutedAction::PlainText(raw.to_string()));
    }

    #[test]
    fn bare_array_is_plain_text() {
        let raw = r#"[1, 2, 3]"#;
        assert_eq!(route(raw), RoutedAction::PlainText(raw.to_string()));
    }

    #[test]
    fn function_none_routes_to_no_op() {
        assert_eq!(route(r#"{"function": "none"}"#), RoutedAction::NoOp);
    }

    #[test]
    fn missing_arguments_default_to_empty_map() {
        let (name, arguments) = tool_call(r#"{"function": "search_arxiv"}"#);
        assert_eq!(name, "search_arxiv");
        assert!(arguments.is_empty());
    }

    #[test]
    fn non_object_arguments_default_to_empty_map() {
        let (_, arguments) = tool_call(r#"{"function": "search_arxiv", "arguments": "oops"}"#);
        assert!(arguments.is_empty());
    }

    #[test]
    fn unknown_function_is_still_a_tool_call() {
        let (name, _) = tool_call(r#"{"function": "summon_demon", "arguments": {}}"#);
        assert_eq!(name, "summon_demon");
    }

    #[test]
    fn broken_json_inside_braces_is_plain_text() {
        let raw = r#"here you go {"function": search_arxiv} done"#;
        assert_eq!(route(raw), RoutedAction::PlainText(raw.to_string()));
    }
}
