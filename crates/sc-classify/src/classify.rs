// classify.rs — Tool-name and input mapping.
//
// Classification is pure and infallible: unknown tools become
// `unknown.<ToolName>`, malformed input becomes an empty-resource envelope.
// The resource is sanitized (redacted + truncated) before it is placed in
// the envelope; risk detection reads the raw text privately and emits only
// enum values.

use serde_json::Value;

use sc_redact::sanitize;

use crate::envelope::ActionEnvelope;
use crate::risk::{detect_risk_signals, RiskSignal};

/// Input fields consulted for the resource, in priority order.
const RESOURCE_FIELDS: &[&str] = &[
    "file_path",
    "notebook_path",
    "url",
    "command",
    "pattern",
    "query",
    "description",
    "skill",
];

/// The classifier's output: the envelope plus advisory risk signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub envelope: ActionEnvelope,
    pub risk_signals: Vec<RiskSignal>,
}

/// Classify one tool call into an action envelope and risk-signal set.
pub fn classify(tool_name: &str, tool_input: &Value) -> Classification {
    // MCP tool names are `mcp__<server>__<action...>`; the action segments
    // are re-joined with dots. Names missing an action segment cannot form
    // a valid `mcp.<server>.<action>` type and fall through to the unknown
    // mapping below.
    if tool_name.starts_with("mcp__") {
        let segments: Vec<&str> = tool_name.split("__").collect();
        if segments.len() >= 3 && !segments[1].is_empty() && !segments[2].is_empty() {
            let server = segments[1];
            let action = segments[2..].join(".");
            let raw = compact_json(tool_input);
            let action_type = format!("mcp.{server}.{action}");
            let risk_signals = detect_risk_signals(&action_type, &raw);
            return Classification {
                envelope: ActionEnvelope::new(action_type, sanitize(&raw)),
                risk_signals,
            };
        }
    }

    let action_type = map_tool_name(tool_name);
    let raw = extract_resource(tool_input);
    let risk_signals = detect_risk_signals(&action_type, &raw);
    Classification {
        envelope: ActionEnvelope::new(action_type, sanitize(&raw)),
        risk_signals,
    }
}

/// The fixed tool-name mapping table.
fn map_tool_name(tool_name: &str) -> String {
    let mapped = match tool_name {
        "Read" => "safe.read.file",
        "Write" | "Edit" | "NotebookEdit" => "filesystem.write",
        "Bash" => "code.exec",
        "Glob" => "safe.read.glob",
        "Grep" => "safe.read.grep",
        "WebFetch" => "network.http",
        "WebSearch" => "network.search",
        "Task" => "agent.subagent",
        "TaskStop" => "code.exec.kill",
        "TodoWrite" | "AskUserQuestion" | "ExitPlanMode" | "EnterPlanMode"
        | "ListMcpResourcesTool" | "ReadMcpResourceTool" | "Skill" | "TaskOutput" => {
            "safe.read.meta"
        }
        _ => return format!("unknown.{tool_name}"),
    };
    mapped.to_string()
}

/// Pull the raw resource out of the tool input: the first populated string
/// field from the priority list, else the compact JSON of the whole input.
fn extract_resource(tool_input: &Value) -> String {
    if let Value::Object(map) = tool_input {
        for field in RESOURCE_FIELDS {
            if let Some(Value::String(s)) = map.get(*field) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
    }
    compact_json(tool_input)
}

/// Compact JSON rendering of the input; null (absent input) is treated as
/// empty rather than the literal string "null".
fn compact_json(tool_input: &Value) -> String {
    if tool_input.is_null() {
        return String::new();
    }
    serde_json::to_string(tool_input).unwrap_or_default()
}
