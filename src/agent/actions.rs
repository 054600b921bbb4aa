//! `[ACTION]` payload parsing.
//!
//! The model replies with display text, then zero or more `[ACTION]` markers
//! each followed by a JSON object. Models wrap JSON in code fences or append
//! trailing prose often enough that decoding tries three shapes in order:
//! fenced payload, the raw block, then the first balanced `{...}` object.
//! A block that survives none of them is logged and dropped rather than
//! failing the turn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker separating display text from machine-readable payloads.
pub const ACTION_MARKER: &str = "[ACTION]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UpdateContact,
    AddContact,
    Search,
    DeleteContact,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::UpdateContact => "update_contact",
            ActionKind::AddContact => "add_contact",
            ActionKind::Search => "search",
            ActionKind::DeleteContact => "delete_contact",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "update_contact" => Some(ActionKind::UpdateContact),
            "add_contact" => Some(ActionKind::AddContact),
            "search" => Some(ActionKind::Search),
            "delete_contact" => Some(ActionKind::DeleteContact),
            _ => None,
        }
    }
}

/// Missing or unrecognized confidence is treated as low, so an
/// underspecified action can never auto-execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Low,
}

/// One decoded action payload. `action` stays a raw string so an unknown
/// verb still parses and can be reported instead of vanishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub action: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_value_extract: Option<String>,
}

impl AgentAction {
    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::parse(&self.action)
    }

    /// Field map with JSON scalars flattened to cell text. Null becomes an
    /// empty cell (a field clear), numbers and booleans their literal form.
    pub fn string_fields(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(key, value)| (key.clone(), value_to_cell(value)))
            .collect()
    }
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Split a model reply into display text and decoded actions.
pub fn parse_actions(text: &str) -> (String, Vec<AgentAction>) {
    if !text.contains(ACTION_MARKER) {
        return (text.trim().to_string(), Vec::new());
    }
    let mut parts = text.split(ACTION_MARKER);
    let message = parts.next().unwrap_or("").trim().to_string();

    let mut actions = Vec::new();
    for part in parts {
        match decode_action(part) {
            Some(action) => actions.push(action),
            None => {
                let head: String = part.trim().chars().take(80).collect();
                log::warn!("dropping undecodable action block: {head}");
            }
        }
    }
    (message, actions)
}

fn decode_action(part: &str) -> Option<AgentAction> {
    let candidate = fenced_payload(part).unwrap_or_else(|| part.trim());
    if let Ok(action) = serde_json::from_str::<AgentAction>(candidate) {
        return Some(action);
    }
    // Trailing prose or an unfenced object: take the first balanced object.
    let object = extract_json_object(part)?;
    serde_json::from_str(object).ok()
}

fn fenced_payload(part: &str) -> Option<&str> {
    if let Some(start) = part.find("```json") {
        let after = &part[start + 7..];
        if let Some(end) = after.find("```") {
            return Some(after[..end].trim());
        }
    }
    if let Some(start) = part.find("```") {
        let after = &part[start + 3..];
        if let Some(end) = after.find("```") {
            let candidate = after[..end].trim();
            if candidate.starts_with('{') {
                return Some(candidate);
            }
        }
    }
    None
}

/// First balanced `{...}` in `text`, tracking string literals so braces
/// inside quoted values do not unbalance the scan.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_without_marker_is_plain_message() {
        let (message, actions) = parse_actions("  네, 김민준님은 네이버에 계십니다.  ");
        assert_eq!(message, "네, 김민준님은 네이버에 계십니다.");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_marker_splits_message_from_action() {
        let text = concat!(
            "점심 기록했어요.\n",
            "[ACTION]\n",
            "{\"action\": \"update_contact\", \"name\": \"김민준\", \"confidence\": \"high\",\n",
            " \"fields\": {\"last_contact\": \"2025-08-25\"}}"
        );
        let (message, actions) = parse_actions(text);
        assert_eq!(message, "점심 기록했어요.");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind(), Some(ActionKind::UpdateContact));
        assert_eq!(actions[0].confidence, Confidence::High);
        assert_eq!(
            actions[0].fields.get("last_contact").and_then(Value::as_str),
            Some("2025-08-25")
        );
    }

    #[test]
    fn test_json_fence_is_stripped() {
        let text = "기록합니다.\n[ACTION]\n```json\n{\"action\": \"search\", \"name\": \"박서연\"}\n```";
        let (_, actions) = parse_actions(text);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind(), Some(ActionKind::Search));
    }

    #[test]
    fn test_bare_fence_with_object_is_accepted() {
        let text = "확인했어요.\n[ACTION]\n```\n{\"action\": \"delete_contact\", \"name\": \"이도윤\", \"confidence\": \"low\"}\n```";
        let (_, actions) = parse_actions(text);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind(), Some(ActionKind::DeleteContact));
    }

    #[test]
    fn test_trailing_prose_falls_back_to_brace_scan() {
        let text = concat!(
            "업데이트할게요.\n",
            "[ACTION]\n",
            "{\"action\": \"update_contact\", \"name\": \"김민준\", \"fields\": {\"title\": \"이사\"}}\n",
            "위 작업을 실행합니다."
        );
        let (_, actions) = parse_actions(text);
        assert_eq!(actions.len(), 1);
        assert_eq!(
            actions[0].fields.get("title").and_then(Value::as_str),
            Some("이사")
        );
    }

    #[test]
    fn test_braces_inside_string_values_stay_balanced() {
        let text = concat!(
            "메모 추가.\n",
            "[ACTION]\n",
            "{\"action\": \"update_contact\", \"name\": \"김민준\", ",
            "\"fields\": {\"follow_up_note\": \"중괄호 {예시} 포함 \\\"인용\\\"\"}} 끝."
        );
        let (_, actions) = parse_actions(text);
        assert_eq!(actions.len(), 1);
        assert_eq!(
            actions[0].fields.get("follow_up_note").and_then(Value::as_str),
            Some("중괄호 {예시} 포함 \"인용\"")
        );
    }

    #[test]
    fn test_undecodable_block_is_skipped_but_rest_survive() {
        let text = concat!(
            "두 건 처리합니다.\n",
            "[ACTION]\n",
            "이건 JSON이 아닙니다\n",
            "[ACTION]\n",
            "{\"action\": \"search\", \"name\": \"최지우\"}"
        );
        let (message, actions) = parse_actions(text);
        assert_eq!(message, "두 건 처리합니다.");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "최지우");
    }

    #[test]
    fn test_missing_confidence_defaults_to_low() {
        let (_, actions) =
            parse_actions("x\n[ACTION]\n{\"action\": \"update_contact\", \"name\": \"김민준\"}");
        assert_eq!(actions[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_string_fields_coerces_scalars() {
        let (_, actions) = parse_actions(concat!(
            "x\n[ACTION]\n",
            "{\"action\": \"update_contact\", \"name\": \"김민준\", ",
            "\"fields\": {\"follow_up_note\": null, \"title\": \"팀장\", \"contact_priority\": 3}}"
        ));
        let fields = actions[0].string_fields();
        assert_eq!(fields.get("follow_up_note").map(String::as_str), Some(""));
        assert_eq!(fields.get("title").map(String::as_str), Some("팀장"));
        assert_eq!(fields.get("contact_priority").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_unknown_action_verb_still_parses() {
        let (_, actions) =
            parse_actions("x\n[ACTION]\n{\"action\": \"merge_contacts\", \"name\": \"김민준\"}");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind(), None);
    }
}
