//! Assistant 回复解析与回复视图
//!
//! 回复按以下顺序解析：整段 JSON → ```json 代码块 → 首个 `{` 到最后一个 `}`；
//! 都失败时保留原文为 `{ fallback_key: text }`，不视为错误。

use serde::Serialize;
use serde_json::{Map, Value};

/// 单个 specialist 的回复（结构由 Assistant 决定，流水线不校验）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AgentResponse(Value);

impl AgentResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// 把 Assistant 的文本回复解析为 JSON；无法解析时包装成 `{fallback_key: text}`
pub fn parse_reply(text: &str, fallback_key: &str) -> Value {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value;
    }

    if let Some(block) = fenced_json(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            return value;
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return value;
            }
        }
    }

    tracing::warn!(
        "Reply is not JSON ({} chars), keeping it under \"{}\"",
        trimmed.len(),
        fallback_key
    );
    let mut map = Map::new();
    map.insert(fallback_key.to_string(), Value::String(text.to_string()));
    Value::Object(map)
}

fn fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```json")?;
    let rest = &text[start + 7..];
    Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()))
}

/// 回复视图：先按 JSON Pointer 截取子树，再只保留指定类别
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseView {
    pointer: Option<String>,
    categories: Vec<String>,
}

impl ResponseView {
    pub fn new(pointer: Option<String>, categories: Vec<String>) -> Self {
        Self {
            pointer: pointer.filter(|p| !p.is_empty()),
            categories,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.pointer.is_none() && self.categories.is_empty()
    }

    /// 应用视图；Pointer 未命中时保留整个回复
    pub fn apply(&self, value: Value) -> Value {
        let value = match &self.pointer {
            Some(pointer) => match value.pointer(pointer) {
                Some(sub) => sub.clone(),
                None => {
                    tracing::warn!("Pointer {} not found in reply, keeping full reply", pointer);
                    value
                }
            },
            None => value,
        };

        if self.categories.is_empty() {
            return value;
        }
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(k, _)| self.categories.iter().any(|c| c == k))
                    .collect(),
            ),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let value = parse_reply(r#"{"analysis": {"recommendations": ["a"]}}"#, "raw_content");
        assert_eq!(value, json!({"analysis": {"recommendations": ["a"]}}));
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "Hier ist die Analyse:\n```json\n{\"ok\": true}\n```\nViel Erfolg!";
        assert_eq!(parse_reply(text, "raw_content"), json!({"ok": true}));
    }

    #[test]
    fn test_parse_embedded_braces() {
        let text = "Analysis follows {\n  \"a\": {\"b\": 1}\n} end";
        assert_eq!(parse_reply(text, "raw_content"), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_parse_fallback_keeps_text() {
        let text = "Leider keine strukturierte Antwort {unvollständig";
        assert_eq!(parse_reply(text, "raw_output"), json!({"raw_output": text}));
    }

    #[test]
    fn test_view_pointer_and_categories() {
        let view = ResponseView::new(
            Some("/integrations_analyse".to_string()),
            vec!["jobcenter_anbindung".to_string()],
        );
        let reply = json!({
            "integrations_analyse": {
                "jobcenter_anbindung": {"status": "angemeldet"},
                "sprachliche_integration": {"bedarf": "B1"}
            }
        });
        assert_eq!(
            view.apply(reply),
            json!({"jobcenter_anbindung": {"status": "angemeldet"}})
        );
    }

    #[test]
    fn test_view_missing_pointer_keeps_reply() {
        let view = ResponseView::new(Some("/nope".to_string()), vec![]);
        let reply = json!({"raw_content": "text"});
        assert_eq!(view.apply(reply.clone()), reply);
    }

    #[test]
    fn test_empty_pointer_is_identity() {
        assert!(ResponseView::new(Some(String::new()), vec![]).is_identity());
    }
}
