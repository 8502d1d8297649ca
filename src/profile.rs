//! Profile Loader：从本地 JSON 文件读取用户 profile
//!
//! 只做结构解析：根必须是 JSON 对象，其余字段原样透传给各 Assistant。

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Cannot read profile {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed profile {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Profile {} must be a JSON object, found {found}", path.display())]
    NotAnObject { path: PathBuf, found: &'static str },
}

/// 用户 profile：不透明的 JSON 对象
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// 缩进格式，用于拼进 prompt
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// 读取并解析 profile 文件
pub fn load_profile(path: &Path) -> Result<UserProfile, ProfileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = serde_json::from_str(&text).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(fields) => Ok(UserProfile(fields)),
        other => Err(ProfileError::NotAnObject {
            path: path.to_path_buf(),
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_profile.json");
        std::fs::write(
            &path,
            r#"{"name": "Amina", "kinder": 2, "sprachen": ["arabisch", "deutsch A2"]}"#,
        )
        .unwrap();

        let profile = load_profile(&path).unwrap();
        assert_eq!(profile.fields()["name"], "Amina");
        assert!(profile.to_pretty_json().contains("deutsch A2"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_profile(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ProfileError::Read { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_profile.json");
        std::fs::write(&path, "{\"name\": ").unwrap();
        assert!(matches!(load_profile(&path), Err(ProfileError::Parse { .. })));
    }

    #[test]
    fn test_root_must_be_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_profile.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = load_profile(&path).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }
}
