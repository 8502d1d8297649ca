//! Output Writer：原子写入策略文档（临时文件 + rename），失败时不留下半截文件

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::agents::AgentKind;
use crate::composer::StrategyDocument;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot encode strategy document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 以缩进 JSON 写入策略文档，覆盖已有内容
pub fn write_strategy(path: &Path, document: &StrategyDocument) -> Result<(), OutputError> {
    let mut content = serde_json::to_string_pretty(document)?;
    content.push('\n');
    atomic_write(path, content.as_bytes())
}

/// 保存某个 specialist 的原始回复到 `<dir>/<kind>_analysis.txt`
pub fn write_analysis(dir: &Path, kind: AgentKind, raw: &str) -> Result<PathBuf, OutputError> {
    let path = dir.join(format!("{}_analysis.txt", kind));
    atomic_write(&path, raw.as_bytes())?;
    Ok(path)
}

fn atomic_write(path: &Path, content: &[u8]) -> Result<(), OutputError> {
    let err = |source: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(err)?;

    let mut temp = NamedTempFile::new_in(&parent).map_err(err)?;
    temp.write_all(content).map_err(err)?;
    temp.flush().map_err(err)?;
    temp.persist(path).map_err(|e| err(e.error))?;

    tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_strategy_roundtrips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("generated_strategy.json");
        let doc = StrategyDocument::new(json!({"milestones": [{"title": "Sprache", "to_dos": []}]}));

        write_strategy(&path, &doc).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(&written, doc.as_value());
    }

    #[test]
    fn test_write_strategy_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_strategy.json");
        std::fs::write(&path, "old content that is much longer than the new document").unwrap();

        write_strategy(&path, &StrategyDocument::new(json!({"v": 2}))).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("old content"));
        assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap(), json!({"v": 2}));
    }

    #[test]
    fn test_write_strategy_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_strategy.json");
        let doc: serde_json::Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2}"#).unwrap();

        write_strategy(&path, &StrategyDocument::new(doc)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.find("\"zeta\"").unwrap() < text.find("\"alpha\"").unwrap(), "{}", text);
    }

    #[test]
    fn test_write_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_analysis(dir.path(), AgentKind::Social, "freier Text").unwrap();
        assert!(path.ends_with("social_analysis.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "freier Text");
    }

    #[test]
    fn test_write_into_file_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_strategy(&blocker.join("out.json"), &StrategyDocument::new(json!({})))
            .unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
    }
}
