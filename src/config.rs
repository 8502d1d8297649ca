//! 应用配置：从 config/default.toml 与环境变量加载，再解析为一次运行使用的不可变 RunConfig
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `COMPASS__*` 覆盖（双下划线表示嵌套，如 `COMPASS__ASSISTANT__RUN_TIMEOUT_SECS=120`）。
//! API Key 与四个 Assistant ID 沿用部署时的环境变量名（`OPENAI_API_KEY`、`INTEGRATION_AGENT_ID` 等），缺失即启动失败。

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::agents::{AgentKind, ResponseView};

/// API Key 环境变量
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Strategy Composer（meta agent）的 Assistant ID 环境变量
pub const COMPOSER_ID_ENV: &str = "STRATEGY_ASSISTANT_ID";
/// 额外配置文件路径（可选）
pub const CONFIG_PATH_ENV: &str = "COMPASS_CONFIG";

/// 配置加载 / 解析错误（启动阶段，尚未发生任何网络或文件写入）
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Cannot read response template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid response template {}: {source}", path.display())]
    TemplateJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid JSON pointer for {kind} agent: {pointer:?} (must be empty or start with '/')")]
    InvalidPointer { kind: AgentKind, pointer: String },

    #[error("Cannot build HTTP client: {0}")]
    HttpClient(String),
}

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub assistant: AssistantSection,
    pub paths: PathsSection,
    pub agents: AgentsSection,
}

/// [assistant] 段：托管 Assistant 服务地址、Key 覆盖与超时
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AssistantSection {
    pub base_url: String,
    /// 未设置时读取 OPENAI_API_KEY
    pub api_key: Option<String>,
    /// 单个 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 单次 run 从创建到完成的最长等待（秒）
    pub run_timeout_secs: u64,
    /// 轮询 run 状态的间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            request_timeout_secs: 60,
            run_timeout_secs: 300,
            poll_interval_ms: 1000,
        }
    }
}

impl fmt::Debug for AssistantSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantSection")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

/// [paths] 段：输入 profile、输出策略文件、可选的原始分析目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub profile: PathBuf,
    pub output: PathBuf,
    /// 设置后，每个 specialist 的原始回复写入 `<dir>/<kind>_analysis.txt`
    pub analyses_dir: Option<PathBuf>,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            profile: PathBuf::from("user_profile.json"),
            output: PathBuf::from("generated_strategy.json"),
            analyses_dir: None,
        }
    }
}

/// [agents] 段：四个 Assistant 各自的覆盖项
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AgentsSection {
    pub integration: AgentSection,
    pub social: AgentSection,
    pub employment: AgentSection,
    pub composer: AgentSection,
}

impl AgentsSection {
    pub fn specialist(&self, kind: AgentKind) -> &AgentSection {
        match kind {
            AgentKind::Integration => &self.integration,
            AgentKind::Social => &self.social,
            AgentKind::Employment => &self.employment,
        }
    }
}

/// [agents.<kind>] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AgentSection {
    /// Assistant ID；优先于环境变量
    pub id: Option<String>,
    /// 自定义回复结构（JSON 文件），替换内置模板
    pub template: Option<PathBuf>,
    /// 从回复中截取的子树（JSON Pointer，如 `/integrations_analyse`）
    pub pointer: Option<String>,
    /// 只保留这些类别（截取后对象的顶层键）；为空则全部保留
    pub categories: Vec<String>,
}

/// 解析后的 Assistant 服务配置
#[derive(Clone)]
pub struct AssistantConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub run_timeout: Duration,
    pub poll_interval: Duration,
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("run_timeout", &self.run_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// 单个 specialist 的解析结果：ID、回复模板、回复视图
#[derive(Debug, Clone)]
pub struct SpecialistConfig {
    pub kind: AgentKind,
    pub assistant_id: String,
    pub template: Value,
    pub view: ResponseView,
}

/// 一次运行的不可变配置：启动时构建一次，之后只读
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub assistant: AssistantConfig,
    pub paths: PathsSection,
    pub integration: SpecialistConfig,
    pub social: SpecialistConfig,
    pub employment: SpecialistConfig,
    pub composer_id: String,
}

impl RunConfig {
    pub fn specialist(&self, kind: AgentKind) -> &SpecialistConfig {
        match kind {
            AgentKind::Integration => &self.integration,
            AgentKind::Social => &self.social,
            AgentKind::Employment => &self.employment,
        }
    }
}

impl AppConfig {
    /// 用进程环境变量解析 RunConfig
    pub fn resolve(&self) -> Result<RunConfig, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// 用给定的变量查找函数解析 RunConfig；空字符串视为缺失
    pub fn resolve_with<F>(&self, lookup: F) -> Result<RunConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |configured: &Option<String>, var: &'static str| {
            configured
                .clone()
                .or_else(|| lookup(var))
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(var))
        };

        let a = &self.assistant;
        let assistant = AssistantConfig {
            base_url: a.base_url.trim_end_matches('/').to_string(),
            api_key: required(&a.api_key, API_KEY_ENV)?,
            request_timeout: Duration::from_secs(a.request_timeout_secs),
            run_timeout: Duration::from_secs(a.run_timeout_secs),
            poll_interval: Duration::from_millis(a.poll_interval_ms),
        };

        let specialist = |kind: AgentKind| -> Result<SpecialistConfig, ConfigError> {
            let section = self.agents.specialist(kind);
            let assistant_id = required(&section.id, kind.id_env())?;
            let template = match &section.template {
                Some(path) => load_template(path)?,
                None => kind.default_template(),
            };
            if let Some(pointer) = &section.pointer {
                if !pointer.is_empty() && !pointer.starts_with('/') {
                    return Err(ConfigError::InvalidPointer {
                        kind,
                        pointer: pointer.clone(),
                    });
                }
            }
            Ok(SpecialistConfig {
                kind,
                assistant_id,
                template,
                view: ResponseView::new(section.pointer.clone(), section.categories.clone()),
            })
        };

        let integration = specialist(AgentKind::Integration)?;
        let social = specialist(AgentKind::Social)?;
        let employment = specialist(AgentKind::Employment)?;
        let composer_id = required(&self.agents.composer.id, COMPOSER_ID_ENV)?;

        Ok(RunConfig {
            assistant,
            paths: self.paths.clone(),
            integration,
            social,
            employment,
            composer_id,
        })
    }
}

fn load_template(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::TemplateRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::TemplateJson {
        path: path.to_path_buf(),
        source,
    })
}

/// 从 config 目录加载配置，环境变量 COMPASS__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 COMPASS__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!("Config file {} not found, ignoring", path.display());
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("COMPASS")
            .separator("__")
            .try_parsing(true),
    );

    Ok(builder.build()?.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (API_KEY_ENV, "sk-test".to_string()),
            ("INTEGRATION_AGENT_ID", "asst_integration".to_string()),
            ("SOCIAL_AGENT_ID", "asst_social".to_string()),
            ("EMPLOYMENT_AGENT_ID", "asst_employment".to_string()),
            (COMPOSER_ID_ENV, "asst_strategy".to_string()),
        ])
    }

    fn lookup<'a>(env: &'a HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| env.get(name).cloned()
    }

    #[test]
    fn test_resolve_from_env() {
        let env = full_env();
        let cfg = AppConfig::default().resolve_with(lookup(&env)).unwrap();

        assert_eq!(cfg.assistant.api_key, "sk-test");
        assert_eq!(cfg.assistant.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.assistant.run_timeout, Duration::from_secs(300));
        assert_eq!(cfg.integration.assistant_id, "asst_integration");
        assert_eq!(cfg.social.assistant_id, "asst_social");
        assert_eq!(cfg.employment.assistant_id, "asst_employment");
        assert_eq!(cfg.composer_id, "asst_strategy");
        assert_eq!(cfg.paths.output, PathBuf::from("generated_strategy.json"));
        assert!(cfg.integration.template.get("integrations_analyse").is_some());
    }

    #[test]
    fn test_missing_agent_id() {
        let mut env = full_env();
        env.remove("SOCIAL_AGENT_ID");
        let err = AppConfig::default().resolve_with(lookup(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("SOCIAL_AGENT_ID")));
    }

    #[test]
    fn test_empty_api_key_is_missing() {
        let mut env = full_env();
        env.insert(API_KEY_ENV, "  ".to_string());
        let err = AppConfig::default().resolve_with(lookup(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(API_KEY_ENV)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_section_overrides_env() {
        let env = full_env();
        let mut app = AppConfig::default();
        app.agents.composer.id = Some("asst_override".to_string());
        app.assistant.base_url = "http://localhost:8080/v1/".to_string();
        let cfg = app.resolve_with(lookup(&env)).unwrap();
        assert_eq!(cfg.composer_id, "asst_override");
        assert_eq!(cfg.assistant.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_custom_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("social.json");
        std::fs::write(&path, r#"{"situation": "", "next_steps": []}"#).unwrap();

        let env = full_env();
        let mut app = AppConfig::default();
        app.agents.social.template = Some(path);
        let cfg = app.resolve_with(lookup(&env)).unwrap();
        assert!(cfg.social.template.get("next_steps").is_some());
    }

    #[test]
    fn test_invalid_pointer() {
        let env = full_env();
        let mut app = AppConfig::default();
        app.agents.employment.pointer = Some("analysis".to_string());
        let err = app.resolve_with(lookup(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPointer { kind: AgentKind::Employment, .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let env = full_env();
        let cfg = AppConfig::default().resolve_with(lookup(&env)).unwrap();
        let rendered = format!("{:?}", cfg.assistant);
        assert!(!rendered.contains("sk-test"));
    }

    #[test]
    fn test_load_config_layers_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compass.toml");
        std::fs::write(
            &path,
            r#"
[assistant]
base_url = "http://localhost:8080/v1"
poll_interval_ms = 250
run_timeout_secs = 30

[paths]
output = "out/strategy.json"
analyses_dir = "prompts"

[agents.integration]
pointer = "/integrations_analyse"
categories = ["sprachliche_integration", "jobcenter_anbindung"]

[agents.composer]
id = "asst_from_file"
"#,
        )
        .unwrap();

        // 只有本测试读写这个变量
        std::env::set_var("COMPASS__ASSISTANT__RUN_TIMEOUT_SECS", "120");
        let loaded = load_config(Some(path));
        std::env::remove_var("COMPASS__ASSISTANT__RUN_TIMEOUT_SECS");
        let app = loaded.unwrap();

        assert_eq!(app.assistant.base_url, "http://localhost:8080/v1");
        assert_eq!(app.assistant.poll_interval_ms, 250);
        assert_eq!(app.assistant.run_timeout_secs, 120);
        assert_eq!(app.assistant.request_timeout_secs, 60);
        assert_eq!(app.paths.profile, PathBuf::from("user_profile.json"));
        assert_eq!(app.paths.output, PathBuf::from("out/strategy.json"));
        assert_eq!(app.paths.analyses_dir, Some(PathBuf::from("prompts")));
        assert_eq!(app.agents.integration.pointer.as_deref(), Some("/integrations_analyse"));
        assert_eq!(
            app.agents.integration.categories,
            vec!["sprachliche_integration", "jobcenter_anbindung"]
        );
        assert!(app.agents.social.pointer.is_none());

        let mut env = full_env();
        env.remove(COMPOSER_ID_ENV);
        let cfg = app.resolve_with(lookup(&env)).unwrap();
        assert_eq!(cfg.composer_id, "asst_from_file");
        assert_eq!(cfg.assistant.run_timeout, Duration::from_secs(120));
        assert_eq!(cfg.assistant.poll_interval, Duration::from_millis(250));
        assert_eq!(
            cfg.integration.view,
            ResponseView::new(
                Some("/integrations_analyse".to_string()),
                vec![
                    "sprachliche_integration".to_string(),
                    "jobcenter_anbindung".to_string()
                ],
            )
        );
        assert!(cfg.social.view.is_identity());
    }

    #[test]
    fn test_load_config_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = load_config(Some(dir.path().join("missing.toml"))).unwrap();
        assert_eq!(app.assistant.base_url, "https://api.openai.com/v1");
        assert_eq!(app.paths.output, PathBuf::from("generated_strategy.json"));
        assert!(app.agents.composer.id.is_none());
    }
}
