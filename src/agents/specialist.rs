//! SpecialistAgent：把 profile 与回复模板拼成 prompt，调用一次 Assistant，解析回复

use std::sync::Arc;

use serde_json::Value;

use crate::agents::{parse_reply, AgentKind, AgentResponse, ResponseView};
use crate::assistant::{AgentError, AssistantClient};
use crate::config::SpecialistConfig;
use crate::profile::UserProfile;

/// 非 JSON 回复保存在此键下
pub const RAW_CONTENT_KEY: &str = "raw_content";

/// 一次分析的结果：原始文本、完整解析结果、应用视图后的回复
#[derive(Debug, Clone)]
pub struct Analysis {
    pub kind: AgentKind,
    pub raw: String,
    /// 视图截取之前的完整回复，milestone 推导读取它
    pub parsed: AgentResponse,
    /// 应用视图后的回复，发给 composer
    pub response: AgentResponse,
}

impl Analysis {
    /// 未经视图截取的分析（parsed 与 response 相同）
    pub fn unfiltered(kind: AgentKind, response: AgentResponse) -> Self {
        Self {
            kind,
            raw: String::new(),
            parsed: response.clone(),
            response,
        }
    }
}

/// 单个 specialist：三类共享同一实现，只在 ID、模板与视图上不同
pub struct SpecialistAgent {
    kind: AgentKind,
    assistant_id: String,
    template: Value,
    view: ResponseView,
    client: Arc<dyn AssistantClient>,
}

impl SpecialistAgent {
    pub fn new(config: &SpecialistConfig, client: Arc<dyn AssistantClient>) -> Self {
        Self {
            kind: config.kind,
            assistant_id: config.assistant_id.clone(),
            template: config.template.clone(),
            view: config.view.clone(),
            client,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn build_prompt(&self, profile: &UserProfile) -> String {
        let template =
            serde_json::to_string_pretty(&self.template).unwrap_or_else(|_| self.template.to_string());
        format!(
            "Please analyze the following user profile and provide your analysis in JSON format:\n\
             {}\n\n\
             Your response should be in JSON format with the following structure:\n\
             {}",
            profile.to_pretty_json(),
            template
        )
    }

    /// 发起一次分析（恰好一次网络调用）
    pub async fn analyze(&self, profile: &UserProfile) -> Result<Analysis, AgentError> {
        let prompt = self.build_prompt(profile);
        tracing::info!(agent = %self.kind, "Invoking {} agent", self.kind);
        tracing::debug!(agent = %self.kind, prompt_chars = prompt.len(), "Prompt built");

        let raw = self.client.invoke(&self.assistant_id, &prompt).await?;
        let parsed = parse_reply(&raw, RAW_CONTENT_KEY);
        let value = self.view.apply(parsed.clone());

        tracing::info!(agent = %self.kind, reply_chars = raw.len(), "{} agent replied", self.kind);
        Ok(Analysis {
            kind: self.kind,
            raw,
            parsed: AgentResponse::new(parsed),
            response: AgentResponse::new(value),
        })
    }
}
