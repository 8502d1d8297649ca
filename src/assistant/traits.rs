//! 托管 Assistant 服务抽象
//!
//! 所有后端（OpenAI Assistants / Mock）实现 AssistantClient：invoke 发送一条用户消息，返回 Assistant 的文本回复。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// 单次 Assistant 调用的失败原因（不做任何重试，直接交给调用方）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl AgentError {
    /// 网络类错误（含超时）
    pub fn is_network(&self) -> bool {
        matches!(self, AgentError::Network(_) | AgentError::Timeout(_))
    }
}

/// Assistant 客户端 trait：按 assistant_id 发送一条消息并取回文本回复
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// 一次请求 / 响应交换
    async fn invoke(&self, assistant_id: &str, content: &str) -> Result<String, AgentError>;
}
