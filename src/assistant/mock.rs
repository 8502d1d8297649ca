//! Mock Assistant 客户端（用于测试，无需 API）
//!
//! 按 assistant_id 预置回复 / 失败 / 延迟，并记录每次调用（调用开始时即记录）。

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::assistant::{AgentError, AssistantClient};

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
}

/// 一次被记录的调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub assistant_id: String,
    pub content: String,
}

/// Mock 客户端：脚本化回复，记录调用顺序
#[derive(Debug, Default)]
pub struct MockAssistantClient {
    scripts: HashMap<String, (Script, Duration)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockAssistantClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, assistant_id: &str, reply: impl Into<String>) -> Self {
        self.with_delayed_reply(assistant_id, reply, Duration::ZERO)
    }

    pub fn with_delayed_reply(
        mut self,
        assistant_id: &str,
        reply: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.scripts
            .insert(assistant_id.to_string(), (Script::Reply(reply.into()), delay));
        self
    }

    /// 该 assistant 返回 Remote 错误
    pub fn with_failure(mut self, assistant_id: &str, message: impl Into<String>) -> Self {
        self.scripts
            .insert(assistant_id.to_string(), (Script::Fail(message.into()), Duration::ZERO));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_to(&self, assistant_id: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.assistant_id == assistant_id)
            .collect()
    }
}

#[async_trait]
impl AssistantClient for MockAssistantClient {
    async fn invoke(&self, assistant_id: &str, content: &str) -> Result<String, AgentError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                assistant_id: assistant_id.to_string(),
                content: content.to_string(),
            });

        let (script, delay) = self.scripts.get(assistant_id).cloned().ok_or_else(|| {
            AgentError::Remote(format!("no scripted reply for assistant {}", assistant_id))
        })?;

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match script {
            Script::Reply(text) => Ok(text),
            Script::Fail(message) => Err(AgentError::Remote(message)),
        }
    }
}
