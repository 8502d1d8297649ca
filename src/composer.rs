//! Strategy Composer（meta agent）客户端：把合并结果发给第四个 Assistant，取回最终策略文档

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::agents::parse_reply;
use crate::aggregate::AggregatedRecommendations;
use crate::assistant::{AgentError, AssistantClient};

/// 非 JSON 的 composer 回复保存在此键下
pub const RAW_OUTPUT_KEY: &str = "raw_output";

/// 最终策略文档：原样写入输出文件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StrategyDocument(Value);

impl StrategyDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

pub struct StrategyComposer {
    assistant_id: String,
    client: Arc<dyn AssistantClient>,
}

impl StrategyComposer {
    pub fn new(assistant_id: impl Into<String>, client: Arc<dyn AssistantClient>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            client,
        }
    }

    /// 发送合并结果（紧凑 JSON），恰好一次网络调用
    pub async fn compose(
        &self,
        aggregated: &AggregatedRecommendations,
    ) -> Result<StrategyDocument, AgentError> {
        let payload = serde_json::to_string(aggregated)
            .map_err(|e| AgentError::Malformed(format!("cannot encode aggregate: {}", e)))?;

        tracing::info!(payload_chars = payload.len(), "Consulting strategy composer");
        let raw = self.client.invoke(&self.assistant_id, &payload).await?;

        Ok(StrategyDocument(parse_reply(&raw, RAW_OUTPUT_KEY)))
    }
}
