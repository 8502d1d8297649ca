//! OpenAI Assistants API（v2）客户端
//!
//! 一次 invoke = 创建 thread 并启动 run → 按间隔轮询 run 状态直到终态 → 列出该 run 产生的消息并拼接 Assistant 文本。
//! 轮询是协议本身的一部分，不是重试；run 在 run_timeout 内未结束（含轮询间隔与请求耗时）即返回 Timeout。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::assistant::{AgentError, AssistantClient};
use crate::config::{AssistantConfig, ConfigError};

const ASSISTANTS_BETA: &str = "assistants=v2";
const ERROR_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// 仍需继续轮询的状态
    fn is_pending(self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling | RunStatus::Unknown
        )
    }
}

#[derive(Debug, Deserialize)]
struct Run {
    id: String,
    thread_id: String,
    status: RunStatus,
    #[serde(default)]
    last_error: Option<RunError>,
    #[serde(default)]
    incomplete_details: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RunError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: String,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

/// Assistants API 客户端：持有 HTTP Client、base_url、Key 与轮询参数
pub struct OpenAiAssistantClient {
    http: Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
    run_timeout: Duration,
    poll_interval: Duration,
}

impl OpenAiAssistantClient {
    pub fn new(cfg: &AssistantConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert("OpenAI-Beta", HeaderValue::from_static(ASSISTANTS_BETA));

        let http = Client::builder()
            .timeout(cfg.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            request_timeout: cfg.request_timeout,
            run_timeout: cfg.run_timeout,
            poll_interval: cfg.poll_interval,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 发送请求并按状态码分类错误；成功时把响应体解码为 T
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AgentError> {
        let resp = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| AgentError::Malformed(format!("{}: {}", e, snippet(&body))))
    }

    fn transport_error(&self, e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::Timeout(self.request_timeout)
        } else {
            AgentError::Network(e.to_string())
        }
    }

    async fn create_run(&self, assistant_id: &str, content: &str) -> Result<Run, AgentError> {
        let body = json!({
            "assistant_id": assistant_id,
            "thread": {
                "messages": [{ "role": "user", "content": content }]
            }
        });
        self.send(self.http.post(self.url("/threads/runs")).json(&body))
            .await
    }

    async fn fetch_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AgentError> {
        let path = format!("/threads/{}/runs/{}", thread_id, run_id);
        self.send(self.http.get(self.url(&path))).await
    }

    /// 轮询直到 run 离开 queued / in_progress；非 completed 的终态视为远端错误
    ///
    /// 整个轮询（含间隔与每次请求）受 run_timeout 约束。
    async fn wait_for_run(&self, run: Run) -> Result<Run, AgentError> {
        let run = tokio::time::timeout(self.run_timeout, self.poll_run(run))
            .await
            .map_err(|_| AgentError::Timeout(self.run_timeout))??;

        if run.status == RunStatus::Completed {
            Ok(run)
        } else {
            Err(run_failure(&run))
        }
    }

    async fn poll_run(&self, mut run: Run) -> Result<Run, AgentError> {
        while run.status.is_pending() {
            tokio::time::sleep(self.poll_interval).await;
            run = self.fetch_run(&run.thread_id, &run.id).await?;
            tracing::debug!(run_id = %run.id, status = ?run.status, "Polled run");
        }
        Ok(run)
    }

    /// 取该 run 产生的 Assistant 消息（时间正序）并拼接文本段
    async fn run_output(&self, run: &Run) -> Result<String, AgentError> {
        let path = format!("/threads/{}/messages", run.thread_id);
        let list: MessageList = self
            .send(
                self.http
                    .get(self.url(&path))
                    .query(&[("run_id", run.id.as_str()), ("order", "asc")]),
            )
            .await?;

        let parts: Vec<&str> = list
            .data
            .iter()
            .filter(|m| m.role == "assistant")
            .flat_map(|m| m.content.iter())
            .filter_map(|c| match c {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect();

        let output = parts.join("\n");
        if output.trim().is_empty() {
            return Err(AgentError::Malformed(format!(
                "run {} completed without assistant text",
                run.id
            )));
        }
        Ok(output)
    }
}

#[async_trait]
impl AssistantClient for OpenAiAssistantClient {
    async fn invoke(&self, assistant_id: &str, content: &str) -> Result<String, AgentError> {
        let run = self.create_run(assistant_id, content).await?;
        tracing::debug!(
            assistant_id,
            run_id = %run.id,
            thread_id = %run.thread_id,
            "Run created"
        );
        let run = self.wait_for_run(run).await?;
        self.run_output(&run).await
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(ERROR_SNIPPET_CHARS).collect()
}

/// 非 2xx：401/403 为鉴权失败，其余为远端错误；优先取 `error.message`
fn status_error(status: StatusCode, body: &str) -> AgentError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| snippet(body));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth {
            status: status.as_u16(),
            message,
        },
        _ => AgentError::Remote(format!("HTTP {}: {}", status.as_u16(), message)),
    }
}

fn run_failure(run: &Run) -> AgentError {
    let detail = run
        .last_error
        .as_ref()
        .map(|e| match &e.code {
            Some(code) => format!("{}: {}", code, e.message),
            None => e.message.clone(),
        })
        .or_else(|| run.incomplete_details.as_ref().map(|d| d.to_string()))
        .unwrap_or_else(|| "no details".to_string());

    AgentError::Remote(format!(
        "run {} ended with status {:?}: {}",
        run.id, run.status, detail
    ))
}
