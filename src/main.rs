//! Compass - 多 Agent 策略生成
//!
//! 入口：加载 .env 与配置、初始化日志，运行一次流水线；成功退出 0，任一阶段失败退出 1。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use compass::assistant::OpenAiAssistantClient;
use compass::config::{load_config, CONFIG_PATH_ENV};
use compass::{observability, Pipeline, PipelineError, PipelineReport};

async fn run() -> Result<PipelineReport, PipelineError> {
    let config_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let cfg = load_config(config_path)?.resolve()?;
    tracing::debug!("Resolved configuration: {:?}", cfg);

    let client = Arc::new(OpenAiAssistantClient::new(&cfg.assistant)?);
    let pipeline = Pipeline::new(cfg, client);
    for (kind, id) in pipeline.specialists() {
        tracing::info!("{} agent: {}", kind, id);
    }

    // Ctrl+C 时直接放弃本次运行；策略文件只在最后一步写入
    tokio::select! {
        result = pipeline.run() => result,
        _ = tokio::signal::ctrl_c() => Err(PipelineError::Interrupted),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 与部署习惯一致：工作目录下的 .env 可提供 API Key 与 Assistant ID
    let _ = dotenvy::dotenv();
    observability::init();

    match run().await {
        Ok(report) => {
            tracing::info!(
                "Strategy created: {} ({} milestones, agents {:.1?}, composer {:.1?}, total {:.1?})",
                report.output.display(),
                report.milestones,
                report.agents_elapsed,
                report.composer_elapsed,
                report.total_elapsed
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(stage = %e.stage(), "{}", e);
            ExitCode::FAILURE
        }
    }
}
