//! 流水线编排器：Loader → 三个 specialist（并发）→ Aggregator → Composer → Writer
//!
//! 单次前向执行，无分支、无重试。三个 specialist 用 try_join! 汇合，任一失败立即终止并丢弃其余调用；
//! 策略文件只在最后一步原子写入，因此任何失败都不会留下输出文件。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::agents::{AgentKind, Analysis, SpecialistAgent};
use crate::aggregate::aggregate;
use crate::assistant::AssistantClient;
use crate::composer::StrategyComposer;
use crate::config::RunConfig;
use crate::core::PipelineError;
use crate::output::{write_analysis, write_strategy};
use crate::profile::{load_profile, UserProfile};

/// 一次成功运行的摘要
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub output: PathBuf,
    pub milestones: usize,
    pub agents_elapsed: Duration,
    pub composer_elapsed: Duration,
    pub total_elapsed: Duration,
}

pub struct Pipeline {
    config: RunConfig,
    integration: SpecialistAgent,
    social: SpecialistAgent,
    employment: SpecialistAgent,
    composer: StrategyComposer,
}

impl Pipeline {
    /// 用同一个 Assistant 客户端构建四个调用方
    pub fn new(config: RunConfig, client: Arc<dyn AssistantClient>) -> Self {
        Self {
            integration: SpecialistAgent::new(&config.integration, client.clone()),
            social: SpecialistAgent::new(&config.social, client.clone()),
            employment: SpecialistAgent::new(&config.employment, client.clone()),
            composer: StrategyComposer::new(config.composer_id.clone(), client),
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    async fn consult(
        agent: &SpecialistAgent,
        profile: &UserProfile,
    ) -> Result<Analysis, PipelineError> {
        agent
            .analyze(profile)
            .await
            .map_err(|source| PipelineError::Agent {
                kind: agent.kind(),
                source,
            })
    }

    pub async fn run(&self) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        let paths = &self.config.paths;

        tracing::info!("Loading user profile from {}", paths.profile.display());
        let profile = load_profile(&paths.profile)?;

        let agents_started = Instant::now();
        let (integration, social, employment) = tokio::try_join!(
            Self::consult(&self.integration, &profile),
            Self::consult(&self.social, &profile),
            Self::consult(&self.employment, &profile),
        )?;
        let agents_elapsed = agents_started.elapsed();
        tracing::info!("All specialist agents replied in {:.1?}", agents_elapsed);

        if let Some(dir) = &paths.analyses_dir {
            for analysis in [&integration, &social, &employment] {
                let path = write_analysis(dir, analysis.kind, &analysis.raw)?;
                tracing::info!("Saved {} analysis to {}", analysis.kind, path.display());
            }
        }

        let aggregated = aggregate(profile, [integration, social, employment])?;
        let milestones = aggregated.milestones().len();

        let composer_started = Instant::now();
        let strategy = self
            .composer
            .compose(&aggregated)
            .await
            .map_err(PipelineError::Composer)?;
        let composer_elapsed = composer_started.elapsed();

        write_strategy(&paths.output, &strategy)?;
        tracing::info!("Strategy saved to {}", paths.output.display());

        Ok(PipelineReport {
            output: paths.output.clone(),
            milestones,
            agents_elapsed,
            composer_elapsed,
            total_elapsed: started.elapsed(),
        })
    }

    /// 参与本次运行的 specialist（固定顺序）
    pub fn specialists(&self) -> [(AgentKind, &str); 3] {
        [
            (AgentKind::Integration, self.integration.assistant_id()),
            (AgentKind::Social, self.social.assistant_id()),
            (AgentKind::Employment, self.employment.assistant_id()),
        ]
    }
}
