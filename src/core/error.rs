//! 流水线错误类型与失败阶段
//!
//! 任一阶段失败即终止本次运行，不做本地恢复；Stage 用于向用户报告是哪一步失败。

use std::fmt;

use thiserror::Error;

use crate::agents::AgentKind;
use crate::aggregate::AggregateError;
use crate::assistant::AgentError;
use crate::config::ConfigError;
use crate::output::OutputError;
use crate::profile::ProfileError;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Profile,
    Agent(AgentKind),
    Aggregate,
    Composer,
    Output,
    Interrupted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => f.write_str("config"),
            Stage::Profile => f.write_str("profile"),
            Stage::Agent(kind) => write!(f, "{}", kind),
            Stage::Aggregate => f.write_str("aggregate"),
            Stage::Composer => f.write_str("composer"),
            Stage::Output => f.write_str("output"),
            Stage::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// 一次运行可能出现的错误（配置、解析、Assistant 调用、写文件）
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("The {kind} agent failed: {source}")]
    Agent {
        kind: AgentKind,
        #[source]
        source: AgentError,
    },

    #[error("Aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("The strategy composer failed: {0}")]
    Composer(#[source] AgentError),

    #[error("Write error: {0}")]
    Output(#[from] OutputError),

    #[error("Interrupted before the strategy was written")]
    Interrupted,
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Config(_) => Stage::Config,
            PipelineError::Profile(_) => Stage::Profile,
            PipelineError::Agent { kind, .. } => Stage::Agent(*kind),
            PipelineError::Aggregate(_) => Stage::Aggregate,
            PipelineError::Composer(_) => Stage::Composer,
            PipelineError::Output(_) => Stage::Output,
            PipelineError::Interrupted => Stage::Interrupted,
        }
    }

    /// 底层的 Assistant 调用错误（若有）
    pub fn agent_error(&self) -> Option<&AgentError> {
        match self {
            PipelineError::Agent { source, .. } => Some(source),
            PipelineError::Composer(source) => Some(source),
            _ => None,
        }
    }
}
