//! Compass - 多 Agent 策略生成流水线
//!
//! 模块划分：
//! - **config**: 配置加载（TOML + 环境变量）与不可变 RunConfig
//! - **core**: 流水线编排、错误与失败阶段
//! - **profile**: 用户 profile 读取
//! - **assistant**: 托管 Assistant 服务客户端抽象与实现（OpenAI Assistants / Mock）
//! - **agents**: 三类 specialist agent、回复解析与类型化视图
//! - **aggregate**: 回复合并与 milestone 推导
//! - **composer**: Strategy Composer（meta agent）客户端
//! - **output**: 策略文档与原始分析的原子写入
//! - **observability**: 日志初始化

pub mod agents;
pub mod aggregate;
pub mod assistant;
pub mod composer;
pub mod config;
pub mod core;
pub mod observability;
pub mod output;
pub mod profile;

pub use crate::core::{Pipeline, PipelineError, PipelineReport, Stage};
