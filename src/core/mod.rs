//! 核心编排层：错误与失败阶段、流水线主控

pub mod error;
pub mod pipeline;

pub use error::{PipelineError, Stage};
pub use pipeline::{Pipeline, PipelineReport};
