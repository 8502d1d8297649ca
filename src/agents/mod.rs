//! Specialist Agent 层：三类专业 Assistant（integration / social / employment）
//!
//! - **kind**: AgentKind 与各自的默认回复模板
//! - **response**: 回复文本 → JSON（含回退）、可配置的回复视图
//! - **specialist**: SpecialistAgent，对 profile 发起一次分析
//! - **views**: Aggregator 读取具体字段时使用的类型化视图

pub mod kind;
pub mod response;
pub mod specialist;
pub mod views;

pub use kind::AgentKind;
pub use response::{parse_reply, AgentResponse, ResponseView};
pub use specialist::{Analysis, SpecialistAgent};
pub use views::{EmploymentView, IntegrationView, SocialView};
