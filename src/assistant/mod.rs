//! Assistant 服务层：客户端抽象与实现（OpenAI Assistants v2 / Mock）

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{MockAssistantClient, RecordedCall};
pub use openai::OpenAiAssistantClient;
pub use traits::{AgentError, AssistantClient};
