//! Study material on top of slide groups: per-group notes, a lecture
//! summary and a mind map, produced through a chat model.

pub mod embedding;
pub mod mindmap;
pub mod notes;
pub mod prompts;
pub mod reply;
pub mod workflow;

pub use embedding::{EmbeddingBackend, EmbeddingClient, EmbeddingConfig, OpenAiEmbedder};
pub use mindmap::{MindEdge, MindMap, MindNode};
pub use notes::GroupNote;
pub use slidemap_llm::{LlmClient, LlmProvider, LlmRequest, LlmResponse};
pub use workflow::{run_study, StudyOptions, StudyOutputs, StudyReport, DEFAULT_LANG};
