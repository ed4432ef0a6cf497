//! Bio-Next core: chat session state, LLM relay, analysis detection, and the
//! HTTP surface that ties them together.

pub mod config;
pub mod controller;
pub mod detector;
pub mod files;
pub mod identity;
pub mod logging;
pub mod prompts;
pub mod relay;
pub mod server;
pub mod store;

pub use config::Config;
pub use controller::{ChatController, Project, RoundTrip, Submit, APOLOGY_MESSAGE};
pub use detector::{AnalysisDetection, AnalysisType, Detection};
pub use files::FileAttachment;
pub use relay::{ChatMessage, ChatRelay, LlmClient, RelayError};
pub use store::{ChatStore, Message, Role, Session};
