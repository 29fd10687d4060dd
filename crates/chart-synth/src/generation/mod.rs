//! Chart spec generation: prompt construction, model client and output parsing

pub mod openai;
pub mod parser;
pub mod prompt;

pub use openai::OpenAiClient;
pub use parser::{extract_json_payload, OutputParser};
pub use prompt::PromptBuilder;
