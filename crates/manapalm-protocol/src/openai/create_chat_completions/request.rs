use serde::{Deserialize, Serialize};

use crate::openai::create_chat_completions::types::ChatCompletionMessage;

/// Shared by OpenAI and OpenRouter; OpenRouter speaks the same dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChatCompletionRequestBody {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}
