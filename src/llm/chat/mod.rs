pub mod gemini;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use self::gemini::GeminiChatClient;
use super::LlmConfig;

/// Why a completion could not be produced.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to reach the model endpoint: {0}")] Transport(#[from] reqwest::Error),
    #[error("model endpoint returned HTTP {status}: {body}")] Status {
        status: u16,
        body: String,
    },
    #[error("model response had no candidate text: {0}")] MalformedResponse(String),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends one flattened prompt and returns the trimmed completion text.
    async fn complete(&self, prompt: &str) -> Result<String, ChatError>;

    fn get_model(&self) -> String;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = GeminiChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
