use async_trait::async_trait;
use log::{ debug, error, info };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use url::Url;

use super::{ ChatClient, ChatError };
use crate::llm::LlmConfig;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
fn extract_text(body: &str) -> Result<String, ChatError> {
    let parsed: GoogleResponse = serde_json
        ::from_str(body)
        .map_err(|_| ChatError::MalformedResponse(body.to_string()))?;

    parsed.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ChatError::MalformedResponse(body.to_string()))
}

pub struct GeminiChatClient {
    http: HttpClient,
    endpoint: Url,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        max_output_tokens: u32,
        temperature: f32
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut endpoint = Url::parse(
            &format!("{}/{}:generateContent", base.trim_end_matches('/'), chat_model)
        ).map_err(|e| format!("Invalid Gemini base URL '{}': {}", base, e))?;
        endpoint.query_pairs_mut().append_pair("key", &api_key);

        Ok(Self {
            http: HttpClient::new(),
            endpoint,
            model: chat_model,
            temperature,
            max_output_tokens,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "Google API key is required for GeminiChatClient".to_string())?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.max_output_tokens,
            config.temperature
        )
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        info!(
            "GeminiChatClient::complete() → model={} host={:?}",
            self.model,
            self.endpoint.host_str()
        );
        debug!("Prompt is {} chars", prompt.len());

        let resp = self.http
            .post(self.endpoint.clone())
            .json(&self.build_request(prompt))
            .send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!("Gemini returned HTTP {}: {}", status, body);
            return Err(ChatError::Status { status: status.as_u16(), body });
        }

        extract_text(&body).map_err(|e| {
            error!("Gemini raw response: {}", body);
            e
        })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
