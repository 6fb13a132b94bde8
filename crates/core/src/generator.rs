use crate::traits::AnswerGenerator;
use crate::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use url::Url;

pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";

const BACKEND: &str = "chat-completions";
const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that answers questions based on the provided context.";

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 1_024,
            top_p: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionGenerator {
    client: Arc<Client>,
    chat_url: Url,
    config: GenerationConfig,
}

impl ChatCompletionGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: Arc::new(Client::new()),
            chat_url: chat_completions_url(&config.endpoint)?,
            config,
        })
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    fn build_request(&self, question: &str, context: &[String]) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(question, context),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
        }
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionGenerator {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String, GenerationError> {
        let mut request = self
            .client
            .post(self.chat_url.clone())
            .json(&self.build_request(question, context));

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        info!(model = %self.config.model, context_chunks = context.len(), "requesting answer");
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("{status}: {body}"),
            });
        }

        let payload: ChatResponse = response.json().await?;
        first_answer(payload)
    }
}

fn chat_completions_url(endpoint: &str) -> Result<Url, GenerationError> {
    let base = format!("{}/", endpoint.trim_end_matches('/'));
    Ok(Url::parse(&base)?.join("chat/completions")?)
}

fn first_answer(payload: ChatResponse) -> Result<String, GenerationError> {
    payload
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
        .ok_or(GenerationError::EmptyAnswer)
}

pub fn build_prompt(question: &str, context: &[String]) -> String {
    format!(
        "You are a helpful AI assistant. Use the following context to answer the question.\n\
         If you cannot find the answer in the context, say \"I cannot find the answer in the provided context.\"\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:",
        context.join("\n")
    )
}

/// Numbered rendering of context chunks for display.
pub fn format_context(chunks: &[String]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| format!("Chunk {}: {chunk}", index + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_gets_chat_completions_path() -> Result<(), GenerationError> {
        let url = chat_completions_url("https://api.groq.com/openai/v1/")?;
        assert_eq!(url.as_str(), "https://api.groq.com/openai/v1/chat/completions");

        let url = chat_completions_url("http://localhost:11434/v1")?;
        assert_eq!(url.as_str(), "http://localhost:11434/v1/chat/completions");
        Ok(())
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            ChatCompletionGenerator::new(GenerationConfig {
                endpoint: "not a url".to_string(),
                ..GenerationConfig::default()
            }),
            Err(GenerationError::Url(_))
        ));
    }

    #[test]
    fn request_carries_context_and_sampling_settings() -> Result<(), GenerationError> {
        let generator = ChatCompletionGenerator::new(GenerationConfig::default())?;
        let request = generator.build_request(
            "Why prime the pump?",
            &["Pumps need priming.".to_string(), "Dry running wears seals.".to_string()],
        );

        let value = serde_json::to_value(&request).map_err(|error| {
            GenerationError::BackendResponse {
                backend: BACKEND.to_string(),
                details: error.to_string(),
            }
        })?;
        assert_eq!(value["model"], DEFAULT_LLM_MODEL);
        assert_eq!(value["max_tokens"], 1_024);
        assert_eq!(value["messages"][0]["role"], "system");

        let prompt = value["messages"][1]["content"].as_str().unwrap_or_default();
        assert!(prompt.contains("Context:\nPumps need priming.\nDry running wears seals.\n"));
        assert!(prompt.contains("Question: Why prime the pump?"));
        assert!(prompt.ends_with("Answer:"));
        Ok(())
    }

    #[test]
    fn first_non_empty_choice_is_the_answer() -> Result<(), Box<dyn std::error::Error>> {
        let payload: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"  "}},{"message":{"content":" Prime it first. "}}]}"#,
        )?;
        assert_eq!(first_answer(payload)?, "Prime it first.");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#)?;
        assert!(matches!(first_answer(empty), Err(GenerationError::EmptyAnswer)));
        Ok(())
    }

    #[test]
    fn context_is_numbered_for_display() {
        let rendered = format_context(&["alpha".to_string(), "beta".to_string()]);
        assert_eq!(rendered, "Chunk 1: alpha\n\nChunk 2: beta");
    }
}
