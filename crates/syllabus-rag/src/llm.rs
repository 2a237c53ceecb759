//! OpenAI-compatible chat completions client.
//!
//! Groq and OpenAI both speak `POST {base_url}/chat/completions`; the prompt
//! is sent as a single user message and the first choice's content is
//! returned untouched.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use syllabus_core::config::LlmSettings;
use syllabus_core::traits::Generator;
use syllabus_core::{Error, Result};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct OpenAiCompatGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatGenerator {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        let base_url = match settings.base_url.as_deref() {
            Some(url) => url.to_string(),
            None => default_base_url(&settings.provider)?.to_string(),
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Generation(format!("failed to build HTTP client: {e}")))?;
        info!(provider = %settings.provider, model = %settings.model, "using generation model");
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }
}

impl Generator for OpenAiCompatGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        debug!(endpoint = %self.endpoint, prompt_chars = prompt.len(), "sending completion request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| Error::Generation(format!("request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Generation(format!("failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(Error::Generation(format!("API error ({}): {}", status.as_u16(), error_message(&body))));
        }
        parse_completion(&body)
    }
}

fn default_base_url(provider: &str) -> Result<&'static str> {
    match provider.to_ascii_lowercase().as_str() {
        "groq" => Ok(GROQ_BASE_URL),
        "openai" => Ok(OPENAI_BASE_URL),
        other => Err(Error::InvalidConfig(format!(
            "unsupported llm.provider '{other}'; use groq, openai, or set llm.base_url"
        ))),
    }
}

/// Extract the first choice's text from a chat completion body.
pub fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::Generation(format!("unexpected response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::Generation("response contained no choices".into()))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Build the generator named by configuration. A missing credential is fatal.
pub fn build_generator(settings: &LlmSettings) -> Result<Box<dyn Generator>> {
    Ok(Box::new(OpenAiCompatGenerator::new(settings)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_key() -> LlmSettings {
        LlmSettings { api_key: Some("gsk_test".into()), ..LlmSettings::default() }
    }

    #[test]
    fn first_choice_is_returned_verbatim() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  CS301\n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "  CS301\n");
    }

    #[test]
    fn empty_choices_is_a_generation_error() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert!(matches!(parse_completion("not json"), Err(Error::Generation(_))));
    }

    #[test]
    fn provider_error_message_is_extracted() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid API Key");
        assert_eq!(error_message(" upstream timeout "), "upstream timeout");
    }

    #[test]
    fn groq_is_the_default_endpoint() {
        let generator = OpenAiCompatGenerator::new(&settings_with_key()).unwrap();
        assert_eq!(generator.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn base_url_override_wins() {
        let settings = LlmSettings {
            provider: "custom".into(),
            base_url: Some("http://localhost:8080/v1/".into()),
            ..settings_with_key()
        };
        let generator = OpenAiCompatGenerator::new(&settings).unwrap();
        assert_eq!(generator.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn unknown_provider_without_base_url_is_rejected() {
        let settings = LlmSettings { provider: "gemini".into(), ..settings_with_key() };
        assert!(matches!(OpenAiCompatGenerator::new(&settings), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn unreachable_endpoint_is_a_generation_error() {
        let settings = LlmSettings {
            base_url: Some("http://127.0.0.1:1/v1".into()),
            timeout_secs: 2,
            ..settings_with_key()
        };
        let generator = OpenAiCompatGenerator::new(&settings).unwrap();

        let err = generator.generate("What is the course code for Machine Learning?").unwrap_err();

        assert!(matches!(err, Error::Generation(ref msg) if msg.starts_with("request failed")), "{err}");
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = build_generator(&LlmSettings::default()).err().unwrap();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }
}
