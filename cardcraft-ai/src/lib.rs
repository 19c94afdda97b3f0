//! Chat-completion proposal generator.
//!
//! Turns source text into flashcard proposals by calling an OpenAI-style
//! chat-completions endpoint and validating the JSON the model returns.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cardcraft_core::{validate_proposals, FlashcardProposal, GenerationError, ProposalGenerator};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Hard cap on one completion request; past it the request is aborted and
/// surfaced as a generation timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = r#"You are a helpful assistant that creates educational flashcards from provided text.
Generate flashcards in JSON format with the following structure:
{
  "flashcards": [
    {
      "front": "Question or prompt",
      "back": "Answer or explanation"
    }
  ]
}

Guidelines:
- Create 2-5 flashcards depending on the content richness
- Make questions clear and specific
- Keep answers concise but complete (1-3 sentences ideal)
- Focus on key concepts and facts that are important to remember
- Ensure flashcards are educational and testable
- Avoid yes/no questions - prefer "What", "How", "Why" questions
- Each flashcard should test a single, distinct concept
- Use proper grammar and punctuation"#;

#[derive(Clone, Debug)]
pub struct AiConfig {
    /// Missing credential is reported as a configuration failure, distinct
    /// from runtime errors, without ever attempting a request.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            api_url: std::env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

pub struct OpenAiGenerator {
    config: AiConfig,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn call_completions(&self, text: &str) -> Result<String, GenerationError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GenerationError::MissingCredential);
        };

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Create flashcards from the following text:\n\n{text}"),
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::TimedOut(self.config.timeout.as_secs())
                } else {
                    GenerationError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "completion API returned an error");
            return Err(GenerationError::Upstream(format!("status {status}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerationError::MalformedResponse("no completion choices".into()))
    }
}

#[async_trait]
impl ProposalGenerator for OpenAiGenerator {
    async fn generate(&self, text: &str) -> Result<Vec<FlashcardProposal>, GenerationError> {
        let content = self.call_completions(text).await?;
        parse_proposals(&content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ProposalsPayload {
    flashcards: Vec<RawProposal>,
}

#[derive(Deserialize)]
struct RawProposal {
    front: String,
    back: String,
}

/// Parses the model's JSON content into validated proposals. Fails the whole
/// call on any malformed or out-of-bounds entry; never returns a partial list.
fn parse_proposals(content: &str) -> Result<Vec<FlashcardProposal>, GenerationError> {
    let payload: ProposalsPayload = serde_json::from_str(content)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    validate_proposals(
        payload
            .flashcards
            .into_iter()
            .map(|r| FlashcardProposal {
                front: r.front,
                back: r.back,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wellformed_payload_in_order() {
        let content = r#"{"flashcards":[
            {"front":"What is ownership?","back":"Rust's compile-time memory discipline."},
            {"front":"What does the borrow checker do?","back":"Rejects aliasing mutable references."}
        ]}"#;
        let proposals = parse_proposals(content).unwrap();
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].front, "What is ownership?");
        assert_eq!(proposals[1].back, "Rejects aliasing mutable references.");
    }

    #[test]
    fn trims_whitespace_from_entries() {
        let content = r#"{"flashcards":[{"front":"  Q  ","back":"  A  "}]}"#;
        let proposals = parse_proposals(content).unwrap();
        assert_eq!(proposals[0].front, "Q");
        assert_eq!(proposals[0].back, "A");
    }

    #[test]
    fn rejects_empty_list() {
        let err = parse_proposals(r#"{"flashcards":[]}"#).unwrap_err();
        assert_eq!(err.reason(), "invalid_proposals");
    }

    #[test]
    fn rejects_non_json_content() {
        let err = parse_proposals("here are your flashcards!").unwrap_err();
        assert_eq!(err.reason(), "malformed_response");
    }

    #[test]
    fn rejects_entry_missing_a_field() {
        let err = parse_proposals(r#"{"flashcards":[{"front":"only a question"}]}"#).unwrap_err();
        assert_eq!(err.reason(), "malformed_response");
    }

    #[test]
    fn rejects_entry_blank_after_trim() {
        let err = parse_proposals(r#"{"flashcards":[{"front":"   ","back":"A"}]}"#).unwrap_err();
        assert_eq!(err.reason(), "invalid_proposals");
    }

    #[test]
    fn rejects_oversized_front_as_a_unit() {
        let long = "x".repeat(1001);
        let content = format!(
            r#"{{"flashcards":[{{"front":"ok","back":"ok"}},{{"front":"{long}","back":"A"}}]}}"#
        );
        let err = parse_proposals(&content).unwrap_err();
        assert_eq!(err.reason(), "invalid_proposals");
    }
}
