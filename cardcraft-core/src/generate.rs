use async_trait::async_trait;
use thiserror::Error;

use crate::{validation, FlashcardProposal};

/// Produces flashcard proposals from free-form source text. The caller
/// guarantees the text is trimmed and within generation bounds.
#[async_trait]
pub trait ProposalGenerator: Send + Sync {
    async fn generate(&self, text: &str) -> Result<Vec<FlashcardProposal>, GenerationError>;
}

/// Why a generation attempt failed. Clients only ever see a single
/// "generation failed" kind with the stable [`reason`](Self::reason) token;
/// the Display text (which may quote the upstream provider) is for logs.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion API credential is not configured")]
    MissingCredential,
    #[error("generation timed out after {0} seconds")]
    TimedOut(u64),
    #[error("completion request failed: {0}")]
    Upstream(String),
    #[error("completion response was not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("unusable proposal list: {0}")]
    InvalidProposals(String),
}

impl GenerationError {
    pub fn reason(&self) -> &'static str {
        match self {
            GenerationError::MissingCredential => "missing_credential",
            GenerationError::TimedOut(_) => "timeout",
            GenerationError::Upstream(_) => "upstream_error",
            GenerationError::MalformedResponse(_) => "malformed_response",
            GenerationError::InvalidProposals(_) => "invalid_proposals",
        }
    }
}

/// Validates a parsed proposal list as a unit: non-empty, every item
/// non-empty after trimming and within content bounds. Any violation rejects
/// the whole list; order is preserved.
pub fn validate_proposals(
    raw: Vec<FlashcardProposal>,
) -> Result<Vec<FlashcardProposal>, GenerationError> {
    if raw.is_empty() {
        return Err(GenerationError::InvalidProposals(
            "empty proposal list".into(),
        ));
    }
    raw.into_iter()
        .enumerate()
        .map(|(i, p)| {
            let front = p.front.trim();
            let back = p.back.trim();
            if front.is_empty() || back.is_empty() {
                return Err(GenerationError::InvalidProposals(format!(
                    "proposal {i} has empty content after trimming"
                )));
            }
            if front.chars().count() > validation::CARD_FRONT.max {
                return Err(GenerationError::InvalidProposals(format!(
                    "proposal {i} front exceeds {} characters",
                    validation::CARD_FRONT.max
                )));
            }
            if back.chars().count() > validation::CARD_BACK.max {
                return Err(GenerationError::InvalidProposals(format!(
                    "proposal {i} back exceeds {} characters",
                    validation::CARD_BACK.max
                )));
            }
            Ok(FlashcardProposal {
                front: front.to_string(),
                back: back.to_string(),
            })
        })
        .collect()
}
