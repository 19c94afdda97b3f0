use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cardcraft_core::{
    CardStatus, Deck, DeckSummary, Flashcard, FlashcardProposal, PageInfo, UsageStatus,
};

// ===== requests =====

#[derive(Debug, Deserialize)]
pub struct CreateDeckIn {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFlashcardIn {
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    /// Set by clients saving an accepted AI proposal individually; plain
    /// manual creation leaves both provenance fields out.
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub ai_accepted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlashcardIn {
    pub front: Option<String>,
    pub back: Option<String>,
    pub status: Option<CardStatus>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    pub deck_id: Uuid,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchItemIn {
    pub front: String,
    pub back: String,
    pub ai_accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchIn {
    pub deck_id: Uuid,
    pub flashcards: Vec<BatchItemIn>,
}

// ===== responses =====

#[derive(Debug, Serialize)]
pub struct DeckOut {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub flashcard_count: u64,
}

impl DeckOut {
    pub fn from_new(deck: Deck) -> Self {
        Self {
            id: deck.id,
            name: deck.name,
            description: deck.description,
            created_at: deck.created_at,
            updated_at: deck.updated_at,
            flashcard_count: 0,
        }
    }
}

impl From<DeckSummary> for DeckOut {
    fn from(summary: DeckSummary) -> Self {
        Self {
            flashcard_count: summary.flashcard_count,
            ..Self::from_new(summary.deck)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlashcardOut {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    pub status: CardStatus,
    pub ai_generated: bool,
    pub ai_accepted: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Flashcard> for FlashcardOut {
    fn from(card: Flashcard) -> Self {
        Self {
            id: card.id,
            deck_id: card.deck_id,
            front: card.front,
            back: card.back,
            status: card.status,
            ai_generated: card.ai_generated,
            ai_accepted: card.ai_accepted,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlashcardPageOut {
    pub data: Vec<FlashcardOut>,
    pub pagination: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct UsageOut {
    /// Proposals returned by this call.
    pub generated_count: usize,
    pub total_generated_today: u32,
    pub daily_limit: u32,
}

impl UsageOut {
    pub fn new(generated_count: usize, usage: UsageStatus) -> Self {
        Self {
            generated_count,
            total_generated_today: usage.used_today,
            daily_limit: usage.daily_limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
    pub proposals: Vec<FlashcardProposal>,
    pub usage: UsageOut,
}

#[derive(Debug, Serialize)]
pub struct BatchOut {
    pub created: Vec<FlashcardOut>,
    pub count: usize,
}
