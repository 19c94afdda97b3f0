use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type DeckId = Uuid;
pub type FlashcardId = Uuid;

/// Review-scheduling status of a flashcard. Stored but not acted on here;
/// a scheduler consuming it lives outside this service.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    New,
    Learning,
    Review,
    Relearning,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub id: DeckId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(user_id: UserId, name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A deck together with its derived flashcard count, as listed to the owner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckSummary {
    #[serde(flatten)]
    pub deck: Deck,
    pub flashcard_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub id: FlashcardId,
    pub user_id: UserId,
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub status: CardStatus,
    pub ai_generated: bool,
    /// `Some(true)`: AI content kept unedited. `Some(false)`: edited before
    /// saving. `None`: manually authored.
    pub ai_accepted: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn create(user_id: UserId, deck_id: DeckId, new: &NewFlashcard) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            deck_id,
            front: new.front.clone(),
            back: new.back.clone(),
            status: CardStatus::New,
            ai_generated: new.ai_generated,
            ai_accepted: new.ai_accepted,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Content and provenance for a flashcard about to be inserted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewFlashcard {
    pub front: String,
    pub back: String,
    pub ai_generated: bool,
    pub ai_accepted: Option<bool>,
}

impl NewFlashcard {
    pub fn manual(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            ai_generated: false,
            ai_accepted: None,
        }
    }

    /// An accepted AI proposal; `accepted` is false when the user edited the
    /// content before saving.
    pub fn from_proposal(proposal: &FlashcardProposal, accepted: bool) -> Self {
        Self {
            front: proposal.front.clone(),
            back: proposal.back.clone(),
            ai_generated: true,
            ai_accepted: Some(accepted),
        }
    }
}

/// Partial update for a flashcard; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashcardPatch {
    pub front: Option<String>,
    pub back: Option<String>,
    pub status: Option<CardStatus>,
}

impl FlashcardPatch {
    pub fn is_empty(&self) -> bool {
        self.front.is_none() && self.back.is_none() && self.status.is_none()
    }
}

/// An AI-suggested flashcard awaiting user review. Held in memory only;
/// becomes a `Flashcard` on acceptance or vanishes on discard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashcardProposal {
    pub front: String,
    pub back: String,
}
