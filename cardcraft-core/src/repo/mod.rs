use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    CoreError, Deck, DeckId, DeckSummary, Flashcard, FlashcardId, FlashcardPatch, FlashcardQuery,
    NewFlashcard, Page, UserId,
};

pub mod memory;

/// Owner-scoped storage. Every operation takes the caller's user id and
/// filters by it; a row that exists but belongs to someone else is reported
/// as `NotFound`, indistinguishable from a row that does not exist.
#[async_trait]
pub trait Repository: Send + Sync {
    // Decks
    async fn create_deck(
        &self,
        user_id: UserId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Deck, CoreError>;
    async fn get_deck(&self, user_id: UserId, id: DeckId) -> Result<Deck, CoreError>;
    /// Newest-updated first, with derived flashcard counts.
    async fn list_decks(&self, user_id: UserId) -> Result<Vec<DeckSummary>, CoreError>;
    /// Removes the deck and every flashcard in it.
    async fn delete_deck(&self, user_id: UserId, id: DeckId) -> Result<(), CoreError>;

    // Flashcards
    async fn create_flashcard(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        new: &NewFlashcard,
    ) -> Result<Flashcard, CoreError>;
    /// Inserts the whole batch or nothing.
    async fn create_flashcards(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        batch: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError>;
    async fn get_flashcard(&self, user_id: UserId, id: FlashcardId)
        -> Result<Flashcard, CoreError>;
    async fn update_flashcard(
        &self,
        user_id: UserId,
        id: FlashcardId,
        patch: &FlashcardPatch,
    ) -> Result<Flashcard, CoreError>;
    async fn delete_flashcard(&self, user_id: UserId, id: FlashcardId) -> Result<(), CoreError>;
    async fn list_flashcards(
        &self,
        user_id: UserId,
        query: &FlashcardQuery,
    ) -> Result<Page<Flashcard>, CoreError>;

    /// AI-generated flashcards the owner created in `[from, to)`. Backs the
    /// daily usage check.
    async fn count_ai_generated(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, CoreError>;
}
