use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::{
    query, CoreError, Deck, DeckId, DeckSummary, Flashcard, FlashcardId, FlashcardPatch,
    FlashcardQuery, NewFlashcard, Page, UserId,
};

#[derive(Default)]
pub struct MemoryRepo {
    decks: RwLock<HashMap<DeckId, Deck>>,
    cards: RwLock<HashMap<FlashcardId, Flashcard>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn create_deck(
        &self,
        user_id: UserId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Deck, CoreError> {
        let deck = Deck::new(user_id, name, description.map(|s| s.to_string()));
        self.decks.write().insert(deck.id, deck.clone());
        Ok(deck)
    }

    async fn get_deck(&self, user_id: UserId, id: DeckId) -> Result<Deck, CoreError> {
        self.decks
            .read()
            .get(&id)
            .filter(|d| d.user_id == user_id)
            .cloned()
            .ok_or(CoreError::NotFound("deck"))
    }

    async fn list_decks(&self, user_id: UserId) -> Result<Vec<DeckSummary>, CoreError> {
        let cards = self.cards.read();
        let mut summaries: Vec<DeckSummary> = self
            .decks
            .read()
            .values()
            .filter(|d| d.user_id == user_id)
            .map(|d| DeckSummary {
                deck: d.clone(),
                flashcard_count: cards.values().filter(|c| c.deck_id == d.id).count() as u64,
            })
            .collect();
        summaries.sort_by(|a, b| b.deck.updated_at.cmp(&a.deck.updated_at));
        Ok(summaries)
    }

    async fn delete_deck(&self, user_id: UserId, id: DeckId) -> Result<(), CoreError> {
        {
            let mut decks = self.decks.write();
            let owned = decks.get(&id).map_or(false, |d| d.user_id == user_id);
            if !owned {
                return Err(CoreError::NotFound("deck"));
            }
            decks.remove(&id);
        }
        self.cards.write().retain(|_, c| c.deck_id != id);
        Ok(())
    }

    async fn create_flashcard(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        new: &NewFlashcard,
    ) -> Result<Flashcard, CoreError> {
        self.get_deck(user_id, deck_id).await?;
        let card = Flashcard::create(user_id, deck_id, new);
        self.cards.write().insert(card.id, card.clone());
        Ok(card)
    }

    async fn create_flashcards(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        batch: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        self.get_deck(user_id, deck_id).await?;
        let created: Vec<Flashcard> = batch
            .iter()
            .map(|n| Flashcard::create(user_id, deck_id, n))
            .collect();
        // Single write-lock hold keeps the batch all-or-nothing.
        let mut cards = self.cards.write();
        for card in &created {
            cards.insert(card.id, card.clone());
        }
        Ok(created)
    }

    async fn get_flashcard(
        &self,
        user_id: UserId,
        id: FlashcardId,
    ) -> Result<Flashcard, CoreError> {
        self.cards
            .read()
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned()
            .ok_or(CoreError::NotFound("flashcard"))
    }

    async fn update_flashcard(
        &self,
        user_id: UserId,
        id: FlashcardId,
        patch: &FlashcardPatch,
    ) -> Result<Flashcard, CoreError> {
        let mut cards = self.cards.write();
        let card = cards
            .get_mut(&id)
            .filter(|c| c.user_id == user_id)
            .ok_or(CoreError::NotFound("flashcard"))?;
        if let Some(front) = &patch.front {
            card.front = front.clone();
        }
        if let Some(back) = &patch.back {
            card.back = back.clone();
        }
        if let Some(status) = patch.status {
            card.status = status;
        }
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    async fn delete_flashcard(&self, user_id: UserId, id: FlashcardId) -> Result<(), CoreError> {
        let mut cards = self.cards.write();
        let owned = cards.get(&id).map_or(false, |c| c.user_id == user_id);
        if !owned {
            return Err(CoreError::NotFound("flashcard"));
        }
        cards.remove(&id);
        Ok(())
    }

    async fn list_flashcards(
        &self,
        user_id: UserId,
        query: &FlashcardQuery,
    ) -> Result<Page<Flashcard>, CoreError> {
        let owned: Vec<Flashcard> = self
            .cards
            .read()
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        Ok(query::select_page(&owned, query))
    }

    async fn count_ai_generated(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, CoreError> {
        Ok(self
            .cards
            .read()
            .values()
            .filter(|c| {
                c.user_id == user_id && c.ai_generated && c.created_at >= from && c.created_at < to
            })
            .count() as u64)
    }
}
