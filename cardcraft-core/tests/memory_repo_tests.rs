use cardcraft_core::{
    repo::memory::MemoryRepo, repo::Repository, CardStatus, CoreError, FlashcardPatch,
    FlashcardQuery, NewFlashcard, SortOrder,
};
use uuid::Uuid;

fn ai_card(front: &str, back: &str, accepted: bool) -> NewFlashcard {
    NewFlashcard {
        front: front.into(),
        back: back.into(),
        ai_generated: true,
        ai_accepted: Some(accepted),
    }
}

#[tokio::test]
async fn foreign_and_missing_decks_are_indistinguishable() {
    let repo = MemoryRepo::new();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let deck = repo.create_deck(owner, "Mine", None).await.unwrap();

    let foreign = repo.get_deck(stranger, deck.id).await.unwrap_err();
    let missing = repo.get_deck(owner, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(foreign, CoreError::NotFound("deck")));
    assert!(matches!(missing, CoreError::NotFound("deck")));

    // deletion behaves the same way, and the deck survives the attempt
    let err = repo.delete_deck(stranger, deck.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound("deck")));
    assert!(repo.get_deck(owner, deck.id).await.is_ok());
}

#[tokio::test]
async fn deleting_a_deck_removes_its_flashcards() {
    let repo = MemoryRepo::new();
    let user = Uuid::new_v4();
    let deck = repo.create_deck(user, "Doomed", None).await.unwrap();
    let other = repo.create_deck(user, "Kept", None).await.unwrap();

    for i in 0..3 {
        repo.create_flashcard(user, deck.id, &NewFlashcard::manual(format!("q{i}"), "a"))
            .await
            .unwrap();
    }
    repo.create_flashcard(user, other.id, &NewFlashcard::manual("q", "a"))
        .await
        .unwrap();

    repo.delete_deck(user, deck.id).await.unwrap();

    let query = FlashcardQuery {
        deck_id: Some(deck.id),
        ..Default::default()
    };
    let page = repo.list_flashcards(user, &query).await.unwrap();
    assert_eq!(page.pagination.total, 0);

    // the other deck is untouched
    let summaries = repo.list_decks(user).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].flashcard_count, 1);
}

#[tokio::test]
async fn batch_create_persists_every_item_with_its_flags() {
    let repo = MemoryRepo::new();
    let user = Uuid::new_v4();
    let deck = repo.create_deck(user, "Rust", None).await.unwrap();

    let batch = vec![
        ai_card("q0", "a0", true),
        ai_card("q1", "a1", false),
        ai_card("q2", "a2", true),
    ];
    let created = repo.create_flashcards(user, deck.id, &batch).await.unwrap();
    assert_eq!(created.len(), 3);
    for (card, item) in created.iter().zip(&batch) {
        assert_eq!(card.front, item.front);
        assert!(card.ai_generated);
        assert_eq!(card.ai_accepted, item.ai_accepted);
        assert_eq!(card.status, CardStatus::New);
    }

    let err = repo
        .create_flashcards(user, Uuid::new_v4(), &batch)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound("deck")));
}

#[tokio::test]
async fn update_patches_only_provided_fields() {
    let repo = MemoryRepo::new();
    let user = Uuid::new_v4();
    let deck = repo.create_deck(user, "Rust", None).await.unwrap();
    let card = repo
        .create_flashcard(user, deck.id, &NewFlashcard::manual("before", "answer"))
        .await
        .unwrap();

    let patch = FlashcardPatch {
        front: Some("after".into()),
        back: None,
        status: Some(CardStatus::Learning),
    };
    let updated = repo.update_flashcard(user, card.id, &patch).await.unwrap();
    assert_eq!(updated.front, "after");
    assert_eq!(updated.back, "answer");
    assert_eq!(updated.status, CardStatus::Learning);
    assert!(updated.updated_at >= card.updated_at);

    let stranger = Uuid::new_v4();
    let err = repo
        .update_flashcard(stranger, card.id, &patch)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound("flashcard")));
}

#[tokio::test]
async fn listing_filters_sorts_and_paginates() {
    let repo = MemoryRepo::new();
    let user = Uuid::new_v4();
    let deck_a = repo.create_deck(user, "A", None).await.unwrap();
    let deck_b = repo.create_deck(user, "B", None).await.unwrap();

    for i in 0..5 {
        repo.create_flashcard(user, deck_a.id, &NewFlashcard::manual(format!("a{i}"), "x"))
            .await
            .unwrap();
    }
    repo.create_flashcard(user, deck_b.id, &ai_card("b0", "x", true))
        .await
        .unwrap();

    // deck filter + pagination
    let query = FlashcardQuery {
        deck_id: Some(deck_a.id),
        order: Some(SortOrder::Asc),
        limit: Some(2),
        page: Some(2),
        ..Default::default()
    };
    let page = repo.list_flashcards(user, &query).await.unwrap();
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_pages, 3);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].front, "a2");
    assert_eq!(page.data[1].front, "a3");

    // ai_generated filter crosses decks
    let query = FlashcardQuery {
        ai_generated: Some(true),
        ..Default::default()
    };
    let page = repo.list_flashcards(user, &query).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.data[0].front, "b0");

    // default order is newest first
    let page = repo
        .list_flashcards(user, &FlashcardQuery::default())
        .await
        .unwrap();
    assert_eq!(page.data[0].front, "b0");
}
