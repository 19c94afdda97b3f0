use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use cardcraft_core::{
    check_usage, next_reset, validation, CoreError, FlashcardPatch, FlashcardQuery, NewFlashcard,
    ProposalGenerator, Repository,
};

use crate::api::auth::CurrentUser;
use crate::api::dto::{
    BatchIn, BatchOut, CreateDeckIn, CreateFlashcardIn, DeckOut, FlashcardOut, FlashcardPageOut,
    GenerateIn, GenerateOut, UpdateFlashcardIn, UsageOut,
};
use crate::api::error::{self, ApiError, ApiJson, ErrorCode};

pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub generator: Arc<dyn ProposalGenerator>,
}

// ===== decks =====

pub async fn list_decks(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<DeckOut>>, ApiError> {
    let decks = st.repo.list_decks(user).await?;
    Ok(Json(decks.into_iter().map(DeckOut::from).collect()))
}

pub async fn create_deck(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreateDeckIn>,
) -> Result<(StatusCode, Json<DeckOut>), ApiError> {
    let name = validation::require("name", &body.name, validation::DECK_NAME)?;
    let description = match body.description.as_deref() {
        Some(d) => {
            let trimmed = validation::require("description", d, validation::DECK_DESCRIPTION)?;
            (!trimmed.is_empty()).then_some(trimmed)
        }
        None => None,
    };
    let deck = st
        .repo
        .create_deck(user, &name, description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(DeckOut::from_new(deck))))
}

pub async fn delete_deck(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    st.repo.delete_deck(user, id).await?;
    Ok(Json(json!({ "deleted": true })))
}

// ===== flashcards =====

pub async fn create_flashcard(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreateFlashcardIn>,
) -> Result<(StatusCode, Json<FlashcardOut>), ApiError> {
    let front = validation::require("front", &body.front, validation::CARD_FRONT)?;
    let back = validation::require("back", &body.back, validation::CARD_BACK)?;
    if body.ai_accepted.is_some() && !body.ai_generated {
        return Err(CoreError::Invalid {
            field: "ai_accepted",
            reason: "only applies to ai_generated flashcards".into(),
        }
        .into());
    }
    let new = NewFlashcard {
        front,
        back,
        ai_generated: body.ai_generated,
        ai_accepted: body.ai_accepted,
    };
    let card = st.repo.create_flashcard(user, body.deck_id, &new).await?;
    Ok((StatusCode::CREATED, Json(FlashcardOut::from(card))))
}

pub async fn update_flashcard(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateFlashcardIn>,
) -> Result<Json<FlashcardOut>, ApiError> {
    let patch = FlashcardPatch {
        front: match &body.front {
            Some(front) => Some(validation::require("front", front, validation::CARD_FRONT)?),
            None => None,
        },
        back: match &body.back {
            Some(back) => Some(validation::require("back", back, validation::CARD_BACK)?),
            None => None,
        },
        status: body.status,
    };
    if patch.is_empty() {
        return Err(CoreError::Invalid {
            field: "body",
            reason: "at least one field must be provided".into(),
        }
        .into());
    }
    let card = st.repo.update_flashcard(user, id, &patch).await?;
    Ok(Json(FlashcardOut::from(card)))
}

pub async fn delete_flashcard(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    st.repo.delete_flashcard(user, id).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn list_flashcards(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<FlashcardQuery>,
) -> Result<Json<FlashcardPageOut>, ApiError> {
    let page = st.repo.list_flashcards(user, &query).await?;
    Ok(Json(FlashcardPageOut {
        data: page.data.into_iter().map(FlashcardOut::from).collect(),
        pagination: page.pagination,
    }))
}

// ===== generation =====

pub async fn generate_flashcards(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<GenerateIn>,
) -> Result<Json<GenerateOut>, ApiError> {
    // Fail fast: nothing leaves this process until the text is known valid.
    let text = validation::require("text", &body.text, validation::GENERATION_TEXT)?;
    st.repo.get_deck(user, body.deck_id).await?;

    let now = Utc::now();
    let usage = check_usage(st.repo.as_ref(), user, now).await?;
    if !usage.can_generate() {
        return Err(error::limit_exceeded(usage, next_reset(now)));
    }

    let proposals = st.generator.generate(&text).await?;
    Ok(Json(GenerateOut {
        usage: UsageOut::new(proposals.len(), usage),
        proposals,
    }))
}

pub async fn batch_create_flashcards(
    State(st): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<BatchIn>,
) -> Result<(StatusCode, Json<BatchOut>), ApiError> {
    if body.flashcards.is_empty() {
        return Err(CoreError::Invalid {
            field: "flashcards",
            reason: "at least one flashcard is required".into(),
        }
        .into());
    }
    if body.flashcards.len() > validation::BATCH_MAX {
        return Err(CoreError::Invalid {
            field: "flashcards",
            reason: format!(
                "cannot create more than {} flashcards at once",
                validation::BATCH_MAX
            ),
        }
        .into());
    }

    let mut items = Vec::with_capacity(body.flashcards.len());
    for (i, item) in body.flashcards.iter().enumerate() {
        let front = item.front.trim();
        let back = item.back.trim();
        validation::CARD_FRONT
            .check(front)
            .map_err(|e| CoreError::Invalid {
                field: "flashcards",
                reason: format!("item {i} front: {e}"),
            })?;
        validation::CARD_BACK
            .check(back)
            .map_err(|e| CoreError::Invalid {
                field: "flashcards",
                reason: format!("item {i} back: {e}"),
            })?;
        items.push(NewFlashcard {
            front: front.to_string(),
            back: back.to_string(),
            ai_generated: true,
            ai_accepted: Some(item.ai_accepted),
        });
    }

    let created = st
        .repo
        .create_flashcards(user, body.deck_id, &items)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BatchOut {
            count: created.len(),
            created: created.into_iter().map(FlashcardOut::from).collect(),
        }),
    ))
}

pub async fn not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "Resource not found")
}
