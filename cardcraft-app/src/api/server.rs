use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use cardcraft_core::{ProposalGenerator, Repository};

use crate::api::routes::{
    batch_create_flashcards, create_deck, create_flashcard, delete_deck, delete_flashcard,
    generate_flashcards, list_decks, list_flashcards, not_found, update_flashcard, AppState,
};

pub async fn run(
    repo: Arc<dyn Repository>,
    generator: Arc<dyn ProposalGenerator>,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let app = router(AppState { repo, generator });
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "cardcraft API listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/decks", get(list_decks).post(create_deck))
        .route("/decks/:id", delete(delete_deck))
        .route("/flashcards", get(list_flashcards).post(create_flashcard))
        .route(
            "/flashcards/:id",
            patch(update_flashcard).delete(delete_flashcard),
        )
        .route("/flashcards/generate", post(generate_flashcards))
        .route("/flashcards/batch", post(batch_create_flashcards))
        .fallback(not_found)
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}
