use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, QueryBuilder, Row};

use cardcraft_core::{
    repo::Repository, CardStatus, CoreError, Deck, DeckId, DeckSummary, Flashcard, FlashcardId,
    FlashcardPatch, FlashcardQuery, NewFlashcard, Page, PageInfo, SortField, SortOrder, UserId,
};

pub struct PostgresRepo {
    pool: PgPool,
}

impl PostgresRepo {
    pub async fn connect(url: &str) -> Result<Self, CoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(storage("pg connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        // Ids and timestamps are generated app-side; cascade keeps deck
        // deletion a single statement with no orphan window.
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS decks (
          id          uuid PRIMARY KEY,
          user_id     uuid NOT NULL,
          name        text NOT NULL,
          description text,
          created_at  timestamptz NOT NULL,
          updated_at  timestamptz NOT NULL
        );

        CREATE TABLE IF NOT EXISTS flashcards (
          id           uuid PRIMARY KEY,
          user_id      uuid NOT NULL,
          deck_id      uuid NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
          front        text NOT NULL,
          back         text NOT NULL,
          status       text NOT NULL DEFAULT 'new' CHECK (status IN ('new','learning','review','relearning')),
          ai_generated boolean NOT NULL DEFAULT false,
          ai_accepted  boolean,
          created_at   timestamptz NOT NULL,
          updated_at   timestamptz NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_decks_user_updated ON decks (user_id, updated_at);
        CREATE INDEX IF NOT EXISTS idx_flashcards_user_created ON flashcards (user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_flashcards_deck ON flashcards (deck_id)
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(storage("pg schema"))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepo {
    // ===== Decks =====
    async fn create_deck(
        &self,
        user_id: UserId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Deck, CoreError> {
        let deck = Deck::new(user_id, name, description.map(|s| s.to_string()));
        sqlx::query(
            "INSERT INTO decks (id,user_id,name,description,created_at,updated_at) VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(deck.id)
        .bind(deck.user_id)
        .bind(&deck.name)
        .bind(deck.description.clone())
        .bind(deck.created_at)
        .bind(deck.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage("pg insert deck"))?;
        Ok(deck)
    }

    async fn get_deck(&self, user_id: UserId, id: DeckId) -> Result<Deck, CoreError> {
        let row = sqlx::query(
            "SELECT id,user_id,name,description,created_at,updated_at FROM decks WHERE id=$1 AND user_id=$2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("pg read deck"))?;
        let row = row.ok_or(CoreError::NotFound("deck"))?;
        Ok(row_into_deck(&row))
    }

    async fn list_decks(&self, user_id: UserId) -> Result<Vec<DeckSummary>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT d.id,d.user_id,d.name,d.description,d.created_at,d.updated_at,
                      count(f.id) AS flashcard_count
               FROM decks d LEFT JOIN flashcards f ON f.deck_id = d.id
               WHERE d.user_id=$1
               GROUP BY d.id
               ORDER BY d.updated_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage("pg list decks"))?;
        Ok(rows
            .into_iter()
            .map(|row| DeckSummary {
                flashcard_count: row.get::<i64, _>("flashcard_count") as u64,
                deck: row_into_deck(&row),
            })
            .collect())
    }

    async fn delete_deck(&self, user_id: UserId, id: DeckId) -> Result<(), CoreError> {
        // Flashcards go with the deck via ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM decks WHERE id=$1 AND user_id=$2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(storage("pg del deck"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("deck"));
        }
        Ok(())
    }

    // ===== Flashcards =====
    async fn create_flashcard(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        new: &NewFlashcard,
    ) -> Result<Flashcard, CoreError> {
        let owns = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM decks WHERE id=$1 AND user_id=$2 LIMIT 1",
        )
        .bind(deck_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("pg read deck"))?
        .is_some();
        if !owns {
            return Err(CoreError::NotFound("deck"));
        }

        let card = Flashcard::create(user_id, deck_id, new);
        insert_flashcard(&self.pool, &card).await?;
        Ok(card)
    }

    async fn create_flashcards(
        &self,
        user_id: UserId,
        deck_id: DeckId,
        batch: &[NewFlashcard],
    ) -> Result<Vec<Flashcard>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(storage("pg begin batch"))?;

        let owns = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM decks WHERE id=$1 AND user_id=$2 LIMIT 1",
        )
        .bind(deck_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage("pg read deck"))?
        .is_some();
        if !owns {
            return Err(CoreError::NotFound("deck"));
        }

        let cards: Vec<Flashcard> = batch
            .iter()
            .map(|n| Flashcard::create(user_id, deck_id, n))
            .collect();
        for card in &cards {
            sqlx::query(INSERT_FLASHCARD)
                .bind(card.id)
                .bind(card.user_id)
                .bind(card.deck_id)
                .bind(&card.front)
                .bind(&card.back)
                .bind(status_to_str(card.status))
                .bind(card.ai_generated)
                .bind(card.ai_accepted)
                .bind(card.created_at)
                .bind(card.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(storage("pg insert flashcard"))?;
        }

        // All rows or none: an error above drops the transaction unbidden.
        tx.commit().await.map_err(storage("pg commit batch"))?;
        Ok(cards)
    }

    async fn get_flashcard(
        &self,
        user_id: UserId,
        id: FlashcardId,
    ) -> Result<Flashcard, CoreError> {
        let row = sqlx::query(
            r#"SELECT id,user_id,deck_id,front,back,status,ai_generated,ai_accepted,created_at,updated_at
               FROM flashcards WHERE id=$1 AND user_id=$2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage("pg read flashcard"))?;
        let row = row.ok_or(CoreError::NotFound("flashcard"))?;
        row_into_flashcard(&row)
    }

    async fn update_flashcard(
        &self,
        user_id: UserId,
        id: FlashcardId,
        patch: &FlashcardPatch,
    ) -> Result<Flashcard, CoreError> {
        let res = sqlx::query(
            r#"UPDATE flashcards SET
                 front = COALESCE($1, front),
                 back = COALESCE($2, back),
                 status = COALESCE($3, status),
                 updated_at = $4
               WHERE id=$5 AND user_id=$6"#,
        )
        .bind(patch.front.clone())
        .bind(patch.back.clone())
        .bind(patch.status.map(status_to_str))
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(storage("pg update flashcard"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("flashcard"));
        }
        self.get_flashcard(user_id, id).await
    }

    async fn delete_flashcard(&self, user_id: UserId, id: FlashcardId) -> Result<(), CoreError> {
        let res = sqlx::query("DELETE FROM flashcards WHERE id=$1 AND user_id=$2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(storage("pg del flashcard"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("flashcard"));
        }
        Ok(())
    }

    async fn list_flashcards(
        &self,
        user_id: UserId,
        query: &FlashcardQuery,
    ) -> Result<Page<Flashcard>, CoreError> {
        let mut count_qb = QueryBuilder::new("SELECT count(*) FROM flashcards WHERE user_id = ");
        count_qb.push_bind(user_id);
        push_filters(&mut count_qb, query);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(storage("pg count flashcards"))?;

        let mut qb = QueryBuilder::new(
            "SELECT id,user_id,deck_id,front,back,status,ai_generated,ai_accepted,created_at,updated_at \
             FROM flashcards WHERE user_id = ",
        );
        qb.push_bind(user_id);
        push_filters(&mut qb, query);
        qb.push(match (query.sort(), query.order()) {
            (SortField::CreatedAt, SortOrder::Asc) => " ORDER BY created_at ASC",
            (SortField::CreatedAt, SortOrder::Desc) => " ORDER BY created_at DESC",
            (SortField::UpdatedAt, SortOrder::Asc) => " ORDER BY updated_at ASC",
            (SortField::UpdatedAt, SortOrder::Desc) => " ORDER BY updated_at DESC",
        });
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(query.limit()));
        qb.push(" OFFSET ");
        qb.push_bind(query.offset() as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage("pg list flashcards"))?;
        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            data.push(row_into_flashcard(&row)?);
        }
        Ok(Page {
            data,
            pagination: PageInfo::new(query.page(), query.limit(), total as u64),
        })
    }

    async fn count_ai_generated(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, CoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT count(*) FROM flashcards
               WHERE user_id=$1 AND ai_generated AND created_at >= $2 AND created_at < $3"#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(storage("pg count generated"))?;
        Ok(count as u64)
    }
}

// ===== helpers =====

const INSERT_FLASHCARD: &str = r#"
    INSERT INTO flashcards (
      id, user_id, deck_id, front, back, status, ai_generated, ai_accepted, created_at, updated_at
    ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
"#;

async fn insert_flashcard(pool: &PgPool, card: &Flashcard) -> Result<(), CoreError> {
    sqlx::query(INSERT_FLASHCARD)
        .bind(card.id)
        .bind(card.user_id)
        .bind(card.deck_id)
        .bind(&card.front)
        .bind(&card.back)
        .bind(status_to_str(card.status))
        .bind(card.ai_generated)
        .bind(card.ai_accepted)
        .bind(card.created_at)
        .bind(card.updated_at)
        .execute(pool)
        .await
        .map_err(storage("pg insert flashcard"))?;
    Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, sqlx::Postgres>, query: &FlashcardQuery) {
    if let Some(deck_id) = query.deck_id {
        qb.push(" AND deck_id = ");
        qb.push_bind(deck_id);
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ");
        qb.push_bind(status_to_str(status));
    }
    if let Some(ai_generated) = query.ai_generated {
        qb.push(" AND ai_generated = ");
        qb.push_bind(ai_generated);
    }
}

/// Flattens a sqlx error to the static storage context after logging the
/// full detail; raw driver text never reaches clients.
fn storage(ctx: &'static str) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(error = %e, "{}", ctx);
        CoreError::Storage(ctx)
    }
}

fn status_to_str(status: CardStatus) -> &'static str {
    match status {
        CardStatus::New => "new",
        CardStatus::Learning => "learning",
        CardStatus::Review => "review",
        CardStatus::Relearning => "relearning",
    }
}

fn status_from_str(s: &str) -> Option<CardStatus> {
    match s {
        "new" => Some(CardStatus::New),
        "learning" => Some(CardStatus::Learning),
        "review" => Some(CardStatus::Review),
        "relearning" => Some(CardStatus::Relearning),
        _ => None,
    }
}

fn row_into_deck(row: &sqlx::postgres::PgRow) -> Deck {
    Deck {
        id: row.get::<uuid::Uuid, _>("id"),
        user_id: row.get::<uuid::Uuid, _>("user_id"),
        name: row.get::<String, _>("name"),
        description: row.get::<Option<String>, _>("description"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    }
}

fn row_into_flashcard(row: &sqlx::postgres::PgRow) -> Result<Flashcard, CoreError> {
    Ok(Flashcard {
        id: row.get::<uuid::Uuid, _>("id"),
        user_id: row.get::<uuid::Uuid, _>("user_id"),
        deck_id: row.get::<uuid::Uuid, _>("deck_id"),
        front: row.get::<String, _>("front"),
        back: row.get::<String, _>("back"),
        status: status_from_str(&row.get::<String, _>("status")).ok_or(CoreError::Invalid {
            field: "status",
            reason: "unknown status value".into(),
        })?,
        ai_generated: row.get::<bool, _>("ai_generated"),
        ai_accepted: row.get::<Option<bool>, _>("ai_accepted"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}
