use serde::{Deserialize, Serialize};

use crate::{CardStatus, DeckId, Flashcard};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters, sort, and pagination for a flashcard listing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FlashcardQuery {
    pub deck_id: Option<DeckId>,
    pub status: Option<CardStatus>,
    pub ai_generated: Option<bool>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FlashcardQuery {
    pub fn sort(&self) -> SortField {
        self.sort.unwrap_or_default()
    }

    pub fn order(&self) -> SortOrder {
        self.order.unwrap_or_default()
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }

    fn matches(&self, card: &Flashcard) -> bool {
        self.deck_id.map_or(true, |d| card.deck_id == d)
            && self.status.map_or(true, |s| card.status == s)
            && self.ai_generated.map_or(true, |a| card.ai_generated == a)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PageInfo {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = (total.div_ceil(u64::from(limit))).min(u64::from(u32::MAX)) as u32;
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

/// Applies filter, sort, and pagination to an owner's cards. Shared by the
/// in-memory repository and tests; SQL backends push the same semantics into
/// the query.
pub fn select_page(cards: &[Flashcard], query: &FlashcardQuery) -> Page<Flashcard> {
    let mut matched: Vec<Flashcard> = cards
        .iter()
        .filter(|c| query.matches(c))
        .cloned()
        .collect();

    matched.sort_by_key(|c| match query.sort() {
        SortField::CreatedAt => c.created_at,
        SortField::UpdatedAt => c.updated_at,
    });
    if query.order() == SortOrder::Desc {
        matched.reverse();
    }

    let total = matched.len() as u64;
    let data: Vec<Flashcard> = matched
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.limit() as usize)
        .collect();

    Page {
        data,
        pagination: PageInfo::new(query.page(), query.limit(), total),
    }
}
