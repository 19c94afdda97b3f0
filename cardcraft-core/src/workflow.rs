//! Generation-and-verification workflow.
//!
//! Client-driven state machine for the create-flashcards flow: pick a deck,
//! generate proposals, review and edit them, commit individually or as one
//! batch. The machine owns the draft list and per-draft save state; network
//! calls happen outside it, bracketed by `begin_*`/`complete_*`/`fail_*`.

use std::time::Duration;

use thiserror::Error;

use crate::{DeckId, Flashcard, FlashcardProposal, NewFlashcard, UsageStatus};

/// Pause between a successful batch save and the success screen, so the user
/// sees every card flip to saved.
pub const SUCCESS_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    DeckSelection,
    Generator,
    Verification,
    Success,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    /// A failed save; retryable exactly like `Idle`.
    Error,
}

/// Session-local draft key. Never persisted; dies with the flow.
pub type DraftKey = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    pub key: DraftKey,
    pub front: String,
    pub back: String,
    /// Set on the first change to either field and never cleared, even when
    /// the user types the original value back in.
    pub edited: bool,
    pub save_state: SaveState,
}

impl Draft {
    fn from_proposal(key: DraftKey, proposal: FlashcardProposal) -> Self {
        Self {
            key,
            front: proposal.front,
            back: proposal.back,
            edited: false,
            save_state: SaveState::Idle,
        }
    }

    pub fn ai_accepted(&self) -> bool {
        !self.edited
    }

    fn payload(&self) -> NewFlashcard {
        NewFlashcard {
            front: self.front.clone(),
            back: self.back.clone(),
            ai_generated: true,
            ai_accepted: Some(self.ai_accepted()),
        }
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("operation not allowed in the {0:?} stage")]
    WrongStage(Stage),
    #[error("unknown draft")]
    UnknownDraft,
    #[error("a save for this draft is in flight")]
    SaveInFlight,
    #[error("draft is already saved")]
    AlreadySaved,
    #[error("nothing left to save")]
    NothingToSave,
}

#[derive(Debug, Default)]
pub struct GenerationFlow {
    stage: Stage,
    deck: Option<DeckId>,
    drafts: Vec<Draft>,
    usage: Option<UsageStatus>,
    created: Vec<Flashcard>,
    next_key: DraftKey,
}

impl GenerationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn deck(&self) -> Option<DeckId> {
        self.deck
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn usage(&self) -> Option<UsageStatus> {
        self.usage
    }

    pub fn created(&self) -> &[Flashcard] {
        &self.created
    }

    /// Drafts not yet committed (anything but `Saved`).
    pub fn unsaved(&self) -> impl Iterator<Item = &Draft> {
        self.drafts
            .iter()
            .filter(|d| d.save_state != SaveState::Saved)
    }

    fn expect_stage(&self, want: Stage) -> Result<(), FlowError> {
        if self.stage() == want {
            Ok(())
        } else {
            Err(FlowError::WrongStage(self.stage()))
        }
    }

    fn draft_mut(&mut self, key: DraftKey) -> Result<&mut Draft, FlowError> {
        self.drafts
            .iter_mut()
            .find(|d| d.key == key)
            .ok_or(FlowError::UnknownDraft)
    }

    // ===== stage transitions =====

    pub fn select_deck(&mut self, deck: DeckId) -> Result<(), FlowError> {
        self.expect_stage(Stage::DeckSelection)?;
        self.deck = Some(deck);
        self.stage = Stage::Generator;
        Ok(())
    }

    /// Enters verification with a fresh draft list; keys are assigned from a
    /// session-local counter and the model's ordering is preserved.
    pub fn proposals_ready(
        &mut self,
        proposals: Vec<FlashcardProposal>,
        usage: UsageStatus,
    ) -> Result<(), FlowError> {
        self.expect_stage(Stage::Generator)?;
        self.drafts = proposals
            .into_iter()
            .map(|p| {
                let key = self.next_key;
                self.next_key += 1;
                Draft::from_proposal(key, p)
            })
            .collect();
        self.usage = Some(usage);
        self.stage = Stage::Verification;
        Ok(())
    }

    /// Steps backward one stage: verification drops its drafts, the generator
    /// drops the selected deck. No-op elsewhere.
    pub fn cancel(&mut self) {
        match self.stage() {
            Stage::Verification => {
                self.drafts.clear();
                self.stage = Stage::Generator;
            }
            Stage::Generator => {
                self.deck = None;
                self.stage = Stage::DeckSelection;
            }
            Stage::DeckSelection | Stage::Success => {}
        }
    }

    pub fn start_over(&mut self) {
        *self = Self {
            next_key: self.next_key,
            ..Self::default()
        };
    }

    /// From the success screen back to the generator, keeping the deck.
    pub fn generate_more(&mut self) -> Result<(), FlowError> {
        self.expect_stage(Stage::Success)?;
        self.drafts.clear();
        self.created.clear();
        self.stage = Stage::Generator;
        Ok(())
    }

    // ===== draft editing =====

    pub fn edit_front(&mut self, key: DraftKey, value: impl Into<String>) -> Result<(), FlowError> {
        self.edit(key, value.into(), true)
    }

    pub fn edit_back(&mut self, key: DraftKey, value: impl Into<String>) -> Result<(), FlowError> {
        self.edit(key, value.into(), false)
    }

    fn edit(&mut self, key: DraftKey, value: String, front: bool) -> Result<(), FlowError> {
        self.expect_stage(Stage::Verification)?;
        let draft = self.draft_mut(key)?;
        match draft.save_state {
            SaveState::Saving => return Err(FlowError::SaveInFlight),
            SaveState::Saved => return Err(FlowError::AlreadySaved),
            SaveState::Idle | SaveState::Error => {}
        }
        let field = if front {
            &mut draft.front
        } else {
            &mut draft.back
        };
        if *field != value {
            draft.edited = true;
        }
        *field = value;
        Ok(())
    }

    /// Removes a draft from the session. Local only; no server call, no trace.
    pub fn remove_draft(&mut self, key: DraftKey) -> Result<(), FlowError> {
        self.expect_stage(Stage::Verification)?;
        let draft = self.draft_mut(key)?;
        if draft.save_state == SaveState::Saving {
            return Err(FlowError::SaveInFlight);
        }
        self.drafts.retain(|d| d.key != key);
        Ok(())
    }

    // ===== single save =====

    /// Marks the draft in flight and hands back the create payload. The
    /// saving state disables its own controls: a second save, an edit, or a
    /// removal of the same draft is refused until the outcome lands.
    pub fn begin_save(&mut self, key: DraftKey) -> Result<NewFlashcard, FlowError> {
        self.expect_stage(Stage::Verification)?;
        let draft = self.draft_mut(key)?;
        match draft.save_state {
            SaveState::Saving => Err(FlowError::SaveInFlight),
            SaveState::Saved => Err(FlowError::AlreadySaved),
            SaveState::Idle | SaveState::Error => {
                draft.save_state = SaveState::Saving;
                Ok(draft.payload())
            }
        }
    }

    /// Saved drafts are excluded from any later batch.
    pub fn complete_save(&mut self, key: DraftKey) -> Result<(), FlowError> {
        let draft = self.draft_mut(key)?;
        if draft.save_state != SaveState::Saving {
            return Err(FlowError::SaveInFlight);
        }
        draft.save_state = SaveState::Saved;
        Ok(())
    }

    pub fn fail_save(&mut self, key: DraftKey) -> Result<(), FlowError> {
        let draft = self.draft_mut(key)?;
        if draft.save_state != SaveState::Saving {
            return Err(FlowError::SaveInFlight);
        }
        draft.save_state = SaveState::Error;
        Ok(())
    }

    // ===== batch save =====

    /// Marks every unsaved draft in flight and returns their payloads in
    /// list order, each tagged `ai_accepted = !edited`. Refused while any
    /// individual save is still pending.
    pub fn begin_batch(&mut self) -> Result<Vec<NewFlashcard>, FlowError> {
        self.expect_stage(Stage::Verification)?;
        if self
            .drafts
            .iter()
            .any(|d| d.save_state == SaveState::Saving)
        {
            return Err(FlowError::SaveInFlight);
        }
        let payloads: Vec<NewFlashcard> = self.unsaved().map(Draft::payload).collect();
        if payloads.is_empty() {
            return Err(FlowError::NothingToSave);
        }
        for draft in &mut self.drafts {
            if draft.save_state != SaveState::Saved {
                draft.save_state = SaveState::Saving;
            }
        }
        Ok(payloads)
    }

    /// All rows committed together: every in-flight draft flips to saved and
    /// the created cards are recorded. The caller shows the saved state for
    /// [`SUCCESS_DELAY`] before calling [`finish`](Self::finish).
    pub fn complete_batch(&mut self, created: Vec<Flashcard>) -> Result<(), FlowError> {
        self.expect_stage(Stage::Verification)?;
        for draft in &mut self.drafts {
            if draft.save_state == SaveState::Saving {
                draft.save_state = SaveState::Saved;
            }
        }
        self.created = created;
        Ok(())
    }

    /// Nothing was committed; every in-flight draft returns to idle.
    pub fn fail_batch(&mut self) -> Result<(), FlowError> {
        self.expect_stage(Stage::Verification)?;
        for draft in &mut self.drafts {
            if draft.save_state == SaveState::Saving {
                draft.save_state = SaveState::Idle;
            }
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), FlowError> {
        self.expect_stage(Stage::Verification)?;
        if self
            .drafts
            .iter()
            .any(|d| d.save_state == SaveState::Saving)
        {
            return Err(FlowError::SaveInFlight);
        }
        self.stage = Stage::Success;
        Ok(())
    }
}
