use thiserror::Error;

use crate::CoreError;

/// Character bounds applied to a field after trimming. Lengths are Unicode
/// scalar values, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

/// Source text for AI generation.
pub const GENERATION_TEXT: Bounds = Bounds { min: 50, max: 5000 };
pub const CARD_FRONT: Bounds = Bounds { min: 1, max: 1000 };
pub const CARD_BACK: Bounds = Bounds { min: 1, max: 2000 };
pub const DECK_NAME: Bounds = Bounds { min: 1, max: 100 };
pub const DECK_DESCRIPTION: Bounds = Bounds { min: 0, max: 500 };

/// Upper bound on flashcards accepted in one batch create.
pub const BATCH_MAX: usize = 100;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LengthError {
    #[error("{missing} more characters required")]
    TooShort { missing: usize },
    #[error("{excess} characters over the limit")]
    TooLong { excess: usize },
}

impl Bounds {
    /// Trims, then passes iff `min <= chars <= max`.
    pub fn check(&self, text: &str) -> Result<(), LengthError> {
        let len = text.trim().chars().count();
        if len < self.min {
            Err(LengthError::TooShort {
                missing: self.min - len,
            })
        } else if len > self.max {
            Err(LengthError::TooLong {
                excess: len - self.max,
            })
        } else {
            Ok(())
        }
    }
}

/// Inline form feedback. An empty field below a nonzero minimum reports no
/// message: the user has not attempted it yet. Server-side validation via
/// [`require`] still rejects such input.
pub fn field_error(text: &str, bounds: Bounds) -> Option<String> {
    if text.trim().is_empty() && bounds.min > 0 {
        return None;
    }
    bounds.check(text).err().map(|e| e.to_string())
}

/// Authoritative validation: returns the trimmed value or a field-tagged error.
pub fn require(field: &'static str, text: &str, bounds: Bounds) -> Result<String, CoreError> {
    let trimmed = text.trim();
    bounds.check(trimmed).map_err(|e| CoreError::Invalid {
        field,
        reason: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}
