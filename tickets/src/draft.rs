//! Event drafts from the creation form.
//!
//! A draft is validated field by field and parked in a [`DraftSlot`] until it
//! can be published.

use crate::listing::EventListing;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Key under which the serialized draft is stored.
pub const DRAFT_KEY: &str = "draft_event";

/// Contents of the event creation form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    /// Event name
    pub name: String,
    /// City
    pub city: String,
    /// Venue
    pub venue: String,
    /// Date and time as entered
    pub datetime: String,
    /// Ticket price
    pub price: f64,
    /// Tickets on sale
    pub quantity: u32,
    /// Short description
    pub description: String,
    /// Preview of the uploaded cover image
    #[serde(default)]
    pub cover_preview: Option<String>,
    /// File name of the uploaded teaser clip
    #[serde(default)]
    pub teaser_name: Option<String>,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            city: String::new(),
            venue: String::new(),
            datetime: String::new(),
            price: 0.0,
            quantity: 50,
            description: String::new(),
            cover_preview: None,
            teaser_name: None,
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as it appears in the form
    pub field: &'static str,
    /// Message shown next to the field
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every rule a draft broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("draft has {} invalid field(s): {}", .0.len(), join(.0))]
pub struct DraftErrors(pub Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DraftErrors {
    /// Rejected fields in form order
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` was rejected
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

fn min_chars(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

impl EventDraft {
    /// Check the form rules, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns [`DraftErrors`] listing each invalid field.
    pub fn validate(&self) -> Result<(), DraftErrors> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &'static str, message: &'static str| {
            if !ok {
                errors.push(FieldError { field, message });
            }
        };

        check(min_chars(&self.name, 3), "name", "Event name is required");
        check(min_chars(&self.city, 2), "city", "City is required");
        check(min_chars(&self.venue, 2), "venue", "Venue is required");
        check(!self.datetime.is_empty(), "datetime", "Date & time is required");
        check(
            self.price.is_finite() && self.price >= 0.0,
            "price",
            "Price must be 0 or more",
        );
        check(self.quantity >= 1, "quantity", "At least 1 ticket");
        check(
            min_chars(&self.description, 10),
            "description",
            "Add a short description",
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DraftErrors(errors))
        }
    }

    /// How the draft would appear in the feed once published.
    #[must_use]
    pub fn preview(&self, creator: impl Into<String>) -> EventListing {
        EventListing {
            id: String::new(),
            title: self.name.clone(),
            creator: creator.into(),
            date: self.datetime.clone(),
            location: format!("{}, {}", self.venue, self.city),
            attendees: self.quantity,
            likes: 0,
            video_thumbnail: self.cover_preview.clone().unwrap_or_default(),
            price: self.price,
        }
    }
}

/// Errors from [`DraftSlot`].
#[derive(Debug, Error)]
pub enum DraftSlotError {
    /// The draft failed validation and was not stored
    #[error(transparent)]
    Invalid(#[from] DraftErrors),

    /// The stored text could not be (de)serialized
    #[error("draft could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// In-memory slot holding one serialized draft.
#[derive(Debug, Default)]
pub struct DraftSlot {
    stored: Mutex<Option<String>>,
}

impl DraftSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `draft`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`DraftSlotError::Invalid`] if the draft breaks a form rule;
    /// nothing is stored in that case.
    pub fn save(&self, draft: &EventDraft) -> Result<(), DraftSlotError> {
        draft.validate()?;
        let json = serde_json::to_string(draft)?;
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        tracing::info!(key = DRAFT_KEY, name = %draft.name, "Event saved as draft");
        Ok(())
    }

    /// Read back the stored draft.
    ///
    /// # Errors
    ///
    /// [`DraftSlotError::Serialization`] if the stored text is not a draft.
    pub fn load(&self) -> Result<Option<EventDraft>, DraftSlotError> {
        let stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        stored
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(DraftSlotError::from)
    }

    /// Raw JSON as stored
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the stored draft.
    pub fn clear(&self) {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
