//! One user's suggestion state and its persisted form.

use serde::{Deserialize, Serialize};
use wander_core::{Coordinates, PlainVenue, SuggestError, Venue};

use crate::navigator::Navigator;

/// Per-session state: the query that produced the sequence, the reference
/// point it was ordered against, and the navigator over it.
#[derive(Debug, Clone)]
pub struct SuggestionSession {
    query: String,
    reference: Coordinates,
    navigator: Navigator,
}

/// Serializable layout of a [`SuggestionSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub query: String,
    pub reference_location: Coordinates,
    pub ordered_sequence: Vec<PlainVenue>,
    pub cursor: usize,
}

impl SuggestionSession {
    #[must_use]
    pub fn new(query: impl Into<String>, reference: Coordinates, navigator: Navigator) -> Self {
        Self {
            query: query.into(),
            reference,
            navigator,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn reference(&self) -> Coordinates {
        self.reference
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            query: self.query.clone(),
            reference_location: self.reference,
            ordered_sequence: self
                .navigator
                .sequence()
                .iter()
                .map(Venue::to_plain_record)
                .collect(),
            cursor: self.navigator.cursor(),
        }
    }

    /// Restores a session, keeping the saved order and cursor.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::NoResults`] if the snapshot has no venues.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Result<Self, SuggestError> {
        let sequence = snapshot
            .ordered_sequence
            .into_iter()
            .map(Venue::from_plain_record)
            .collect();
        let navigator = Navigator::resume(sequence, snapshot.cursor)?;
        Ok(Self::new(
            snapshot.query,
            snapshot.reference_location,
            navigator,
        ))
    }
}
