//! Cursor over an ordered suggestion sequence.
//!
//! Moving the cursor hydrates the target venue first and only then commits the
//! move, so a quota or timeout failure leaves both the cursor and the venue
//! exactly as they were. The cursor clamps at `0` and `len - 1`; callers use
//! [`Navigator::has_next`] and [`Navigator::has_previous`] rather than index
//! arithmetic.

use serde::Serialize;
use wander_core::{DetailPayload, DetailProvider, SuggestError, Venue};

#[derive(Debug, Clone)]
pub struct Navigator {
    sequence: Vec<Venue>,
    cursor: usize,
}

/// Where the cursor stands, for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub position: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Navigator {
    /// Positions a new navigator at the first venue.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::NoResults`] if `sequence` is empty.
    pub fn start(sequence: Vec<Venue>) -> Result<Self, SuggestError> {
        Self::resume(sequence, 0)
    }

    /// Rebuilds a navigator at a saved cursor, clamped into range.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::NoResults`] if `sequence` is empty.
    pub fn resume(sequence: Vec<Venue>, cursor: usize) -> Result<Self, SuggestError> {
        if sequence.is_empty() {
            return Err(SuggestError::NoResults);
        }
        let cursor = cursor.min(sequence.len() - 1);
        Ok(Self { sequence, cursor })
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.sequence.len()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            position: self.cursor,
            total: self.total(),
            has_next: self.has_next(),
            has_previous: self.has_previous(),
        }
    }

    #[must_use]
    pub fn sequence(&self) -> &[Venue] {
        &self.sequence
    }

    /// The venue under the cursor, without hydrating it.
    #[must_use]
    pub fn peek(&self) -> &Venue {
        &self.sequence[self.cursor]
    }

    /// Returns the venue under the cursor, hydrating it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::QuotaExceeded`] or [`SuggestError::Timeout`]
    /// from the detail provider. Nothing changes in that case.
    pub async fn current(&mut self, details: &dyn DetailProvider) -> Result<&Venue, SuggestError> {
        self.move_to(self.cursor, details).await
    }

    /// Advances one venue. At the last venue this is a no-op that returns the
    /// current venue.
    ///
    /// # Errors
    ///
    /// Same as [`Navigator::current`].
    pub async fn next(&mut self, details: &dyn DetailProvider) -> Result<&Venue, SuggestError> {
        let target = (self.cursor + 1).min(self.sequence.len() - 1);
        self.move_to(target, details).await
    }

    /// Steps back one venue. At the first venue this is a no-op that returns
    /// the current venue.
    ///
    /// # Errors
    ///
    /// Same as [`Navigator::current`].
    pub async fn previous(&mut self, details: &dyn DetailProvider) -> Result<&Venue, SuggestError> {
        let target = self.cursor.saturating_sub(1);
        self.move_to(target, details).await
    }

    /// Returns to the first venue.
    ///
    /// # Errors
    ///
    /// Same as [`Navigator::current`].
    pub async fn restart(&mut self, details: &dyn DetailProvider) -> Result<&Venue, SuggestError> {
        self.move_to(0, details).await
    }

    async fn move_to(
        &mut self,
        target: usize,
        details: &dyn DetailProvider,
    ) -> Result<&Venue, SuggestError> {
        self.hydrate(target, details).await?;
        self.cursor = target;
        Ok(&self.sequence[target])
    }

    async fn hydrate(
        &mut self,
        index: usize,
        details: &dyn DetailProvider,
    ) -> Result<(), SuggestError> {
        let venue = &mut self.sequence[index];
        if venue.is_hydrated() {
            return Ok(());
        }

        let payload = match details.fetch_details(venue.id()).await {
            Ok(payload) => payload,
            Err(e) if e.is_retry_later() => {
                tracing::warn!(venue_id = %venue.id(), error = %e, "detail lookup aborted");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    venue_id = %venue.id(),
                    error = %e,
                    "detail lookup failed, showing venue without details"
                );
                DetailPayload::default()
            }
        };

        venue.hydrate(payload);
        venue.derive_all();
        Ok(())
    }
}
