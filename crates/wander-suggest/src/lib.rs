//! Suggestion engine for wander.
//!
//! Orders a provider's raw venue list into a distance-biased random sequence,
//! then walks that sequence one venue at a time, hydrating venue details on
//! demand.

pub mod navigator;
pub mod ordering;
pub mod query;
pub mod session;

pub use navigator::{Navigator, Position};
pub use ordering::{
    distance_weighted_order, latlng_distribution, order_suggestions, DegenerateWeighting,
    DEFAULT_SMOOTHING,
};
pub use query::{run_query, search_with_retry, suggest_near, QueryOptions, Suggestions};
pub use session::{SessionSnapshot, SuggestionSession};
