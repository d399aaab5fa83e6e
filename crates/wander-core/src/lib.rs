//! Shared domain model, error taxonomy, provider seams, and configuration for
//! the wander venue-suggestion workspace.

mod app_config;
mod config;
pub mod error;
pub mod location;
pub mod provider;
pub mod venue;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, SuggestError};
pub use location::{Coordinates, LocationRecord};
pub use provider::{
    DetailProvider, LocationProvider, SearchParams, VenueSearchProvider, DEFAULT_LIMIT,
    DEFAULT_RADIUS_METERS, MAX_LIMIT, MAX_RADIUS_METERS,
};
pub use venue::{
    ContactInfo, DetailKind, DetailPayload, DetailValue, OpeningHours, PlainVenue, RawVenue,
    Timeframe, Venue, VenueLocation, HOURS_NOT_LISTED, UNKNOWN_RATING,
};
