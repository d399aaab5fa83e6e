//! HTTP clients for wander's external collaborators: the Foursquare venue
//! search and detail endpoints, and ipdata geolocation.
//!
//! Both clients implement the provider traits from `wander-core`, converting
//! every transport failure into a [`wander_core::SuggestError`] at the boundary.

pub mod error;
pub mod foursquare;
pub mod ipdata;
pub(crate) mod retry;
pub mod types;

pub use error::ProviderError;
pub use foursquare::{FoursquareClient, FoursquareCredentials};
pub use ipdata::IpdataClient;
