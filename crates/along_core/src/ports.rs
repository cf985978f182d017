//! crates/along_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! pipeline to be independent of the concrete database, LLM, geocoding and
//! flight-search providers behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Blueprint, Coordinates, FlightOffer, FlightSegment, Location, MetArtifact, SegmentStatus,
    TasteProfile, TripIntent, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Record Store Port
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Taste Profiles ---
    /// Full-replace upsert keyed by `profile.user_id`. At most one row per
    /// user; later writes overwrite, never append.
    async fn upsert_taste_profile(&self, profile: TasteProfile) -> PortResult<TasteProfile>;

    async fn get_taste_profile(&self, user_id: Uuid) -> PortResult<TasteProfile>;

    // --- Trip Intents ---
    async fn create_trip_intent(&self, intent: TripIntent) -> PortResult<TripIntent>;

    /// Scoped to the owner: another user's intent is `NotFound`, not leaked.
    async fn get_trip_intent(&self, intent_id: Uuid, owner_id: Uuid) -> PortResult<TripIntent>;

    /// Patches the intent once a build completes: blueprint id, the scope
    /// that was built, and status advanced to `building`.
    async fn attach_blueprint_to_intent(
        &self,
        intent_id: Uuid,
        blueprint_id: Uuid,
        scope_id: &str,
    ) -> PortResult<()>;

    // --- Blueprints and Locations ---
    async fn create_blueprint(&self, blueprint: Blueprint) -> PortResult<Blueprint>;

    async fn get_blueprint(&self, blueprint_id: Uuid, owner_id: Uuid) -> PortResult<Blueprint>;

    /// Bulk insert of one itinerary's locations. Only called after the
    /// owning blueprint row exists.
    async fn insert_locations(&self, locations: &[Location]) -> PortResult<()>;

    async fn get_locations_for_blueprint(&self, blueprint_id: Uuid) -> PortResult<Vec<Location>>;

    // --- Connections ---
    /// Records one resolved flight segment against a blueprint. Returns the
    /// new connection row id. `row_status` may differ from the segment's
    /// response status: an unconfigured provider is recorded as `suggested`
    /// while the response carries `unavailable`.
    async fn create_flight_connection(
        &self,
        blueprint_id: Uuid,
        segment: &FlightSegment,
        row_status: SegmentStatus,
    ) -> PortResult<Uuid>;
}

//=========================================================================================
// External Capability Ports
//=========================================================================================

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Submits a prompt and returns the raw completion text. The text may
    /// carry extraneous formatting (code fences); callers must sanitize.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> PortResult<String>;
}

/// A successfully geocoded place.
#[derive(Debug, Clone)]
pub struct GeocodedPlace {
    pub coordinates: Coordinates,
    pub formatted_address: String,
}

#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Resolves a free-text query to coordinates and a canonical address.
    ///
    /// Returns `None` for provider errors, rate limits and zero results
    /// alike: an unresolvable place is an expected outcome, never an error
    /// that could abort the batch it belongs to.
    async fn geocode(&self, query: &str) -> Option<GeocodedPlace>;
}

#[async_trait]
pub trait ArtifactService: Send + Sync {
    /// Best-effort museum-artifact lookup keyed by (culture, category).
    /// Idempotent and cacheable; `None` on any failure.
    async fn lookup(&self, culture: &str, category: &str) -> Option<MetArtifact>;
}

#[async_trait]
pub trait FlightSearchService: Send + Sync {
    /// Whether a provider key is configured. Without a key no search runs;
    /// segments come back `unavailable` instead of erroring.
    fn is_configured(&self) -> bool;

    /// Searches one origin/destination/date. Offers may come back unsorted;
    /// the resolver ranks by price itself.
    async fn search(
        &self,
        origin_iata: &str,
        destination_iata: &str,
        date: &str,
        passengers: u32,
    ) -> PortResult<Vec<FlightOffer>>;

    /// Route- and date-specific booking deep link. Providers without a
    /// consumer booking page link into a prefilled flight-search page.
    fn deep_link(&self, origin_iata: &str, destination_iata: &str, date: &str) -> String;
}
