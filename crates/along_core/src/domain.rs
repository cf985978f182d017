//! crates/along_core/src/domain.rs
//!
//! Defines the pure, core data structures for the trip-planning pipeline.
//! These structs are independent of any database or transport format; they
//! derive serde because scope options, enrichment bags and research plans
//! are stored and shipped as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Shared Value Types
//=========================================================================================

/// A geographic point. A place without one is valid but off the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// How densely a traveler wants their days packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    SlowDeep,
    Varied,
    HighCoverage,
}

/// How a traveler prefers to find places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    Wander,
    Researched,
    LocalLed,
}

//=========================================================================================
// Taste Profile
//=========================================================================================

/// Five continuous aesthetic scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub formality: f64,
    pub density: f64,
    pub temporality: f64,
    pub sociality: f64,
    pub legibility: f64,
}

impl Dimensions {
    /// Forces every score into [0, 1]. The model is instructed to stay in
    /// range but nothing upstream enforces it.
    pub fn clamped(self) -> Self {
        let c = |v: f64| v.clamp(0.0, 1.0);
        Self {
            formality: c(self.formality),
            density: c(self.density),
            temporality: c(self.temporality),
            sociality: c(self.sociality),
            legibility: c(self.legibility),
        }
    }
}

/// A traveler's extracted aesthetic profile. At most one per user; a later
/// extraction fully replaces the stored row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasteProfile {
    pub user_id: Uuid,
    /// Free-text cultural anchors (restaurants, artists, bucket-list trips,
    /// anti-patterns). Kept as a JSON bag; the shape varies by intake flow.
    pub anchors: serde_json::Value,
    pub dimensions: Dimensions,
    pub pace: Pace,
    pub discovery_mode: DiscoveryMode,
    pub hard_constraints: Vec<String>,
    pub soft_preferences: Vec<String>,
    pub taste_summary: String,
    /// Audit trail of whatever answers produced this profile.
    pub raw_answers: serde_json::Value,
}

/// One answer from the intake questionnaire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeAnswer {
    pub question_id: String,
    pub question: String,
    pub answer: String,
}

//=========================================================================================
// Trip Intent and Scope Options
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Scoping,
    Building,
    Built,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRange {
    pub low: u32,
    pub high: u32,
    pub currency: String,
}

/// One of the distinct trip "shapes" offered before full itinerary
/// generation. Embedded in the owning `TripIntent`, never stored alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeOption {
    pub id: String,
    pub title: String,
    pub tagline: String,
    pub duration_days: u32,
    pub cities: Vec<String>,
    pub pace: Pace,
    pub estimated_cost: CostRange,
    pub tradeoffs: String,
    pub highlights: Vec<String>,
}

/// One planning session: a destination, the generated scope options, and the
/// blueprint the session eventually produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripIntent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub destination: String,
    pub scope_options: Vec<ScopeOption>,
    pub selected_scope_id: Option<String>,
    pub hard_constraints: Vec<String>,
    pub soft_preferences: Vec<String>,
    pub status: IntentStatus,
    pub blueprint_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Blueprint and Locations
//=========================================================================================

/// The persisted trip/map container. Owns a set of `Location`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub story_intent: String,
    pub title: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who put a location on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[serde(rename = "self")]
    SelfSourced,
    Ai,
    Friend,
    Influencer,
    Editorial,
    Dataset,
}

/// A single point of interest owned by a blueprint.
///
/// `coordinates: None` means geocoding did not resolve; the row is retained
/// for audit and manual fixing but must be excluded from route and flight
/// computations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub blueprint_id: Uuid,
    pub name: String,
    pub coordinates: Option<Coordinates>,
    pub category: Vec<String>,
    pub notes: String,
    pub source_type: SourceType,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub confidence: Option<f64>,
    /// Free-form bag: day index, time of day, duration, booking flag,
    /// fit rationale, formatted address, museum artifact reference.
    pub enrichment: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Location {
    /// Whether this location may participate in route/flight computations.
    pub fn is_on_map(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// A Met Open Access object attached to a location as visual enrichment.
/// Always best-effort; `None` never blocks persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetArtifact {
    pub object_id: u64,
    pub title: String,
    pub object_name: String,
    pub image_url: String,
    pub met_url: String,
}

//=========================================================================================
// Research Plans (ephemeral until accepted)
//=========================================================================================

/// A candidate place inside a research theme. Not persisted by the planner;
/// acceptance into a blueprint is a per-place user decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPlace {
    pub name: String,
    pub address: String,
    pub why: String,
    pub category: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchTheme {
    pub id: String,
    pub name: String,
    pub description: String,
    pub places: Vec<ResearchPlace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub title: String,
    pub summary: String,
    pub intent: String,
    pub themes: Vec<ResearchTheme>,
}

//=========================================================================================
// Flight Segments (ephemeral)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Suggested,
    Searching,
    Available,
    Unavailable,
}

/// One flight offer, already reduced to the fields the pipeline ranks on.
/// Amounts stay as provider strings ("234.50"); parsing happens at the
/// comparison site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightOffer {
    pub id: String,
    pub total_amount: String,
    pub total_currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_name: Option<String>,
}

impl FlightOffer {
    /// Total price for ranking. Unparseable amounts sort last.
    pub fn total_price(&self) -> f64 {
        self.total_amount.parse().unwrap_or(f64::MAX)
    }
}

/// A requested leg of travel, before resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub origin_city: String,
    pub destination_city: String,
    /// Pre-resolved IATA overrides, optional.
    #[serde(default)]
    pub origin_iata: Option<String>,
    #[serde(default)]
    pub destination_iata: Option<String>,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub passengers: Option<u32>,
}

/// A resolved leg. Never dropped from the output: an unresolved or failed
/// segment comes back with `status: unavailable` and the generic deep link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSegment {
    pub connection_id: Option<Uuid>,
    pub origin_city: String,
    pub destination_city: String,
    pub origin_iata: Option<String>,
    pub destination_iata: Option<String>,
    pub date: String,
    pub status: SegmentStatus,
    pub cheapest_offer: Option<FlightOffer>,
    pub deep_link_url: String,
}

//=========================================================================================
// Users and Auth Sessions
//=========================================================================================

// Represents a user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_clamp_out_of_range_scores() {
        let d = Dimensions {
            formality: -0.3,
            density: 1.7,
            temporality: 0.5,
            sociality: 0.0,
            legibility: 1.0,
        }
        .clamped();
        assert_eq!(d.formality, 0.0);
        assert_eq!(d.density, 1.0);
        assert_eq!(d.temporality, 0.5);
    }

    #[test]
    fn source_type_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&SourceType::SelfSourced).unwrap(),
            "\"self\""
        );
        assert_eq!(serde_json::to_string(&SourceType::Ai).unwrap(), "\"ai\"");
    }

    #[test]
    fn unparseable_offer_amount_sorts_last() {
        let good = FlightOffer {
            id: "off_1".into(),
            total_amount: "120.50".into(),
            total_currency: "USD".into(),
            carrier_name: None,
        };
        let bad = FlightOffer {
            total_amount: "n/a".into(),
            ..good.clone()
        };
        assert!(good.total_price() < bad.total_price());
    }
}
