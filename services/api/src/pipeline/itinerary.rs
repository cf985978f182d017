//! services/api/src/pipeline/itinerary.rs
//!
//! Itinerary generation: the richest prompt in the system. Injects the
//! profile narrative, dimension scores, pace, constraints and the selected
//! scope, and requires every place to carry a `fit` rationale tying it back
//! to this specific traveler. A parse failure is fatal, no partial
//! itinerary is better than none, and no blueprint is created.

const ITINERARY_PROMPT_TEMPLATE: &str = r#"You are building a precise, personalized travel itinerary.

TRAVELER PROFILE:
{taste_summary}

Aesthetic dimensions: {dimensions}
Anchors: {anchors}
Pace: {pace}
Discovery mode: {discovery_mode}
Constraints: {constraints}
Preferences: {preferences}

TRIP SCOPE: {scope_title}
Destination: {destination}
Duration: {duration_days} days
Cities: {cities}
Scope highlights: {highlights}

Build a day-by-day itinerary. Each day has 3-5 places. Every place must be:
- A real, specific named location (not generic)
- Genuinely matched to this traveler's taste profile — explain WHY in the "fit" field
- Timed realistically (not 8 places in one day)

Return JSON:
{
  "title": "Trip title that captures the spirit",
  "days": [
    {
      "day": 1,
      "theme": "Arrival day theme (e.g. 'Landing and orienting')",
      "places": [
        {
          "name": "Specific place name",
          "address": "Full address with city and country",
          "category": ["restaurant", "coffee"],
          "time_of_day": "morning|afternoon|evening|night",
          "duration_minutes": 90,
          "fit": "1-2 sentences on why this place is right for this specific traveler",
          "booking_required": false,
          "source_url": "https://..."
        }
      ]
    }
  ]
}

Return ONLY valid JSON. Be specific, not generic. Avoid tourist traps unless the traveler's profile suggests they want them."#;

use serde::Deserialize;

use along_core::domain::{ScopeOption, TasteProfile, TripIntent};
use along_core::extract::{extract, ExtractError};
use along_core::ports::LanguageModelService;

/// One generated place, before geocoding and enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDraft {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub fit: String,
    #[serde(default)]
    pub booking_required: bool,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayDraft {
    pub day: u32,
    #[serde(default)]
    pub theme: String,
    pub places: Vec<PlaceDraft>,
}

/// The parsed itinerary, still unverified against the real world.
#[derive(Debug, Clone, Deserialize)]
pub struct ItineraryDraft {
    pub title: String,
    pub days: Vec<DayDraft>,
}

/// Renders a serde-named enum variant as its wire name ("slow_deep").
fn wire_name<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

pub fn build_prompt(profile: &TasteProfile, intent: &TripIntent, scope: &ScopeOption) -> String {
    ITINERARY_PROMPT_TEMPLATE
        .replace("{taste_summary}", &profile.taste_summary)
        .replace(
            "{dimensions}",
            &serde_json::to_string(&profile.dimensions).unwrap_or_default(),
        )
        .replace(
            "{anchors}",
            &serde_json::to_string(&profile.anchors).unwrap_or_default(),
        )
        .replace("{pace}", &wire_name(&profile.pace))
        .replace("{discovery_mode}", &wire_name(&profile.discovery_mode))
        .replace(
            "{constraints}",
            &serde_json::to_string(&intent.hard_constraints).unwrap_or_default(),
        )
        .replace(
            "{preferences}",
            &serde_json::to_string(&intent.soft_preferences).unwrap_or_default(),
        )
        .replace("{scope_title}", &scope.title)
        .replace("{destination}", &intent.destination)
        .replace("{duration_days}", &scope.duration_days.to_string())
        .replace("{cities}", &scope.cities.join(", "))
        .replace("{highlights}", &scope.highlights.join(", "))
}

/// Generates the day-by-day itinerary for the selected scope.
pub async fn generate_itinerary(
    llm: &dyn LanguageModelService,
    profile: &TasteProfile,
    intent: &TripIntent,
    scope: &ScopeOption,
) -> Result<ItineraryDraft, ExtractError> {
    let prompt = build_prompt(profile, intent, scope);
    extract(llm, &prompt, 6000).await
}
