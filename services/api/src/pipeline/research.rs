//! services/api/src/pipeline/research.rs
//!
//! The research planner: the lighter-weight sibling of the itinerary
//! builder, used for exploratory "build a map" queries. One LLM call with a
//! looser structure (2-4 themes, 3-5 places each, no day/time binding),
//! then the same best-effort geocode fan-out per place. The planner never
//! writes to storage; accepting places into a blueprint is the user's
//! per-place decision, handled elsewhere.

const RESEARCH_PROMPT_TEMPLATE: &str = r#"You are a travel research assistant. A user typed: "{query}"

Interpret what they want and return a structured trip plan as JSON.

Return this exact shape:
{
  "title": "Short evocative title for this map (e.g. 'Tokyo Weekend Ramen Run')",
  "summary": "1-2 sentence description of what this map is about",
  "intent": "weekend_trip" | "day_trip" | "food_tour" | "nature" | "culture" | "nightlife" | "shopping" | "custom",
  "themes": [
    {
      "id": "theme_1",
      "name": "Theme name (e.g. 'Morning Coffee', 'Day 1', 'Hidden Bars')",
      "description": "What this theme covers in 1 sentence",
      "places": [
        {
          "name": "Specific real place name",
          "address": "Full address with city and country",
          "why": "1 sentence on why this place fits",
          "category": ["tag1", "tag2"],
          "source_url": "https://..."
        }
      ]
    }
  ]
}

Rules:
- 2-4 themes max
- 3-5 places per theme
- All places must be real, specific, named locations
- Return ONLY valid JSON, no markdown, no explanation"#;

use futures::stream::{self, StreamExt};

use along_core::domain::{ResearchPlace, ResearchPlan};
use along_core::extract::{extract, ExtractError};
use along_core::ports::{GeocodingService, LanguageModelService};

use super::LOOKUP_CONCURRENCY;

async fn geocode_place(geocoder: &dyn GeocodingService, mut place: ResearchPlace) -> ResearchPlace {
    let query = format!("{} {}", place.name, place.address);
    match geocoder.geocode(&query).await {
        Some(resolved) => {
            place.coordinates = Some(resolved.coordinates);
            place.formatted_address = Some(resolved.formatted_address);
        }
        None => {
            // Flagged but retained: the place stays on the plan without
            // coordinates and acceptance remains a user decision.
            place.coordinates = None;
            place.formatted_address = Some(place.address.clone());
        }
    }
    place
}

/// Generates a research plan for a free-text query and geocodes every place
/// concurrently, best-effort. A parse failure fails the plan, since there
/// is nothing useful to return without one, but nothing has been persisted.
pub async fn plan(
    llm: &dyn LanguageModelService,
    geocoder: &dyn GeocodingService,
    query: &str,
) -> Result<ResearchPlan, ExtractError> {
    let prompt = RESEARCH_PROMPT_TEMPLATE.replace("{query}", query);
    let mut plan: ResearchPlan = extract(llm, &prompt, 4000).await?;

    for theme in &mut plan.themes {
        let places = std::mem::take(&mut theme.places);
        theme.places = stream::iter(places)
            .map(|p| geocode_place(geocoder, p))
            .buffered(LOOKUP_CONCURRENCY)
            .collect()
            .await;
    }

    Ok(plan)
}

/// Refines an existing plan by re-running the planner with the original
/// query plus the refinement instruction appended. Full regeneration, not
/// incremental editing: previously generated wording may change.
pub async fn refine(
    llm: &dyn LanguageModelService,
    geocoder: &dyn GeocodingService,
    original_query: &str,
    instruction: &str,
) -> Result<ResearchPlan, ExtractError> {
    let composed = format!("{original_query}\n\nRefinement: {instruction}");
    plan(llm, geocoder, &composed).await
}
