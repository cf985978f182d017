//! services/api/src/pipeline/onboarding.rs
//!
//! The onboarding "mirror" flow: image choices plus three free-text answers
//! go through one LLM call that returns short mirror phrases and a taste
//! profile. The client-resolved image moods are merged into the profile
//! before upsert; the model never sees them as structured output it could
//! drop.

const ONBOARDING_PROMPT_TEMPLATE: &str = r#"You are an AI travel concierge. You've just learned something deep about a traveler through their choices. Your job is two things:

1. Extract their taste profile as structured data
2. Write 4-6 short, poetic mirror phrases — things that are TRUE about this person when they travel, revealed by their choices

THE TRAVELER CHOSE IMAGES WITH THESE MOODS:
{image_moods}

THEIR CULTURAL ANCHOR:
"{anchor_text}"

THEIR DREAM TRIP (bucket list):
"{bucket_list}"

THEIR HARD CONSTRAINT (what they never want):
"{hard_constraint}"

MIRROR PHRASES: Write 4-6 phrases that feel like revelations, not descriptions. Each should be:
- Short (max 8 words)
- Declarative, not interrogative
- Specific enough to feel true, not generic
- About their travel *mode*, not destinations
- In second person ("You want...", "Mornings...", "The counter...")

TASTE PROFILE: Extract these dimensions based on all evidence:
- formality: 0.0 (underground/raw) to 1.0 (refined/formal)
- density: 0.0 (sparse/empty) to 1.0 (layered/crowded)
- temporality: 0.0 (ancient) to 1.0 (contemporary)
- sociality: 0.0 (solitary) to 1.0 (communal)
- legibility: 0.0 (hidden/obscure) to 1.0 (famous/obvious)
- pace: "slow_deep" | "varied" | "high_coverage"
- discovery_mode: "wander" | "researched" | "local_led"
- taste_summary: A 2-3 sentence narrative of who this traveler is. Used in future trip prompts. Be specific and poetic. Don't mention destinations.

Respond ONLY with valid JSON, no markdown:
{
  "taste_phrases": ["phrase 1", "phrase 2", "phrase 3", "phrase 4"],
  "taste_profile": {
    "anchors": {
      "cultural": "",
      "bucket_list": "",
      "anti_pattern": ""
    },
    "dimensions": {
      "formality": 0.0,
      "density": 0.0,
      "temporality": 0.0,
      "sociality": 0.0,
      "legibility": 0.0
    },
    "pace": "slow_deep",
    "discovery_mode": "wander",
    "taste_summary": ""
  }
}"#;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use along_core::domain::{Dimensions, DiscoveryMode, Pace, TasteProfile};
use along_core::extract::{extract, ExtractError};
use along_core::ports::LanguageModelService;

/// The free-text answers collected across the onboarding acts.
#[derive(Debug, Clone)]
pub struct OnboardingAnswers {
    /// Moods of the images the traveler picked, already resolved client-side.
    pub image_moods: Vec<String>,
    pub anchor_text: String,
    pub bucket_list_trip: String,
    pub hard_constraint: String,
}

#[derive(Debug, Deserialize)]
struct OnboardingShape {
    taste_phrases: Vec<String>,
    taste_profile: ProfileShape,
}

#[derive(Debug, Deserialize)]
struct ProfileShape {
    anchors: serde_json::Value,
    dimensions: Dimensions,
    pace: Pace,
    discovery_mode: DiscoveryMode,
    #[serde(default)]
    taste_summary: String,
}

pub struct MirrorOutcome {
    pub taste_phrases: Vec<String>,
    pub profile: TasteProfile,
}

/// Runs the mirror extraction and merges the image moods into the profile's
/// anchors. A parse failure is fatal for the flow, like regular profile
/// extraction: everything downstream needs this profile.
pub async fn extract_mirror(
    llm: &dyn LanguageModelService,
    user_id: Uuid,
    answers: &OnboardingAnswers,
) -> Result<MirrorOutcome, ExtractError> {
    let prompt = ONBOARDING_PROMPT_TEMPLATE
        .replace("{image_moods}", &answers.image_moods.join(", "))
        .replace("{anchor_text}", &answers.anchor_text)
        .replace("{bucket_list}", &answers.bucket_list_trip)
        .replace("{hard_constraint}", &answers.hard_constraint);

    let shape: OnboardingShape = extract(llm, &prompt, 1200).await?;

    let mut anchors = shape.taste_profile.anchors;
    if let Some(map) = anchors.as_object_mut() {
        map.insert(
            "selected_image_moods".to_string(),
            json!(answers.image_moods),
        );
    }

    let profile = TasteProfile {
        user_id,
        anchors,
        dimensions: shape.taste_profile.dimensions.clamped(),
        pace: shape.taste_profile.pace,
        discovery_mode: shape.taste_profile.discovery_mode,
        hard_constraints: vec![answers.hard_constraint.clone()],
        soft_preferences: Vec::new(),
        taste_summary: shape.taste_profile.taste_summary,
        raw_answers: json!({
            "image_moods": answers.image_moods,
            "anchor_text": answers.anchor_text,
            "bucket_list_trip": answers.bucket_list_trip,
            "hard_constraint": answers.hard_constraint,
        }),
    };

    Ok(MirrorOutcome {
        taste_phrases: shape.taste_phrases,
        profile,
    })
}
