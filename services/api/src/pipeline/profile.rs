//! services/api/src/pipeline/profile.rs
//!
//! Taste-profile extraction: one LLM call over the raw intake answers,
//! parsed into the structured profile everything downstream depends on.
//! A parse failure here is fatal for the whole intake, since there is no
//! useful fallback for a missing profile.

const PROFILE_PROMPT_TEMPLATE: &str = r#"You are a cultural analyst building a traveler's taste profile.

Analyze these intake answers and extract a rich semantic profile.

ANSWERS:
{answers}

Return a JSON object with this exact shape:
{
  "anchors": {
    "restaurants": ["extracted restaurant names"],
    "artists": ["extracted artist/musician/filmmaker/writer names"],
    "spaces": ["any spaces, hotels, or environments mentioned"]
  },
  "dimensions": {
    "formality": 0.0,
    "density": 0.0,
    "temporality": 0.0,
    "sociality": 0.0,
    "legibility": 0.0
  },
  "pace": "slow_deep|varied|high_coverage",
  "discovery_mode": "wander|researched|local_led",
  "hard_constraints": ["things they explicitly don't want"],
  "soft_preferences": ["things they seem to prefer based on signals"],
  "taste_summary": "A 2-3 sentence first-person narrative about who this traveler is and what they're seeking. Write it as if you're briefing a brilliant local fixer about who's arriving. Be specific and cultural, not generic."
}

Dimension scoring guide (0.0 to 1.0):
- formality: 0=raw/underground/unmarked, 1=refined/institutional/celebrated
- density: 0=sparse/minimal/quiet, 1=layered/maximalist/busy
- temporality: 0=ancient/patinated/historical, 1=contemporary/new/cutting-edge
- sociality: 0=solitary/intimate/private, 1=communal/convivial/social
- legibility: 0=hidden/local-only/unmarked, 1=famous/well-reviewed/on-every-list

Return ONLY valid JSON."#;

use serde::Deserialize;
use uuid::Uuid;

use along_core::domain::{Dimensions, DiscoveryMode, IntakeAnswer, Pace, TasteProfile};
use along_core::extract::{extract, ExtractError};
use along_core::ports::LanguageModelService;

/// The JSON shape the model is instructed to return.
#[derive(Debug, Deserialize)]
struct ProfileShape {
    anchors: serde_json::Value,
    dimensions: Dimensions,
    pace: Pace,
    discovery_mode: DiscoveryMode,
    #[serde(default)]
    hard_constraints: Vec<String>,
    #[serde(default)]
    soft_preferences: Vec<String>,
    #[serde(default)]
    taste_summary: String,
}

pub fn build_prompt(answers: &[IntakeAnswer]) -> String {
    let rendered: Vec<String> = answers
        .iter()
        .map(|a| format!("Q: {}\nA: {}", a.question, a.answer))
        .collect();
    PROFILE_PROMPT_TEMPLATE.replace("{answers}", &rendered.join("\n\n"))
}

/// Extracts a `TasteProfile` for `user_id` from intake answers. Dimension
/// scores are clamped to [0, 1]; the raw answers ride along as audit trail.
pub async fn extract_profile(
    llm: &dyn LanguageModelService,
    user_id: Uuid,
    answers: &[IntakeAnswer],
) -> Result<TasteProfile, ExtractError> {
    let prompt = build_prompt(answers);
    let shape: ProfileShape = extract(llm, &prompt, 2000).await?;

    Ok(TasteProfile {
        user_id,
        anchors: shape.anchors,
        dimensions: shape.dimensions.clamped(),
        pace: shape.pace,
        discovery_mode: shape.discovery_mode,
        hard_constraints: shape.hard_constraints,
        soft_preferences: shape.soft_preferences,
        taste_summary: shape.taste_summary,
        raw_answers: serde_json::to_value(answers).unwrap_or_default(),
    })
}

/// Finds the destination the traveler named during intake.
pub fn destination_from_answers(answers: &[IntakeAnswer]) -> String {
    answers
        .iter()
        .find(|a| a.question_id == "destination")
        .map(|a| a.answer.clone())
        .unwrap_or_else(|| "unknown".to_string())
}
