//! services/api/src/pipeline/scopes.rs
//!
//! Scope generation: one LLM call producing distinct trip "shapes" for a
//! destination and profile. This stage degrades instead of failing: a
//! parse failure returns an empty list so the intake still records the
//! profile and intent, and the user can retry scoping alone.

const SCOPES_PROMPT_TEMPLATE: &str = r#"You are planning a trip to {destination} for someone with this profile:

{taste_summary}

Constraints: {constraints}
Preferences: {preferences}

Generate exactly 3 distinct trip scope options. Each should be a genuinely different shape of the trip — not just duration variations but philosophically different approaches.

Return JSON array:
[{
  "id": "scope_1",
  "title": "Short evocative title (e.g. 'The Deep Cut')",
  "tagline": "One sentence that captures the spirit of this scope",
  "duration_days": 7,
  "cities": ["Tokyo"],
  "pace": "slow_deep|varied|high_coverage",
  "estimated_cost": { "low": 2000, "high": 3500, "currency": "USD" },
  "tradeoffs": "What you gain and what you give up in one sentence",
  "highlights": ["3-4 specific things that define this scope, not generic activities"]
}]

Make the options genuinely different. One could be a single city deep dive. One could span regions. One could be structured around a theme (food, architecture, nature). Return ONLY valid JSON array."#;

use tracing::warn;

use along_core::domain::{ScopeOption, TasteProfile};
use along_core::extract::extract;
use along_core::ports::LanguageModelService;

pub fn build_prompt(profile: &TasteProfile, destination: &str) -> String {
    SCOPES_PROMPT_TEMPLATE
        .replace("{destination}", destination)
        .replace("{taste_summary}", &profile.taste_summary)
        .replace(
            "{constraints}",
            &serde_json::to_string(&profile.hard_constraints).unwrap_or_default(),
        )
        .replace(
            "{preferences}",
            &serde_json::to_string(&profile.soft_preferences).unwrap_or_default(),
        )
}

/// Generates scope options for the destination. The model is asked for
/// exactly 3 but nothing enforces the count; whatever parses is returned
/// as-is. On any extraction failure the list is empty, never an error.
pub async fn generate_scopes(
    llm: &dyn LanguageModelService,
    profile: &TasteProfile,
    destination: &str,
) -> Vec<ScopeOption> {
    let prompt = build_prompt(profile, destination);
    match extract::<Vec<ScopeOption>>(llm, &prompt, 2000).await {
        Ok(scopes) => scopes,
        Err(e) => {
            warn!(error = %e, destination, "Scope generation failed; continuing with no options");
            Vec::new()
        }
    }
}
