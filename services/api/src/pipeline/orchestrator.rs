//! services/api/src/pipeline/orchestrator.rs
//!
//! Sequences the pipeline stages for one planning session:
//!
//! ```text
//! INTAKE_RECEIVED → PROFILE_EXTRACTED → SCOPES_GENERATED → SCOPE_SELECTED
//!                 → ITINERARY_BUILT → PERSISTED
//! ```
//!
//! Profile extraction failing is fatal (nothing downstream works without
//! it). Scope generation failing degrades to an empty option list. The
//! build stage fans out geocoding and artifact enrichment per place and
//! joins on every lookup before persisting. Persistence is two-phase:
//! blueprint row first, then the location batch, then the intent patch.
//! A failed blueprint insert aborts before any location write.
//!
//! Builds are deliberately not idempotent: running the build twice for the
//! same intent creates two blueprints. Callers gate repeat invocation.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use along_core::dedupe::dedupe_by_name;
use along_core::domain::{
    Blueprint, Coordinates, IntakeAnswer, IntentStatus, Location, MetArtifact, ResearchPlan,
    ScopeOption, SourceType, TasteProfile, TripIntent,
};
use along_core::ports::{
    ArtifactService, DatabaseService, GeocodingService, LanguageModelService, PortError,
};

use super::itinerary::{self, PlaceDraft};
use super::onboarding::{self, MirrorOutcome, OnboardingAnswers};
use super::research;
use super::{profile, scopes, PipelineError, PipelineResult, LOOKUP_CONCURRENCY};

const BUILDER_SOURCE_NAME: &str = "Along Trip Builder";
const BUILDER_CONFIDENCE: f64 = 0.88;

/// Everything the intake flow produces.
#[derive(Debug)]
pub struct IntakeOutcome {
    pub trip_intent: TripIntent,
    pub profile: TasteProfile,
}

/// Everything the build stage produces.
#[derive(Debug)]
pub struct BuildOutcome {
    pub blueprint_id: Uuid,
    pub title: String,
    pub days: usize,
    pub total_places: usize,
    pub locations: Vec<Location>,
}

/// One flattened place after the geocode/enrich join, ready to persist.
struct ResolvedPlace {
    draft: PlaceDraft,
    day: u32,
    coordinates: Option<Coordinates>,
    formatted_address: String,
    artifact: Option<MetArtifact>,
}

/// The pipeline orchestrator. Holds one port per external capability; all
/// stage logic lives in the sibling modules.
#[derive(Clone)]
pub struct TripPipeline {
    db: Arc<dyn DatabaseService>,
    profile_llm: Arc<dyn LanguageModelService>,
    trip_llm: Arc<dyn LanguageModelService>,
    research_llm: Arc<dyn LanguageModelService>,
    geocoder: Arc<dyn GeocodingService>,
    artifacts: Arc<dyn ArtifactService>,
}

impl TripPipeline {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        profile_llm: Arc<dyn LanguageModelService>,
        trip_llm: Arc<dyn LanguageModelService>,
        research_llm: Arc<dyn LanguageModelService>,
        geocoder: Arc<dyn GeocodingService>,
        artifacts: Arc<dyn ArtifactService>,
    ) -> Self {
        Self {
            db,
            profile_llm,
            trip_llm,
            research_llm,
            geocoder,
            artifacts,
        }
    }

    //=====================================================================================
    // Intake: answers → profile → scopes → trip intent
    //=====================================================================================

    /// Extracts the taste profile, generates scope options and records the
    /// trip intent. Scope generation may come back empty; the intent and
    /// profile are persisted regardless so the user can retry scoping.
    pub async fn submit_intake(
        &self,
        owner_id: Uuid,
        answers: &[IntakeAnswer],
    ) -> PipelineResult<IntakeOutcome> {
        let destination = profile::destination_from_answers(answers);

        let extracted = profile::extract_profile(self.profile_llm.as_ref(), owner_id, answers)
            .await
            .map_err(PipelineError::generation("taste profile"))?;
        let stored_profile = self.db.upsert_taste_profile(extracted).await?;

        let scope_options =
            scopes::generate_scopes(self.trip_llm.as_ref(), &stored_profile, &destination).await;
        if scope_options.is_empty() {
            warn!(%owner_id, %destination, "Intake proceeding without scope options");
        }

        let intent = self
            .db
            .create_trip_intent(TripIntent {
                id: Uuid::new_v4(),
                owner_id,
                destination,
                scope_options,
                selected_scope_id: None,
                hard_constraints: stored_profile.hard_constraints.clone(),
                soft_preferences: stored_profile.soft_preferences.clone(),
                status: IntentStatus::Scoping,
                blueprint_id: None,
                created_at: Utc::now(),
            })
            .await?;

        info!(intent_id = %intent.id, scopes = intent.scope_options.len(), "Intake recorded");
        Ok(IntakeOutcome {
            trip_intent: intent,
            profile: stored_profile,
        })
    }

    /// The onboarding mirror flow: same upsert semantics as intake, with
    /// the client-resolved image moods merged in before persistence.
    pub async fn run_onboarding(
        &self,
        owner_id: Uuid,
        answers: &OnboardingAnswers,
    ) -> PipelineResult<MirrorOutcome> {
        let outcome = onboarding::extract_mirror(self.profile_llm.as_ref(), owner_id, answers)
            .await
            .map_err(PipelineError::generation("taste profile"))?;
        let profile = self.db.upsert_taste_profile(outcome.profile).await?;
        Ok(MirrorOutcome {
            taste_phrases: outcome.taste_phrases,
            profile,
        })
    }

    //=====================================================================================
    // Build: scope selection → itinerary → geocode/enrich fan-out → persist
    //=====================================================================================

    /// Builds the itinerary for a selected scope and persists it as a new
    /// blueprint with one location per generated place.
    pub async fn build_itinerary(
        &self,
        owner_id: Uuid,
        trip_intent_id: Uuid,
        scope_id: Option<String>,
    ) -> PipelineResult<BuildOutcome> {
        let intent = self.db.get_trip_intent(trip_intent_id, owner_id).await?;
        let taste = self.db.get_taste_profile(owner_id).await?;
        let scope = select_scope(&intent, scope_id.as_deref())?;

        let draft =
            itinerary::generate_itinerary(self.trip_llm.as_ref(), &taste, &intent, &scope)
                .await
                .map_err(PipelineError::generation("itinerary"))?;
        let day_count = draft.days.len();
        let title = draft.title.clone();

        // Flatten day-by-day places, drop exact-name repeats, then resolve
        // every place concurrently. `buffered` keeps LLM output order.
        let flattened: Vec<(u32, PlaceDraft)> = draft
            .days
            .into_iter()
            .flat_map(|day| {
                let number = day.day;
                day.places.into_iter().map(move |p| (number, p))
            })
            .collect();
        let flattened = dedupe_by_name(flattened, |(_, p)| p.name.as_str());

        let resolved: Vec<ResolvedPlace> = stream::iter(flattened)
            .map(|(day, place)| self.resolve_place(day, place, &intent.destination))
            .buffered(LOOKUP_CONCURRENCY)
            .collect()
            .await;

        let unresolved = resolved.iter().filter(|p| p.coordinates.is_none()).count();
        if unresolved > 0 {
            warn!(unresolved, total = resolved.len(), "Some places did not geocode");
        }

        // Two-phase persist: blueprint first; locations only if it exists.
        let blueprint = self
            .db
            .create_blueprint(Blueprint {
                id: Uuid::new_v4(),
                owner_id,
                story_intent: "travel".to_string(),
                title: title.clone(),
                metadata: json!({
                    "title": title,
                    "is_public": false,
                    "tags": [intent.destination],
                    "artifact_type": "trip_itinerary",
                    "trip_intent_id": trip_intent_id,
                    "scope_id": scope.id,
                }),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await?;

        let locations: Vec<Location> = resolved
            .into_iter()
            .map(|place| to_location(place, blueprint.id))
            .collect();
        self.db.insert_locations(&locations).await?;

        self.db
            .attach_blueprint_to_intent(trip_intent_id, blueprint.id, &scope.id)
            .await?;

        info!(
            blueprint_id = %blueprint.id,
            days = day_count,
            places = locations.len(),
            "Itinerary built"
        );
        Ok(BuildOutcome {
            blueprint_id: blueprint.id,
            title: blueprint.title,
            days: day_count,
            total_places: locations.len(),
            locations,
        })
    }

    /// Geocodes one place and fetches its best-effort artifact. Both halves
    /// absorb their own failures; this future never errors.
    async fn resolve_place(&self, day: u32, draft: PlaceDraft, destination: &str) -> ResolvedPlace {
        let query = format!("{} {}", draft.name, draft.address);
        let geocoded = self.geocoder.geocode(&query).await;

        let primary_category = draft
            .category
            .first()
            .map(String::as_str)
            .unwrap_or("landmark");
        let artifact = self.artifacts.lookup(destination, primary_category).await;

        let formatted_address = geocoded
            .as_ref()
            .map(|g| g.formatted_address.clone())
            .unwrap_or_else(|| draft.address.clone());
        ResolvedPlace {
            coordinates: geocoded.map(|g| g.coordinates),
            formatted_address,
            artifact,
            day,
            draft,
        }
    }

    /// Listing helper for the caller-facing API: blueprint must belong to
    /// the caller.
    pub async fn list_locations(
        &self,
        owner_id: Uuid,
        blueprint_id: Uuid,
    ) -> PipelineResult<Vec<Location>> {
        self.db.get_blueprint(blueprint_id, owner_id).await?;
        Ok(self.db.get_locations_for_blueprint(blueprint_id).await?)
    }

    //=====================================================================================
    // Research mode
    //=====================================================================================

    pub async fn run_research(&self, query: &str) -> PipelineResult<ResearchPlan> {
        research::plan(self.research_llm.as_ref(), self.geocoder.as_ref(), query)
            .await
            .map_err(PipelineError::generation("research plan"))
    }

    pub async fn refine_research(
        &self,
        query: &str,
        instruction: &str,
    ) -> PipelineResult<ResearchPlan> {
        research::refine(
            self.research_llm.as_ref(),
            self.geocoder.as_ref(),
            query,
            instruction,
        )
        .await
        .map_err(PipelineError::generation("research plan"))
    }
}

/// Picks the scope to build: an explicit request wins, then the previously
/// selected scope, then the first option.
fn select_scope(intent: &TripIntent, requested: Option<&str>) -> PipelineResult<ScopeOption> {
    let wanted = requested.or(intent.selected_scope_id.as_deref());
    let scope = match wanted {
        Some(id) => intent.scope_options.iter().find(|s| s.id == id),
        None => None,
    }
    .or_else(|| intent.scope_options.first());

    scope
        .cloned()
        .ok_or_else(|| PipelineError::Port(PortError::NotFound("Scope not found".to_string())))
}

fn to_location(place: ResolvedPlace, blueprint_id: Uuid) -> Location {
    let artifact = place.artifact.as_ref().map(|a| {
        json!({
            "object_id": a.object_id,
            "image_url": a.image_url,
            "title": a.title,
            "object_name": a.object_name,
            "met_url": a.met_url,
        })
    });
    Location {
        id: Uuid::new_v4(),
        blueprint_id,
        name: place.draft.name,
        coordinates: place.coordinates,
        category: place.draft.category,
        notes: place.draft.fit.clone(),
        source_type: SourceType::Ai,
        source_name: Some(BUILDER_SOURCE_NAME.to_string()),
        source_url: place.draft.source_url.clone(),
        confidence: Some(BUILDER_CONFIDENCE),
        enrichment: json!({
            "formatted_address": place.formatted_address,
            "day": place.day,
            "time_of_day": place.draft.time_of_day,
            "duration_minutes": place.draft.duration_minutes,
            "booking_required": place.draft.booking_required,
            "source_url": place.draft.source_url,
            "fit": place.draft.fit,
            "artifact": artifact,
        }),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use along_core::domain::{CostRange, Pace};

    fn scope(id: &str) -> ScopeOption {
        ScopeOption {
            id: id.to_string(),
            title: format!("Scope {id}"),
            tagline: String::new(),
            duration_days: 5,
            cities: vec!["Lisbon".to_string()],
            pace: Pace::Varied,
            estimated_cost: CostRange {
                low: 1000,
                high: 2000,
                currency: "USD".to_string(),
            },
            tradeoffs: String::new(),
            highlights: Vec::new(),
        }
    }

    fn intent_with_scopes(scopes: Vec<ScopeOption>, selected: Option<&str>) -> TripIntent {
        TripIntent {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            destination: "Lisbon".to_string(),
            scope_options: scopes,
            selected_scope_id: selected.map(String::from),
            hard_constraints: Vec::new(),
            soft_preferences: Vec::new(),
            status: IntentStatus::Scoping,
            blueprint_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn explicit_scope_request_wins_over_selected() {
        let intent = intent_with_scopes(vec![scope("a"), scope("b")], Some("a"));
        let picked = select_scope(&intent, Some("b")).unwrap();
        assert_eq!(picked.id, "b");
    }

    #[test]
    fn falls_back_to_first_scope_when_id_unknown() {
        let intent = intent_with_scopes(vec![scope("a"), scope("b")], None);
        let picked = select_scope(&intent, Some("missing")).unwrap();
        assert_eq!(picked.id, "a");
    }

    #[test]
    fn empty_scope_list_is_not_found() {
        let intent = intent_with_scopes(Vec::new(), None);
        let err = select_scope(&intent, None).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Port(PortError::NotFound(_))
        ));
    }
}
