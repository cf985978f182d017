//! services/api/tests/pipeline.rs
//!
//! End-to-end pipeline tests against in-memory ports. The scripted LLM
//! returns queued responses verbatim, so each test controls exactly what
//! the "model" says at every stage.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use along_core::domain::{
    Blueprint, Coordinates, FlightOffer, FlightSegment, IntakeAnswer, IntentStatus, Location,
    MetArtifact, SegmentRequest, SegmentStatus, TasteProfile, TripIntent, User, UserCredentials,
};
use along_core::ports::{
    ArtifactService, DatabaseService, FlightSearchService, GeocodedPlace, GeocodingService,
    LanguageModelService, PortError, PortResult,
};
use api_lib::pipeline::{FlightResolver, PipelineError, TripPipeline};

//=========================================================================================
// In-Memory Ports
//=========================================================================================

/// Pops one scripted response per completion call.
#[derive(Default)]
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedLlm {
    fn with_responses(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait]
impl LanguageModelService for ScriptedLlm {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> PortResult<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PortError::Unexpected("script exhausted".to_string()))
    }
}

/// Geocodes everything except queries containing a poison marker.
struct MarkerGeocoder;

const UNRESOLVABLE_MARKER: &str = "Ghost";

#[async_trait]
impl GeocodingService for MarkerGeocoder {
    async fn geocode(&self, query: &str) -> Option<GeocodedPlace> {
        if query.contains(UNRESOLVABLE_MARKER) {
            return None;
        }
        Some(GeocodedPlace {
            coordinates: Coordinates {
                lat: 38.7223,
                lng: -9.1393,
            },
            formatted_address: format!("{query}, Portugal"),
        })
    }
}

struct NoArtifacts;

#[async_trait]
impl ArtifactService for NoArtifacts {
    async fn lookup(&self, _culture: &str, _category: &str) -> Option<MetArtifact> {
        None
    }
}

/// Flight search with one scripted route; everything else errors.
struct RouteFlights {
    configured: bool,
    route: (String, String),
    offers: Vec<FlightOffer>,
}

#[async_trait]
impl FlightSearchService for RouteFlights {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search(
        &self,
        origin_iata: &str,
        destination_iata: &str,
        _date: &str,
        _passengers: u32,
    ) -> PortResult<Vec<FlightOffer>> {
        if (origin_iata, destination_iata) == (self.route.0.as_str(), self.route.1.as_str()) {
            Ok(self.offers.clone())
        } else {
            Err(PortError::Unexpected("route not served".to_string()))
        }
    }

    fn deep_link(&self, origin_iata: &str, destination_iata: &str, date: &str) -> String {
        format!("https://flights.test/{origin_iata}/{destination_iata}/{date}")
    }
}

#[derive(Default)]
struct MemoryDbState {
    profiles: HashMap<Uuid, TasteProfile>,
    intents: HashMap<Uuid, TripIntent>,
    blueprints: HashMap<Uuid, Blueprint>,
    locations: Vec<Location>,
    connections: Vec<(Uuid, FlightSegment, SegmentStatus)>,
}

#[derive(Default)]
struct MemoryDb {
    state: Mutex<MemoryDbState>,
}

impl MemoryDb {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn locations(&self) -> Vec<Location> {
        self.state.lock().unwrap().locations.clone()
    }

    fn blueprint_count(&self) -> usize {
        self.state.lock().unwrap().blueprints.len()
    }

    fn connection_count(&self) -> usize {
        self.state.lock().unwrap().connections.len()
    }

    fn connection_row_statuses(&self) -> Vec<SegmentStatus> {
        self.state
            .lock()
            .unwrap()
            .connections
            .iter()
            .map(|(_, _, status)| *status)
            .collect()
    }

    fn profile_for(&self, user_id: Uuid) -> Option<TasteProfile> {
        self.state.lock().unwrap().profiles.get(&user_id).cloned()
    }

    fn intent(&self, id: Uuid) -> Option<TripIntent> {
        self.state.lock().unwrap().intents.get(&id).cloned()
    }

    fn seed_blueprint(&self, blueprint: Blueprint) {
        self.state
            .lock()
            .unwrap()
            .blueprints
            .insert(blueprint.id, blueprint);
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn create_user_with_email(
        &self,
        email: &str,
        _hashed_password: &str,
    ) -> PortResult<User> {
        Ok(User {
            user_id: Uuid::new_v4(),
            email: Some(email.to_string()),
        })
    }

    async fn get_user_by_email(&self, _email: &str) -> PortResult<UserCredentials> {
        Err(PortError::NotFound("User not found".to_string()))
    }

    async fn create_auth_session(
        &self,
        _session_id: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        Ok(())
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        Err(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<()> {
        Ok(())
    }

    async fn upsert_taste_profile(&self, profile: TasteProfile) -> PortResult<TasteProfile> {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn get_taste_profile(&self, user_id: Uuid) -> PortResult<TasteProfile> {
        self.state
            .lock()
            .unwrap()
            .profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Taste profile not found".to_string()))
    }

    async fn create_trip_intent(&self, intent: TripIntent) -> PortResult<TripIntent> {
        self.state
            .lock()
            .unwrap()
            .intents
            .insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn get_trip_intent(&self, intent_id: Uuid, owner_id: Uuid) -> PortResult<TripIntent> {
        self.state
            .lock()
            .unwrap()
            .intents
            .get(&intent_id)
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Trip intent not found".to_string()))
    }

    async fn attach_blueprint_to_intent(
        &self,
        intent_id: Uuid,
        blueprint_id: Uuid,
        scope_id: &str,
    ) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let intent = state
            .intents
            .get_mut(&intent_id)
            .ok_or_else(|| PortError::NotFound("Trip intent not found".to_string()))?;
        intent.blueprint_id = Some(blueprint_id);
        intent.selected_scope_id = Some(scope_id.to_string());
        intent.status = IntentStatus::Building;
        Ok(())
    }

    async fn create_blueprint(&self, blueprint: Blueprint) -> PortResult<Blueprint> {
        self.state
            .lock()
            .unwrap()
            .blueprints
            .insert(blueprint.id, blueprint.clone());
        Ok(blueprint)
    }

    async fn get_blueprint(&self, blueprint_id: Uuid, owner_id: Uuid) -> PortResult<Blueprint> {
        self.state
            .lock()
            .unwrap()
            .blueprints
            .get(&blueprint_id)
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Blueprint not found".to_string()))
    }

    async fn insert_locations(&self, locations: &[Location]) -> PortResult<()> {
        self.state
            .lock()
            .unwrap()
            .locations
            .extend(locations.iter().cloned());
        Ok(())
    }

    async fn get_locations_for_blueprint(&self, blueprint_id: Uuid) -> PortResult<Vec<Location>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .locations
            .iter()
            .filter(|l| l.blueprint_id == blueprint_id)
            .cloned()
            .collect())
    }

    async fn create_flight_connection(
        &self,
        blueprint_id: Uuid,
        segment: &FlightSegment,
        row_status: SegmentStatus,
    ) -> PortResult<Uuid> {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .connections
            .push((blueprint_id, segment.clone(), row_status));
        Ok(id)
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

const PROFILE_JSON: &str = r#"{
  "anchors": {"restaurants": ["Ramiro"], "artists": ["Pessoa"], "spaces": []},
  "dimensions": {"formality": 0.3, "density": 0.4, "temporality": 0.2, "sociality": 0.5, "legibility": 0.3},
  "pace": "slow_deep",
  "discovery_mode": "wander",
  "hard_constraints": ["no clubs"],
  "soft_preferences": ["seafood"],
  "taste_summary": "A quiet literary traveler drawn to old cafes."
}"#;

const SCOPES_JSON: &str = r#"[
  {"id": "scope_1", "title": "The Deep Cut", "tagline": "Lisbon, slowly", "duration_days": 5,
   "cities": ["Lisbon"], "pace": "slow_deep",
   "estimated_cost": {"low": 1200, "high": 2000, "currency": "USD"},
   "tradeoffs": "Depth over breadth", "highlights": ["Alfama mornings"]},
  {"id": "scope_2", "title": "Two Coasts", "tagline": "Lisbon and Porto", "duration_days": 7,
   "cities": ["Lisbon", "Porto"], "pace": "varied",
   "estimated_cost": {"low": 1800, "high": 2800, "currency": "USD"},
   "tradeoffs": "More ground, less depth", "highlights": ["Douro at dusk"]}
]"#;

const ITINERARY_JSON: &str = r#"{
  "title": "Lisbon, Slowly",
  "days": [
    {"day": 1, "theme": "Alfama on foot", "places": [
      {"name": "Cafe A Brasileira", "address": "R. Garrett 120", "category": ["cafe"],
       "time_of_day": "morning", "duration_minutes": 60,
       "fit": "The literary cafe anchor, straight from the profile.",
       "booking_required": false, "source_url": null},
      {"name": "Ghost Tavern", "address": "Nowhere 1", "category": ["bar"],
       "time_of_day": "evening", "duration_minutes": 90,
       "fit": "An unmarked place locals argue about.",
       "booking_required": false, "source_url": null}
    ]},
    {"day": 2, "theme": "Waterfront", "places": [
      {"name": "cafe a brasileira", "address": "R. Garrett 120", "category": ["cafe"],
       "time_of_day": "morning", "duration_minutes": 45,
       "fit": "Duplicate entry the model repeated.",
       "booking_required": false, "source_url": null},
      {"name": "Ramiro", "address": "Av. Almirante Reis 1", "category": ["restaurant"],
       "time_of_day": "evening", "duration_minutes": 120,
       "fit": "Seafood counter matching the stated preference.",
       "booking_required": true, "source_url": "https://example.test/ramiro"}
    ]}
  ]
}"#;

fn intake_answers() -> Vec<IntakeAnswer> {
    vec![
        IntakeAnswer {
            question_id: "destination".to_string(),
            question: "Where to?".to_string(),
            answer: "Lisbon".to_string(),
        },
        IntakeAnswer {
            question_id: "mood".to_string(),
            question: "What mood?".to_string(),
            answer: "quiet, old cafes".to_string(),
        },
    ]
}

fn pipeline_with(db: Arc<MemoryDb>, llm: Arc<ScriptedLlm>) -> TripPipeline {
    TripPipeline::new(
        db,
        llm.clone(),
        llm.clone(),
        llm,
        Arc::new(MarkerGeocoder),
        Arc::new(NoArtifacts),
    )
}

//=========================================================================================
// Intake
//=========================================================================================

#[tokio::test]
async fn intake_records_profile_intent_and_scopes() {
    let db = MemoryDb::new();
    let llm = ScriptedLlm::with_responses(&[PROFILE_JSON, SCOPES_JSON]);
    let pipeline = pipeline_with(db.clone(), llm);
    let user_id = Uuid::new_v4();

    let outcome = pipeline
        .submit_intake(user_id, &intake_answers())
        .await
        .expect("intake should succeed");

    assert_eq!(outcome.trip_intent.destination, "Lisbon");
    assert_eq!(outcome.trip_intent.status, IntentStatus::Scoping);
    assert_eq!(outcome.trip_intent.scope_options.len(), 2);
    assert_eq!(outcome.profile.hard_constraints, vec!["no clubs"]);
    assert!(db.profile_for(user_id).is_some());
    assert!(db.intent(outcome.trip_intent.id).is_some());
}

#[tokio::test]
async fn scope_failure_degrades_but_intake_still_succeeds() {
    let db = MemoryDb::new();
    let llm = ScriptedLlm::with_responses(&[PROFILE_JSON, "the model rambled instead of JSON"]);
    let pipeline = pipeline_with(db.clone(), llm);
    let user_id = Uuid::new_v4();

    let outcome = pipeline
        .submit_intake(user_id, &intake_answers())
        .await
        .expect("degraded scopes must not fail the intake");

    assert!(outcome.trip_intent.scope_options.is_empty());
    assert!(db.profile_for(user_id).is_some());
}

#[tokio::test]
async fn profile_parse_failure_is_fatal_and_writes_nothing() {
    let db = MemoryDb::new();
    let llm = ScriptedLlm::with_responses(&["not json at all"]);
    let pipeline = pipeline_with(db.clone(), llm);
    let user_id = Uuid::new_v4();

    let err = pipeline
        .submit_intake(user_id, &intake_answers())
        .await
        .expect_err("garbage profile output must fail");

    assert!(matches!(err, PipelineError::Generation { .. }));
    assert!(db.profile_for(user_id).is_none());
}

#[tokio::test]
async fn code_fenced_profile_output_still_parses() {
    let db = MemoryDb::new();
    let fenced = format!("```json\n{PROFILE_JSON}\n```");
    let llm = ScriptedLlm::with_responses(&[&fenced, SCOPES_JSON]);
    let pipeline = pipeline_with(db.clone(), llm);

    let outcome = pipeline
        .submit_intake(Uuid::new_v4(), &intake_answers())
        .await
        .expect("fenced output should sanitize and parse");
    assert_eq!(
        outcome.profile.taste_summary,
        "A quiet literary traveler drawn to old cafes."
    );
}

//=========================================================================================
// Build
//=========================================================================================

/// Runs a full intake, then a build with the given itinerary response.
async fn intake_then_build(
    db: Arc<MemoryDb>,
    itinerary_response: &str,
) -> (Uuid, Result<api_lib::pipeline::BuildOutcome, PipelineError>) {
    let llm = ScriptedLlm::with_responses(&[PROFILE_JSON, SCOPES_JSON, itinerary_response]);
    let pipeline = pipeline_with(db.clone(), llm);
    let user_id = Uuid::new_v4();

    let intake = pipeline
        .submit_intake(user_id, &intake_answers())
        .await
        .expect("intake should succeed");
    let result = pipeline
        .build_itinerary(user_id, intake.trip_intent.id, Some("scope_1".to_string()))
        .await;
    (intake.trip_intent.id, result)
}

#[tokio::test]
async fn build_persists_every_place_even_unresolved_ones() {
    let db = MemoryDb::new();
    let (intent_id, result) = intake_then_build(db.clone(), ITINERARY_JSON).await;
    let outcome = result.expect("build should succeed");

    // 4 generated places, 1 duplicate collapsed, the unresolvable one kept.
    assert_eq!(outcome.total_places, 3);
    assert_eq!(outcome.days, 2);

    let locations = db.locations();
    assert_eq!(locations.len(), 3);

    let ghost = locations
        .iter()
        .find(|l| l.name == "Ghost Tavern")
        .expect("unresolved place must still be persisted");
    assert!(ghost.coordinates.is_none());
    assert!(!ghost.is_on_map());
    assert_eq!(ghost.enrichment["formatted_address"], "Nowhere 1");

    let cafe = locations
        .iter()
        .find(|l| l.name == "Cafe A Brasileira")
        .expect("geocoded place present");
    assert!(cafe.coordinates.is_some());
    assert_eq!(cafe.enrichment["day"], 1);

    let intent = db.intent(intent_id).expect("intent still present");
    assert_eq!(intent.blueprint_id, Some(outcome.blueprint_id));
    assert_eq!(intent.status, IntentStatus::Building);
    assert_eq!(intent.selected_scope_id.as_deref(), Some("scope_1"));
}

#[tokio::test]
async fn bad_itinerary_output_fails_before_any_write() {
    let db = MemoryDb::new();
    let (_, result) = intake_then_build(db.clone(), "no json here either").await;

    let err = result.expect_err("unparseable itinerary must fail the build");
    assert!(matches!(err, PipelineError::Generation { .. }));
    assert_eq!(db.blueprint_count(), 0);
    assert!(db.locations().is_empty());
}

#[tokio::test]
async fn unknown_scope_id_falls_back_to_first_option() {
    let db = MemoryDb::new();
    let llm = ScriptedLlm::with_responses(&[PROFILE_JSON, SCOPES_JSON, ITINERARY_JSON]);
    let pipeline = pipeline_with(db.clone(), llm);
    let user_id = Uuid::new_v4();

    let intake = pipeline
        .submit_intake(user_id, &intake_answers())
        .await
        .expect("intake should succeed");
    pipeline
        .build_itinerary(user_id, intake.trip_intent.id, Some("scope_99".to_string()))
        .await
        .expect("unknown scope id should fall back, not fail");

    let intent = db.intent(intake.trip_intent.id).unwrap();
    assert_eq!(intent.selected_scope_id.as_deref(), Some("scope_1"));
}

#[tokio::test]
async fn building_for_another_users_intent_is_not_found() {
    let db = MemoryDb::new();
    let llm = ScriptedLlm::with_responses(&[PROFILE_JSON, SCOPES_JSON]);
    let pipeline = pipeline_with(db.clone(), llm);
    let owner = Uuid::new_v4();

    let intake = pipeline
        .submit_intake(owner, &intake_answers())
        .await
        .expect("intake should succeed");

    let err = pipeline
        .build_itinerary(Uuid::new_v4(), intake.trip_intent.id, None)
        .await
        .expect_err("foreign intent must be invisible");
    assert!(matches!(
        err,
        PipelineError::Port(PortError::NotFound(_))
    ));
}

//=========================================================================================
// Onboarding
//=========================================================================================

const MIRROR_JSON: &str = r#"{
  "taste_phrases": ["Mornings are for unmarked doors.", "You trust counters over tables."],
  "taste_profile": {
    "anchors": {"cultural": "Wong Kar-wai", "bucket_list": "Kyoto in autumn", "anti_pattern": "rooftop bars"},
    "dimensions": {"formality": 0.2, "density": 0.6, "temporality": 0.3, "sociality": 0.4, "legibility": 0.2},
    "pace": "slow_deep",
    "discovery_mode": "wander",
    "taste_summary": "Drawn to quiet rooms with history in the walls."
  }
}"#;

#[tokio::test]
async fn onboarding_merges_image_moods_and_persists_profile() {
    let db = MemoryDb::new();
    let llm = ScriptedLlm::with_responses(&[MIRROR_JSON]);
    let pipeline = pipeline_with(db.clone(), llm);
    let user_id = Uuid::new_v4();

    let answers = api_lib::pipeline::onboarding::OnboardingAnswers {
        image_moods: vec!["misty".to_string(), "neon".to_string()],
        anchor_text: "Wong Kar-wai films".to_string(),
        bucket_list_trip: "Kyoto in autumn".to_string(),
        hard_constraint: "no rooftop bars".to_string(),
    };
    let outcome = pipeline
        .run_onboarding(user_id, &answers)
        .await
        .expect("onboarding should succeed");

    assert_eq!(outcome.taste_phrases.len(), 2);
    let stored = db.profile_for(user_id).expect("profile persisted");
    assert_eq!(stored.hard_constraints, vec!["no rooftop bars"]);
    assert_eq!(
        stored.anchors["selected_image_moods"],
        serde_json::json!(["misty", "neon"])
    );
}

//=========================================================================================
// Flight Segments
//=========================================================================================

fn offer(id: &str, amount: &str) -> FlightOffer {
    FlightOffer {
        id: id.to_string(),
        total_amount: amount.to_string(),
        total_currency: "USD".to_string(),
        carrier_name: Some("TestAir".to_string()),
    }
}

fn segment_request(origin: &str, destination: &str) -> SegmentRequest {
    SegmentRequest {
        origin_city: origin.to_string(),
        destination_city: destination.to_string(),
        origin_iata: None,
        destination_iata: None,
        date: "2026-09-12".to_string(),
        passengers: None,
    }
}

fn seeded_blueprint_for(db: &MemoryDb, owner_id: Uuid) -> Uuid {
    let blueprint = Blueprint {
        id: Uuid::new_v4(),
        owner_id,
        story_intent: "travel".to_string(),
        title: "Lisbon, Slowly".to_string(),
        metadata: serde_json::json!({}),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let id = blueprint.id;
    db.seed_blueprint(blueprint);
    id
}

#[tokio::test]
async fn every_requested_segment_comes_back_in_order() {
    let db = MemoryDb::new();
    let owner = Uuid::new_v4();
    let blueprint_id = seeded_blueprint_for(&db, owner);

    let flights = Arc::new(RouteFlights {
        configured: true,
        route: ("LIS".to_string(), "CDG".to_string()),
        offers: vec![offer("off_2", "240.00"), offer("off_1", "180.50")],
    });
    let resolver = FlightResolver::new(db.clone(), flights);

    let segments = resolver
        .resolve_segments(
            owner,
            blueprint_id,
            vec![
                segment_request("Lisbon", "Paris"),
                segment_request("Lisbon", "Atlantis"),
                segment_request("Paris", "Lisbon"),
            ],
        )
        .await
        .expect("resolution itself never fails");

    assert_eq!(segments.len(), 3);

    // Served route: cheapest offer wins despite arrival order.
    assert_eq!(segments[0].status, SegmentStatus::Available);
    let cheapest = segments[0].cheapest_offer.as_ref().unwrap();
    assert_eq!(cheapest.id, "off_1");
    assert_eq!(
        segments[0].deep_link_url,
        "https://flights.test/LIS/CDG/2026-09-12"
    );

    // Unknown city: no IATA mapping, folded into unavailable.
    assert_eq!(segments[1].status, SegmentStatus::Unavailable);
    assert!(segments[1].destination_iata.is_none());
    assert!(segments[1].cheapest_offer.is_none());

    // Provider error on the reverse route: also unavailable, not an error.
    assert_eq!(segments[2].status, SegmentStatus::Unavailable);

    assert_eq!(db.connection_count(), 3);
    assert!(segments.iter().all(|s| s.connection_id.is_some()));
    assert_eq!(
        db.connection_row_statuses(),
        vec![
            SegmentStatus::Available,
            SegmentStatus::Unavailable,
            SegmentStatus::Unavailable
        ]
    );
}

#[tokio::test]
async fn unconfigured_provider_is_unavailable_to_caller_but_suggested_on_row() {
    let db = MemoryDb::new();
    let owner = Uuid::new_v4();
    let blueprint_id = seeded_blueprint_for(&db, owner);

    let flights = Arc::new(RouteFlights {
        configured: false,
        route: ("LIS".to_string(), "CDG".to_string()),
        offers: vec![offer("off_1", "180.50")],
    });
    let resolver = FlightResolver::new(db.clone(), flights);

    let segments = resolver
        .resolve_segments(owner, blueprint_id, vec![segment_request("Lisbon", "Paris")])
        .await
        .expect("unconfigured provider still resolves");

    assert_eq!(segments[0].status, SegmentStatus::Unavailable);
    assert!(segments[0].cheapest_offer.is_none());
    assert_eq!(
        segments[0].deep_link_url,
        "https://www.google.com/travel/flights"
    );
    assert_eq!(db.connection_row_statuses(), vec![SegmentStatus::Suggested]);
}

#[tokio::test]
async fn foreign_blueprint_blocks_segment_resolution() {
    let db = MemoryDb::new();
    let blueprint_id = seeded_blueprint_for(&db, Uuid::new_v4());

    let flights = Arc::new(RouteFlights {
        configured: true,
        route: ("LIS".to_string(), "CDG".to_string()),
        offers: Vec::new(),
    });
    let resolver = FlightResolver::new(db.clone(), flights);

    let err = resolver
        .resolve_segments(
            Uuid::new_v4(),
            blueprint_id,
            vec![segment_request("Lisbon", "Paris")],
        )
        .await
        .expect_err("ownership check comes before any search");
    assert!(matches!(
        err,
        PipelineError::Port(PortError::NotFound(_))
    ));
    assert_eq!(db.connection_count(), 0);
}

//=========================================================================================
// Research
//=========================================================================================

const RESEARCH_JSON: &str = r#"{
  "title": "Old Cafes of Lisbon",
  "summary": "Where the city still reads the paper.",
  "intent": "find historic cafes",
  "themes": [
    {"id": "theme_1", "name": "Literary haunts", "description": "Cafes with a past.",
     "places": [
       {"name": "Cafe A Brasileira", "address": "R. Garrett 120", "why": "Pessoa's table.",
        "category": ["cafe"], "source_url": null},
       {"name": "Ghost Pavilion", "address": "Unknown lane", "why": "Locals swear it exists.",
        "category": ["cafe"], "source_url": null}
     ]}
  ]
}"#;

#[tokio::test]
async fn research_keeps_unresolvable_places_off_map() {
    let db = MemoryDb::new();
    let llm = ScriptedLlm::with_responses(&[RESEARCH_JSON]);
    let pipeline = pipeline_with(db, llm);

    let plan = pipeline
        .run_research("old cafes in lisbon")
        .await
        .expect("research should succeed");

    let places = &plan.themes[0].places;
    assert_eq!(places.len(), 2);
    assert!(places[0].coordinates.is_some());
    assert!(places[0]
        .formatted_address
        .as_deref()
        .unwrap()
        .ends_with("Portugal"));
    assert!(places[1].coordinates.is_none());
    assert_eq!(places[1].formatted_address.as_deref(), Some("Unknown lane"));
}
