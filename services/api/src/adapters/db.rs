//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Queries are runtime-bound (`sqlx::query_as`) so the workspace builds
//! without a live database. Enum-ish columns are stored as text and mapped
//! through their serde wire names; JSON bags (scope options, enrichment,
//! anchors) are `jsonb`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use along_core::domain::{
    Blueprint, Coordinates, Dimensions, FlightSegment, Location, ScopeOption, SegmentStatus,
    TasteProfile, TripIntent, User, UserCredentials,
};
use along_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a text column back to a serde-named enum variant.
fn enum_from_text<T: DeserializeOwned>(column: &str, raw: &str) -> PortResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| PortError::Unexpected(format!("Invalid {column} value in row: '{raw}'")))
}

/// Serializes a serde-named enum variant to its text column form.
fn enum_to_text<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn not_found_or(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct TasteProfileRecord {
    user_id: Uuid,
    anchors: Json<serde_json::Value>,
    dimensions: Json<Dimensions>,
    pace: String,
    discovery_mode: String,
    hard_constraints: Vec<String>,
    soft_preferences: Vec<String>,
    taste_summary: String,
    raw_answers: Json<serde_json::Value>,
}
impl TasteProfileRecord {
    fn to_domain(self) -> PortResult<TasteProfile> {
        Ok(TasteProfile {
            user_id: self.user_id,
            anchors: self.anchors.0,
            dimensions: self.dimensions.0,
            pace: enum_from_text("pace", &self.pace)?,
            discovery_mode: enum_from_text("discovery_mode", &self.discovery_mode)?,
            hard_constraints: self.hard_constraints,
            soft_preferences: self.soft_preferences,
            taste_summary: self.taste_summary,
            raw_answers: self.raw_answers.0,
        })
    }
}

#[derive(FromRow)]
struct TripIntentRecord {
    id: Uuid,
    owner_id: Uuid,
    destination: String,
    scope_options: Json<Vec<ScopeOption>>,
    selected_scope_id: Option<String>,
    hard_constraints: Vec<String>,
    soft_preferences: Vec<String>,
    status: String,
    blueprint_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl TripIntentRecord {
    fn to_domain(self) -> PortResult<TripIntent> {
        Ok(TripIntent {
            id: self.id,
            owner_id: self.owner_id,
            destination: self.destination,
            scope_options: self.scope_options.0,
            selected_scope_id: self.selected_scope_id,
            hard_constraints: self.hard_constraints,
            soft_preferences: self.soft_preferences,
            status: enum_from_text("status", &self.status)?,
            blueprint_id: self.blueprint_id,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct BlueprintRecord {
    id: Uuid,
    owner_id: Uuid,
    story_intent: String,
    title: String,
    metadata: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl BlueprintRecord {
    fn to_domain(self) -> Blueprint {
        Blueprint {
            id: self.id,
            owner_id: self.owner_id,
            story_intent: self.story_intent,
            title: self.title,
            metadata: self.metadata.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct LocationRecord {
    id: Uuid,
    blueprint_id: Uuid,
    name: String,
    coordinates: Option<Json<Coordinates>>,
    category: Vec<String>,
    notes: String,
    source_type: String,
    source_name: Option<String>,
    source_url: Option<String>,
    confidence: Option<f64>,
    enrichment: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}
impl LocationRecord {
    fn to_domain(self) -> PortResult<Location> {
        Ok(Location {
            id: self.id,
            blueprint_id: self.blueprint_id,
            name: self.name,
            coordinates: self.coordinates.map(|c| c.0),
            category: self.category,
            notes: self.notes,
            source_type: enum_from_text("source_type", &self.source_type)?,
            source_name: self.source_name,
            source_url: self.source_url,
            confidence: self.confidence,
            enrichment: self.enrichment.0,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("User with email {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(row.0)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn upsert_taste_profile(&self, profile: TasteProfile) -> PortResult<TasteProfile> {
        let record = sqlx::query_as::<_, TasteProfileRecord>(
            "INSERT INTO taste_profiles \
               (user_id, anchors, dimensions, pace, discovery_mode, hard_constraints, \
                soft_preferences, taste_summary, raw_answers) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id) DO UPDATE SET \
               anchors = EXCLUDED.anchors, \
               dimensions = EXCLUDED.dimensions, \
               pace = EXCLUDED.pace, \
               discovery_mode = EXCLUDED.discovery_mode, \
               hard_constraints = EXCLUDED.hard_constraints, \
               soft_preferences = EXCLUDED.soft_preferences, \
               taste_summary = EXCLUDED.taste_summary, \
               raw_answers = EXCLUDED.raw_answers, \
               updated_at = now() \
             RETURNING user_id, anchors, dimensions, pace, discovery_mode, \
               hard_constraints, soft_preferences, taste_summary, raw_answers",
        )
        .bind(profile.user_id)
        .bind(Json(profile.anchors))
        .bind(Json(profile.dimensions))
        .bind(enum_to_text(&profile.pace))
        .bind(enum_to_text(&profile.discovery_mode))
        .bind(&profile.hard_constraints)
        .bind(&profile.soft_preferences)
        .bind(&profile.taste_summary)
        .bind(Json(profile.raw_answers))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn get_taste_profile(&self, user_id: Uuid) -> PortResult<TasteProfile> {
        let record = sqlx::query_as::<_, TasteProfileRecord>(
            "SELECT user_id, anchors, dimensions, pace, discovery_mode, hard_constraints, \
               soft_preferences, taste_summary, raw_answers \
             FROM taste_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Taste profile for user {} not found", user_id)))?;
        record.to_domain()
    }

    async fn create_trip_intent(&self, intent: TripIntent) -> PortResult<TripIntent> {
        let record = sqlx::query_as::<_, TripIntentRecord>(
            "INSERT INTO trip_intents \
               (id, owner_id, destination, scope_options, selected_scope_id, \
                hard_constraints, soft_preferences, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, owner_id, destination, scope_options, selected_scope_id, \
               hard_constraints, soft_preferences, status, blueprint_id, created_at",
        )
        .bind(intent.id)
        .bind(intent.owner_id)
        .bind(&intent.destination)
        .bind(Json(intent.scope_options))
        .bind(&intent.selected_scope_id)
        .bind(&intent.hard_constraints)
        .bind(&intent.soft_preferences)
        .bind(enum_to_text(&intent.status))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn get_trip_intent(&self, intent_id: Uuid, owner_id: Uuid) -> PortResult<TripIntent> {
        let record = sqlx::query_as::<_, TripIntentRecord>(
            "SELECT id, owner_id, destination, scope_options, selected_scope_id, \
               hard_constraints, soft_preferences, status, blueprint_id, created_at \
             FROM trip_intents WHERE id = $1 AND owner_id = $2",
        )
        .bind(intent_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Trip intent {} not found", intent_id)))?;
        record.to_domain()
    }

    async fn attach_blueprint_to_intent(
        &self,
        intent_id: Uuid,
        blueprint_id: Uuid,
        scope_id: &str,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE trip_intents \
             SET blueprint_id = $1, selected_scope_id = $2, status = 'building' \
             WHERE id = $3",
        )
        .bind(blueprint_id)
        .bind(scope_id)
        .bind(intent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn create_blueprint(&self, blueprint: Blueprint) -> PortResult<Blueprint> {
        let record = sqlx::query_as::<_, BlueprintRecord>(
            "INSERT INTO blueprints (id, owner_id, story_intent, title, metadata) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, owner_id, story_intent, title, metadata, created_at, updated_at",
        )
        .bind(blueprint.id)
        .bind(blueprint.owner_id)
        .bind(&blueprint.story_intent)
        .bind(&blueprint.title)
        .bind(Json(blueprint.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_blueprint(&self, blueprint_id: Uuid, owner_id: Uuid) -> PortResult<Blueprint> {
        let record = sqlx::query_as::<_, BlueprintRecord>(
            "SELECT id, owner_id, story_intent, title, metadata, created_at, updated_at \
             FROM blueprints WHERE id = $1 AND owner_id = $2",
        )
        .bind(blueprint_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Blueprint {} not found", blueprint_id)))?;
        Ok(record.to_domain())
    }

    async fn insert_locations(&self, locations: &[Location]) -> PortResult<()> {
        // One row at a time keeps the statement simple; itinerary batches
        // are small (tens of rows).
        for location in locations {
            sqlx::query(
                "INSERT INTO locations \
                   (id, blueprint_id, name, coordinates, category, notes, source_type, \
                    source_name, source_url, confidence, enrichment) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(location.id)
            .bind(location.blueprint_id)
            .bind(&location.name)
            .bind(location.coordinates.map(Json))
            .bind(&location.category)
            .bind(&location.notes)
            .bind(enum_to_text(&location.source_type))
            .bind(&location.source_name)
            .bind(&location.source_url)
            .bind(location.confidence)
            .bind(Json(location.enrichment.clone()))
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        Ok(())
    }

    async fn get_locations_for_blueprint(&self, blueprint_id: Uuid) -> PortResult<Vec<Location>> {
        let records = sqlx::query_as::<_, LocationRecord>(
            "SELECT id, blueprint_id, name, coordinates, category, notes, source_type, \
               source_name, source_url, confidence, enrichment, created_at \
             FROM locations WHERE blueprint_id = $1 \
             ORDER BY (enrichment->>'day')::int NULLS LAST, created_at ASC",
        )
        .bind(blueprint_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_flight_connection(
        &self,
        blueprint_id: Uuid,
        segment: &FlightSegment,
        row_status: SegmentStatus,
    ) -> PortResult<Uuid> {
        let data = serde_json::json!({
            "origin_city": segment.origin_city,
            "destination_city": segment.destination_city,
            "origin_iata": segment.origin_iata,
            "destination_iata": segment.destination_iata,
            "date": segment.date,
            "offer": segment.cheapest_offer,
        });
        // A suggested row means no provider was configured for the search.
        let provider = if row_status == SegmentStatus::Suggested {
            None
        } else {
            Some("duffel")
        };
        let row: (Uuid,) = sqlx::query_as(
            "INSERT INTO connections \
               (id, blueprint_id, connection_type, status, provider, provider_ref_id, \
                data, deep_link_url) \
             VALUES ($1, $2, 'flight', $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(blueprint_id)
        .bind(enum_to_text(&row_status))
        .bind(provider)
        .bind(segment.cheapest_offer.as_ref().map(|o| o.id.clone()))
        .bind(Json(data))
        .bind(&segment.deep_link_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(row.0)
    }
}
