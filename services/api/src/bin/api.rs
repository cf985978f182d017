//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        artifacts::MetArtifactAdapter, db::DbAdapter, flights::DuffelFlightAdapter,
        geocode::GoogleGeocodeAdapter, llm::OpenAiLlmAdapter,
    },
    config::Config,
    error::ApiError,
    pipeline::{FlightResolver, TripPipeline},
    web::{
        auth::{login_handler, logout_handler, signup_handler},
        middleware::require_auth,
        rest::{
            build_trip_handler, list_locations_handler, onboarding_handler,
            refine_research_handler, research_handler, resolve_flights_handler,
            submit_intake_handler, ApiDoc,
        },
        state::AppState,
    },
};
use along_core::cache::MemoryCache;
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let profile_llm = Arc::new(OpenAiLlmAdapter::new(
        openai_client.clone(),
        config.profile_model.clone(),
    ));
    let trip_llm = Arc::new(OpenAiLlmAdapter::new(
        openai_client.clone(),
        config.itinerary_model.clone(),
    ));
    let research_llm = Arc::new(OpenAiLlmAdapter::new(
        openai_client.clone(),
        config.research_model.clone(),
    ));

    let geocoder = Arc::new(GoogleGeocodeAdapter::new(
        config.google_geocoding_key.clone(),
        Arc::new(MemoryCache::new()),
    ));
    let artifacts = Arc::new(MetArtifactAdapter::new(Arc::new(MemoryCache::new())));
    let flights = Arc::new(DuffelFlightAdapter::new(config.duffel_api_key.clone()));

    // --- 4. Build the Pipeline and Shared AppState ---
    let pipeline = TripPipeline::new(
        db_adapter.clone(),
        profile_llm,
        trip_llm,
        research_llm,
        geocoder,
        artifacts,
    );
    let flight_resolver = FlightResolver::new(db_adapter.clone(), flights);

    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        pipeline,
        flight_resolver,
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origin
                .parse::<HeaderValue>()
                .map_err(|_| ApiError::Internal("Invalid ALLOWED_ORIGIN".to_string()))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/trips/intake", post(submit_intake_handler))
        .route("/trips/build", post(build_trip_handler))
        .route("/onboarding", post(onboarding_handler))
        .route("/research", post(research_handler))
        .route("/research/refine", post(refine_research_handler))
        .route("/connections/flights", post(resolve_flights_handler))
        .route("/blueprints/{id}/locations", get(list_locations_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
