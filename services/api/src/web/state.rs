//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::pipeline::{FlightResolver, TripPipeline};
use along_core::ports::DatabaseService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Handlers go through the pipeline facades; the raw database port is kept
/// only for the auth endpoints and the session middleware.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub pipeline: TripPipeline,
    pub flight_resolver: FlightResolver,
}
