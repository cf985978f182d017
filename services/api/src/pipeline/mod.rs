//! services/api/src/pipeline/mod.rs
//!
//! The multi-stage generative itinerary pipeline: prompt-and-parse stages
//! (profile, scopes, itinerary, research), the orchestrator that sequences
//! them and fans out geocoding/enrichment, and the flight-segment resolver.
//!
//! Failure policy, in one place: a primary parse failure (profile,
//! itinerary, research) fails its stage; a scope parse failure degrades to
//! an empty option list; an unresolved geocode, artifact or flight search
//! is absorbed into the result shape and never aborts a batch.

pub mod flights;
pub mod itinerary;
pub mod onboarding;
pub mod orchestrator;
pub mod profile;
pub mod research;
pub mod scopes;

pub use flights::FlightResolver;
pub use orchestrator::{BuildOutcome, IntakeOutcome, TripPipeline};

use along_core::extract::ExtractError;
use along_core::ports::PortError;

/// An error from one pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A load-bearing LLM stage failed to produce parseable output. Nothing
    /// was persisted for the failed stage; the caller may retry.
    #[error("Failed to generate {stage}")]
    Generation {
        stage: &'static str,
        #[source]
        source: ExtractError,
    },

    /// A port failure: missing prerequisite entity, unauthorized caller, or
    /// an unexpected adapter error.
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Client-side cap on in-flight geocode/enrichment lookups, to avoid
/// provider rate-limit storms during a large build.
pub(crate) const LOOKUP_CONCURRENCY: usize = 16;

impl PipelineError {
    pub(crate) fn generation(stage: &'static str) -> impl FnOnce(ExtractError) -> Self {
        move |source| Self::Generation { stage, source }
    }
}
