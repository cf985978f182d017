pub mod airports;
pub mod cache;
pub mod dedupe;
pub mod domain;
pub mod extract;
pub mod ports;

pub use airports::city_to_iata;
pub use cache::{KeyValueCache, MemoryCache};
pub use dedupe::{dedupe_by_name, normalize_name};
pub use domain::{
    AuthSession, Blueprint, Coordinates, CostRange, Dimensions, DiscoveryMode, FlightOffer,
    FlightSegment, IntakeAnswer, IntentStatus, Location, MetArtifact, Pace, ResearchPlace,
    ResearchPlan, ResearchTheme, ScopeOption, SegmentRequest, SegmentStatus, SourceType,
    TasteProfile, TripIntent, User, UserCredentials,
};
pub use extract::{extract, parse_structured, strip_code_fences, ExtractError};
pub use ports::{
    ArtifactService, DatabaseService, FlightSearchService, GeocodedPlace, GeocodingService,
    LanguageModelService, PortError, PortResult,
};
