pub mod artifacts;
pub mod db;
pub mod flights;
pub mod geocode;
pub mod llm;

pub use artifacts::MetArtifactAdapter;
pub use db::DbAdapter;
pub use flights::DuffelFlightAdapter;
pub use geocode::GoogleGeocodeAdapter;
pub use llm::OpenAiLlmAdapter;
