//! services/api/src/pipeline/flights.rs
//!
//! Resolves inter-city travel segments against the flight-search port.
//! Per-segment failures never surface to the caller: the output always has
//! exactly one segment per request, in request order, with failures carried
//! as `unavailable` status and a generic search link. Persisting a resolved
//! segment as a connection row is best effort too.

use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;
use uuid::Uuid;

use along_core::airports::city_to_iata;
use along_core::domain::{FlightSegment, SegmentRequest, SegmentStatus};
use along_core::ports::{DatabaseService, FlightSearchService};

use super::PipelineResult;

/// Fallback when there is no offer to deep-link into.
const GENERIC_SEARCH_URL: &str = "https://www.google.com/travel/flights";

#[derive(Clone)]
pub struct FlightResolver {
    db: Arc<dyn DatabaseService>,
    flights: Arc<dyn FlightSearchService>,
}

impl FlightResolver {
    pub fn new(db: Arc<dyn DatabaseService>, flights: Arc<dyn FlightSearchService>) -> Self {
        Self { db, flights }
    }

    /// Resolves every requested segment concurrently and records the
    /// successful ones against the blueprint. Ownership of the blueprint is
    /// checked before any provider call.
    pub async fn resolve_segments(
        &self,
        owner_id: Uuid,
        blueprint_id: Uuid,
        requests: Vec<SegmentRequest>,
    ) -> PipelineResult<Vec<FlightSegment>> {
        self.db.get_blueprint(blueprint_id, owner_id).await?;

        let resolved = join_all(
            requests
                .into_iter()
                .map(|request| self.resolve_one(request)),
        )
        .await;

        let mut segments = Vec::with_capacity(resolved.len());
        for mut segment in resolved {
            segment.connection_id = self.record_connection(blueprint_id, &segment).await;
            segments.push(segment);
        }
        Ok(segments)
    }

    /// Resolves one segment. Never errors; every failure mode folds into
    /// the segment's status.
    async fn resolve_one(&self, request: SegmentRequest) -> FlightSegment {
        let origin_iata = request
            .origin_iata
            .clone()
            .or_else(|| city_to_iata(&request.origin_city).map(String::from));
        let destination_iata = request
            .destination_iata
            .clone()
            .or_else(|| city_to_iata(&request.destination_city).map(String::from));

        let mut segment = FlightSegment {
            connection_id: None,
            origin_city: request.origin_city,
            destination_city: request.destination_city,
            origin_iata,
            destination_iata,
            date: request.date,
            status: SegmentStatus::Unavailable,
            cheapest_offer: None,
            deep_link_url: GENERIC_SEARCH_URL.to_string(),
        };

        let (Some(origin), Some(destination)) =
            (segment.origin_iata.as_deref(), segment.destination_iata.as_deref())
        else {
            warn!(
                origin = %segment.origin_city,
                destination = %segment.destination_city,
                "No airport mapping for segment"
            );
            return segment;
        };

        if !self.flights.is_configured() {
            warn!(origin, destination, "Flight provider not configured, skipping search");
            return segment;
        }

        let passengers = request.passengers.unwrap_or(1);
        match self
            .flights
            .search(origin, destination, &segment.date, passengers)
            .await
        {
            Ok(mut offers) if !offers.is_empty() => {
                offers.sort_by(|a, b| {
                    a.total_price()
                        .partial_cmp(&b.total_price())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let cheapest = offers.remove(0);
                segment.deep_link_url = self.flights.deep_link(origin, destination, &segment.date);
                segment.cheapest_offer = Some(cheapest);
                segment.status = SegmentStatus::Available;
            }
            Ok(_) => {
                warn!(origin, destination, date = %segment.date, "No offers for segment");
            }
            Err(err) => {
                warn!(origin, destination, error = %err, "Flight search failed for segment");
            }
        }
        segment
    }

    /// Best-effort persistence; a failed insert leaves `connection_id` unset
    /// but keeps the segment in the response. The row status distinguishes a
    /// missing provider key (`suggested`) from a failed or empty search
    /// (`unavailable`); the response folds both into `unavailable`.
    async fn record_connection(
        &self,
        blueprint_id: Uuid,
        segment: &FlightSegment,
    ) -> Option<Uuid> {
        let row_status = if segment.cheapest_offer.is_some() {
            SegmentStatus::Available
        } else if self.flights.is_configured() {
            SegmentStatus::Unavailable
        } else {
            SegmentStatus::Suggested
        };
        match self
            .db
            .create_flight_connection(blueprint_id, segment, row_status)
            .await
        {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(error = %err, "Failed to record flight connection");
                None
            }
        }
    }
}
