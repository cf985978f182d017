//! services/api/src/adapters/flights.rs
//!
//! Duffel flight-search adapter. Two-step provider protocol: create an
//! offer request, then list offers for it. Offers are reduced to the fields
//! the resolver ranks on; the resolver sorts by price itself. Duffel has no
//! consumer booking page, so deep links point at a Google Flights search
//! prefilled with the route and date.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use along_core::domain::FlightOffer;
use along_core::ports::{FlightSearchService, PortError, PortResult};

const DUFFEL_BASE: &str = "https://api.duffel.com";
const DUFFEL_VERSION: &str = "beta";
pub const GENERIC_FLIGHT_SEARCH_URL: &str = "https://www.google.com/travel/flights";

#[derive(Debug, Deserialize)]
struct OfferRequestResponse {
    data: OfferRequestData,
}

#[derive(Debug, Deserialize)]
struct OfferRequestData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<RawOffer>,
}

#[derive(Debug, Deserialize)]
struct RawOffer {
    id: String,
    total_amount: String,
    total_currency: String,
    #[serde(default)]
    owner: Option<RawCarrier>,
}

#[derive(Debug, Deserialize)]
struct RawCarrier {
    name: String,
}

pub struct DuffelFlightAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl DuffelFlightAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    fn key(&self) -> PortResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| PortError::Unexpected("DUFFEL_API_KEY is not configured".to_string()))
    }

    async fn create_offer_request(
        &self,
        origin: &str,
        destination: &str,
        date: &str,
        passengers: u32,
    ) -> PortResult<String> {
        let body = json!({
            "data": {
                "slices": [{
                    "origin": origin,
                    "destination": destination,
                    "departure_date": date,
                }],
                "passengers": vec![json!({"type": "adult"}); passengers.max(1) as usize],
                "cabin_class": "economy",
            }
        });

        let response = self
            .client
            .post(format!("{DUFFEL_BASE}/air/offer_requests"))
            .bearer_auth(self.key()?)
            .header("Duffel-Version", DUFFEL_VERSION)
            .json(&body)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Duffel offer_request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "Duffel offer_request failed: {}",
                response.status()
            )));
        }

        let parsed: OfferRequestResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Duffel offer_request failed: {e}")))?;
        Ok(parsed.data.id)
    }

    async fn list_offers(&self, offer_request_id: &str, limit: usize) -> PortResult<Vec<RawOffer>> {
        let response = self
            .client
            .get(format!("{DUFFEL_BASE}/air/offers"))
            .bearer_auth(self.key()?)
            .header("Duffel-Version", DUFFEL_VERSION)
            .query(&[
                ("offer_request_id", offer_request_id),
                ("limit", &limit.to_string()),
                ("sort", "total_amount"),
            ])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Duffel list_offers failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "Duffel list_offers failed: {}",
                response.status()
            )));
        }

        let parsed: OffersResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Duffel list_offers failed: {e}")))?;
        Ok(parsed.data)
    }
}

#[async_trait]
impl FlightSearchService for DuffelFlightAdapter {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(
        &self,
        origin_iata: &str,
        destination_iata: &str,
        date: &str,
        passengers: u32,
    ) -> PortResult<Vec<FlightOffer>> {
        let request_id = self
            .create_offer_request(origin_iata, destination_iata, date, passengers)
            .await?;
        let raw = self.list_offers(&request_id, 15).await?;

        Ok(raw
            .into_iter()
            .map(|o| FlightOffer {
                id: o.id,
                total_amount: o.total_amount,
                total_currency: o.total_currency,
                carrier_name: o.owner.map(|c| c.name),
            })
            .collect())
    }

    fn deep_link(&self, origin_iata: &str, destination_iata: &str, date: &str) -> String {
        // Duffel offers cannot be opened directly by consumers; link into a
        // Google Flights search prefilled with the route and date instead.
        format!(
            "{GENERIC_FLIGHT_SEARCH_URL}/search?hl=en\
             #flt={origin_iata}.{destination_iata}.{date};c:USD;e:1;sd:1;t:f"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_link_carries_route_and_date() {
        let adapter = DuffelFlightAdapter::new(None);
        let url = adapter.deep_link("LIS", "CDG", "2026-09-12");
        assert!(url.starts_with(GENERIC_FLIGHT_SEARCH_URL));
        assert!(url.contains("flt=LIS.CDG.2026-09-12"));
    }

    #[test]
    fn missing_key_reports_unconfigured() {
        assert!(!DuffelFlightAdapter::new(None).is_configured());
        assert!(DuffelFlightAdapter::new(Some("key".to_string())).is_configured());
    }
}
