//! crates/along_core/src/airports.rs
//!
//! Static city-name → IATA lookup for common travel destinations. Exact
//! match first, then a substring pass so "Paris, France" or "Paris 75001"
//! still resolve. Unknown cities are `None`; the flight resolver keeps the
//! segment and marks it unavailable instead of dropping it.

/// Ordered so the substring pass is deterministic.
const CITY_IATA: &[(&str, &str)] = &[
    // North America
    ("new york", "JFK"),
    ("nyc", "JFK"),
    ("manhattan", "JFK"),
    ("los angeles", "LAX"),
    ("chicago", "ORD"),
    ("san francisco", "SFO"),
    ("miami", "MIA"),
    ("boston", "BOS"),
    ("washington", "DCA"),
    ("seattle", "SEA"),
    ("atlanta", "ATL"),
    ("denver", "DEN"),
    ("toronto", "YYZ"),
    ("montreal", "YUL"),
    ("vancouver", "YVR"),
    ("mexico city", "MEX"),
    // Europe
    ("london", "LHR"),
    ("paris", "CDG"),
    ("amsterdam", "AMS"),
    ("berlin", "BER"),
    ("madrid", "MAD"),
    ("barcelona", "BCN"),
    ("rome", "FCO"),
    ("milan", "MXP"),
    ("florence", "FLR"),
    ("venice", "VCE"),
    ("naples", "NAP"),
    ("lisbon", "LIS"),
    ("porto", "OPO"),
    ("athens", "ATH"),
    ("istanbul", "IST"),
    ("prague", "PRG"),
    ("vienna", "VIE"),
    ("zurich", "ZRH"),
    ("geneva", "GVA"),
    ("stockholm", "ARN"),
    ("copenhagen", "CPH"),
    ("oslo", "OSL"),
    ("helsinki", "HEL"),
    ("dublin", "DUB"),
    ("edinburgh", "EDI"),
    ("brussels", "BRU"),
    // Asia-Pacific
    ("tokyo", "NRT"),
    ("osaka", "KIX"),
    // Kyoto is served by Osaka (KIX)
    ("kyoto", "KIX"),
    ("seoul", "ICN"),
    ("beijing", "PEK"),
    ("shanghai", "PVG"),
    ("hong kong", "HKG"),
    ("singapore", "SIN"),
    ("bangkok", "BKK"),
    ("taipei", "TPE"),
    ("sydney", "SYD"),
    ("melbourne", "MEL"),
    ("auckland", "AKL"),
    ("bali", "DPS"),
    ("denpasar", "DPS"),
    ("jakarta", "CGK"),
    ("kuala lumpur", "KUL"),
    // Middle East & Africa
    ("dubai", "DXB"),
    ("abu dhabi", "AUH"),
    ("tel aviv", "TLV"),
    ("cairo", "CAI"),
    ("marrakech", "RAK"),
    ("cape town", "CPT"),
    ("johannesburg", "JNB"),
    // South America
    ("buenos aires", "EZE"),
    ("rio de janeiro", "GIG"),
    ("rio", "GIG"),
    ("sao paulo", "GRU"),
    ("bogota", "BOG"),
    ("lima", "LIM"),
    ("santiago", "SCL"),
];

/// Resolves a free-text city name to an IATA code.
pub fn city_to_iata(city: &str) -> Option<&'static str> {
    let normalized = city.trim().to_lowercase();
    if let Some((_, code)) = CITY_IATA.iter().find(|(name, _)| *name == normalized) {
        return Some(code);
    }
    // Partial match: the city may come with a country or postal suffix.
    CITY_IATA
        .iter()
        .find(|(name, _)| normalized.starts_with(name) || normalized.contains(name))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_resolves() {
        assert_eq!(city_to_iata("Lisbon"), Some("LIS"));
        assert_eq!(city_to_iata("tokyo"), Some("NRT"));
    }

    #[test]
    fn suffixed_city_resolves_via_substring_pass() {
        assert_eq!(city_to_iata("Paris, France"), Some("CDG"));
        assert_eq!(city_to_iata("Paris 75001"), Some("CDG"));
    }

    #[test]
    fn unknown_city_is_none() {
        assert_eq!(city_to_iata("Nowhereland"), None);
    }
}
