//! # Location Helpers
//!
//! The static province/territory table and the loose parser for the
//! comma-joined location composite. Both are consulted read-only by the
//! query compiler and the presentation layer.

/// Short code → human-readable label for every Canadian province and
/// territory. Lookup is exact-match only; no fuzzy matching.
pub const PROVINCES: [(&str, &str); 13] = [
    ("AB", "Alberta"),
    ("BC", "British Columbia"),
    ("MB", "Manitoba"),
    ("NB", "New Brunswick"),
    ("NL", "Newfoundland and Labrador"),
    ("NS", "Nova Scotia"),
    ("NT", "Northwest Territories"),
    ("NU", "Nunavut"),
    ("ON", "Ontario"),
    ("PE", "Prince Edward Island"),
    ("QC", "Quebec"),
    ("SK", "Saskatchewan"),
    ("YT", "Yukon"),
];

/// Resolves a province code to its label. Unknown codes yield `None`.
pub fn province_label(code: &str) -> Option<&'static str> {
    PROVINCES
        .iter()
        .find(|(value, _)| *value == code)
        .map(|(_, label)| *label)
}

/// The structured reading of a location composite. Missing segments fall
/// back to empty strings (country defaults to Canada).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLocation {
    pub address: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// Splits "address, region, country, postal code" on commas. The composite
/// is never strictly validated, so any segment may be absent.
pub fn parse_location(location: &str) -> ParsedLocation {
    let mut parts = location.split(',').map(str::trim);

    let address = parts.next().unwrap_or("").to_string();
    let state = parts.next().unwrap_or("").to_string();
    let country = parts
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("Canada")
        .to_string();
    let postal_code = parts.next().unwrap_or("").to_string();

    ParsedLocation {
        address,
        state,
        country,
        postal_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_codes() {
        assert_eq!(province_label("ON"), Some("Ontario"));
        assert_eq!(province_label("QC"), Some("Quebec"));
        assert_eq!(province_label("YT"), Some("Yukon"));
    }

    #[test]
    fn unknown_codes_yield_none() {
        assert_eq!(province_label("ZZ"), None);
        assert_eq!(province_label("on"), None); // exact match only
        assert_eq!(province_label(""), None);
    }

    #[test]
    fn parses_full_composite() {
        let parsed = parse_location("500 Queen St, Ontario, Canada, M5V2T6");
        assert_eq!(
            parsed,
            ParsedLocation {
                address: "500 Queen St".into(),
                state: "Ontario".into(),
                country: "Canada".into(),
                postal_code: "M5V2T6".into(),
            }
        );
    }

    #[test]
    fn missing_segments_fall_back() {
        let parsed = parse_location("10 Rue Ste-Catherine");
        assert_eq!(parsed.address, "10 Rue Ste-Catherine");
        assert_eq!(parsed.state, "");
        assert_eq!(parsed.country, "Canada");
        assert_eq!(parsed.postal_code, "");
    }
}
