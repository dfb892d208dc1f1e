use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::QueryError;
use crate::models::{Intent, QueryParams};

/// Default POI search radius when the utterance names no distance.
pub const DEFAULT_POI_RADIUS_KM: f64 = 5.0;

/// Category synonyms, folded to the canonical category names the providers
/// understand.
const CATEGORY_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "restaurant",
        &["restaurant", "restaurants", "food", "dining", "eat"],
    ),
    ("cafe", &["cafe", "cafes", "coffee", "coffeeshop", "coffee shop"]),
    ("library", &["library", "libraries", "books"]),
    ("park", &["park", "parks"]),
];

static RAW_COORD_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)").unwrap());

static GEOCODE_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:where\s+is|location\s+of|located|show\s+me|find)\b").unwrap()
});

static FROM_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfrom\s+(.+?)\s+to\s+(.+)$").unwrap());

static NEAR_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:near|in)\s+(.+)$").unwrap());

static RADIUS_KM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*km\b").unwrap());

static MATRIX_CUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:for|between|matrix)\b").unwrap());

static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r",|(?i:\band\b)").unwrap());

/// Extracts the structured arguments a determined intent needs. Pure function
/// of the utterance and the intent; makes no external calls.
pub fn extract(utterance: &str, intent: Intent) -> Result<QueryParams, QueryError> {
    match intent {
        Intent::Geocode => extract_geocode(utterance),
        Intent::ReverseGeocode => extract_reverse_geocode(utterance),
        Intent::Route => extract_route(utterance),
        Intent::PoiSearch => extract_poi(utterance),
        Intent::Matrix => extract_matrix(utterance),
        Intent::Repeat | Intent::Unknown => Ok(QueryParams::Empty {}),
    }
}

fn extract_geocode(utterance: &str) -> Result<QueryParams, QueryError> {
    let stripped = GEOCODE_CUES.replace_all(utterance, " ");
    let place = trim_fragment(&stripped);
    Ok(QueryParams::Geocode { place })
}

fn extract_reverse_geocode(utterance: &str) -> Result<QueryParams, QueryError> {
    let captures = RAW_COORD_PAIR.captures(utterance).ok_or_else(|| {
        QueryError::InvalidCoordinates("no latitude/longitude pair in the request".to_string())
    })?;

    let latitude: f64 = captures[1]
        .parse()
        .map_err(|_| QueryError::InvalidCoordinates(captures[1].to_string()))?;
    let longitude: f64 = captures[2]
        .parse()
        .map_err(|_| QueryError::InvalidCoordinates(captures[2].to_string()))?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(QueryError::InvalidCoordinates(format!(
            "{latitude}, {longitude} is outside the valid range"
        )));
    }

    Ok(QueryParams::ReverseGeocode {
        latitude,
        longitude,
    })
}

fn extract_route(utterance: &str) -> Result<QueryParams, QueryError> {
    let captures = FROM_TO
        .captures(utterance)
        .ok_or(QueryError::MissingRouteEndpoints)?;

    Ok(QueryParams::Route {
        origin: trim_fragment(&captures[1]),
        destination: trim_fragment(&captures[2]),
    })
}

fn extract_poi(utterance: &str) -> Result<QueryParams, QueryError> {
    let lower = utterance.to_lowercase();

    let category = CATEGORY_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|synonym| lower.contains(synonym)))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or_else(|| fallback_category(utterance));

    let center_place = NEAR_ANCHOR
        .captures(utterance)
        .map(|captures| trim_fragment(&captures[1]))
        .unwrap_or_default();

    let radius_km = RADIUS_KM
        .captures(utterance)
        .and_then(|captures| captures[1].parse::<f64>().ok())
        .unwrap_or(DEFAULT_POI_RADIUS_KM);

    Ok(QueryParams::PoiSearch {
        category,
        center_place,
        radius_km,
    })
}

fn extract_matrix(utterance: &str) -> Result<QueryParams, QueryError> {
    let tail_start = MATRIX_CUE
        .find_iter(utterance)
        .last()
        .map(|found| found.end())
        .unwrap_or(0);

    let places: Vec<String> = LIST_SEPARATOR
        .split(&utterance[tail_start..])
        .map(trim_fragment)
        .filter(|token| !token.is_empty())
        .collect();

    if places.len() < 2 {
        return Err(QueryError::InsufficientPlaces {
            found: places.len(),
        });
    }

    Ok(QueryParams::Matrix { places })
}

/// Whatever sits between a leading search verb and the `near` anchor, with a
/// plural `s` folded off.
fn fallback_category(utterance: &str) -> String {
    let lower = utterance.to_lowercase();
    let before_near = lower
        .split(" near ")
        .next()
        .unwrap_or(&lower)
        .trim_start_matches("find ")
        .trim();
    before_near
        .rsplit(' ')
        .next()
        .unwrap_or(before_near)
        .trim_end_matches('s')
        .to_string()
}

fn trim_fragment(fragment: &str) -> String {
    fragment
        .trim()
        .trim_matches(|ch: char| matches!(ch, '?' | '!' | '.' | ',' | ';' | ':'))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geocode_strips_cues_and_punctuation() {
        let params = extract("Where is Paris?", Intent::Geocode).unwrap();
        assert_eq!(
            params,
            QueryParams::Geocode {
                place: "Paris".to_string()
            }
        );
    }

    #[test]
    fn geocode_drops_located() {
        let params = extract("Where is the Eiffel Tower located?", Intent::Geocode).unwrap();
        assert_eq!(
            params,
            QueryParams::Geocode {
                place: "the Eiffel Tower".to_string()
            }
        );
    }

    #[test]
    fn reverse_geocode_parses_both_numbers() {
        let params = extract("What is at 48.8566, 2.3522?", Intent::ReverseGeocode).unwrap();
        assert_eq!(
            params,
            QueryParams::ReverseGeocode {
                latitude: 48.8566,
                longitude: 2.3522
            }
        );
    }

    #[test]
    fn reverse_geocode_rejects_out_of_range() {
        let err = extract("What is at 91.0, 2.3522?", Intent::ReverseGeocode).unwrap_err();
        assert!(matches!(err, QueryError::InvalidCoordinates(_)));
    }

    #[test]
    fn route_preserves_case_and_trims() {
        let params = extract("Give me a route from Paris to Berlin", Intent::Route).unwrap();
        assert_eq!(
            params,
            QueryParams::Route {
                origin: "Paris".to_string(),
                destination: "Berlin".to_string()
            }
        );
    }

    #[test]
    fn route_without_endpoints_fails() {
        let err = extract("how far is the airport", Intent::Route).unwrap_err();
        assert_eq!(err, QueryError::MissingRouteEndpoints);
    }

    #[test]
    fn poi_maps_synonyms_and_defaults_radius() {
        let params = extract("Find restaurants near Central Park", Intent::PoiSearch).unwrap();
        assert_eq!(
            params,
            QueryParams::PoiSearch {
                category: "restaurant".to_string(),
                center_place: "Central Park".to_string(),
                radius_km: DEFAULT_POI_RADIUS_KM,
            }
        );
    }

    #[test]
    fn poi_coffee_folds_to_cafe_with_explicit_radius() {
        let params = extract(
            "coffee within 2 km near City Library",
            Intent::PoiSearch,
        )
        .unwrap();
        assert_eq!(
            params,
            QueryParams::PoiSearch {
                category: "cafe".to_string(),
                center_place: "City Library".to_string(),
                radius_km: 2.0,
            }
        );
    }

    #[test]
    fn matrix_splits_after_last_cue_on_commas_and_and() {
        let params = extract(
            "Give me a travel matrix for Paris, London and Berlin",
            Intent::Matrix,
        )
        .unwrap();
        assert_eq!(
            params,
            QueryParams::Matrix {
                places: vec![
                    "Paris".to_string(),
                    "London".to_string(),
                    "Berlin".to_string()
                ]
            }
        );
    }

    #[test]
    fn matrix_needs_two_places() {
        let err = extract("matrix for Paris", Intent::Matrix).unwrap_err();
        assert_eq!(err, QueryError::InsufficientPlaces { found: 1 });
    }

    #[test]
    fn repeat_has_no_params() {
        assert_eq!(
            extract("again", Intent::Repeat).unwrap(),
            QueryParams::Empty {}
        );
    }
}
