use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Intent;

/// Outcome of the deterministic rule stage. `Inconclusive` hands the
/// utterance to the fallback classifier; the rules never answer `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDecision {
    Intent(Intent),
    Inconclusive,
}

static COORD_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)").unwrap());

static FROM_TO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfrom\s+.+\s+to\s+\S").unwrap());

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Pattern-matches an utterance against the known intent shapes, in a fixed
/// priority order. Pure and deterministic: identical input always yields the
/// identical decision.
pub fn classify_rules(text: &str) -> RuleDecision {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    if coordinate_pair(&lower).is_some() {
        return RuleDecision::Intent(Intent::ReverseGeocode);
    }

    if is_repeat_cue(&lower) {
        return RuleDecision::Intent(Intent::Repeat);
    }

    if contains_any(&lower, &["route", "distance to", "how far"]) || FROM_TO.is_match(trimmed) {
        return RuleDecision::Intent(Intent::Route);
    }

    if contains_any(&lower, &["matrix", "compare"])
        || (has_travel_cue(&lower) && capitalized_list_len(trimmed) >= 2)
    {
        return RuleDecision::Intent(Intent::Matrix);
    }

    if contains_any(
        &lower,
        &["restaurant", "cafe", "coffee", "library", "near"],
    ) {
        return RuleDecision::Intent(Intent::PoiSearch);
    }

    if contains_any(&lower, &["where is", "located", "location of"]) {
        return RuleDecision::Intent(Intent::Geocode);
    }

    RuleDecision::Inconclusive
}

/// Finds a lat/lon pair in the text, accepting it only when both numbers are
/// inside their valid ranges.
pub fn coordinate_pair(text: &str) -> Option<(f64, f64)> {
    let captures = COORD_PAIR.captures(text)?;
    let latitude: f64 = captures[1].parse().ok()?;
    let longitude: f64 = captures[2].parse().ok()?;

    if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
        Some((latitude, longitude))
    } else {
        None
    }
}

fn is_repeat_cue(lower: &str) -> bool {
    matches!(
        lower.trim_end_matches(['.', '!', '?']).trim(),
        "again" | "repeat" | "same"
    )
}

fn has_travel_cue(lower: &str) -> bool {
    contains_any(lower, &["travel time", "travel times", "drive time", "drive times"])
}

/// Number of comma-separated segments holding a capitalized word, the shape
/// of a "Paris, London, Berlin" style place list. The first segment may carry
/// leading prose ("travel times between Paris").
fn capitalized_list_len(text: &str) -> usize {
    text.split(',')
        .filter(|segment| {
            segment
                .split_whitespace()
                .any(|word| word.chars().next().is_some_and(char::is_uppercase))
        })
        .count()
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
