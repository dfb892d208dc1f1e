use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use wayfinder_agents::MapAgent;
use wayfinder_core::{Intent, MapResult, QueryError, QueryParams};
use wayfinder_llm::FallbackClassifier;
use wayfinder_observability::AppMetrics;
use wayfinder_providers::{BackendConfig, SampleMapProvider};

/// Fallback stub: counts invocations, always answers a fixed intent.
struct CountingFallback {
    calls: AtomicUsize,
    reply: Intent,
}

impl CountingFallback {
    fn new(reply: Intent) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply,
        })
    }
}

#[async_trait]
impl FallbackClassifier for CountingFallback {
    async fn classify(&self, _text: &str) -> Intent {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
    }
}

fn build_agent(fallback: Arc<CountingFallback>) -> MapAgent {
    MapAgent::new(
        Arc::new(SampleMapProvider::new()),
        Arc::new(SampleMapProvider::new()),
        fallback,
        BackendConfig { live_mode: false },
        AppMetrics::shared(),
    )
}

#[tokio::test]
async fn where_is_resolves_to_geocode() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    let outcome = agent.handle("Where is Central Park?").await.unwrap();
    assert_eq!(outcome.intent, Intent::Geocode);
    assert_eq!(
        outcome.params,
        QueryParams::Geocode {
            place: "Central Park".to_string()
        }
    );
    match outcome.result {
        MapResult::Place(place) => assert_eq!(place.name, "Central Park"),
        other => panic!("expected a place, got {other:?}"),
    }
}

#[tokio::test]
async fn coordinate_pair_resolves_to_reverse_geocode() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    let outcome = agent.handle("What is at 40.7532, -73.9822?").await.unwrap();
    assert_eq!(outcome.intent, Intent::ReverseGeocode);
    assert_eq!(
        outcome.params,
        QueryParams::ReverseGeocode {
            latitude: 40.7532,
            longitude: -73.9822
        }
    );
    match outcome.result {
        MapResult::Place(place) => assert_eq!(place.name, "City Library"),
        other => panic!("expected a place, got {other:?}"),
    }
}

#[tokio::test]
async fn route_from_to_resolves_with_literal_endpoints() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    let outcome = agent
        .handle("Give me a route from Central Park to City Library")
        .await
        .unwrap();
    assert_eq!(outcome.intent, Intent::Route);
    assert_eq!(
        outcome.params,
        QueryParams::Route {
            origin: "Central Park".to_string(),
            destination: "City Library".to_string()
        }
    );
    match outcome.result {
        MapResult::Route(route) => {
            assert!(route.distance_km > 0.0);
            assert!(route.duration_min > 0.0);
        }
        other => panic!("expected a route, got {other:?}"),
    }
}

#[tokio::test]
async fn restaurants_near_resolves_to_poi_search() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    let outcome = agent
        .handle("Find restaurants near Central Park")
        .await
        .unwrap();
    assert_eq!(outcome.intent, Intent::PoiSearch);
    assert_eq!(
        outcome.params,
        QueryParams::PoiSearch {
            category: "restaurant".to_string(),
            center_place: "Central Park".to_string(),
            radius_km: 5.0,
        }
    );
    match outcome.result {
        MapResult::Poi(poi) => {
            assert_eq!(poi.hits.len(), 1);
            assert_eq!(poi.hits[0].place.name, "Alice's Restaurant");
        }
        other => panic!("expected poi hits, got {other:?}"),
    }
}

#[tokio::test]
async fn travel_matrix_lists_places_in_order() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    let outcome = agent
        .handle("Give me a travel matrix for Central Park, City Library, Bob's Coffee Shop")
        .await
        .unwrap();
    assert_eq!(outcome.intent, Intent::Matrix);
    assert_eq!(
        outcome.params,
        QueryParams::Matrix {
            places: vec![
                "Central Park".to_string(),
                "City Library".to_string(),
                "Bob's Coffee Shop".to_string(),
            ]
        }
    );
    match outcome.result {
        MapResult::Matrix(matrix) => {
            assert_eq!(matrix.places.len(), 3);
            for i in 0..3 {
                assert_eq!(matrix.distance_matrix[i][i], 0.0);
                assert_eq!(matrix.duration_matrix[i][i], 0.0);
            }
        }
        other => panic!("expected a matrix, got {other:?}"),
    }
}

#[tokio::test]
async fn again_replays_the_matrix_without_re_extraction() {
    let fallback = CountingFallback::new(Intent::Unknown);
    let agent = build_agent(fallback.clone());

    let first = agent
        .handle("Give me a travel matrix for Central Park, City Library")
        .await
        .unwrap();
    let replay = agent.handle("again").await.unwrap();

    assert_eq!(replay.intent, Intent::Matrix);
    assert_eq!(first.params, replay.params);
    assert_eq!(first.result, replay.result);
    // Both utterances matched rules; the fallback never ran.
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeating_twice_replays_the_same_query() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    agent.handle("Where is Central Park?").await.unwrap();
    let first_replay = agent.handle("again").await.unwrap();
    let second_replay = agent.handle("repeat").await.unwrap();

    assert_eq!(first_replay.params, second_replay.params);
    assert_eq!(first_replay.result, second_replay.result);
}

#[tokio::test]
async fn repeat_on_a_fresh_session_reports_no_prior_command() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    let err = agent.handle("again").await.unwrap_err();
    assert_eq!(err, QueryError::NoPriorCommand);
}

#[tokio::test]
async fn fallback_intent_drives_extraction() {
    // "show me" is not a rule cue, so the rules are inconclusive and the
    // fallback's answer drives extraction.
    let fallback = CountingFallback::new(Intent::Geocode);
    let agent = build_agent(fallback.clone());

    let outcome = agent.handle("show me Central Park").await.unwrap();
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.intent, Intent::Geocode);
    match outcome.result {
        MapResult::Place(place) => assert_eq!(place.name, "Central Park"),
        other => panic!("expected a place, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_after_both_stages_is_not_understood() {
    let fallback = CountingFallback::new(Intent::Unknown);
    let agent = build_agent(fallback.clone());

    let err = agent.handle("sing me a sea shanty").await.unwrap_err();
    assert_eq!(err, QueryError::NotUnderstood);
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn normalized_result_shape_is_stable() {
    let agent = build_agent(CountingFallback::new(Intent::Unknown));

    let outcome = agent.handle("Where is Central Park?").await.unwrap();
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["intent"], "geocode");
    assert!(value["params"].is_object());
    assert!(value["result"].is_object());
}
