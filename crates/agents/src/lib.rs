use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{info, instrument};
use wayfinder_core::{
    classify_rules, extract, normalize_text, DispatchOutcome, Intent, MapResult, ParsedQuery,
    QueryError, QueryParams, RuleDecision, Session,
};
use wayfinder_llm::FallbackClassifier;
use wayfinder_observability::AppMetrics;
use wayfinder_providers::{select_backend, BackendConfig, BackendKind, MapProvider};

/// The tool dispatcher. Classifies an utterance, extracts parameters,
/// resolves "repeat", picks a backend, invokes it, and normalizes the result.
pub struct MapAgent {
    sample: Arc<dyn MapProvider>,
    live: Arc<dyn MapProvider>,
    fallback: Arc<dyn FallbackClassifier>,
    config: BackendConfig,
    session: Mutex<Session>,
    metrics: Arc<AppMetrics>,
}

impl MapAgent {
    pub fn new(
        sample: Arc<dyn MapProvider>,
        live: Arc<dyn MapProvider>,
        fallback: Arc<dyn FallbackClassifier>,
        config: BackendConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            sample,
            live,
            fallback,
            config,
            session: Mutex::new(Session::new()),
            metrics,
        }
    }

    /// Full pipeline for one utterance. Classification always terminates with
    /// some intent; the fallback stage runs only when the rules are
    /// inconclusive.
    #[instrument(skip(self, utterance))]
    pub async fn handle(&self, utterance: &str) -> Result<DispatchOutcome, QueryError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let normalized = normalize_text(utterance);

        let intent = match classify_rules(&normalized) {
            RuleDecision::Intent(intent) => intent,
            RuleDecision::Inconclusive => {
                self.metrics.inc_fallback();
                self.fallback.classify(&normalized).await
            }
        };

        let query = match intent {
            Intent::Unknown => return Err(QueryError::NotUnderstood),
            Intent::Repeat => self
                .session
                .lock()
                .get_last()
                .ok_or(QueryError::NoPriorCommand)?,
            _ => {
                let params = extract(&normalized, intent)?;
                ParsedQuery { intent, params }
            }
        };

        let outcome = self.dispatch(query).await;
        if outcome.is_ok() {
            self.metrics.observe_latency(started.elapsed());
        }
        outcome
    }

    /// Dispatches an already-parsed query: stores it as "what was last
    /// asked", selects the backend, invokes the matching operation, and
    /// normalizes the result. Extraction failures never reach this point, so
    /// the session update always describes a well-formed query even when the
    /// backend later fails.
    pub async fn dispatch(&self, query: ParsedQuery) -> Result<DispatchOutcome, QueryError> {
        self.session.lock().set_last(query.clone());

        let backend = select_backend(query.intent, &query.params, &self.config);
        let provider = match backend {
            BackendKind::Sample => self.sample.as_ref(),
            BackendKind::Live => self.live.as_ref(),
        };

        let result = invoke(provider, &query).await;
        if result.is_err() {
            self.metrics.inc_backend_error();
        }
        let result = result?;

        info!(
            intent = query.intent.as_tag(),
            backend = provider.name(),
            "query dispatched"
        );

        Ok(DispatchOutcome {
            intent: query.intent,
            params: query.params,
            result,
        })
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }
}

async fn invoke(provider: &dyn MapProvider, query: &ParsedQuery) -> Result<MapResult, QueryError> {
    match &query.params {
        QueryParams::Geocode { place } => provider.geocode(place).await.map(MapResult::Place),
        QueryParams::ReverseGeocode {
            latitude,
            longitude,
        } => provider
            .reverse_geocode(*latitude, *longitude)
            .await
            .map(MapResult::Place),
        QueryParams::Route {
            origin,
            destination,
        } => provider
            .route(origin, destination)
            .await
            .map(MapResult::Route),
        QueryParams::PoiSearch {
            category,
            center_place,
            radius_km,
        } => provider
            .poi_search(center_place, *radius_km, category)
            .await
            .map(MapResult::Poi),
        QueryParams::Matrix { places } => provider.matrix(places).await.map(MapResult::Matrix),
        QueryParams::Empty {} => Err(QueryError::NotUnderstood),
    }
}
