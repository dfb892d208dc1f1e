mod osm;
mod sample;

use async_trait::async_trait;
use wayfinder_core::{Intent, MatrixResult, Place, PoiResult, QueryError, QueryParams, RouteResult};

pub use osm::{OsmMapProvider, OsmProviderParams};
pub use sample::SampleMapProvider;

/// The backend collaborator contract, implemented identically by the sample
/// dataset provider and the live OpenStreetMap provider. Origin, destination,
/// center, and matrix entries are place names; providers resolve them through
/// their own geocoding.
#[async_trait]
pub trait MapProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn geocode(&self, place_name: &str) -> Result<Place, QueryError>;

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, QueryError>;

    async fn route(&self, origin: &str, destination: &str) -> Result<RouteResult, QueryError>;

    async fn poi_search(
        &self,
        center: &str,
        radius_km: f64,
        category: &str,
    ) -> Result<PoiResult, QueryError>;

    async fn matrix(&self, places: &[String]) -> Result<MatrixResult, QueryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sample,
    Live,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BackendConfig {
    pub live_mode: bool,
}

/// Chooses the provider for a query. Pure over (intent, params, config);
/// every query re-selects.
pub fn select_backend(intent: Intent, params: &QueryParams, config: &BackendConfig) -> BackendKind {
    if !config.live_mode {
        return BackendKind::Sample;
    }

    match intent {
        Intent::Geocode | Intent::ReverseGeocode | Intent::Route | Intent::Matrix => {
            BackendKind::Live
        }
        Intent::PoiSearch => match params {
            QueryParams::PoiSearch { category, .. } if osm::search_tag(category).is_some() => {
                BackendKind::Live
            }
            _ => BackendKind::Sample,
        },
        Intent::Repeat | Intent::Unknown => BackendKind::Sample,
    }
}

pub(crate) fn haversine_km(
    from_lat: f64,
    from_lon: f64,
    to_lat: f64,
    to_lon: f64,
) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let phi1 = from_lat.to_radians();
    let phi2 = to_lat.to_radians();
    let d_phi = (to_lat - from_lat).to_radians();
    let d_lambda = (to_lon - from_lon).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
