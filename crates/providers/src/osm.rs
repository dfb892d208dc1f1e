use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wayfinder_core::{MatrixResult, Place, PoiHit, PoiResult, QueryError, RouteResult};

use crate::{haversine_km, round1, round3, MapProvider};

/// Kilometers per degree of latitude, used to derive search bounding boxes.
const KM_PER_DEGREE: f64 = 111.0;

/// Endpoint configuration for the live provider.
#[derive(Debug, Clone)]
pub struct OsmProviderParams {
    pub nominatim_search_url: String,
    pub nominatim_reverse_url: String,
    pub osrm_route_url: String,
    pub osrm_table_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for OsmProviderParams {
    fn default() -> Self {
        Self {
            nominatim_search_url: "https://nominatim.openstreetmap.org/search".to_string(),
            nominatim_reverse_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            osrm_route_url: "http://router.project-osrm.org/route/v1/driving".to_string(),
            osrm_table_url: "http://router.project-osrm.org/table/v1/driving".to_string(),
            user_agent: "wayfinder/0.1".to_string(),
            timeout: Duration::from_secs(12),
        }
    }
}

/// Live provider over Nominatim (geocoding) and OSRM (routing). Every call is
/// bounded by the configured timeout; network failures surface as
/// `BackendUnavailable`.
#[derive(Debug, Clone)]
pub struct OsmMapProvider {
    params: OsmProviderParams,
    client: reqwest::Client,
}

/// Nominatim search tag for a canonical POI category, if it has one.
pub(crate) fn search_tag(category: &str) -> Option<&'static str> {
    match category.trim().to_lowercase().as_str() {
        "restaurant" => Some("restaurant"),
        "cafe" => Some("cafe"),
        "library" => Some("library"),
        "park" => Some("park"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    display_name: String,
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    durations: Option<Vec<Vec<f64>>>,
    distances: Option<Vec<Vec<f64>>>,
}

impl OsmMapProvider {
    pub fn new(params: OsmProviderParams) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(params.user_agent.clone())
            .timeout(params.timeout)
            .build()?;
        Ok(Self { params, client })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, QueryError> {
        debug!(url, "live provider request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;

        response.json::<T>().await.map_err(unavailable)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>, QueryError> {
        let hits: Vec<NominatimHit> = self
            .get_json(
                &self.params.nominatim_search_url,
                &[
                    ("q", query.to_string()),
                    ("format", "json".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(hits.into_iter().filter_map(to_place).collect())
    }

    async fn bounded_search(
        &self,
        query: &str,
        center: &Place,
        radius_km: f64,
    ) -> Result<Vec<Place>, QueryError> {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let lon_delta = radius_km / (KM_PER_DEGREE * center.latitude.to_radians().cos().max(0.01));
        let viewbox = format!(
            "{},{},{},{}",
            center.longitude - lon_delta,
            center.latitude + lat_delta,
            center.longitude + lon_delta,
            center.latitude - lat_delta,
        );

        let hits: Vec<NominatimHit> = self
            .get_json(
                &self.params.nominatim_search_url,
                &[
                    ("q", query.to_string()),
                    ("format", "json".to_string()),
                    ("limit", "10".to_string()),
                    ("viewbox", viewbox),
                    ("bounded", "1".to_string()),
                ],
            )
            .await?;

        Ok(hits.into_iter().filter_map(to_place).collect())
    }
}

fn to_place(hit: NominatimHit) -> Option<Place> {
    Some(Place {
        name: hit.display_name,
        latitude: hit.lat.parse().ok()?,
        longitude: hit.lon.parse().ok()?,
    })
}

fn unavailable(err: reqwest::Error) -> QueryError {
    QueryError::BackendUnavailable {
        reason: err.to_string(),
    }
}

#[async_trait]
impl MapProvider for OsmMapProvider {
    fn name(&self) -> &'static str {
        "osm"
    }

    async fn geocode(&self, place_name: &str) -> Result<Place, QueryError> {
        let name = place_name.trim();
        if name.is_empty() {
            return Err(QueryError::PlaceNotFound {
                name: place_name.to_string(),
            });
        }

        self.search(name, 3)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::PlaceNotFound {
                name: place_name.to_string(),
            })
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, QueryError> {
        let reverse: NominatimReverse = self
            .get_json(
                &self.params.nominatim_reverse_url,
                &[
                    ("format", "json".to_string()),
                    ("lat", latitude.to_string()),
                    ("lon", longitude.to_string()),
                ],
            )
            .await?;

        let name = reverse
            .display_name
            .ok_or_else(|| QueryError::PlaceNotFound {
                name: format!("{latitude}, {longitude}"),
            })?;

        Ok(Place {
            name,
            latitude,
            longitude,
        })
    }

    async fn route(&self, origin: &str, destination: &str) -> Result<RouteResult, QueryError> {
        let from = self.geocode(origin).await?;
        let to = self.geocode(destination).await?;

        let url = format!(
            "{}/{},{};{},{}",
            self.params.osrm_route_url, from.longitude, from.latitude, to.longitude, to.latitude
        );
        let response: OsrmRouteResponse = self
            .get_json(&url, &[("overview", "false".to_string())])
            .await?;

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::BackendUnavailable {
                reason: "no route returned".to_string(),
            })?;

        Ok(RouteResult {
            distance_km: round3(route.distance / 1000.0),
            duration_min: round1(route.duration / 60.0),
        })
    }

    async fn poi_search(
        &self,
        center: &str,
        radius_km: f64,
        category: &str,
    ) -> Result<PoiResult, QueryError> {
        let tag = search_tag(category).ok_or_else(|| QueryError::PlaceNotFound {
            name: category.to_string(),
        })?;
        let anchor = self.geocode(center).await?;

        let mut hits: Vec<PoiHit> = self
            .bounded_search(tag, &anchor, radius_km)
            .await?
            .into_iter()
            .map(|place| {
                let distance_km = haversine_km(
                    anchor.latitude,
                    anchor.longitude,
                    place.latitude,
                    place.longitude,
                );
                PoiHit {
                    place,
                    distance_km: round3(distance_km),
                }
            })
            .filter(|hit| hit.distance_km <= radius_km)
            .collect();

        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(PoiResult { hits })
    }

    async fn matrix(&self, places: &[String]) -> Result<MatrixResult, QueryError> {
        if places.len() < 2 {
            return Err(QueryError::InsufficientPlaces {
                found: places.len(),
            });
        }

        let mut resolved = Vec::with_capacity(places.len());
        for name in places {
            resolved.push(self.geocode(name).await?);
        }

        let coords = resolved
            .iter()
            .map(|place| format!("{},{}", place.longitude, place.latitude))
            .collect::<Vec<_>>()
            .join(";");
        let url = format!("{}/{}", self.params.osrm_table_url, coords);

        let response: OsrmTableResponse = self
            .get_json(&url, &[("annotations", "duration,distance".to_string())])
            .await?;

        let durations = response
            .durations
            .ok_or_else(|| QueryError::BackendUnavailable {
                reason: "no matrix returned".to_string(),
            })?;

        let duration_matrix: Vec<Vec<f64>> = durations
            .iter()
            .map(|row| row.iter().map(|seconds| round1(seconds / 60.0)).collect())
            .collect();

        // Some OSRM deployments omit distances; fall back to straight-line.
        let distance_matrix: Vec<Vec<f64>> = match response.distances {
            Some(distances) => distances
                .iter()
                .map(|row| row.iter().map(|meters| round3(meters / 1000.0)).collect())
                .collect(),
            None => resolved
                .iter()
                .map(|from| {
                    resolved
                        .iter()
                        .map(|to| {
                            round3(haversine_km(
                                from.latitude,
                                from.longitude,
                                to.latitude,
                                to.longitude,
                            ))
                        })
                        .collect()
                })
                .collect(),
        };

        Ok(MatrixResult {
            places: resolved,
            distance_matrix,
            duration_matrix,
        })
    }
}
