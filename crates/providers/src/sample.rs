use async_trait::async_trait;
use wayfinder_core::{MatrixResult, Place, PoiHit, PoiResult, QueryError, RouteResult};

use crate::{haversine_km, round1, round3, MapProvider};

/// Average driving speed used for duration estimates, km/h.
const ASSUMED_SPEED_KMH: f64 = 50.0;

/// Farthest a point may sit from a known place and still reverse-geocode.
const REVERSE_RESOLUTION_KM: f64 = 25.0;

struct SamplePlace {
    name: &'static str,
    latitude: f64,
    longitude: f64,
    category: &'static str,
}

const DATASET: &[SamplePlace] = &[
    SamplePlace {
        name: "Central Park",
        latitude: 40.785091,
        longitude: -73.968285,
        category: "park",
    },
    SamplePlace {
        name: "Alice's Restaurant",
        latitude: 40.77,
        longitude: -73.98,
        category: "restaurant",
    },
    SamplePlace {
        name: "Bob's Coffee Shop",
        latitude: 40.775,
        longitude: -73.97,
        category: "cafe",
    },
    SamplePlace {
        name: "City Library",
        latitude: 40.7532,
        longitude: -73.9822,
        category: "library",
    },
];

/// In-memory provider over a small fixed dataset. Deterministic and offline,
/// the default backend when live mode is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleMapProvider;

impl SampleMapProvider {
    pub fn new() -> Self {
        Self
    }

    fn lookup(&self, place_name: &str) -> Option<&'static SamplePlace> {
        let query = place_name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        DATASET
            .iter()
            .find(|place| place.name.to_lowercase().contains(&query))
    }

    fn resolve(&self, place_name: &str) -> Result<Place, QueryError> {
        self.lookup(place_name)
            .map(to_place)
            .ok_or_else(|| QueryError::PlaceNotFound {
                name: place_name.to_string(),
            })
    }
}

fn to_place(place: &SamplePlace) -> Place {
    Place {
        name: place.name.to_string(),
        latitude: place.latitude,
        longitude: place.longitude,
    }
}

#[async_trait]
impl MapProvider for SampleMapProvider {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn geocode(&self, place_name: &str) -> Result<Place, QueryError> {
        self.resolve(place_name)
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place, QueryError> {
        DATASET
            .iter()
            .map(|place| {
                (
                    place,
                    haversine_km(latitude, longitude, place.latitude, place.longitude),
                )
            })
            .filter(|(_, distance)| *distance <= REVERSE_RESOLUTION_KM)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(place, _)| to_place(place))
            .ok_or_else(|| QueryError::PlaceNotFound {
                name: format!("{latitude}, {longitude}"),
            })
    }

    async fn route(&self, origin: &str, destination: &str) -> Result<RouteResult, QueryError> {
        let from = self.resolve(origin)?;
        let to = self.resolve(destination)?;

        let distance_km = haversine_km(from.latitude, from.longitude, to.latitude, to.longitude);
        let duration_min = distance_km / ASSUMED_SPEED_KMH * 60.0;

        Ok(RouteResult {
            distance_km: round3(distance_km),
            duration_min: round1(duration_min),
        })
    }

    async fn poi_search(
        &self,
        center: &str,
        radius_km: f64,
        category: &str,
    ) -> Result<PoiResult, QueryError> {
        // An empty center means no distance filter, matching the dataset's
        // original uncentered search behavior.
        let anchor = if center.trim().is_empty() {
            None
        } else {
            Some(self.resolve(center)?)
        };

        let wanted = category.trim().to_lowercase();
        let wanted_base = wanted.trim_end_matches('s');

        let mut hits: Vec<PoiHit> = DATASET
            .iter()
            .filter(|place| {
                place.category == wanted_base || place.name.to_lowercase().contains(&wanted)
            })
            .filter_map(|place| {
                let distance_km = match &anchor {
                    Some(anchor) => {
                        let distance = haversine_km(
                            anchor.latitude,
                            anchor.longitude,
                            place.latitude,
                            place.longitude,
                        );
                        if distance > radius_km {
                            return None;
                        }
                        distance
                    }
                    None => 0.0,
                };
                Some(PoiHit {
                    place: to_place(place),
                    distance_km: round3(distance_km),
                })
            })
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

        let resolved: Vec<Place> = places
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<_, _>>()?;

        let n = resolved.len();
        let mut distance_matrix = vec![vec![0.0; n]; n];
        let mut duration_matrix = vec![vec![0.0; n]; n];

        for (i, from) in resolved.iter().enumerate() {
            for (j, to) in resolved.iter().enumerate() {
                if i == j {
                    continue;
                }
                let distance =
                    haversine_km(from.latitude, from.longitude, to.latitude, to.longitude);
                distance_matrix[i][j] = round3(distance);
                duration_matrix[i][j] = round1(distance / ASSUMED_SPEED_KMH * 60.0);
            }
        }

        Ok(MatrixResult {
            places: resolved,
            distance_matrix,
            duration_matrix,
        })
    }
}
