use serde::{Deserialize, Serialize};

/// The category of map operation a user utterance requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Geocode,
    ReverseGeocode,
    Route,
    PoiSearch,
    Matrix,
    Repeat,
    Unknown,
}

impl Intent {
    pub fn from_tag(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"').to_lowercase().as_str() {
            "geocode" => Some(Self::Geocode),
            "reverse_geocode" | "reverse-geocode" => Some(Self::ReverseGeocode),
            "route" => Some(Self::Route),
            "poi_search" | "poi-search" | "poi" => Some(Self::PoiSearch),
            "matrix" => Some(Self::Matrix),
            "repeat" => Some(Self::Repeat),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Geocode => "geocode",
            Self::ReverseGeocode => "reverse_geocode",
            Self::Route => "route",
            Self::PoiSearch => "poi_search",
            Self::Matrix => "matrix",
            Self::Repeat => "repeat",
            Self::Unknown => "unknown",
        }
    }
}

/// Structured arguments for one intent, serialized as the bare params object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParams {
    Geocode {
        place: String,
    },
    ReverseGeocode {
        latitude: f64,
        longitude: f64,
    },
    Route {
        origin: String,
        destination: String,
    },
    PoiSearch {
        category: String,
        center_place: String,
        radius_km: f64,
    },
    Matrix {
        places: Vec<String>,
    },
    Empty {},
}

/// One fully understood utterance. Never mutated after creation; the repeat
/// path clones the stored query instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub intent: Intent,
    pub params: QueryParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub distance_km: f64,
    pub duration_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiHit {
    pub place: Place,
    pub distance_km: f64,
}

/// Hits ordered by ascending distance from the search center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiResult {
    pub hits: Vec<PoiHit>,
}

/// N x N grids in the order of `places`; diagonal entries are 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixResult {
    pub places: Vec<Place>,
    pub distance_matrix: Vec<Vec<f64>>,
    pub duration_matrix: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapResult {
    Place(Place),
    Route(RouteResult),
    Poi(PoiResult),
    Matrix(MatrixResult),
}

/// The normalized shape returned to the caller for every dispatched query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub intent: Intent,
    pub params: QueryParams,
    pub result: MapResult,
}
