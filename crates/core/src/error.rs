use serde::Serialize;
use thiserror::Error;

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classification,
    Extraction,
    RepeatResolution,
    Backend,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Classification => "classification",
            Self::Extraction => "extraction",
            Self::RepeatResolution => "repeat_resolution",
            Self::Backend => "backend",
        };
        f.write_str(name)
    }
}

/// Every way a query can fail, tagged with the stage that failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("could not find a 'from <origin> to <destination>' pattern in the request")]
    MissingRouteEndpoints,

    #[error("a travel matrix needs at least two places, got {found}")]
    InsufficientPlaces { found: usize },

    #[error("nothing to repeat yet; ask for something first")]
    NoPriorCommand,

    #[error("no place matching '{name}' was found")]
    PlaceNotFound { name: String },

    #[error("backend unavailable ({reason}); try again in a moment")]
    BackendUnavailable { reason: String },

    #[error("could not understand the request")]
    NotUnderstood,
}

impl QueryError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidCoordinates(_)
            | Self::MissingRouteEndpoints
            | Self::InsufficientPlaces { .. } => Stage::Extraction,
            Self::NoPriorCommand => Stage::RepeatResolution,
            Self::PlaceNotFound { .. } | Self::BackendUnavailable { .. } => Stage::Backend,
            Self::NotUnderstood => Stage::Classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_carry_their_stage() {
        assert_eq!(
            QueryError::InsufficientPlaces { found: 1 }.stage(),
            Stage::Extraction
        );
        assert_eq!(QueryError::NoPriorCommand.stage(), Stage::RepeatResolution);
        assert_eq!(
            QueryError::PlaceNotFound {
                name: "Atlantis".to_string()
            }
            .stage(),
            Stage::Backend
        );
        assert_eq!(QueryError::NotUnderstood.stage(), Stage::Classification);
    }
}
