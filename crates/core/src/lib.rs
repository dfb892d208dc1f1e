pub mod error;
pub mod extract;
pub mod intent;
pub mod models;
pub mod session;

pub use error::{QueryError, Stage};
pub use extract::{extract, DEFAULT_POI_RADIUS_KM};
pub use intent::{classify_rules, coordinate_pair, normalize_text, RuleDecision};
pub use models::*;
pub use session::Session;
