use crate::models::{Intent, ParsedQuery};

/// Process-scoped memory of the last dispatched query, enabling "repeat".
///
/// Created empty at startup, overwritten after every successfully extracted
/// non-repeat query, and never cleared. Reading the stored query does not
/// consume it, so repeating twice replays the same prior query.
#[derive(Debug, Default)]
pub struct Session {
    last_query: Option<ParsedQuery>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_last(&self) -> Option<ParsedQuery> {
        self.last_query.clone()
    }

    /// Stores the query as "what was last asked". A `Repeat` intent is
    /// resolved to the underlying query before it ever reaches here.
    pub fn set_last(&mut self, query: ParsedQuery) {
        debug_assert_ne!(query.intent, Intent::Repeat);
        self.last_query = Some(query);
    }
}
