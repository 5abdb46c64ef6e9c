use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifetimes, in days, a new snippet may be created with.
pub const SNIPPET_EXPIRY_DAYS: [i64; 3] = [1, 7, 365];

/// Expiry preselected on the create form.
pub const DEFAULT_EXPIRY_DAYS: i64 = 365;

/// Number of snippets shown on the home page.
pub const LATEST_SNIPPETS: u32 = 10;

/// A published snippet. Only rows with `expires` in the future are ever
/// handed out by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}
