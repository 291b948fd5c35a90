pub mod artist;
pub mod show;
pub mod venue;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::BookingResult;

/// Start time as shown on venue and artist pages
pub const DETAIL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Start time as shown on the shows listing
pub const LISTING_TIME_FORMAT: &str = "%m/%d/%Y, %H:%M";

/// A venue or artist as it appears in listings and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<EntitySummary>,
}

impl From<Vec<EntitySummary>> for SearchResults {
    fn from(data: Vec<EntitySummary>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

pub fn encode_genres(genres: &[String]) -> BookingResult<String> {
    Ok(serde_json::to_string(genres)?)
}

pub fn decode_genres(raw: &str) -> BookingResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// Case-insensitive substring match on a name. Folds every letter, not just ASCII.
pub fn name_matches(name: &str, search_term: &str) -> bool {
    name.to_lowercase().contains(&search_term.to_lowercase())
}

/// Split `(start_time, item)` pairs into past and upcoming relative to `now`.
/// Both bounds are open: an item starting exactly at `now` lands in neither.
pub fn split_past_upcoming<T>(
    shows: impl IntoIterator<Item = (DateTime<Utc>, T)>,
    now: DateTime<Utc>,
) -> (Vec<T>, Vec<T>) {
    let mut past = Vec::new();
    let mut upcoming = Vec::new();
    for (start_time, item) in shows {
        if start_time < now {
            past.push(item);
        } else if start_time > now {
            upcoming.push(item);
        }
    }
    (past, upcoming)
}
