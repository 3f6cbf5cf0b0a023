//! Projection from the visible tracks to table rows, plus the transient
//! notices shown after each outcome. Nothing here touches the store.

use std::time::{Duration, Instant};

use crate::models::Track;

/// Placeholder for absent optional values.
pub const MISSING: &str = "N/A";

/// Display-ready cells for one table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub year: String,
}

impl From<&Track> for TrackRow {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            genre: track.genre.clone().unwrap_or_else(|| MISSING.to_string()),
            year: track
                .year
                .filter(|year| *year != 0)
                .map(|year| year.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
        }
    }
}

pub fn render_rows(view: &[&Track]) -> Vec<TrackRow> {
    view.iter().map(|track| TrackRow::from(*track)).collect()
}

/// Text shown in place of the table when no rows are visible.
pub fn empty_message(catalog_len: usize, term: &str) -> &'static str {
    if catalog_len > 0 && !term.trim().is_empty() {
        "No tracks match the current search."
    } else {
        "No tracks to display."
    }
}

/// Category of a notice. Deletions get their own kind so they can be styled
/// apart from ordinary confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Destructive,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    shown_at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant, lifetime: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= lifetime
    }
}
