//! Domain models for the catalog. `Track` is the persisted record shape and
//! `TrackFields` is the editable subset handed to the store by the form. Both
//! stay plain data holders; the store owns the collection rules and the UI
//! owns presentation.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::errors::CatalogError;

/// One catalog entry. The field names double as the persisted JSON keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque identifier assigned by the store. Never changes after `add`.
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Written as an empty string when absent so the stored array keeps a
    /// uniform shape. Blank, `null` or missing values all read back as `None`.
    #[serde(
        default,
        serialize_with = "genre_as_text",
        deserialize_with = "lenient_genre"
    )]
    pub genre: Option<String>,
    /// Written as `null` when absent. Numeric strings and integral floats are
    /// accepted on read; anything else reads as `None`.
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
}

impl Track {
    /// Build a record from an id and an already normalized field set.
    pub(crate) fn from_fields(id: String, fields: TrackFields) -> Self {
        Self {
            id,
            title: fields.title,
            artist: fields.artist,
            genre: fields.genre,
            year: fields.year,
        }
    }

    /// Overwrite every editable field, keeping the id.
    pub(crate) fn apply(&mut self, fields: TrackFields) {
        self.title = fields.title;
        self.artist = fields.artist;
        self.genre = fields.genre;
        self.year = fields.year;
    }

    /// Snapshot of the editable fields, used to seed the edit form.
    pub fn fields(&self) -> TrackFields {
        TrackFields {
            title: self.title.clone(),
            artist: self.artist.clone(),
            genre: self.genre.clone(),
            year: self.year,
        }
    }

    /// `Title - Artist`, the label used in dialogs and notices.
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }

    /// Case-insensitive substring match over title, artist and genre. The
    /// needle must already be lowercased. Year never participates.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.artist.to_lowercase().contains(needle)
            || self
                .genre
                .as_ref()
                .is_some_and(|genre| genre.to_lowercase().contains(needle))
    }
}

/// Everything about a track except its id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFields {
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
}

impl TrackFields {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            genre: None,
            year: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Trim text values, drop a blank genre, and reject blank required
    /// fields.
    pub fn normalized(self) -> Result<Self, CatalogError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(CatalogError::Validation("Title is required.".into()));
        }
        let artist = self.artist.trim().to_string();
        if artist.is_empty() {
            return Err(CatalogError::Validation("Artist is required.".into()));
        }
        let genre = self
            .genre
            .map(|genre| genre.trim().to_string())
            .filter(|genre| !genre.is_empty());

        Ok(Self {
            title,
            artist,
            genre,
            year: self.year,
        })
    }
}

fn genre_as_text<S>(genre: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(genre.as_deref().unwrap_or(""))
}

fn lenient_genre<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|genre| genre.trim().to_string())
        .filter(|genre| !genre.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Number(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Never fails: a year that cannot be used becomes `None` so the rest of the
/// record survives.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<YearRepr>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(YearRepr::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(raw) => raw,
    };

    let (year, shown) = match raw {
        YearRepr::Number(year) => (i32::try_from(year).ok(), year.to_string()),
        YearRepr::Float(year) => (integral_year(year), year.to_string()),
        YearRepr::Text(text) => {
            let trimmed = text.trim();
            let year = trimmed
                .parse::<i32>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral_year));
            (year, text)
        }
        YearRepr::Other(_) => (None, "non-numeric value".to_string()),
    };

    if year.is_none() {
        warn!(year = %shown, "ignoring unusable year");
    }
    Ok(year)
}

fn integral_year(year: f64) -> Option<i32> {
    let in_range = year >= f64::from(i32::MIN) && year <= f64::from(i32::MAX);
    (year.fract() == 0.0 && in_range).then_some(year as i32)
}
