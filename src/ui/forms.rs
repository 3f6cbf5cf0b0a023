use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Track, TrackFields};

/// Form state for adding or editing a track.
#[derive(Default, Clone)]
pub(crate) struct TrackForm {
    pub(crate) title: String,
    pub(crate) artist: String,
    pub(crate) genre: String,
    pub(crate) year: String,
    pub(crate) active: TrackField,
    pub(crate) error: Option<String>,
}

/// Fields of the track form, in focus order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum TrackField {
    #[default]
    Title,
    Artist,
    Genre,
    Year,
}

impl TrackField {
    pub(crate) const ALL: [TrackField; 4] = [
        TrackField::Title,
        TrackField::Artist,
        TrackField::Genre,
        TrackField::Year,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            TrackField::Title => "Title",
            TrackField::Artist => "Artist",
            TrackField::Genre => "Genre",
            TrackField::Year => "Year",
        }
    }

    /// Row of the field inside the form popup.
    pub(crate) fn row(self) -> u16 {
        match self {
            TrackField::Title => 0,
            TrackField::Artist => 1,
            TrackField::Genre => 2,
            TrackField::Year => 3,
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            TrackField::Title | TrackField::Artist => "<required>",
            TrackField::Genre | TrackField::Year => "<optional>",
        }
    }

    fn next(self) -> Self {
        match self {
            TrackField::Title => TrackField::Artist,
            TrackField::Artist => TrackField::Genre,
            TrackField::Genre => TrackField::Year,
            TrackField::Year => TrackField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            TrackField::Title => TrackField::Year,
            TrackField::Artist => TrackField::Title,
            TrackField::Genre => TrackField::Artist,
            TrackField::Year => TrackField::Genre,
        }
    }
}

impl TrackForm {
    /// Populate the form from an existing track when entering edit mode.
    pub(crate) fn from_track(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
            genre: track.genre.clone().unwrap_or_default(),
            year: track.year.map(|year| year.to_string()).unwrap_or_default(),
            active: TrackField::Title,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    /// Insert a character into the active field. The year only takes digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            TrackField::Title => self.title.push(ch),
            TrackField::Artist => self.artist.push(ch),
            TrackField::Genre => self.genre.push(ch),
            TrackField::Year => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.year.push(ch);
            }
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Check required fields and turn the raw text into a field set the store
    /// accepts.
    pub(crate) fn parse_inputs(&self) -> Result<TrackFields> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let artist = self.artist.trim();
        if artist.is_empty() {
            return Err(anyhow!("Artist is required."));
        }

        let mut fields = TrackFields::new(title, artist);
        let genre = self.genre.trim();
        if !genre.is_empty() {
            fields = fields.with_genre(genre);
        }
        let year = self.year.trim();
        if !year.is_empty() {
            let year = year
                .parse::<i32>()
                .map_err(|_| anyhow!("Year must be a whole number."))?;
            fields = fields.with_year(year);
        }
        Ok(fields)
    }

    /// Render a single labelled line for the form popup.
    pub(crate) fn build_line(&self, field: TrackField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            field.placeholder().to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Character count of the requested field, for cursor placement.
    pub(crate) fn value_len(&self, field: TrackField) -> usize {
        self.value(field).chars().count()
    }

    fn value(&self, field: TrackField) -> &str {
        match field {
            TrackField::Title => &self.title,
            TrackField::Artist => &self.artist,
            TrackField::Genre => &self.genre,
            TrackField::Year => &self.year,
        }
    }

    fn value_mut(&mut self, field: TrackField) -> &mut String {
        match field {
            TrackField::Title => &mut self.title,
            TrackField::Artist => &mut self.artist,
            TrackField::Genre => &mut self.genre,
            TrackField::Year => &mut self.year,
        }
    }
}

/// State for confirming permanent track deletion.
pub(crate) struct ConfirmTrackDelete {
    pub(crate) track: Track,
}
