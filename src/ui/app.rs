use std::mem;
use std::time::{Duration, Instant};

use anyhow::Error;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::catalog::CatalogStore;
use crate::db::KeyValueStore;
use crate::errors::CatalogError;
use crate::render::{empty_message, render_rows, Notice, NoticeKind, TrackRow};

use super::forms::{ConfirmTrackDelete, TrackField, TrackForm};
use super::helpers::{
    centered_rect, clamp_selection, notice_style, offset_selection, surface_error,
};

/// Footer space reserved for the notice line and key hints.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the search bar above the table.
const SEARCH_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 5;
const SEARCH_PREFIX: &str = "Search: ";

/// Input modes. Everything except `Normal` and `Searching` draws a popup over
/// the table.
enum Mode {
    Normal,
    Searching,
    AddingTrack(TrackForm),
    EditingTrack { id: String, form: TrackForm },
    ConfirmDelete(ConfirmTrackDelete),
}

/// Central application state: the catalog plus everything needed to draw it.
pub struct App<S: KeyValueStore> {
    catalog: CatalogStore<S>,
    search: String,
    rows: Vec<TrackRow>,
    selected: usize,
    mode: Mode,
    notice: Option<Notice>,
    notice_lifetime: Duration,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(catalog: CatalogStore<S>, notice_lifetime: Duration) -> Self {
        let mut app = Self {
            catalog,
            search: String::new(),
            rows: Vec::new(),
            selected: 0,
            mode: Mode::Normal,
            notice: None,
            notice_lifetime,
        };
        app.refresh_view();
        app
    }

    /// Rows currently visible in the table.
    pub fn rows(&self) -> &[TrackRow] {
        &self.rows
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn catalog(&self) -> &CatalogStore<S> {
        &self.catalog
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching => self.handle_search(code),
            Mode::AddingTrack(form) => self.handle_form(code, None, form),
            Mode::EditingTrack { id, form } => self.handle_form(code, Some(id), form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        exit
    }

    /// Drop the notice once it has been visible long enough.
    pub fn tick(&mut self, now: Instant) {
        if self
            .notice
            .as_ref()
            .is_some_and(|notice| notice.is_expired(now, self.notice_lifetime))
        {
            self.notice = None;
        }
    }

    /// Empty the search bar and show the whole catalog again.
    pub fn clear_search(&mut self) {
        self.search.clear();
        if matches!(self.mode, Mode::Searching) {
            self.mode = Mode::Normal;
        }
        self.refresh_view();
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.rows.len().saturating_sub(1),
            KeyCode::Char('f') | KeyCode::Char('/') => return Mode::Searching,
            KeyCode::Char('+') | KeyCode::Char('a') => {
                return Mode::AddingTrack(TrackForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                match self.current_id().and_then(|id| self.catalog.get(id)) {
                    Some(track) => {
                        return Mode::EditingTrack {
                            id: track.id.clone(),
                            form: TrackForm::from_track(track),
                        };
                    }
                    None => self.set_notice("No track selected to edit.", NoticeKind::Error),
                }
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                match self.current_id().and_then(|id| self.catalog.get(id)) {
                    Some(track) => {
                        return Mode::ConfirmDelete(ConfirmTrackDelete {
                            track: track.clone(),
                        });
                    }
                    None => self.set_notice("No track selected to delete.", NoticeKind::Error),
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    /// Every edit of the query re-filters the table immediately.
    fn handle_search(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_search();
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Backspace => {
                self.search.pop();
                self.refresh_view();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.search.push(ch);
                self.refresh_view();
            }
            _ => {}
        }
        Mode::Searching
    }

    /// Shared key handling for the add and edit forms. `editing` carries the
    /// id of the track being edited.
    fn handle_form(
        &mut self,
        code: KeyCode,
        editing: Option<String>,
        mut form: TrackForm,
    ) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_notice();
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            KeyCode::Enter => match self.save_form(editing.as_deref(), &form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    self.set_notice(message.clone(), NoticeKind::Error);
                    if matches!(
                        err.downcast_ref::<CatalogError>(),
                        Some(CatalogError::NotFound(_))
                    ) {
                        self.refresh_view();
                        return Mode::Normal;
                    }
                    form.error = Some(message);
                }
            },
            _ => {}
        }

        match editing {
            Some(id) => Mode::EditingTrack { id, form },
            None => Mode::AddingTrack(form),
        }
    }

    fn save_form(&mut self, editing: Option<&str>, form: &TrackForm) -> Result<(), Error> {
        let fields = form.parse_inputs()?;
        let (track, text) = match editing {
            Some(id) => (self.catalog.update(id, fields)?, "Track updated."),
            None => (self.catalog.add(fields)?, "Track added."),
        };

        self.refresh_view();
        if let Some(index) = self.rows.iter().position(|row| row.id == track.id) {
            self.selected = index;
        }
        self.set_notice(text, NoticeKind::Success);
        Ok(())
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmTrackDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.clear_notice();
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.catalog.remove(&confirm.track.id) {
                    Ok(_) => self.set_notice("Track deleted.", NoticeKind::Destructive),
                    Err(err) => {
                        warn!(id = %confirm.track.id, error = %err, "delete failed");
                        self.set_notice(surface_error(&err.into()), NoticeKind::Error);
                    }
                }
                self.refresh_view();
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Recompute the visible rows from the catalog and the search term.
    fn refresh_view(&mut self) {
        self.rows = render_rows(&self.catalog.search(&self.search));
        self.selected = clamp_selection(self.selected, self.rows.len());
    }

    fn current_id(&self) -> Option<&str> {
        self.rows.get(self.selected).map(|row| row.id.as_str())
    }

    fn move_selection(&mut self, offset: isize) {
        self.selected = offset_selection(self.selected, offset, self.rows.len());
    }

    fn set_notice<T: Into<String>>(&mut self, text: T, kind: NoticeKind) {
        self.notice = Some(Notice::new(text, kind));
    }

    fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(SEARCH_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_search_bar(frame, chunks[0]);
        self.draw_table(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::AddingTrack(form) => self.draw_track_form(frame, area, "Add Track", form),
            Mode::EditingTrack { form, .. } => {
                self.draw_track_form(frame, area, "Edit Track", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal | Mode::Searching => {}
        }
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect) {
        let searching = matches!(self.mode, Mode::Searching);
        let border_style = if searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title("Search");

        let query = if self.search.is_empty() && !searching {
            Span::styled("press f to filter", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(self.search.clone())
        };
        let paragraph = Paragraph::new(Line::from(vec![Span::raw(SEARCH_PREFIX), query]))
            .block(block.clone());
        frame.render_widget(paragraph, area);

        if searching {
            let inner = block.inner(area);
            let cursor_x =
                inner.x + SEARCH_PREFIX.len() as u16 + self.search.chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Tracks ({}/{})", self.rows.len(), self.catalog.len());
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.rows.is_empty() {
            let message = Paragraph::new(empty_message(self.catalog.len(), &self.search))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(["Title", "Artist", "Genre", "Year"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1);
        let rows = self.rows.iter().map(|row| {
            Row::new([
                row.title.clone(),
                row.artist.clone(),
                row.genre.clone(),
                row.year.clone(),
            ])
        });
        let widths = [
            Constraint::Percentage(35),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let notice_line = match &self.notice {
            Some(notice) => Line::from(Span::styled(
                notice.text.clone(),
                notice_style(notice.kind),
            )),
            None => Line::from(""),
        };

        let paragraph = Paragraph::new(vec![notice_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = match &self.mode {
            Mode::Searching => &[
                ("[Type]", " Filter   "),
                ("[↑↓]", " Select   "),
                ("[Enter]", " Keep   "),
                ("[Esc]", " Clear"),
            ],
            Mode::AddingTrack(_) | Mode::EditingTrack { .. } => &[
                ("[Tab]", " Next Field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Delete   "), ("[n]", " Keep")],
            Mode::Normal => &[
                ("[↑↓]", " Select   "),
                ("[f]", " Search   "),
                ("[Ctrl+L]", " Clear Search   "),
                ("[+]", " Add   "),
                ("[e]", " Edit   "),
                ("[-]", " Delete   "),
                ("[q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = hints
            .iter()
            .flat_map(|(key, label)| [Span::styled(*key, key_style), Span::raw(*label)])
            .collect();
        Line::from(spans)
    }

    fn draw_track_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &TrackForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = TrackField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = format!("{}: ", form.active.label()).len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + form.active.row(),
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmTrackDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Track").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete '{}' permanently?",
                confirm.track.display_title()
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}
