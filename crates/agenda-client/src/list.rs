//! Projection of cached records into list rows.
//!
//! Rows are hidden, never removed, by filtering so that per-row UI state
//! (the expanded details panel) survives a filter toggle.  Row buttons
//! forward [`RowAction`]s over a channel; the renderer itself never talks to
//! the network.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use agenda_shared::{DisplayStatus, Record, RecordId};

/// User intent raised from a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit(RecordId),
    Delete(RecordId),
}

impl RowAction {
    pub fn record_id(&self) -> RecordId {
        match self {
            RowAction::Edit(id) | RowAction::Delete(id) => *id,
        }
    }
}

/// One rendered list entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Local start / end text, e.g. `01/03/2024 09:00 - 10:00`.
    pub schedule: String,
    pub tags: Vec<String>,
    pub flagged: bool,
    pub participants: usize,
    pub status: DisplayStatus,
    pub visible: bool,
    pub expanded: bool,
}

impl Row {
    fn from_record(record: &Record, id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: record.title.clone(),
            description: record.description.clone().unwrap_or_default(),
            location: record.location.clone(),
            schedule: schedule(record),
            tags: record.tags.clone(),
            flagged: record.flagged,
            participants: record.participants.len(),
            status: record.status_at(now),
            visible: true,
            expanded: false,
        }
    }

    /// Lower-cased concatenation of every text field shown for the row.
    fn search_text(&self) -> String {
        let mut text = [
            self.title.as_str(),
            self.description.as_str(),
            self.location.as_str(),
            self.schedule.as_str(),
            self.status.label(),
        ]
        .join(" ");
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text.to_lowercase()
    }
}

fn schedule(record: &Record) -> String {
    let start = record.start_at.with_timezone(&Local);
    let end = record.end_at.with_timezone(&Local);
    if start.date_naive() == end.date_naive() {
        format!("{} - {}", start.format("%d/%m/%Y %H:%M"), end.format("%H:%M"))
    } else {
        format!(
            "{} - {}",
            start.format("%d/%m/%Y %H:%M"),
            end.format("%d/%m/%Y %H:%M")
        )
    }
}

#[derive(Debug, Default)]
pub struct ListRenderer {
    rows: Vec<Row>,
    term: String,
    status_filter: Option<DisplayStatus>,
    actions: Option<mpsc::UnboundedSender<RowAction>>,
}

impl ListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive the actions raised by row buttons.  A new subscription
    /// replaces the previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<RowAction> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.actions = Some(tx);
        rx
    }

    /// Rebuild the rows from `records`, keeping the expanded state of rows
    /// whose id survives and re-applying the active filters.
    pub fn render(&mut self, records: &[Record], now: DateTime<Utc>) {
        let previous = std::mem::take(&mut self.rows);
        self.rows = records
            .iter()
            .filter_map(|record| {
                let id = record.id?;
                let mut row = Row::from_record(record, id, now);
                row.expanded = previous.iter().any(|p| p.id == id && p.expanded);
                Some(row)
            })
            .collect();
        self.refresh_visibility();
    }

    /// Case-insensitive substring filter over each row's visible text.  An
    /// empty term shows every row.
    pub fn apply_filter(&mut self, term: &str) {
        self.term = term.trim().to_lowercase();
        self.refresh_visibility();
    }

    /// Restrict rows to one status; `None` clears the restriction.
    pub fn filter_status(&mut self, status: Option<DisplayStatus>) {
        self.status_filter = status;
        self.refresh_visibility();
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.visible)
    }

    /// Flip the details panel of a row.  Returns the new state, or `None`
    /// for an unknown id.
    pub fn toggle_expanded(&mut self, id: RecordId) -> Option<bool> {
        let row = self.rows.iter_mut().find(|r| r.id == id)?;
        row.expanded = !row.expanded;
        Some(row.expanded)
    }

    /// A row button was pressed.  Returns whether the action was forwarded.
    pub fn click(&self, action: RowAction) -> bool {
        if !self.rows.iter().any(|r| r.id == action.record_id()) {
            debug!(?action, "Action for a row that is not rendered");
            return false;
        }
        match &self.actions {
            Some(tx) => tx.send(action).is_ok(),
            None => false,
        }
    }

    fn refresh_visibility(&mut self) {
        for row in &mut self.rows {
            let term_ok = self.term.is_empty() || row.search_text().contains(&self.term);
            let status_ok = self.status_filter.map_or(true, |s| row.status == s);
            row.visible = term_ok && status_ok;
        }
    }
}
