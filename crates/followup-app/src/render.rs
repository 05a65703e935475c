// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::filter::{FilterCriteria, filter_records};
use crate::ids::RecordId;
use crate::model::Record;
use crate::store::{Freshness, RecordStore};

pub const COLUMNS: [&str; 9] = [
    "id",
    "Name",
    "Phone",
    "AssignedTo",
    "Category",
    "Status",
    "LastUpdated",
    "Notes",
    "",
];
pub const SELECT_ACTION_LABEL: &str = "Select";
pub const NO_RECORDS_MESSAGE: &str = "No records found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: RecordId,
    /// One entry per [`COLUMNS`] element, the select action last.
    pub cells: [String; 9],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableBody {
    Rows(Vec<RowView>),
    /// Single fallback row spanning every column.
    NoRecords,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub body: TableBody,
    pub shown: usize,
    pub total: usize,
    pub freshness: Freshness,
}

impl Default for TableView {
    fn default() -> Self {
        Self {
            body: TableBody::NoRecords,
            shown: 0,
            total: 0,
            freshness: Freshness::NeverLoaded,
        }
    }
}

impl TableView {
    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            TableBody::Rows(rows) => rows,
            TableBody::NoRecords => &[],
        }
    }

    pub fn title(&self) -> String {
        let mut title = format!("records {}/{}", self.shown, self.total);
        match self.freshness {
            Freshness::Fresh => {}
            Freshness::Stale => title.push_str(" (stale: last refresh failed)"),
            Freshness::NeverLoaded => title.push_str(" (not loaded)"),
        }
        title
    }
}

pub fn render_table(store: &RecordStore, criteria: &FilterCriteria) -> TableView {
    let visible = filter_records(store.records(), criteria);
    let shown = visible.len();
    let body = if visible.is_empty() {
        TableBody::NoRecords
    } else {
        TableBody::Rows(visible.into_iter().map(row_for).collect())
    };
    TableView {
        body,
        shown,
        total: store.len(),
        freshness: store.freshness(),
    }
}

fn row_for(record: &Record) -> RowView {
    RowView {
        id: record.id.clone(),
        cells: [
            record.id.to_string(),
            record.name.clone(),
            record.phone.clone(),
            record.assigned_to.clone(),
            record.category.clone(),
            record.status.clone(),
            format_last_updated(&record.last_updated),
            record.notes.clone(),
            SELECT_ACTION_LABEL.to_owned(),
        ],
    }
}

/// RFC 3339 timestamps render as `YYYY-MM-DD HH:MM`, keeping a non-UTC offset.
/// Anything else passes through untouched.
pub fn format_last_updated(raw: &str) -> String {
    let Ok(parsed) = OffsetDateTime::parse(raw.trim(), &Rfc3339) else {
        return raw.to_owned();
    };
    let formatted = if parsed.offset().is_utc() {
        parsed.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
    } else {
        parsed.format(format_description!(
            "[year]-[month]-[day] [hour]:[minute] [offset_hour sign:mandatory]:[offset_minute]"
        ))
    };
    formatted.unwrap_or_else(|_| raw.to_owned())
}
