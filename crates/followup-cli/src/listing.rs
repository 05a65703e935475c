// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use followup_app::{
    COLUMNS, DashboardCommand, DashboardState, EditDraft, FilterCriteria, Freshness,
    LOAD_FAILED_MESSAGE, NO_RECORDS_MESSAGE, RecordService, StatusMessage, TableBody, TableView,
    UiPort,
};
use std::io::{self, Write};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub search: String,
    pub status: Option<String>,
    pub category: Option<String>,
}

/// Non-interactive presentation: fixed filters, no edit form.
#[derive(Debug, Default)]
struct PlainUi {
    criteria: FilterCriteria,
    view: TableView,
}

impl UiPort for PlainUi {
    fn render(&mut self, view: &TableView) {
        self.view = view.clone();
    }

    fn show_status(&mut self, message: &StatusMessage) {
        debug!(kind = message.kind.as_str(), text = %message.text, "status");
    }

    fn read_filter_criteria(&self) -> FilterCriteria {
        self.criteria.clone()
    }

    fn reset_filters(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    fn read_edit_draft(&self) -> EditDraft {
        EditDraft::default()
    }

    fn fill_edit_draft(&mut self, _draft: &EditDraft) {}
}

/// Loads once and prints the filtered table as tab-separated text.
pub fn list<S, W>(service: &S, filters: &ListFilters, out: &mut W) -> Result<()>
where
    S: RecordService + ?Sized,
    W: Write,
{
    let mut ui = PlainUi {
        criteria: FilterCriteria::from_inputs(
            &filters.search,
            filters.status.as_deref(),
            filters.category.as_deref(),
        ),
        ..PlainUi::default()
    };
    let mut dashboard = DashboardState::default();
    dashboard.run(DashboardCommand::Load, service, &mut ui);

    if dashboard.store().freshness() != Freshness::Fresh {
        let message = dashboard
            .status()
            .map_or(LOAD_FAILED_MESSAGE, |status| status.text.as_str());
        bail!("{message} -- check [service].base_url and the log file for details");
    }

    write_table(out, &ui.view).context("write records")
}

pub fn check<S, W>(service: &S, base_url: &str, out: &mut W) -> Result<()>
where
    S: RecordService + ?Sized,
    W: Write,
{
    let records = service
        .fetch_records()
        .with_context(|| format!("load records from {base_url}"))?;
    writeln!(out, "ok: {} records from {base_url}", records.len()).context("write report")?;
    Ok(())
}

fn write_table<W: Write>(out: &mut W, view: &TableView) -> io::Result<()> {
    let TableBody::Rows(rows) = &view.body else {
        return writeln!(out, "{NO_RECORDS_MESSAGE}");
    };

    // The trailing action column has no meaning outside the terminal.
    let data_columns = COLUMNS.len() - 1;
    writeln!(out, "{}", COLUMNS[..data_columns].join("\t"))?;
    for row in rows {
        let cells = row.cells[..data_columns]
            .iter()
            .map(|cell| cell.replace(['\t', '\n', '\r'], " "))
            .collect::<Vec<_>>();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}
