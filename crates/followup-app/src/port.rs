// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::filter::FilterCriteria;
use crate::forms::{EditDraft, UpdatePayload};
use crate::model::{Record, StatusMessage};
use crate::render::TableView;

/// Presentation layer as seen by the dashboard core. Adapters own the actual
/// controls; the core only reads their values and pushes output.
pub trait UiPort {
    fn render(&mut self, view: &TableView);
    fn show_status(&mut self, message: &StatusMessage);
    fn read_filter_criteria(&self) -> FilterCriteria;
    fn reset_filters(&mut self);
    fn read_edit_draft(&self) -> EditDraft;
    fn fill_edit_draft(&mut self, draft: &EditDraft);
}

/// Remote records service.
pub trait RecordService {
    fn fetch_records(&self) -> Result<Vec<Record>, ServiceError>;
    fn update_record(&self, payload: &UpdatePayload) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Error text supplied by the service in the response body.
    #[error("{0}")]
    Server(String),
    #[error("request failed (HTTP {0})")]
    Status(u16),
    #[error("cannot reach {base_url} -- check [service].base_url and that the service is running ({detail})")]
    Unreachable { base_url: String, detail: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Status-line text for a failed update: the server's own message when it
    /// sent one, otherwise a generic line carrying the HTTP code.
    pub fn update_message(&self) -> String {
        match self {
            Self::Server(message) => message.clone(),
            Self::Status(code) => format!("Update failed (HTTP {code})"),
            other => other.to_string(),
        }
    }
}
