// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;
use thiserror::Error;

use crate::ids::RecordId;
use crate::model::Record;

pub const NOTES_MAX_CHARS: usize = 500;

/// Working copy of the edit form. Lives in the presentation layer's fields
/// and is overwritten on every selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditDraft {
    pub selected_id: Option<RecordId>,
    pub status: String,
    pub notes: String,
}

impl EditDraft {
    pub fn for_record(record: &Record) -> Self {
        Self {
            selected_id: Some(record.id.clone()),
            status: record.status.clone(),
            notes: record.notes.clone(),
        }
    }

    pub fn notes_len(&self) -> usize {
        self.notes.chars().count()
    }

    pub fn validate(&self) -> Result<UpdatePayload, ValidationError> {
        let id = match &self.selected_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => return Err(ValidationError::MissingSelection),
        };
        if self.status.trim().is_empty() {
            return Err(ValidationError::MissingStatus);
        }
        let notes_len = self.notes_len();
        if notes_len > NOTES_MAX_CHARS {
            return Err(ValidationError::NotesTooLong { len: notes_len });
        }
        Ok(UpdatePayload {
            id,
            status: self.status.clone(),
            notes: self.notes.clone(),
        })
    }
}

/// Validated update for one record. Serializes to the `PUT` body, which
/// carries only `status` and `notes`; the id travels in the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    #[serde(skip)]
    pub id: RecordId,
    pub status: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no record selected -- select a record from the table first")]
    MissingSelection,
    #[error("status is required -- choose a new status")]
    MissingStatus,
    #[error("notes are too long ({len} characters, max 500)")]
    NotesTooLong { len: usize },
}
