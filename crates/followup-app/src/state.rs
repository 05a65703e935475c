// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::forms::{EditDraft, UpdatePayload};
use crate::ids::RecordId;
use crate::model::{Record, StatusMessage};
use crate::port::{RecordService, ServiceError, UiPort};
use crate::render::render_table;
use crate::store::RecordStore;

pub const LOAD_FAILED_MESSAGE: &str = "Error loading records. Please try again.";
pub const SELECTION_NOT_FOUND_MESSAGE: &str = "Selected record could not be found in memory.";
pub const UPDATE_SUCCEEDED_MESSAGE: &str = "Record updated successfully.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    Load,
    FilterChanged,
    ClearFilters,
    Select(RecordId),
    Submit,
}

/// Network work the dashboard wants done. The executor runs it against a
/// [`RecordService`] and hands the matching [`SyncResponse`] back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    FetchAll { request_id: u64 },
    Update { request_id: u64, payload: UpdatePayload },
}

impl SyncRequest {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::FetchAll { request_id } | Self::Update { request_id, .. } => *request_id,
        }
    }

    pub fn execute<S: RecordService + ?Sized>(self, service: &S) -> SyncResponse {
        match self {
            Self::FetchAll { request_id } => SyncResponse::Fetched {
                request_id,
                result: service.fetch_records(),
            },
            Self::Update {
                request_id,
                payload,
            } => {
                let result = service.update_record(&payload);
                SyncResponse::Updated {
                    request_id,
                    id: payload.id,
                    result,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResponse {
    Fetched {
        request_id: u64,
        result: Result<Vec<Record>, ServiceError>,
    },
    Updated {
        request_id: u64,
        id: RecordId,
        result: Result<(), ServiceError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {id} is not in the current record set")]
pub struct SelectionNotFound {
    pub id: RecordId,
}

/// Owns the record snapshot, the current selection, and request bookkeeping.
/// Every state change flows through [`DashboardState::dispatch`] (user
/// commands) or [`DashboardState::complete`] (network responses).
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    store: RecordStore,
    selection: Option<RecordId>,
    status: Option<StatusMessage>,
    next_request_id: u64,
    latest_fetch: Option<u64>,
}

impl DashboardState {
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn selection(&self) -> Option<&RecordId> {
        self.selection.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn dispatch<U: UiPort + ?Sized>(
        &mut self,
        command: DashboardCommand,
        ui: &mut U,
    ) -> Vec<SyncRequest> {
        match command {
            DashboardCommand::Load => {
                self.set_status(ui, StatusMessage::neutral("Loading records..."));
                vec![self.begin_fetch()]
            }
            DashboardCommand::FilterChanged => {
                self.refresh_view(ui);
                Vec::new()
            }
            DashboardCommand::ClearFilters => {
                ui.reset_filters();
                self.refresh_view(ui);
                Vec::new()
            }
            DashboardCommand::Select(id) => {
                let _ = self.select(&id, ui);
                Vec::new()
            }
            DashboardCommand::Submit => self.submit(ui).into_iter().collect(),
        }
    }

    pub fn complete<U: UiPort + ?Sized>(
        &mut self,
        response: SyncResponse,
        ui: &mut U,
    ) -> Vec<SyncRequest> {
        match response {
            SyncResponse::Fetched { request_id, result } => {
                if self.latest_fetch.is_some_and(|latest| request_id < latest) {
                    debug!(request_id, "dropping superseded fetch response");
                    return Vec::new();
                }
                match result {
                    Ok(records) => self.apply_records(records, ui),
                    Err(error) => {
                        warn!(request_id, %error, "loading records failed");
                        self.store.mark_stale();
                        self.set_status(ui, StatusMessage::error(LOAD_FAILED_MESSAGE));
                        self.refresh_view(ui);
                    }
                }
                Vec::new()
            }
            SyncResponse::Updated {
                request_id,
                id,
                result,
            } => match result {
                Ok(()) => {
                    info!(request_id, record = %id, "record updated");
                    self.set_status(ui, StatusMessage::success(UPDATE_SUCCEEDED_MESSAGE));
                    vec![self.begin_fetch()]
                }
                Err(error) => {
                    warn!(request_id, record = %id, %error, "record update failed");
                    self.set_status(ui, StatusMessage::error(error.update_message()));
                    Vec::new()
                }
            },
        }
    }

    /// Makes `id` the selection and seeds the edit form from its record. An
    /// unknown id leaves the previous selection and form untouched.
    pub fn select<U: UiPort + ?Sized>(
        &mut self,
        id: &RecordId,
        ui: &mut U,
    ) -> Result<EditDraft, SelectionNotFound> {
        let Some(record) = self.store.find(id) else {
            self.set_status(ui, StatusMessage::error(SELECTION_NOT_FOUND_MESSAGE));
            return Err(SelectionNotFound { id: id.clone() });
        };
        let draft = EditDraft::for_record(record);
        self.selection = Some(id.clone());
        ui.fill_edit_draft(&draft);
        self.set_status(
            ui,
            StatusMessage::success(format!("Selected record {id} for update.")),
        );
        Ok(draft)
    }

    pub fn refresh_view<U: UiPort + ?Sized>(&self, ui: &mut U) {
        let criteria = ui.read_filter_criteria();
        ui.render(&render_table(&self.store, &criteria));
    }

    /// Runs `command` to completion on the calling thread, executing every
    /// request it spawns (including follow-up fetches) in order.
    pub fn run<S, U>(&mut self, command: DashboardCommand, service: &S, ui: &mut U)
    where
        S: RecordService + ?Sized,
        U: UiPort + ?Sized,
    {
        let mut queue: VecDeque<SyncRequest> = self.dispatch(command, ui).into();
        while let Some(request) = queue.pop_front() {
            let response = request.execute(service);
            queue.extend(self.complete(response, ui));
        }
    }

    fn submit<U: UiPort + ?Sized>(&mut self, ui: &mut U) -> Option<SyncRequest> {
        let mut draft = ui.read_edit_draft();
        draft.selected_id = self.selection.clone();
        let payload = match draft.validate() {
            Ok(payload) => payload,
            Err(error) => {
                self.set_status(ui, StatusMessage::error(error.to_string()));
                return None;
            }
        };
        self.set_status(
            ui,
            StatusMessage::neutral(format!("Updating record {}...", payload.id)),
        );
        let request_id = self.next_request_id();
        debug!(request_id, record = %payload.id, "issuing update");
        Some(SyncRequest::Update {
            request_id,
            payload,
        })
    }

    fn begin_fetch(&mut self) -> SyncRequest {
        let request_id = self.next_request_id();
        self.latest_fetch = Some(request_id);
        debug!(request_id, "issuing fetch");
        SyncRequest::FetchAll { request_id }
    }

    fn apply_records<U: UiPort + ?Sized>(&mut self, records: Vec<Record>, ui: &mut U) {
        let count = records.len();
        self.store.replace(records);
        info!(count, "records loaded");

        let mut message = format!("Loaded {count} records.");
        if let Some(id) = self.selection.clone() {
            match self.store.find(&id) {
                Some(record) => ui.fill_edit_draft(&EditDraft::for_record(record)),
                None => {
                    self.selection = None;
                    ui.fill_edit_draft(&EditDraft::default());
                    message.push_str(&format!(" Record {id} is no longer available."));
                }
            }
        }
        self.refresh_view(ui);
        self.set_status(ui, StatusMessage::success(message));
    }

    fn set_status<U: UiPort + ?Sized>(&mut self, ui: &mut U, message: StatusMessage) {
        ui.show_status(&message);
        self.status = Some(message);
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.next_request_id
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DashboardCommand, DashboardState, LOAD_FAILED_MESSAGE, SELECTION_NOT_FOUND_MESSAGE,
        SyncRequest, SyncResponse, UPDATE_SUCCEEDED_MESSAGE,
    };
    use crate::{
        EditDraft, FilterCriteria, Record, RecordId, RecordService, ServiceError, StatusKind,
        StatusMessage, TableBody, TableView, UiPort, UpdatePayload,
    };
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Default)]
    struct FakeService {
        records: RefCell<Vec<Record>>,
        fetch_error: RefCell<Option<ServiceError>>,
        update_error: RefCell<Option<ServiceError>>,
        fetch_calls: Cell<usize>,
        updates: RefCell<Vec<UpdatePayload>>,
    }

    impl RecordService for FakeService {
        fn fetch_records(&self) -> Result<Vec<Record>, ServiceError> {
            self.fetch_calls.set(self.fetch_calls.get() + 1);
            match self.fetch_error.borrow().clone() {
                Some(error) => Err(error),
                None => Ok(self.records.borrow().clone()),
            }
        }

        fn update_record(&self, payload: &UpdatePayload) -> Result<(), ServiceError> {
            self.updates.borrow_mut().push(payload.clone());
            if let Some(error) = self.update_error.borrow().clone() {
                return Err(error);
            }
            for record in self.records.borrow_mut().iter_mut() {
                if record.id == payload.id {
                    record.status = payload.status.clone();
                    record.notes = payload.notes.clone();
                    record.last_updated = "2026-02-01T09:00:00+00:00".to_owned();
                }
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct RecordingUi {
        search: String,
        status_filter: Option<String>,
        category_filter: Option<String>,
        draft: EditDraft,
        view: Option<TableView>,
        statuses: Vec<StatusMessage>,
    }

    impl RecordingUi {
        fn last_status(&self) -> &StatusMessage {
            self.statuses.last().expect("a status should have been shown")
        }

        fn shown_ids(&self) -> Vec<String> {
            self.view
                .as_ref()
                .map(|view| view.rows().iter().map(|row| row.id.to_string()).collect())
                .unwrap_or_default()
        }
    }

    impl UiPort for RecordingUi {
        fn render(&mut self, view: &TableView) {
            self.view = Some(view.clone());
        }

        fn show_status(&mut self, message: &StatusMessage) {
            self.statuses.push(message.clone());
        }

        fn read_filter_criteria(&self) -> FilterCriteria {
            FilterCriteria::from_inputs(
                &self.search,
                self.status_filter.as_deref(),
                self.category_filter.as_deref(),
            )
        }

        fn reset_filters(&mut self) {
            self.search.clear();
            self.status_filter = None;
            self.category_filter = None;
        }

        fn read_edit_draft(&self) -> EditDraft {
            self.draft.clone()
        }

        fn fill_edit_draft(&mut self, draft: &EditDraft) {
            self.draft = draft.clone();
        }
    }

    fn record(id: &str, name: &str, status: &str) -> Record {
        Record {
            id: RecordId::from(id),
            name: name.to_owned(),
            status: status.to_owned(),
            notes: format!("notes for {name}"),
            ..Record::default()
        }
    }

    fn service_with_two() -> FakeService {
        FakeService {
            records: RefCell::new(vec![
                record("1", "Alice", "Open"),
                record("2", "Bob", "Closed"),
            ]),
            ..FakeService::default()
        }
    }

    fn loaded(service: &FakeService, ui: &mut RecordingUi) -> DashboardState {
        let mut state = DashboardState::default();
        state.run(DashboardCommand::Load, service, ui);
        state
    }

    #[test]
    fn load_replaces_store_and_renders() {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let state = loaded(&service, &mut ui);

        assert_eq!(state.store().len(), 2);
        assert_eq!(ui.shown_ids(), vec!["1", "2"]);
        assert_eq!(ui.statuses[0], StatusMessage::neutral("Loading records..."));
        assert_eq!(*ui.last_status(), StatusMessage::success("Loaded 2 records."));
    }

    #[test]
    fn failed_load_keeps_previous_records() {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);

        *service.fetch_error.borrow_mut() = Some(ServiceError::Status(500));
        state.run(DashboardCommand::Load, &service, &mut ui);

        assert_eq!(state.store().len(), 2);
        assert_eq!(*ui.last_status(), StatusMessage::error(LOAD_FAILED_MESSAGE));
        let view = ui.view.as_ref().expect("view rendered");
        assert!(view.title().contains("stale"));
    }

    #[test]
    fn first_load_failure_leaves_empty_set() {
        let service = FakeService::default();
        *service.fetch_error.borrow_mut() = Some(ServiceError::Malformed("eof".to_owned()));
        let mut ui = RecordingUi::default();
        let state = loaded(&service, &mut ui);

        assert!(state.store().is_empty());
        assert_eq!(ui.last_status().kind, StatusKind::Error);
        assert_eq!(
            ui.view.as_ref().map(|view| view.body.clone()),
            Some(TableBody::NoRecords)
        );
    }

    #[test]
    fn filter_change_rerenders_without_network() {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);

        ui.search = "BOB".to_owned();
        let requests = state.dispatch(DashboardCommand::FilterChanged, &mut ui);
        assert!(requests.is_empty());
        assert_eq!(ui.shown_ids(), vec!["2"]);

        let requests = state.dispatch(DashboardCommand::ClearFilters, &mut ui);
        assert!(requests.is_empty());
        assert_eq!(ui.search, "");
        assert_eq!(ui.shown_ids(), vec!["1", "2"]);
        assert_eq!(service.fetch_calls.get(), 1);
    }

    #[test]
    fn select_seeds_draft() -> Result<(), Box<dyn std::error::Error>> {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);

        let draft = state.select(&RecordId::from("2"), &mut ui)?;
        assert_eq!(draft.status, "Closed");
        assert_eq!(ui.draft, draft);
        assert_eq!(state.selection(), Some(&RecordId::from("2")));
        assert_eq!(
            *ui.last_status(),
            StatusMessage::success("Selected record 2 for update.")
        );
        Ok(())
    }

    #[test]
    fn unknown_selection_preserves_previous_state() -> Result<(), Box<dyn std::error::Error>> {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);
        state.select(&RecordId::from("1"), &mut ui)?;
        ui.draft.notes = "typed but unsaved".to_owned();

        let result = state.select(&RecordId::from("99"), &mut ui);
        assert!(result.is_err());
        assert_eq!(state.selection(), Some(&RecordId::from("1")));
        assert_eq!(ui.draft.notes, "typed but unsaved");
        assert_eq!(
            *ui.last_status(),
            StatusMessage::error(SELECTION_NOT_FOUND_MESSAGE)
        );
        Ok(())
    }

    #[test]
    fn submit_without_selection_never_hits_network() {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);
        ui.draft.status = "Closed".to_owned();

        state.run(DashboardCommand::Submit, &service, &mut ui);
        assert!(service.updates.borrow().is_empty());
        assert_eq!(service.fetch_calls.get(), 1);
        assert_eq!(ui.last_status().kind, StatusKind::Error);
        assert!(ui.last_status().text.contains("no record selected"));
    }

    #[test]
    fn submit_validation_errors_are_reported() -> Result<(), Box<dyn std::error::Error>> {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);
        state.select(&RecordId::from("1"), &mut ui)?;

        ui.draft.status.clear();
        state.run(DashboardCommand::Submit, &service, &mut ui);
        assert!(ui.last_status().text.contains("status is required"));

        ui.draft.status = "Available".to_owned();
        ui.draft.notes = "n".repeat(501);
        state.run(DashboardCommand::Submit, &service, &mut ui);
        assert!(ui.last_status().text.contains("notes are too long"));
        assert!(service.updates.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn successful_update_refetches_exactly_once() -> Result<(), Box<dyn std::error::Error>> {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);
        state.select(&RecordId::from("1"), &mut ui)?;
        assert_eq!(service.fetch_calls.get(), 1);

        ui.draft.status = "Available".to_owned();
        ui.draft.notes = "ok".to_owned();
        state.run(DashboardCommand::Submit, &service, &mut ui);

        assert_eq!(service.fetch_calls.get(), 2);
        assert_eq!(
            *service.updates.borrow(),
            vec![UpdatePayload {
                id: RecordId::from("1"),
                status: "Available".to_owned(),
                notes: "ok".to_owned(),
            }]
        );
        assert!(
            ui.statuses
                .contains(&StatusMessage::success(UPDATE_SUCCEEDED_MESSAGE))
        );
        let refreshed = state
            .store()
            .find(&RecordId::from("1"))
            .expect("record still present");
        assert_eq!(refreshed.last_updated, "2026-02-01T09:00:00+00:00");
        assert_eq!(ui.draft.status, "Available");
        Ok(())
    }

    #[test]
    fn failed_update_reports_server_message_verbatim() -> Result<(), Box<dyn std::error::Error>> {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);
        state.select(&RecordId::from("2"), &mut ui)?;
        let records_before = state.store().records().to_vec();
        let generation_before = state.store().generation();

        *service.update_error.borrow_mut() =
            Some(ServiceError::Server("Invalid status".to_owned()));
        ui.draft.status = "Bogus".to_owned();
        state.run(DashboardCommand::Submit, &service, &mut ui);

        assert_eq!(*ui.last_status(), StatusMessage::error("Invalid status"));
        assert_eq!(state.store().records(), records_before.as_slice());
        assert_eq!(state.store().generation(), generation_before);
        assert_eq!(state.selection(), Some(&RecordId::from("2")));
        assert_eq!(service.fetch_calls.get(), 1);
        Ok(())
    }

    #[test]
    fn superseded_fetch_response_is_dropped() {
        let mut state = DashboardState::default();
        let mut ui = RecordingUi::default();

        let first = state.dispatch(DashboardCommand::Load, &mut ui);
        let second = state.dispatch(DashboardCommand::Load, &mut ui);
        let (Some(SyncRequest::FetchAll { request_id: old }), Some(newer)) =
            (first.first(), second.first())
        else {
            panic!("expected fetch requests");
        };
        assert!(newer.request_id() > *old);

        state.complete(
            SyncResponse::Fetched {
                request_id: newer.request_id(),
                result: Ok(vec![record("1", "Fresh", "Open")]),
            },
            &mut ui,
        );
        state.complete(
            SyncResponse::Fetched {
                request_id: *old,
                result: Ok(vec![record("1", "Old", "Open"), record("2", "Gone", "")]),
            },
            &mut ui,
        );

        assert_eq!(state.store().len(), 1);
        assert_eq!(state.store().records()[0].name, "Fresh");
    }

    #[test]
    fn stale_load_arriving_after_update_refetch_is_dropped()
    -> Result<(), Box<dyn std::error::Error>> {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);
        state.select(&RecordId::from("1"), &mut ui)?;

        let in_flight = state.dispatch(DashboardCommand::Load, &mut ui);
        let Some(stale_fetch) = in_flight.into_iter().next() else {
            panic!("expected a fetch request");
        };
        let stale_response = stale_fetch.execute(&service);

        ui.draft.status = "Available".to_owned();
        ui.draft.notes = "call after 5pm".to_owned();
        let update = state.dispatch(DashboardCommand::Submit, &mut ui);
        assert_eq!(update.len(), 1);

        let mut follow_up = Vec::new();
        for request in update {
            follow_up.extend(state.complete(request.execute(&service), &mut ui));
        }
        assert_eq!(follow_up.len(), 1);
        for request in follow_up {
            assert!(state.complete(request.execute(&service), &mut ui).is_empty());
        }

        assert!(state.complete(stale_response, &mut ui).is_empty());

        let record = state
            .store()
            .find(&RecordId::from("1"))
            .expect("record still present");
        assert_eq!(record.status, "Available");
        assert_eq!(record.notes, "call after 5pm");
        assert_eq!(ui.draft.status, "Available");
        assert_eq!(
            state.status(),
            Some(&StatusMessage::success("Loaded 2 records."))
        );
        assert_eq!(service.fetch_calls.get(), 3);
        Ok(())
    }

    #[test]
    fn refresh_clears_selection_that_vanished() -> Result<(), Box<dyn std::error::Error>> {
        let service = service_with_two();
        let mut ui = RecordingUi::default();
        let mut state = loaded(&service, &mut ui);
        state.select(&RecordId::from("2"), &mut ui)?;

        service.records.borrow_mut().retain(|record| record.id.as_str() != "2");
        state.run(DashboardCommand::Load, &service, &mut ui);

        assert_eq!(state.selection(), None);
        assert_eq!(ui.draft, EditDraft::default());
        assert!(ui.last_status().text.contains("Record 2 is no longer available"));
        Ok(())
    }

    #[test]
    fn status_filter_uses_normalized_dropdown_value() {
        let service = FakeService {
            records: RefCell::new(vec![
                record("1", "Alice", "OPEN"),
                record("2", "Bob", "Closed"),
            ]),
            ..FakeService::default()
        };
        let mut ui = RecordingUi {
            status_filter: Some("Open".to_owned()),
            ..RecordingUi::default()
        };
        let _state = loaded(&service, &mut ui);
        assert_eq!(ui.shown_ids(), vec!["1"]);
    }
}
