// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use followup_app::{Record, RecordId, RecordService, ServiceError, UpdatePayload};
use std::cell::{Cell, RefCell};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

pub const STATUSES: [&str; 5] = [
    "Waiting for a response",
    "No response",
    "Indecisive",
    "Available",
    "Unavailable",
];

pub const CATEGORIES: [&str; 4] = [
    "ABSENT_FOR_A_WHILE",
    "FIRST_TIMER",
    "OUTREACH",
    "SECOND_TIMER",
];

const MOCK_RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub fn record(id: &str, name: &str, phone: &str, category: &str, status: &str) -> Record {
    Record {
        id: RecordId::from(id),
        name: name.to_owned(),
        phone: phone.to_owned(),
        assigned_to: "Raissa".to_owned(),
        category: category.to_owned(),
        status: status.to_owned(),
        last_updated: "2026-01-05T14:03:22+00:00".to_owned(),
        notes: String::new(),
    }
}

pub fn sample_records() -> Vec<Record> {
    vec![
        record("1", "Alice Mugisha", "+250 788 100 101", "FIRST_TIMER", "Waiting for a response"),
        record("2", "Bob Habimana", "+250 788 200 202", "OUTREACH", "No response"),
        record("3", "Carine Uwase", "+250 788 300 303", "SECOND_TIMER", "Available"),
        record("4", "David Nkusi", "+250 788 400 404", "ABSENT_FOR_A_WHILE", "Indecisive"),
        record("5", "Esther Ingabire", "+250 788 500 505", "first timer", "available"),
    ]
}

/// JSON array in the records service wire format.
pub fn records_json(records: &[Record]) -> Result<String> {
    serde_json::to_string(records).context("encode records")
}

/// In-memory records service that counts calls. Updates are applied to the
/// held records unless an error is armed.
#[derive(Debug, Default)]
pub struct FakeService {
    pub records: RefCell<Vec<Record>>,
    pub fetch_error: RefCell<Option<ServiceError>>,
    pub update_error: RefCell<Option<ServiceError>>,
    pub fetch_calls: Cell<usize>,
    pub updates: RefCell<Vec<UpdatePayload>>,
}

impl FakeService {
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    pub fn fail_fetch(&self, error: ServiceError) {
        *self.fetch_error.borrow_mut() = Some(error);
    }

    pub fn fail_update(&self, error: ServiceError) {
        *self.update_error.borrow_mut() = Some(error);
    }

    pub fn update_count(&self) -> usize {
        self.updates.borrow().len()
    }
}

impl RecordService for FakeService {
    fn fetch_records(&self) -> Result<Vec<Record>, ServiceError> {
        self.fetch_calls.set(self.fetch_calls.get() + 1);
        if let Some(error) = self.fetch_error.borrow().clone() {
            return Err(error);
        }
        Ok(self.records.borrow().clone())
    }

    fn update_record(&self, payload: &UpdatePayload) -> Result<(), ServiceError> {
        self.updates.borrow_mut().push(payload.clone());
        if let Some(error) = self.update_error.borrow().clone() {
            return Err(error);
        }
        let mut records = self.records.borrow_mut();
        let Some(record) = records.iter_mut().find(|record| record.id == payload.id) else {
            return Err(ServiceError::Server("Record Not Found".to_owned()));
        };
        record.status = payload.status.clone();
        record.notes = payload.notes.clone();
        record.last_updated = "2026-02-01T09:30:00+00:00".to_owned();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

impl CannedResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// Local HTTP server that answers one canned response per request, in order,
/// and records what it received.
pub struct MockServer {
    base_url: String,
    handle: JoinHandle<Vec<CapturedRequest>>,
}

impl MockServer {
    pub fn start(responses: Vec<CannedResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for canned in responses {
                let mut request = match server.recv_timeout(MOCK_RECV_TIMEOUT) {
                    Ok(Some(request)) => request,
                    Ok(None) | Err(_) => break,
                };
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                captured.push(CapturedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    body,
                });

                let mut response =
                    Response::from_string(canned.body).with_status_code(canned.status);
                if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
            captured
        });

        Ok(Self { base_url, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Waits for the server thread and returns the requests it served.
    pub fn finish(self) -> Result<Vec<CapturedRequest>> {
        self.handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))
    }
}
