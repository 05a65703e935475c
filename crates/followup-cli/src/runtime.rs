// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use followup_app::{Record, RecordService, ServiceError, SyncRequest, UpdatePayload};
use followup_client::Client;
use followup_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

/// Runs each dashboard request on its own worker thread so the terminal stays
/// responsive while the records service answers.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl RecordService for HttpRuntime {
    fn fetch_records(&self) -> Result<Vec<Record>, ServiceError> {
        self.client.fetch_records()
    }

    fn update_record(&self, payload: &UpdatePayload) -> Result<(), ServiceError> {
        self.client.update_record(payload)
    }
}

impl followup_tui::AppRuntime for HttpRuntime {
    fn spawn_request(&mut self, request: SyncRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        let request_id = request.request_id();
        thread::Builder::new()
            .name(format!("followup-sync-{request_id}"))
            .spawn(move || {
                let response = request.execute(&client);
                if tx.send(InternalEvent::Sync(response)).is_err() {
                    debug!(request_id, "dashboard closed before response arrived");
                }
            })
            .context("spawn sync worker")?;
        Ok(())
    }
}
