// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use followup_app::{Record, RecordId, RecordService, ServiceError, UpdatePayload};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const RECORDS_PATH: &str = "api/records";

/// Blocking client for the follow-up records service. Cheap to clone; clones
/// share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    records_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("service.base_url must not be empty");
        }

        let records_url = Url::parse(&format!("{base_url}/{RECORDS_PATH}"))
            .with_context(|| format!("service.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(records_url.scheme(), "http" | "https") {
            bail!(
                "service.base_url {base_url:?} must use http or https, got {:?}",
                records_url.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            records_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn records_url(&self) -> &Url {
        &self.records_url
    }

    /// `{base}/api/records/{id}` with the id escaped as a single path segment.
    pub fn record_url(&self, id: &RecordId) -> Url {
        let mut url = self.records_url.clone();
        // http(s) URLs always have path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id.as_str());
        }
        url
    }

    pub fn list_records(&self) -> Result<Vec<Record>, ServiceError> {
        debug!(url = %self.records_url, "GET records");
        let response = self
            .http
            .get(self.records_url.clone())
            .send()
            .map_err(|error| self.connection_error(error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let body = response
            .text()
            .map_err(|error| ServiceError::Malformed(format!("read records body: {error}")))?;
        decode_records(&body)
    }

    pub fn put_record(&self, payload: &UpdatePayload) -> Result<(), ServiceError> {
        let url = self.record_url(&payload.id);
        debug!(url = %url, "PUT record");
        let response = self
            .http
            .put(url)
            .json(payload)
            .send()
            .map_err(|error| self.connection_error(error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }

    fn connection_error(&self, error: reqwest::Error) -> ServiceError {
        let detail = if error.is_timeout() {
            format!("timed out after {:?}", self.timeout)
        } else {
            error.to_string()
        };
        warn!(base_url = %self.base_url, %detail, "records service unreachable");
        ServiceError::Unreachable {
            base_url: self.base_url.clone(),
            detail,
        }
    }
}

impl RecordService for Client {
    fn fetch_records(&self) -> Result<Vec<Record>, ServiceError> {
        self.list_records()
    }

    fn update_record(&self, payload: &UpdatePayload) -> Result<(), ServiceError> {
        self.put_record(payload)
    }
}

/// Decodes a records payload. Invalid JSON is an error; valid JSON that is
/// not an array is an empty collection, and non-object entries are skipped.
pub fn decode_records(body: &str) -> Result<Vec<Record>, ServiceError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|error| ServiceError::Malformed(format!("decode records: {error}")))?;

    let serde_json::Value::Array(items) = value else {
        warn!("records payload is not an array; treating it as empty");
        return Ok(Vec::new());
    };

    let total = items.len();
    let records = items
        .into_iter()
        .filter(serde_json::Value::is_object)
        .filter_map(|item| serde_json::from_value::<Record>(item).ok())
        .collect::<Vec<_>>();
    if records.len() != total {
        debug!(skipped = total - records.len(), "skipped non-record entries");
    }
    Ok(records)
}

fn clean_error_response(status: StatusCode, body: &str) -> ServiceError {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message()
    {
        return ServiceError::Server(message);
    }
    ServiceError::Status(status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<serde_json::Value>,
    #[serde(rename = "Error")]
    error_title_case: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    fn message(self) -> Option<String> {
        [self.error, self.error_title_case]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                serde_json::Value::String(text) if !text.is_empty() => Some(text),
                _ => None,
            })
    }
}
