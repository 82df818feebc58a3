// src/response.rs
//! Maps a pipeline outcome onto the JSON envelope the widget consumes.

use axum::http::StatusCode;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::outcome::ResolutionOutcome;

pub const ALL_FAILED: &str = "All fetch methods failed";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SuccessBody {
    pub success: bool,
    pub timestamp: String,
    pub data: Value,
    pub source: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
    pub attempts: Vec<String>,
    pub elapsed_ms: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StatusBody {
    Success(SuccessBody),
    Failure(FailureBody),
}

/// `2024-05-01T12:00:00.000Z`
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn format(outcome: ResolutionOutcome, now: DateTime<Utc>) -> (StatusCode, StatusBody) {
    let timestamp = iso_timestamp(now);
    match outcome {
        ResolutionOutcome::Success {
            payload,
            source_name,
            elapsed_ms,
        } => (
            StatusCode::OK,
            StatusBody::Success(SuccessBody {
                success: true,
                timestamp,
                data: payload,
                source: source_name,
                elapsed_ms,
            }),
        ),
        ResolutionOutcome::Failure {
            attempts,
            elapsed_ms,
        } => (
            StatusCode::SERVICE_UNAVAILABLE,
            StatusBody::Failure(FailureBody {
                success: false,
                error: ALL_FAILED.to_string(),
                attempts: attempts.iter().map(|a| a.summary()).collect(),
                elapsed_ms,
                timestamp,
            }),
        ),
    }
}
