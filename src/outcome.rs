// src/outcome.rs
//! Terminal result of one pipeline run.

use serde_json::Value;

/// One failed attempt. Created once, never touched again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub source_name: String,
    pub error_message: String,
}

impl AttemptRecord {
    pub fn new(source_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            error_message: error_message.into(),
        }
    }

    /// `"name: message"`, the form used in the 503 body.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.source_name, self.error_message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Success {
        payload: Value,
        source_name: String,
        elapsed_ms: u64,
    },
    Failure {
        attempts: Vec<AttemptRecord>,
        elapsed_ms: u64,
    },
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResolutionOutcome::Success { .. })
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            ResolutionOutcome::Success { elapsed_ms, .. }
            | ResolutionOutcome::Failure { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    pub fn source_name(&self) -> Option<&str> {
        match self {
            ResolutionOutcome::Success { source_name, .. } => Some(source_name),
            ResolutionOutcome::Failure { .. } => None,
        }
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            ResolutionOutcome::Success { .. } => &[],
            ResolutionOutcome::Failure { attempts, .. } => attempts,
        }
    }
}
