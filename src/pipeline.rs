// src/pipeline.rs
//! Sequential fallback over the configured strategies.
//!
//! States: `Pending(i)` -> `Success` | `Pending(i + 1)` | `Exhausted`.
//! Strategies never run concurrently, and nothing carries over between runs.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::StatusConfig;
use crate::error::FetchError;
use crate::outcome::{AttemptRecord, ResolutionOutcome};
use crate::strategy::headers::{self, SharedRng};
use crate::strategy::http::build_client;
use crate::strategy::{Deadline, DynStrategy, HttpStrategy, SourceStrategy};
use crate::validate::is_valid;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("status_attempts_total", "Strategy attempts started.");
        describe_counter!(
            "status_attempt_failures_total",
            "Strategy attempts that failed or returned an invalid shape."
        );
        describe_counter!("status_resolved_total", "Runs resolved by a strategy.");
        describe_counter!("status_exhausted_total", "Runs where every strategy failed.");
        describe_histogram!("status_resolve_ms", "Pipeline wall time in milliseconds.");
    });
}

pub struct Pipeline {
    strategies: Vec<DynStrategy>,
}

impl Pipeline {
    pub fn new(strategies: Vec<DynStrategy>) -> Self {
        Self { strategies }
    }

    pub fn from_config(cfg: &StatusConfig) -> Result<Self> {
        Self::from_config_with_rng(cfg, headers::os_rng())
    }

    /// Builds one `HttpStrategy` per descriptor, sharing a client and RNG.
    pub fn from_config_with_rng(cfg: &StatusConfig, rng: SharedRng) -> Result<Self> {
        cfg.validate()?;
        let client = build_client()?;
        let strategies = cfg
            .strategies
            .iter()
            .map(|d| {
                Arc::new(HttpStrategy::from_descriptor(
                    d,
                    &cfg.target_url,
                    client.clone(),
                    rng.clone(),
                )) as DynStrategy
            })
            .collect();
        Ok(Self::new(strategies))
    }

    pub fn strategies(&self) -> &[DynStrategy] {
        &self.strategies
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self) -> ResolutionOutcome {
        resolve(&self.strategies).await
    }
}

/// One attempt: deadline-bounded fetch followed by the shape check.
async fn attempt(strategy: &dyn SourceStrategy) -> Result<Value, FetchError> {
    let deadline = Deadline::after(strategy.timeout());
    let payload = deadline.enforce(strategy.fetch(&deadline)).await?;
    if is_valid(&payload) {
        Ok(payload)
    } else {
        Err(FetchError::ShapeInvalid)
    }
}

pub async fn resolve(strategies: &[DynStrategy]) -> ResolutionOutcome {
    ensure_metrics_described();
    let start = Instant::now();
    let mut attempts = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        let name = strategy.name().to_string();
        counter!("status_attempts_total", "source" => name.clone()).increment(1);

        match attempt(strategy.as_ref()).await {
            Ok(payload) => {
                let elapsed_ms = elapsed_ms_since(start);
                counter!("status_resolved_total", "source" => name.clone()).increment(1);
                histogram!("status_resolve_ms").record(elapsed_ms as f64);
                info!(source = %name, elapsed_ms, failed_before = attempts.len(), "status resolved");
                return ResolutionOutcome::Success {
                    payload,
                    source_name: name,
                    elapsed_ms,
                };
            }
            Err(e) => {
                warn!(source = %name, kind = e.kind(), error = %e, "status source failed");
                counter!("status_attempt_failures_total", "source" => name.clone()).increment(1);
                attempts.push(AttemptRecord::new(name, e.to_string()));
            }
        }
    }

    let elapsed_ms = elapsed_ms_since(start);
    counter!("status_exhausted_total").increment(1);
    histogram!("status_resolve_ms").record(elapsed_ms as f64);
    warn!(attempts = attempts.len(), elapsed_ms, "all status sources failed");
    ResolutionOutcome::Failure {
        attempts,
        elapsed_ms,
    }
}

fn elapsed_ms_since(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
