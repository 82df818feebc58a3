// src/strategy/mod.rs
pub mod headers;
pub mod http;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::FetchError;

pub use headers::HeaderMode;
pub use http::{Envelope, HttpStrategy};

/// One named way of retrieving the status payload.
#[async_trait]
pub trait SourceStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn timeout(&self) -> Duration;
    /// Exactly one outbound call, no internal retries.
    async fn fetch(&self, deadline: &Deadline) -> Result<Value, FetchError>;
}

pub type DynStrategy = Arc<dyn SourceStrategy>;

/// Per-attempt deadline handed to a strategy and enforced around its call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Runs `fut` until it settles or the deadline passes. On expiry the
    /// future is dropped, which cancels any in-flight request; the timer is
    /// owned by the returned future and released on every path.
    pub async fn enforce<F, T>(&self, fut: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(res) => res,
            Err(_elapsed) => Err(FetchError::Timeout),
        }
    }
}
