// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod pipeline;
pub mod response;
pub mod strategy;
pub mod validate;

pub use crate::api::{router, AppState};
pub use crate::error::FetchError;
pub use crate::outcome::{AttemptRecord, ResolutionOutcome};
pub use crate::pipeline::Pipeline;
pub use crate::strategy::{Deadline, DynStrategy, SourceStrategy};

use crate::metrics::Metrics;
use tracing::info;

/// Router built from `config::load_default()`; `/metrics` is merged in when
/// `METRICS_ROUTES=1`. Used by the Shuttle entrypoint and by tests.
pub async fn app() -> anyhow::Result<axum::Router> {
    let cfg = config::load_default()?;
    info!(
        target_url = %cfg.target_url,
        strategies = ?cfg.strategy_names(),
        "status config loaded"
    );
    let state = AppState::from_config(&cfg)?;
    let mut app = router(state);

    if Metrics::enabled_from_env() {
        let metrics = Metrics::init(cfg.strategies.len())?;
        app = app.merge(metrics.router());
    }

    Ok(app)
}
