use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const ENV_METRICS_ROUTES: &str = "METRICS_ROUTES";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. The recorder is process-global, so
    /// later calls reuse the first handle.
    pub fn init(strategy_count: usize) -> Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| {
                PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")
            })?
            .clone();

        gauge!("status_strategies_configured").set(strategy_count as f64);

        Ok(Self { handle })
    }

    pub fn enabled_from_env() -> bool {
        std::env::var(ENV_METRICS_ROUTES).ok().as_deref() == Some("1")
    }

    /// `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
