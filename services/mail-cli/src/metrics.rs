//! Prometheus rendering for `--metrics`
//!
//! The client emits through the `metrics` facade; this installs the
//! recorder so a run can dump what it did:
//!
//! - `mail_client_requests_total` (counter): label `outcome`
//! - `mail_client_refresh_total` (counter): label `result`
//! - `mail_client_refresh_waiters` (histogram): requests resolved per refresh

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const WAITER_BUCKETS: &[f64] = &[0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0];

fn builder() -> Result<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("mail_client_refresh_waiters".to_string()),
            WAITER_BUCKETS,
        )
        .context("failed to set histogram buckets")
}

/// Install the global recorder and return a handle for rendering.
///
/// Buckets make `mail_client_refresh_waiters` render as a histogram rather
/// than a summary.
pub fn install_recorder() -> Result<PrometheusHandle> {
    builder()?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
