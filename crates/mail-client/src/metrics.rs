//! Client metrics
//!
//! Emitted through the `metrics` facade; the embedding application decides
//! whether and how to export them.
//!
//! - `mail_client_requests_total` (counter): label `outcome`
//! - `mail_client_refresh_total` (counter): label `result`
//! - `mail_client_refresh_waiters` (histogram): requests resolved per refresh

/// Record a finished client call.
pub fn record_request(outcome: &str) {
    metrics::counter!("mail_client_requests_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a finished refresh episode and how many requests it resolved.
pub fn record_refresh(result: &str, waiters: usize) {
    metrics::counter!("mail_client_refresh_total", "result" => result.to_string()).increment(1);
    metrics::histogram!("mail_client_refresh_waiters").record(waiters as f64);
}
