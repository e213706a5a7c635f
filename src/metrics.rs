use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true) // Enabled by default
    })
}

/// Install the Prometheus recorder and spawn its upkeep task.
///
/// Returns `Ok(None)` when observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router serving the Prometheus scrape endpoint
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics helpers

pub fn track_class_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("classes_created_total").increment(1);
}

pub fn track_class_deactivated(purged_members: u64) {
    if !is_observability_enabled() {
        return;
    }
    counter!("classes_deactivated_total").increment(1);
    counter!("members_purged_total").increment(purged_members);
}

pub fn track_member_joined() {
    if !is_observability_enabled() {
        return;
    }
    counter!("members_joined_total").increment(1);
}

pub fn track_member_left(removed_by_other: bool) {
    if !is_observability_enabled() {
        return;
    }
    let kind = if removed_by_other { "removed" } else { "left" };
    counter!("members_left_total", "kind" => kind).increment(1);
}

pub fn track_role_changed(role: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("member_role_changes_total", "role" => role).increment(1);
}

pub fn track_ownership_handoff() {
    if !is_observability_enabled() {
        return;
    }
    counter!("ownership_handoffs_total").increment(1);
}

/// Track authorization denials by action and reason
pub fn track_authorization_denied(action: &'static str, reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("authorization_denials_total", "action" => action, "reason" => reason).increment(1);
}

/// Track transactions that were rolled back, including deadline expiry
pub fn track_transaction_rollback(operation: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("transactions_rolled_back_total", "operation" => operation).increment(1);
}
