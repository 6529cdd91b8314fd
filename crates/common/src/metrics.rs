use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static REGISTRATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "account_api_registrations_total",
        "Total accounts created"
    )
    .expect("register registrations_total")
});

pub static LOGINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "account_api_logins_total",
        "Login attempts by outcome",
        &["outcome"]
    )
    .expect("register logins_total")
});

pub static LOGOUTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "account_api_logouts_total",
        "Total access tokens revoked through logout"
    )
    .expect("register logouts_total")
});

pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    LOGINS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn encode_metrics() -> (StatusCode, String) {
    // touch lazies so the families show up before the first event
    Lazy::force(&REGISTRATIONS_TOTAL);
    Lazy::force(&LOGINS_TOTAL);
    Lazy::force(&LOGOUTS_TOTAL);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
