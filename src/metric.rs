use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("otp_bridge_statds")
        .with_description("WhatsApp OTP bridge statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

pub fn incr_connection_statds(event: &str) {
    incr_statds("connection".to_string(), event.into())
}

pub fn incr_send_otp_statds(outcome: &str) {
    incr_statds("send_otp".to_string(), outcome.into())
}
