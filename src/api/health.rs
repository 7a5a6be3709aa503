use crate::{connection::ConnectionHandle, consts, utils};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    /// `"connected"` while a session is live, `"connecting"` otherwise
    pub whatsapp: &'static str,
    pub timestamp: String,
}

pub fn health_report(connection: &ConnectionHandle) -> HealthReport {
    HealthReport {
        status: "ok",
        service: consts::SERVICE_NAME,
        whatsapp: if connection.is_connected() {
            "connected"
        } else {
            "connecting"
        },
        timestamp: utils::iso_timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connection, whatsapp::MockSession};
    use std::sync::Arc;

    fn field_names(report: &HealthReport) -> Vec<String> {
        serde_json::to_value(report)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn test_health_report_follows_connection() {
        let (publisher, handle) = connection::session_channel();

        let before = health_report(&handle);
        assert_eq!(before.status, "ok");
        assert_eq!(before.whatsapp, "connecting");

        publisher.publish(Arc::new(MockSession::new()));
        let after = health_report(&handle);
        assert_eq!(after.whatsapp, "connected");
        assert_eq!(field_names(&before), field_names(&after));

        publisher.clear();
        assert_eq!(health_report(&handle).whatsapp, "connecting");
    }
}
