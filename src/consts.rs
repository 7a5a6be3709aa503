use std::time::Duration;

pub const SERVICE_NAME: &str = "WhatsApp OTP Service";

/// Domain appended to the phone digits to build a user JID
pub const JID_USER_SERVER: &str = "s.whatsapp.net";

pub const CREDENTIALS_FILE_NAME: &str = "creds.json";

/// Delay before reconnecting after an open connection closed
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Delay before retrying after a connect attempt failed outright
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(10);

pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

pub const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound for one Graph API request, keepalive probes included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const EVENT_CHANNEL_CAPACITY: usize = 16;

pub const STARTUP_NOTIFICATION_TEXT: &str = "OTP service connected and ready to send messages.";

pub const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v22.0";
