use ntex::web;

/// Configures the public gateway routes.
///
/// # Routes
/// - `GET /` - Health check with the WhatsApp connection state
/// - `POST /send-otp` - Sends an OTP text message
pub fn gateway(cfg: &mut web::ServiceConfig) {
    cfg.service((super::server::index, super::otp::send_otp));
}
