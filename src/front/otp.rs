//! OTP delivery endpoint

use crate::{
    api, metric, utils,
    front::{AppState, errors},
};
use ntex::{util::Bytes, web};
use serde_json::json;

/// Sends an OTP message to a WhatsApp number (POST)
///
/// # Request Body
/// `{"number": "+1 (555) 123-4567", "message": "Your code is 1234"}`
///
/// # Returns
/// - 200 with the normalized number when WhatsApp accepted the message
/// - 400 if a field is missing or the recipient was rejected
/// - 401 if the WhatsApp session is no longer authorized
/// - 503 while no WhatsApp session is open
/// - 500 for any other send failure
#[web::post("/send-otp")]
pub async fn send_otp(
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let request = api::otp::parse_otp_request(&body).map_err(|received| {
        metric::incr_send_otp_statds("invalid_request");
        errors::GatewayError::MissingFields { received }
    })?;

    let delivery = api::otp::send_otp(&app_state.connection, &request)
        .await
        .map_err(|e| {
            metric::incr_send_otp_statds("failed");
            errors::GatewayError::from(e)
        })?;

    metric::incr_send_otp_statds("sent");
    logfire::info!(
        "OTP sent to {to}, message id {message_id}",
        to = delivery.to.clone(),
        message_id = delivery.message_id.clone()
    );

    Ok(web::HttpResponse::Ok().json(&json!({
        "ok": true,
        "message": "OTP sent successfully",
        "to": delivery.to,
        "timestamp": utils::iso_timestamp(),
    })))
}
