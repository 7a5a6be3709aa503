use crate::{
    api::otp::SendOtpError,
    utils,
    whatsapp::{ErrorKind, WhatsAppError},
};
use derive_more::{Display, Error};
use ntex::{http, web};
use serde_json::json;

#[derive(Debug, Display, Error)]
pub enum GatewayError {
    #[display("Missing number or message")]
    MissingFields { received: serde_json::Value },
    #[display("WhatsApp not connected")]
    NotConnected,
    #[display("Failed to send message: {_0}")]
    SendFailed(WhatsAppError),
    #[display("Not found")]
    UrlNotFound,
}

impl From<SendOtpError> for GatewayError {
    fn from(err: SendOtpError) -> Self {
        match err {
            SendOtpError::NotConnected => GatewayError::NotConnected,
            SendOtpError::Send(err) => GatewayError::SendFailed(err),
        }
    }
}

impl GatewayError {
    fn body(&self) -> serde_json::Value {
        match self {
            GatewayError::MissingFields { received } => json!({
                "error": self.to_string(),
                "received": received,
            }),
            GatewayError::NotConnected => json!({
                "error": self.to_string(),
                "message": "WhatsApp connection is being established, please try again in a few seconds",
            }),
            GatewayError::SendFailed(err) => {
                let details = match err.kind() {
                    ErrorKind::Unauthorized => format!("WhatsApp authentication required: {err}"),
                    _ => err.to_string(),
                };

                json!({
                    "error": "Failed to send message",
                    "details": details,
                    "timestamp": utils::iso_timestamp(),
                })
            }
            GatewayError::UrlNotFound => json!({ "error": self.to_string() }),
        }
    }
}

impl web::error::WebResponseError for GatewayError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            logfire::error!("{error}", error = self.to_string());
        } else {
            logfire::warn!("{error}", error = self.to_string());
        }

        web::HttpResponse::build(status).json(&self.body())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            GatewayError::MissingFields { .. } => http::StatusCode::BAD_REQUEST,
            GatewayError::NotConnected => http::StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::SendFailed(err) => match err.kind() {
                ErrorKind::Unauthorized => http::StatusCode::UNAUTHORIZED,
                ErrorKind::InvalidRecipient => http::StatusCode::BAD_REQUEST,
                ErrorKind::Other => http::StatusCode::INTERNAL_SERVER_ERROR,
            },
            GatewayError::UrlNotFound => http::StatusCode::NOT_FOUND,
        }
    }
}
