//! # OTP API Module
//!
//! Validates send requests and forwards them to the live WhatsApp session.

use crate::{
    connection::ConnectionHandle,
    whatsapp::{Jid, WhatsAppError},
};
use derive_more::{Display, Error};
use serde_json::Value;

/// A validated send request
#[derive(Debug, Clone, PartialEq)]
pub struct OtpRequest {
    pub number: String,
    pub message: String,
}

/// Result of a message accepted by WhatsApp
#[derive(Debug, Clone, PartialEq)]
pub struct OtpDelivery {
    /// Normalized phone number digits
    pub to: String,
    pub message_id: String,
}

#[derive(Debug, Display, Error)]
pub enum SendOtpError {
    /// No session is open right now
    #[display("WhatsApp not connected")]
    NotConnected,
    #[display("{_0}")]
    Send(WhatsAppError),
}

/// Reads `number` and `message` from a JSON body.
///
/// Both must be present and non-empty; `number` may also be a JSON number.
/// On failure the parsed body is returned (`null` when it is not JSON) so it
/// can be echoed back to the caller.
pub fn parse_otp_request(body: &[u8]) -> Result<OtpRequest, Value> {
    let received: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    let number = match received.get("number") {
        Some(Value::String(number)) => number.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };
    let message = match received.get("message") {
        Some(Value::String(message)) => message.clone(),
        _ => String::new(),
    };

    if number.is_empty() || message.is_empty() {
        return Err(received);
    }

    Ok(OtpRequest { number, message })
}

/// Sends the OTP text through the current session.
///
/// The phone number is reduced to its digits; no other validation happens here,
/// WhatsApp decides whether the recipient is valid.
pub async fn send_otp(
    connection: &ConnectionHandle,
    request: &OtpRequest,
) -> Result<OtpDelivery, SendOtpError> {
    let session = connection.current().ok_or(SendOtpError::NotConnected)?;
    let jid = Jid::from_phone_number(&request.number);

    let receipt = session
        .send_text(&jid, &request.message)
        .await
        .map_err(SendOtpError::Send)?;

    Ok(OtpDelivery {
        to: jid.user().to_string(),
        message_id: receipt.message_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connection,
        whatsapp::{ErrorKind, MessageReceipt, MockSession},
    };
    use serde_json::json;
    use std::sync::Arc;

    fn request(number: &str, message: &str) -> OtpRequest {
        OtpRequest {
            number: number.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_parse_valid_request() {
        let body = json!({"number": "+1 (555) 123-4567", "message": "Your code is 1234"});
        let parsed = parse_otp_request(body.to_string().as_bytes()).unwrap();

        assert_eq!(parsed, request("+1 (555) 123-4567", "Your code is 1234"));
    }

    #[test]
    fn test_parse_numeric_number() {
        let body = json!({"number": 5215512345678u64, "message": "1234"});
        let parsed = parse_otp_request(body.to_string().as_bytes()).unwrap();

        assert_eq!(parsed.number, "5215512345678");
    }

    #[test]
    fn test_parse_missing_or_empty_fields() {
        for body in [
            json!({"number": "5551234"}),
            json!({"message": "1234"}),
            json!({"number": "", "message": "1234"}),
            json!({"number": "5551234", "message": ""}),
            json!({"number": "5551234", "message": 1234}),
            json!({}),
        ] {
            let received = parse_otp_request(body.to_string().as_bytes()).unwrap_err();
            assert_eq!(received, body);
        }
    }

    #[test]
    fn test_parse_invalid_json_echoes_null() {
        assert_eq!(parse_otp_request(b"number=123").unwrap_err(), Value::Null);
    }

    #[tokio::test]
    async fn test_send_without_session_is_not_connected() {
        let (_publisher, handle) = connection::session_channel();

        let result = send_otp(&handle, &request("5551234", "1234")).await;

        assert!(matches!(result, Err(SendOtpError::NotConnected)));
    }

    #[tokio::test]
    async fn test_send_normalizes_number() {
        let mut session = MockSession::new();
        session
            .expect_send_text()
            .withf(|to, body| to.to_string() == "15551234567@s.whatsapp.net" && body == "1234")
            .times(1)
            .returning(|_, _| {
                Ok(MessageReceipt {
                    message_id: "wamid.1".into(),
                })
            });

        let (publisher, handle) = connection::session_channel();
        publisher.publish(Arc::new(session));

        let delivery = send_otp(&handle, &request("+1 (555) 123-4567", "1234"))
            .await
            .unwrap();

        assert_eq!(delivery.to, "15551234567");
        assert_eq!(delivery.message_id, "wamid.1");
    }

    #[tokio::test]
    async fn test_send_failure_is_returned() {
        let mut session = MockSession::new();
        session
            .expect_send_text()
            .times(1)
            .returning(|_, _| Err(WhatsAppError::new("number not registered")));

        let (publisher, handle) = connection::session_channel();
        publisher.publish(Arc::new(session));

        let result = send_otp(&handle, &request("5551234", "1234")).await;

        match result {
            Err(SendOtpError::Send(err)) => assert_eq!(err.kind(), ErrorKind::InvalidRecipient),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
