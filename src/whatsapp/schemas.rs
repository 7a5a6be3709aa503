//! # WhatsApp Graph API Schemas
//!
//! JSON payloads exchanged with the WhatsApp Business Cloud API.

use serde::{Deserialize, Serialize};

/// Text message to send to WhatsApp
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTextMessage {
    /// Messaging product, always "whatsapp"
    pub messaging_product: String,
    /// Recipient type, always "individual"
    pub recipient_type: String,
    /// Recipient's phone number digits
    pub to: String,
    /// Message type
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Text content
    pub text: OutgoingTextContent,
}

impl OutgoingTextMessage {
    /// Creates a new text message
    pub fn new(to: String, body: String) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            recipient_type: "individual".to_string(),
            to,
            msg_type: "text".to_string(),
            text: OutgoingTextContent {
                preview_url: false,
                body,
            },
        }
    }
}

/// Text content for outgoing messages
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTextContent {
    pub preview_url: bool,
    /// Message body text
    pub body: String,
}

/// Response from WhatsApp API after sending a message
#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppMessageResponse {
    pub messaging_product: String,
    #[serde(default)]
    pub contacts: Vec<ResponseContact>,
    pub messages: Vec<ResponseMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseContact {
    pub input: String,
    pub wa_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub id: String,
}

/// Business phone number resource, used as the liveness probe
#[derive(Debug, Serialize, Deserialize)]
pub struct PhoneNumberInfo {
    pub id: String,
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub verified_name: Option<String>,
}

/// Response of the long-lived token exchange
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Error envelope returned by the Graph API on non-2xx responses
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphError,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_text_message_shape() {
        let message = OutgoingTextMessage::new("15551234567".into(), "code 1234".into());
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["messaging_product"], "whatsapp");
        assert_eq!(value["to"], "15551234567");
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"]["body"], "code 1234");
    }

    #[test]
    fn test_graph_error_deserialization() {
        let json = r#"{"error":{"message":"(#131030) Recipient phone number not in allowed list","type":"OAuthException","code":131030,"fbtrace_id":"Abc"}}"#;
        let rsp: GraphErrorResponse = serde_json::from_str(json).unwrap();

        assert_eq!(rsp.error.code, Some(131030));
        assert_eq!(rsp.error.error_type.as_deref(), Some("OAuthException"));
        assert!(rsp.error.error_subcode.is_none());
    }

    #[test]
    fn test_message_response_deserialization() {
        let json = r#"{"messaging_product":"whatsapp","contacts":[{"input":"15551234567","wa_id":"15551234567"}],"messages":[{"id":"wamid.HBgL"}]}"#;
        let rsp: WhatsAppMessageResponse = serde_json::from_str(json).unwrap();

        assert_eq!(rsp.messages[0].id, "wamid.HBgL");
        assert_eq!(rsp.contacts[0].wa_id, "15551234567");
    }
}
