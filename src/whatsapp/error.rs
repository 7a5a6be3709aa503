//! Errors reported by the WhatsApp client
//!
//! The Graph API answers failures with a numeric code plus a message. The code
//! is the primary signal for [`WhatsAppError::kind`]; when there is no code, or
//! an unknown one, the message text is matched against known phrases.

use derive_more::{Display, Error};

#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display("{message}")]
pub struct WhatsAppError {
    pub code: Option<i64>,
    pub message: String,
}

/// Coarse failure category used to pick the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The session lost its authorization
    Unauthorized,
    /// The recipient or a request parameter was rejected
    InvalidRecipient,
    Other,
}

impl WhatsAppError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code {
            // 0: AuthException, 10 and 200-299: permissions, 190: access token
            Some(0 | 10 | 190 | 200..=299) => ErrorKind::Unauthorized,
            // 100: invalid parameter, 131009: parameter value invalid,
            // 131026: undeliverable, 131030: recipient not allowed
            Some(100 | 131009 | 131026 | 131030) => ErrorKind::InvalidRecipient,
            _ => Self::kind_from_message(&self.message),
        }
    }

    fn kind_from_message(message: &str) -> ErrorKind {
        let message = message.to_lowercase();

        if message.contains("not authorized") {
            return ErrorKind::Unauthorized;
        }
        if message.contains("not registered") || message.contains("invalid") {
            return ErrorKind::InvalidRecipient;
        }

        ErrorKind::Other
    }
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("request to WhatsApp API failed: {err}"))
    }
}
