//! WhatsApp messaging client integration
//!
//! The rest of the bridge only talks to the messaging network through the
//! [`Connector`] and [`Session`] traits defined here, so the connection
//! supervisor and the HTTP gateway can be exercised against mocks.
//!
//! ## Submodules
//!
//! - [`client`] - Cloud API implementation of the traits
//! - [`error`] - Error type returned by the client and its classification
//! - [`schemas`] - Graph API request and response payloads

pub mod client;
pub mod error;
pub mod schemas;

pub use error::{ErrorKind, WhatsAppError};

use crate::consts;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::sync::mpsc;

/// Address of a WhatsApp user: `<digits>@s.whatsapp.net`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jid {
    user: String,
}

impl Jid {
    /// Builds a user JID from a phone number, dropping every non-digit character
    ///
    /// `"+1 (555) 123-4567"` becomes `15551234567@s.whatsapp.net`
    pub fn from_phone_number(phone_number: &str) -> Self {
        Self {
            user: phone_number.chars().filter(char::is_ascii_digit).collect(),
        }
    }

    /// Digits part of the address
    pub fn user(&self) -> &str {
        &self.user
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, consts::JID_USER_SERVER)
    }
}

/// Session credentials persisted between restarts.
///
/// The content is opaque to the supervisor: it loads it, hands it to the
/// [`Connector`] and saves whatever comes back in [`ConnectionEvent::CredsUpdate`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub phone_number_id: String,
    /// 🔒 SENSITIVE
    pub access_token: String,
    /// Display phone number of the account, known after the first connection
    #[serde(default)]
    pub me: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(phone_number_id: String, access_token: String) -> Self {
        Self {
            phone_number_id,
            access_token,
            me: None,
            updated_at: Utc::now(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &"<redacted>")
            .field("me", &self.me)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Lifecycle signals emitted by a connection
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The session is authenticated and can send messages
    Open,
    /// The session is gone, a new connection is needed
    Close { reason: String },
    /// Credentials changed and must be persisted
    CredsUpdate(Credentials),
}

/// Acknowledgement of an accepted outgoing message
#[derive(Debug, Clone, PartialEq)]
pub struct MessageReceipt {
    pub message_id: String,
}

/// A live session with the messaging network
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Session: Send + Sync {
    /// Sends a plain text message
    async fn send_text(&self, to: &Jid, body: &str) -> Result<MessageReceipt, WhatsAppError>;

    /// Address of the account this session is logged in as
    fn own_jid(&self) -> Option<Jid>;
}

pub type ImplSession = Arc<dyn Session>;

/// Result of a connect attempt: the session plus its lifecycle events.
///
/// The session must not be used before [`ConnectionEvent::Open`] arrives.
/// Dropping `events` tells the client the connection is no longer wanted.
pub struct Connection {
    pub session: ImplSession,
    pub events: mpsc::Receiver<ConnectionEvent>,
}

/// Opens connections to the messaging network
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credentials: Credentials) -> Result<Connection, WhatsAppError>;
}

pub type ImplConnector = Arc<dyn Connector>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jid_from_formatted_phone_number() {
        let jid = Jid::from_phone_number("+1 (555) 123-4567");
        assert_eq!(jid.user(), "15551234567");
        assert_eq!(jid.to_string(), "15551234567@s.whatsapp.net");
    }

    #[test]
    fn test_jid_keeps_plain_digits() {
        assert_eq!(
            Jid::from_phone_number("5215512345678").to_string(),
            "5215512345678@s.whatsapp.net"
        );
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = Credentials::new("1234".into(), "super-secret-token".into());
        let debug = format!("{creds:?}");

        assert!(debug.contains("1234"));
        assert!(!debug.contains("super-secret-token"));
    }
}
