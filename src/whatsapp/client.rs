//! # WhatsApp API Client
//!
//! [`Connector`] and [`Session`] implementation on top of the WhatsApp Business
//! Cloud API. A "connection" is an access token that was accepted by the API:
//! opening one fetches the business phone number resource, and a keepalive
//! task keeps probing it so a revoked token or a network outage surfaces as a
//! [`ConnectionEvent::Close`].

use super::{
    Connection, ConnectionEvent, Connector, Credentials, Jid, MessageReceipt, Session,
    WhatsAppError,
    schemas::{
        AccessTokenResponse, GraphErrorResponse, OutgoingTextMessage, PhoneNumberInfo,
        WhatsAppMessageResponse,
    },
};
use crate::consts;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{RwLock, mpsc},
    time::Instant,
};
use tracing::{info, warn};

/// Meta app credentials, required to refresh the access token
#[derive(Clone)]
pub struct AppCredentials {
    pub app_id: String,
    /// 🔒 SENSITIVE
    pub app_secret: String,
}

#[derive(Clone)]
pub struct ClientOptions {
    /// Graph API base url including the version, without trailing slash
    pub graph_api_url: String,
    /// Enables the periodic token refresh when set
    pub app: Option<AppCredentials>,
    pub keepalive_interval: Duration,
    pub token_refresh_interval: Duration,
    /// Upper bound for a whole Graph API request, probes included
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            graph_api_url: consts::DEFAULT_GRAPH_API_URL.to_string(),
            app: None,
            keepalive_interval: consts::KEEPALIVE_INTERVAL,
            token_refresh_interval: consts::TOKEN_REFRESH_INTERVAL,
            request_timeout: consts::REQUEST_TIMEOUT,
        }
    }
}

/// Opens Cloud API sessions
pub struct CloudApiConnector {
    /// HTTP client for making API requests
    client: reqwest::Client,
    options: ClientOptions,
}

impl CloudApiConnector {
    pub fn new(options: ClientOptions) -> Result<Self, WhatsAppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(options.request_timeout.min(consts::CONNECT_TIMEOUT))
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self { client, options })
    }
}

#[async_trait]
impl Connector for CloudApiConnector {
    async fn connect(&self, mut credentials: Credentials) -> Result<Connection, WhatsAppError> {
        let mut session = CloudSession {
            client: self.client.clone(),
            graph_api_url: self.options.graph_api_url.clone(),
            phone_number_id: credentials.phone_number_id.clone(),
            access_token: RwLock::new(credentials.access_token.clone()),
            own_jid: None,
        };

        let phone_info = session.get_phone_number_info().await?;
        session.own_jid = phone_info
            .display_phone_number
            .as_deref()
            .map(Jid::from_phone_number);
        info!(
            "WhatsApp session authenticated for phone number id {}",
            phone_info.id
        );

        let session = Arc::new(session);
        let (events, rx) = mpsc::channel(consts::EVENT_CHANNEL_CAPACITY);

        if credentials.me != phone_info.display_phone_number {
            credentials.me = phone_info.display_phone_number;
            credentials.updated_at = Utc::now();
            let _ = events
                .send(ConnectionEvent::CredsUpdate(credentials.clone()))
                .await;
        }
        let _ = events.send(ConnectionEvent::Open).await;

        tokio::spawn(keep_alive(
            session.clone(),
            self.options.clone(),
            credentials,
            events,
        ));

        Ok(Connection {
            session,
            events: rx,
        })
    }
}

/// Cloud API session bound to one business phone number
pub struct CloudSession {
    client: reqwest::Client,
    graph_api_url: String,
    phone_number_id: String,
    /// 🔒 SENSITIVE, replaced on token refresh
    access_token: RwLock<String>,
    own_jid: Option<Jid>,
}

impl CloudSession {
    async fn get_phone_number_info(&self) -> Result<PhoneNumberInfo, WhatsAppError> {
        let token = self.access_token.read().await.clone();
        let response = self
            .client
            .get(format!("{}/{}", self.graph_api_url, self.phone_number_id))
            .query(&[("fields", "id,display_phone_number,verified_name")])
            .bearer_auth(token)
            .send()
            .await?;

        read_response(response).await
    }

    /// Swaps the current token for a fresh long-lived one and returns it
    async fn exchange_token(&self, app: &AppCredentials) -> Result<String, WhatsAppError> {
        let token = self.access_token.read().await.clone();
        let response = self
            .client
            .get(format!("{}/oauth/access_token", self.graph_api_url))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", app.app_id.as_str()),
                ("client_secret", app.app_secret.as_str()),
                ("fb_exchange_token", token.as_str()),
            ])
            .send()
            .await?;

        let rsp: AccessTokenResponse = read_response(response).await?;
        *self.access_token.write().await = rsp.access_token.clone();

        Ok(rsp.access_token)
    }
}

#[async_trait]
impl Session for CloudSession {
    async fn send_text(&self, to: &Jid, body: &str) -> Result<MessageReceipt, WhatsAppError> {
        let message = OutgoingTextMessage::new(to.user().to_string(), body.to_string());
        let token = self.access_token.read().await.clone();

        let response = self
            .client
            .post(format!(
                "{}/{}/messages",
                self.graph_api_url, self.phone_number_id
            ))
            .bearer_auth(token)
            .json(&message)
            .send()
            .await?;

        let rsp: WhatsAppMessageResponse = read_response(response).await?;

        rsp.messages
            .into_iter()
            .next()
            .map(|msg| MessageReceipt { message_id: msg.id })
            .ok_or_else(|| WhatsAppError::new("WhatsApp API accepted the message without an id"))
    }

    fn own_jid(&self) -> Option<Jid> {
        self.own_jid.clone()
    }
}

/// Probes the session until it fails or the receiver side is dropped
async fn keep_alive(
    session: Arc<CloudSession>,
    options: ClientOptions,
    mut credentials: Credentials,
    events: mpsc::Sender<ConnectionEvent>,
) {
    let mut last_refresh = Instant::now();

    loop {
        tokio::select! {
            _ = events.closed() => return,
            _ = tokio::time::sleep(options.keepalive_interval) => {}
        }

        if let Err(e) = session.get_phone_number_info().await {
            let _ = events
                .send(ConnectionEvent::Close {
                    reason: e.to_string(),
                })
                .await;
            return;
        }

        let Some(app) = &options.app else {
            continue;
        };
        if last_refresh.elapsed() < options.token_refresh_interval {
            continue;
        }

        match session.exchange_token(app).await {
            Ok(access_token) => {
                last_refresh = Instant::now();
                credentials.access_token = access_token;
                credentials.updated_at = Utc::now();
                if events
                    .send(ConnectionEvent::CredsUpdate(credentials.clone()))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(e) => warn!("WhatsApp access token refresh failed: {}", e),
        }
    }
}

async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WhatsAppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        return Err(error_from_response(status, &body));
    }

    let body = response.bytes().await?;
    decode_body(status, &body)
}

/// Decodes a 2xx body; a schema mismatch is a server side fault, not a bad request
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, WhatsAppError> {
    serde_json::from_slice::<T>(body).map_err(|e| {
        warn!("unexpected WhatsApp API response body ({}): {}", status, e);
        WhatsAppError::new(format!(
            "WhatsApp API answered {status} with an unexpected body"
        ))
    })
}

/// Builds the error for a non-2xx Graph API response
fn error_from_response(status: StatusCode, body: &str) -> WhatsAppError {
    if let Ok(rsp) = serde_json::from_str::<GraphErrorResponse>(body) {
        return match rsp.error.code {
            Some(code) => WhatsAppError::with_code(code, rsp.error.message),
            None => WhatsAppError::new(rsp.error.message),
        };
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            WhatsAppError::new(format!("request not authorized ({status}): {body}"))
        }
        _ => WhatsAppError::new(format!("WhatsApp API returned error status {status}: {body}")),
    }
}
