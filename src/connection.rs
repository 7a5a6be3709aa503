//! WhatsApp connection supervisor
//!
//! Keeps exactly one connection to the messaging network alive for the whole
//! process. The [`Supervisor`] is the only writer of the current session; the
//! HTTP handlers read it through a cloned [`ConnectionHandle`].
//!
//! Lifecycle of every attempt:
//!
//! 1. `Connecting`: load the credentials and ask the [`Connector`] for a session
//! 2. `Connected`: on the open signal the session is published
//! 3. `Disconnected`: on the close signal the session is cleared and one new
//!    attempt is scheduled after [`RetryPolicy::reconnect_delay`]
//!
//! An attempt that fails before the session opens is retried after
//! [`RetryPolicy::connect_retry_delay`]. There is no retry limit.
//!
//! [`Connector`]: crate::whatsapp::Connector

use crate::{
    consts, metric,
    services::ImplCredentialStore,
    whatsapp::{Connection, ConnectionEvent, Credentials, ImplConnector, ImplSession},
};
use derive_more::Display;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Creates the single-writer cell holding the live session
pub fn session_channel() -> (SessionPublisher, ConnectionHandle) {
    let (tx, rx) = watch::channel(None);
    (SessionPublisher { tx }, ConnectionHandle { rx })
}

/// Write side of the session cell, owned by the [`Supervisor`]
pub struct SessionPublisher {
    tx: watch::Sender<Option<ImplSession>>,
}

impl SessionPublisher {
    pub fn publish(&self, session: ImplSession) {
        self.tx.send_replace(Some(session));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }
}

/// Read-only access to the live session
#[derive(Clone)]
pub struct ConnectionHandle {
    rx: watch::Receiver<Option<ImplSession>>,
}

impl ConnectionHandle {
    /// The session currently open, `None` before the first open and while
    /// reconnecting
    pub fn current(&self) -> Option<ImplSession> {
        self.rx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

/// Delays between connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait after an open connection closed
    pub reconnect_delay: Duration,
    /// Wait after an attempt failed before opening
    pub connect_retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            reconnect_delay: consts::RECONNECT_DELAY,
            connect_retry_delay: consts::CONNECT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, outcome: &AttemptOutcome) -> Duration {
        match outcome {
            AttemptOutcome::Closed { .. } => self.reconnect_delay,
            AttemptOutcome::Failed(_) => self.connect_retry_delay,
        }
    }
}

/// How a connection attempt ended
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The connection was established and later closed
    Closed { reason: String },
    /// No connection could be established
    Failed(anyhow::Error),
}

pub struct Supervisor {
    connector: ImplConnector,
    store: ImplCredentialStore,
    bootstrap_credentials: Option<Credentials>,
    publisher: SessionPublisher,
    policy: RetryPolicy,
    notify_on_open: bool,
    notified: bool,
    status: ConnectionStatus,
}

impl Supervisor {
    pub fn new(
        connector: ImplConnector,
        store: ImplCredentialStore,
        publisher: SessionPublisher,
    ) -> Self {
        Self {
            connector,
            store,
            bootstrap_credentials: None,
            publisher,
            policy: RetryPolicy::default(),
            notify_on_open: true,
            notified: false,
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Credentials used while the store is still empty
    pub fn with_bootstrap_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.bootstrap_credentials = credentials;
        self
    }

    /// Whether to message the account's own number after the first open
    pub fn with_startup_notification(mut self, enabled: bool) -> Self {
        self.notify_on_open = enabled;
        self
    }

    /// Runs the supervisor in a background task
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Connects, waits for the connection to end and connects again, forever
    pub async fn run(mut self) {
        loop {
            let outcome = self.attempt().await;
            let delay = self.policy.delay_after(&outcome);

            match &outcome {
                AttemptOutcome::Closed { reason } => {
                    self.set_status(ConnectionStatus::Disconnected);
                    info!(
                        context = "connection",
                        "connection closed ({}), reconnecting in {}s",
                        reason,
                        delay.as_secs_f64()
                    );
                }
                AttemptOutcome::Failed(e) => {
                    metric::incr_connection_statds("connect_failed");
                    error!(
                        context = "connect",
                        "connection attempt failed: {:#}, retrying in {}s",
                        e,
                        delay.as_secs_f64()
                    );
                }
            }

            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&mut self) -> AttemptOutcome {
        self.set_status(ConnectionStatus::Connecting);

        let credentials = match self.load_credentials().await {
            Ok(credentials) => credentials,
            Err(e) => return AttemptOutcome::Failed(e),
        };

        let Connection {
            session,
            mut events,
        } = match self.connector.connect(credentials).await {
            Ok(connection) => connection,
            Err(e) => return AttemptOutcome::Failed(e.into()),
        };

        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Open => {
                    self.publisher.publish(session.clone());
                    self.set_status(ConnectionStatus::Connected);

                    if self.notify_on_open && !self.notified {
                        self.notified = true;
                        send_startup_notification(session.clone());
                    }
                }
                ConnectionEvent::CredsUpdate(credentials) => {
                    match self.store.save(&credentials).await {
                        Ok(()) => info!(context = "credentials", "session credentials saved"),
                        Err(e) => error!(
                            context = "credentials",
                            "failed to save session credentials: {:#}", e
                        ),
                    }
                }
                ConnectionEvent::Close { reason } => {
                    self.publisher.clear();
                    return AttemptOutcome::Closed { reason };
                }
            }
        }

        self.publisher.clear();
        AttemptOutcome::Closed {
            reason: "connection event stream ended".to_string(),
        }
    }

    async fn load_credentials(&self) -> anyhow::Result<Credentials> {
        if let Some(credentials) = self.store.load().await? {
            return Ok(credentials);
        }

        self.bootstrap_credentials.clone().ok_or_else(|| {
            anyhow::anyhow!("no saved session credentials and no bootstrap credentials configured")
        })
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status == status {
            return;
        }

        info!(
            context = "connection",
            "connection status {} -> {}", self.status, status
        );
        self.status = status;
        metric::incr_connection_statds(&status.to_string().to_lowercase());
    }
}

/// Best-effort message to the account's own number
fn send_startup_notification(session: ImplSession) {
    tokio::spawn(async move {
        let Some(own_jid) = session.own_jid() else {
            warn!(
                context = "startup_notification",
                "own number unknown, skipping startup notification"
            );
            return;
        };

        match session
            .send_text(&own_jid, consts::STARTUP_NOTIFICATION_TEXT)
            .await
        {
            Ok(_) => info!(context = "startup_notification", "sent to {}", own_jid),
            Err(e) => warn!(
                context = "startup_notification",
                "failed to send startup notification: {}", e
            ),
        }
    });
}
