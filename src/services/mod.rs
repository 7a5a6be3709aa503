pub mod storage;

use crate::whatsapp;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence for the session credentials
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `None` when nothing was saved yet
    async fn load(&self) -> anyhow::Result<Option<whatsapp::Credentials>>;

    async fn save(&self, credentials: &whatsapp::Credentials) -> anyhow::Result<()>;
}

pub type ImplCredentialStore = Arc<dyn CredentialStore>;
