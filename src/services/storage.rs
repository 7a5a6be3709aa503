//! File based credential storage.
//!
//! Credentials live in `<session_dir>/creds.json`. Writes go to a temporary file
//! first and are renamed into place, so a crash mid-write never leaves a
//! truncated session behind.

use crate::{consts, whatsapp};
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct FileCredentialStore {
    session_dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(session_dir: impl AsRef<Path>) -> Self {
        Self {
            session_dir: session_dir.as_ref().to_path_buf(),
        }
    }

    fn credentials_path(&self) -> PathBuf {
        self.session_dir.join(consts::CREDENTIALS_FILE_NAME)
    }
}

#[async_trait]
impl crate::services::CredentialStore for FileCredentialStore {
    async fn load(&self) -> anyhow::Result<Option<whatsapp::Credentials>> {
        let path = self.credentials_path();

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read credentials from {}", path.display()));
            }
        };

        let credentials = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse credentials in {}", path.display()))?;

        Ok(Some(credentials))
    }

    async fn save(&self, credentials: &whatsapp::Credentials) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.session_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create session directory {}",
                    self.session_dir.display()
                )
            })?;

        let path = self.credentials_path();
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, serde_json::to_vec_pretty(credentials)?)
            .await
            .with_context(|| format!("Failed to write credentials to {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to move credentials into {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CredentialStore;

    #[tokio::test]
    async fn test_load_without_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("auth_info"));

        let mut creds = whatsapp::Credentials::new("1234".into(), "token".into());
        creds.me = Some("+1 555-123-4567".into());
        store.save(&creds).await.unwrap();

        assert!(dir.path().join("auth_info").join("creds.json").exists());
        assert_eq!(store.load().await.unwrap(), Some(creds));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());

        store
            .save(&whatsapp::Credentials::new("1234".into(), "old".into()))
            .await
            .unwrap();
        store
            .save(&whatsapp::Credentials::new("1234".into(), "new".into()))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "new");
        assert!(!dir.path().join("creds.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_corrupted_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("creds.json"), b"{not json").unwrap();

        let store = FileCredentialStore::new(dir.path());

        assert!(store.load().await.is_err());
    }
}
