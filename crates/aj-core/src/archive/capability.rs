use std::path::{Path, PathBuf};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Grant {
    path: PathBuf,
    issued_at: DateTime<Utc>,
}

/// Opaque, persistable grant of write access to a chosen directory.
///
/// The grant is only as good as the directory behind it: `resolve` fails with
/// `StaleCapability` once the directory is gone or no longer writable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCapability {
    token: String,
}

impl OutputCapability {
    pub fn issue(dir: &Path) -> Result<Self> {
        let grant = Grant {
            path: dir.to_path_buf(),
            issued_at: Utc::now(),
        };
        let token = STANDARD.encode(serde_json::to_vec(&grant)?);

        Ok(Self { token })
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.grant().ok().map(|g| g.issued_at)
    }

    /// Revalidate the grant and return the directory it covers.
    pub async fn resolve(&self) -> Result<PathBuf> {
        let grant = self.grant()?;

        let metadata = tokio::fs::metadata(&grant.path)
            .await
            .map_err(|_| Error::StaleCapability)?;
        if !metadata.is_dir() || metadata.permissions().readonly() {
            return Err(Error::StaleCapability);
        }

        Ok(grant.path)
    }

    fn grant(&self) -> Result<Grant> {
        let raw = STANDARD.decode(&self.token).map_err(|_| Error::StaleCapability)?;
        serde_json::from_slice(&raw).map_err(|_| Error::StaleCapability)
    }
}
