//! Local directory store for received fax documents.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use faxgate_core::fax::FaxFileStore;
use faxgate_domain::{FaxError, Result};
use tracing::{info, instrument};

/// Stores fax documents as `{fax_id}.pdf` under a configured directory.
///
/// The directory is created on first write. On Unix the directory is held at
/// mode 0770 and documents at 0660 so only the service account and its group
/// can read patient documents.
#[derive(Debug, Clone)]
pub struct LocalFaxFileStore {
    root: PathBuf,
}

impl LocalFaxFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl FaxFileStore for LocalFaxFileStore {
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    async fn store(&self, fax_id: &str, content: &[u8]) -> Result<String> {
        // Fax ids come off the wire; they must stay a single path component.
        if fax_id.is_empty() || fax_id.contains(['/', '\\']) || fax_id.contains("..") {
            return Err(FaxError::InvalidInput(format!("invalid fax id for storage: {fax_id:?}")));
        }

        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            FaxError::StorageWriteFailed(format!(
                "cannot create storage directory {}: {err}",
                self.root.display()
            ))
        })?;
        restrict_permissions(&self.root, 0o770).await?;

        let path = self.root.join(format!("{fax_id}.pdf"));
        tokio::fs::write(&path, content).await.map_err(|err| {
            FaxError::StorageWriteFailed(format!(
                "cannot write fax document {}: {err}",
                path.display()
            ))
        })?;
        restrict_permissions(&path, 0o660).await?;

        info!(fax_id, path = %path.display(), "stored fax document");

        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await.map_err(|err| {
        FaxError::StorageWriteFailed(format!(
            "cannot restrict permissions on {}: {err}",
            path.display()
        ))
    })
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
