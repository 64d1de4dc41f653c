use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for finished recordings
#[async_trait::async_trait]
pub trait DownloadSink: Send + Sync {
    /// Persist one file and return where it landed
    async fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf>;
}

/// Writes recordings into a downloads folder
///
/// Existing files are never overwritten: a colliding name gets a ` (n)`
/// suffix before the extension.
pub struct DownloadDirectory {
    root: PathBuf,
}

impl DownloadDirectory {
    /// Create the sink, expanding `~` and environment variables in the path
    pub fn new(path: &str) -> Result<Self> {
        let expanded = shellexpand::full(path)
            .with_context(|| format!("Failed to expand downloads path: {}", path))?;
        Ok(Self::at(PathBuf::from(expanded.as_ref())))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.root.join(filename);
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }

        let (stem, extension) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };

        let mut n = 1;
        loop {
            let name = match extension {
                Some(ext) => format!("{} ({}).{}", stem, n, ext),
                None => format!("{} ({})", stem, n),
            };
            let candidate = self.root.join(name);
            if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[async_trait::async_trait]
impl DownloadSink for DownloadDirectory {
    async fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        // Only the final component; a filename must not escape the folder
        let filename = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid download filename: {:?}", filename))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create downloads folder: {:?}", self.root))?;

        let path = self.free_path(filename).await;
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write download: {:?}", path))?;

        info!("Saved {} ({} bytes)", path.display(), data.len());

        Ok(path)
    }
}
