use anyhow::{Context, Result};
use log::{error, info};
use std::path::{Path, PathBuf};

use super::types::sanitize_label;
use crate::driver::PageDriver;

/// Screenshot folder for one session
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    dir: PathBuf,
}

impl EvidenceStore {
    /// Create `{output}/screenshots/{YYYYmmdd_HHMMSS}`
    pub fn create(output_dir: &Path) -> Result<Self> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let dir = output_dir.join("screenshots").join(stamp);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create evidence directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        self.dir
            .join(format!("{}_{}.png", sanitize_label(label), stamp))
    }

    /// Best-effort screenshot of `page`. Failures are logged and swallowed.
    pub async fn capture(&self, page: &dyn PageDriver, label: &str) -> Option<PathBuf> {
        let path = self.path_for(label);
        match page.take_screenshot(&path).await {
            Ok(()) => {
                info!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                error!("Failed to take screenshot '{}': {:#}", label, e);
                None
            }
        }
    }
}
