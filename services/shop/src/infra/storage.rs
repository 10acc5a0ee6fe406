//! Payment screenshots on the local filesystem.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bytes::Bytes;
use uuid::Uuid;

use crate::domain::repository::ScreenshotStore;
use crate::error::ShopServiceError;

const SCREENSHOT_DIR: &str = "payment_screenshots";
const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "pdf"];

#[derive(Clone)]
pub struct LocalScreenshotStore {
    pub root: PathBuf,
}

impl LocalScreenshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Lower-cased extension of the uploaded name if it is an accepted image/document type.
fn extension(file_name: Option<&str>) -> Option<String> {
    let ext = Path::new(file_name?).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

impl ScreenshotStore for LocalScreenshotStore {
    async fn save(
        &self,
        order_number: &str,
        file_name: Option<&str>,
        data: Bytes,
    ) -> Result<String, ShopServiceError> {
        let ext = extension(file_name).ok_or_else(|| {
            ShopServiceError::validation(format!(
                "transaction_ss must be one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

        let reference = format!("{SCREENSHOT_DIR}/{order_number}-{}.{ext}", Uuid::now_v7());
        let path = self.root.join(&reference);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create {}", dir.display()))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("write {}", path.display()))?;

        tracing::debug!(%reference, bytes = data.len(), "screenshot stored");
        Ok(reference)
    }

    async fn discard(&self, reference: &str) -> Result<(), ShopServiceError> {
        if !reference.starts_with(SCREENSHOT_DIR) || reference.contains("..") {
            return Err(anyhow::anyhow!("not a screenshot reference: {reference}").into());
        }
        let path = self.root.join(reference);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove {}", path.display()))
                .into()),
        }
    }
}
