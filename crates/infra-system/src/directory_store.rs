// ScreenshotStore adapter: copies images into a web-served directory
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use homewatch_core::port::{PageError, ScreenshotStore};

/// Publishes by copying into `publish_dir/<key>`; the URL is `public_base_url/<key>`
pub struct DirectoryStore {
    publish_dir: PathBuf,
    public_base_url: String,
}

impl DirectoryStore {
    pub fn new(publish_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            publish_dir: publish_dir.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl ScreenshotStore for DirectoryStore {
    async fn publish(&self, image: &Path, key: &str) -> Result<String, PageError> {
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(PageError::Publish(format!("invalid key: {key}")));
        }

        let destination = self.publish_dir.join(key);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(image, &destination).await?;

        let url = self.url_for(key);
        info!(path = %destination.display(), url = %url, "Screenshot published");
        Ok(url)
    }
}
