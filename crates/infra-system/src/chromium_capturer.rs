// PageCapturer adapter: headless Chromium `--screenshot`
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::command::{run_command, stderr_text};
use homewatch_core::application::constants::{SCREENSHOT_HEIGHT, SCREENSHOT_WIDTH};
use homewatch_core::port::{PageCapturer, PageError};

const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ChromiumCapturer {
    chromium_path: String,
    timeout: Duration,
}

impl ChromiumCapturer {
    pub fn new(chromium_path: impl Into<String>) -> Self {
        Self {
            chromium_path: chromium_path.into(),
            timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(url: &str, destination: &Path) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--screenshot={}", destination.display()),
            format!("--window-size={},{}", SCREENSHOT_WIDTH, SCREENSHOT_HEIGHT),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl PageCapturer for ChromiumCapturer {
    async fn capture(&self, url: &str, destination: &Path) -> Result<(), PageError> {
        // A stale screenshot must not pass for a fresh one
        if tokio::fs::try_exists(destination).await? {
            tokio::fs::remove_file(destination).await?;
        }

        let output = run_command(&self.chromium_path, Self::args(url, destination), self.timeout)
            .await
            .map_err(|e| PageError::Capture(e.to_string()))?;

        if !output.status.success() {
            return Err(PageError::Capture(format!(
                "chromium exited with {:?}: {}",
                output.status.code(),
                stderr_text(&output)
            )));
        }
        if !tokio::fs::try_exists(destination).await? {
            return Err(PageError::Capture(format!(
                "chromium wrote no screenshot to {}",
                destination.display()
            )));
        }

        info!(url = %url, path = %destination.display(), "Screenshot captured");
        Ok(())
    }
}
