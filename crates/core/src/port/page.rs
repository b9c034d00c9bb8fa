// Page Pipeline Ports (screenshot, OCR, publishing)
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Screenshot failed: {0}")]
    Capture(String),

    #[error("Text detection failed: {0}")]
    Detection(String),

    #[error("Publishing failed: {0}")]
    Publish(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a web page to a PNG file
#[async_trait]
pub trait PageCapturer: Send + Sync {
    async fn capture(&self, url: &str, destination: &Path) -> Result<(), PageError>;
}

/// Extracts text blocks (lines) from an image
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_text(&self, image: &Path) -> Result<Vec<String>, PageError>;
}

/// Publishes an image and returns a URL a phone can open
#[async_trait]
pub trait ScreenshotStore: Send + Sync {
    async fn publish(&self, image: &Path, key: &str) -> Result<String, PageError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Writes a placeholder PNG and records requested URLs
    pub struct StaticCapturer {
        captured: Mutex<Vec<String>>,
        failing_urls: Mutex<Vec<String>>,
    }

    impl StaticCapturer {
        pub fn new() -> Self {
            Self {
                captured: Mutex::new(Vec::new()),
                failing_urls: Mutex::new(Vec::new()),
            }
        }

        pub fn fail_for(&self, url: &str) {
            self.failing_urls.lock().unwrap().push(url.to_string());
        }

        pub fn captured(&self) -> Vec<String> {
            self.captured.lock().unwrap().clone()
        }
    }

    impl Default for StaticCapturer {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PageCapturer for StaticCapturer {
        async fn capture(&self, url: &str, destination: &Path) -> Result<(), PageError> {
            if self.failing_urls.lock().unwrap().iter().any(|u| u == url) {
                return Err(PageError::Capture(format!("mock capture failure for {url}")));
            }
            self.captured.lock().unwrap().push(url.to_string());
            tokio::fs::write(destination, b"\x89PNG mock").await?;
            Ok(())
        }
    }

    /// Returns canned text keyed by the image file stem (the page name)
    pub struct StaticTextDetector {
        texts: Mutex<HashMap<String, Vec<String>>>,
    }

    impl StaticTextDetector {
        pub fn new() -> Self {
            Self {
                texts: Mutex::new(HashMap::new()),
            }
        }

        pub fn set_text(&self, page_name: &str, lines: &[&str]) {
            self.texts.lock().unwrap().insert(
                page_name.to_string(),
                lines.iter().map(|l| l.to_string()).collect(),
            );
        }
    }

    impl Default for StaticTextDetector {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl TextDetector for StaticTextDetector {
        async fn detect_text(&self, image: &Path) -> Result<Vec<String>, PageError> {
            let stem = image
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            Ok(self
                .texts
                .lock()
                .unwrap()
                .get(&stem)
                .cloned()
                .unwrap_or_default())
        }
    }

    /// Pretends to upload and records published keys
    pub struct RecordingStore {
        published: Mutex<Vec<String>>,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
            }
        }

        pub fn published(&self) -> Vec<String> {
            self.published.lock().unwrap().clone()
        }
    }

    impl Default for RecordingStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ScreenshotStore for RecordingStore {
        async fn publish(&self, _image: &Path, key: &str) -> Result<String, PageError> {
            self.published.lock().unwrap().push(key.to_string());
            Ok(format!("https://screenshots.test/{key}"))
        }
    }
}
