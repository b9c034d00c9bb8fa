// TextDetector adapter: `tesseract <image> stdout`
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::command::{run_command, stderr_text};
use homewatch_core::port::{PageError, TextDetector};

const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(60);

pub struct TesseractDetector {
    tesseract_path: String,
    timeout: Duration,
}

impl TesseractDetector {
    pub fn new(tesseract_path: impl Into<String>) -> Self {
        Self {
            tesseract_path: tesseract_path.into(),
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }
}

/// Non-empty, trimmed lines of OCR output
pub fn text_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl TextDetector for TesseractDetector {
    async fn detect_text(&self, image: &Path) -> Result<Vec<String>, PageError> {
        let image_arg = image.display().to_string();
        let output = run_command(&self.tesseract_path, [image_arg.as_str(), "stdout"], self.timeout)
            .await
            .map_err(|e| PageError::Detection(e.to_string()))?;

        if !output.status.success() {
            return Err(PageError::Detection(format!(
                "tesseract exited with {:?}: {}",
                output.status.code(),
                stderr_text(&output)
            )));
        }

        let lines = text_lines(&String::from_utf8_lossy(&output.stdout));
        debug!(image = %image.display(), lines = lines.len(), "Text detected");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lines_drops_blanks() {
        let raw = "Sony 65\" TV\n\n   OUT OF STOCK  \n\x0c";
        assert_eq!(text_lines(raw), vec!["Sony 65\" TV", "OUT OF STOCK"]);
    }

    #[tokio::test]
    async fn test_reads_tool_stdout() {
        // `echo` stands in for tesseract: prints its arguments back
        let detector = TesseractDetector::new("echo");

        let lines = detector
            .detect_text(Path::new("/tmp/Costco-tv.png"))
            .await
            .unwrap();

        assert_eq!(lines, vec!["/tmp/Costco-tv.png stdout"]);
    }
}
