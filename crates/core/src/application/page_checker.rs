//! Page Checker - screenshots retailer pages and reports when items are back
//!
//! Per page (sequentially):
//! 1. Resolve the retailer from the page name prefix (`Costco-tv` -> `Costco`)
//! 2. Screenshot the page, run text detection on the image
//! 3. No unavailability marker in the text -> publish the image and notify

use super::constants::SCREENSHOT_KEY_PREFIX;
use super::dispatch::Dispatcher;
use super::scheduler::{Cycle, CycleReport};
use crate::port::{PageCapturer, PageError, ScreenshotStore, TextDetector};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A watched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    /// `<Retailer>-<label>`
    pub name: String,
    pub url: String,
}

impl PageTarget {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Retailer part of the name (everything before the first `-`)
    pub fn retailer(&self) -> &str {
        self.name.split('-').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct PageCheckerSettings {
    pub screenshot_dir: PathBuf,
    /// Retailer -> texts that mean "not available"
    pub markers: HashMap<String, Vec<String>>,
}

impl PageCheckerSettings {
    pub fn new(screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
            markers: default_markers(),
        }
    }

    /// Replace (or add) the markers of one retailer
    pub fn with_markers(mut self, retailer: impl Into<String>, markers: Vec<String>) -> Self {
        self.markers.insert(retailer.into(), markers);
        self
    }
}

pub fn default_markers() -> HashMap<String, Vec<String>> {
    HashMap::from([
        ("Amazon".to_string(), vec!["UNAVAILABLE".to_string()]),
        (
            "Costco".to_string(),
            vec![
                "OUT OF STOCK".to_string(),
                "$--.--".to_string(),
                "$-.--".to_string(),
                "$ -".to_string(),
            ],
        ),
    ])
}

/// First marker found in any detected line (case-insensitive)
pub fn find_marker<'a>(lines: &[String], markers: &'a [String]) -> Option<&'a str> {
    let lines: Vec<String> = lines.iter().map(|l| l.to_uppercase()).collect();
    markers
        .iter()
        .find(|marker| {
            let marker = marker.to_uppercase();
            lines.iter().any(|line| line.contains(&marker))
        })
        .map(String::as_str)
}

/// Result of checking one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    Unavailable { marker: String },
    Available { image_url: String },
    UnknownRetailer,
}

pub struct PageChecker {
    pages: Vec<PageTarget>,
    capturer: Arc<dyn PageCapturer>,
    detector: Arc<dyn TextDetector>,
    store: Arc<dyn ScreenshotStore>,
    dispatcher: Dispatcher,
    settings: PageCheckerSettings,
}

impl PageChecker {
    pub fn new(
        pages: Vec<PageTarget>,
        capturer: Arc<dyn PageCapturer>,
        detector: Arc<dyn TextDetector>,
        store: Arc<dyn ScreenshotStore>,
        dispatcher: Dispatcher,
        settings: PageCheckerSettings,
    ) -> Self {
        Self {
            pages,
            capturer,
            detector,
            store,
            dispatcher,
            settings,
        }
    }

    pub fn pages(&self) -> &[PageTarget] {
        &self.pages
    }

    /// Screenshot, detect and (when available) publish + notify for one page
    pub async fn check_page(&self, page: &PageTarget) -> Result<PageVerdict, PageError> {
        let Some(markers) = self.settings.markers.get(page.retailer()) else {
            warn!(page = %page.name, retailer = %page.retailer(), "No markers for retailer, skipping page");
            return Ok(PageVerdict::UnknownRetailer);
        };

        tokio::fs::create_dir_all(&self.settings.screenshot_dir).await?;
        let image = self.settings.screenshot_dir.join(format!("{}.png", page.name));

        info!(page = %page.name, url = %page.url, "Taking screenshot");
        self.capturer.capture(&page.url, &image).await?;

        let lines = self.detector.detect_text(&image).await?;
        let text_file = image.with_extension("txt");
        let json = serde_json::to_string(&lines)
            .map_err(|e| PageError::Detection(format!("encoding detected text: {e}")))?;
        tokio::fs::write(&text_file, json).await?;

        if let Some(marker) = find_marker(&lines, markers) {
            info!(page = %page.name, marker, "Page is unavailable");
            return Ok(PageVerdict::Unavailable {
                marker: marker.to_string(),
            });
        }

        let key = format!("{}/{}-new.png", SCREENSHOT_KEY_PREFIX, page.name);
        let image_url = self.store.publish(&image, &key).await?;

        let message = format!(
            "A page, '{}', now has items available.\nURL: {}\n\nScreenshot: {}",
            page.name, page.url, image_url
        );
        let report = self.dispatcher.broadcast(&message, Some(&image_url)).await;
        info!(
            page = %page.name,
            delivered = report.delivered,
            failed = report.failed,
            "Page has items available"
        );

        Ok(PageVerdict::Available { image_url })
    }
}

#[async_trait]
impl Cycle for PageChecker {
    fn name(&self) -> &str {
        "page-checker"
    }

    async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        for page in &self.pages {
            match self.check_page(page).await {
                Ok(PageVerdict::UnknownRetailer) => report.skipped += 1,
                Ok(_) => report.evaluated += 1,
                Err(e) => {
                    error!(page = %page.name, error = %e, "Page check failed");
                    report.skipped += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Recipient;
    use crate::port::notifier::mocks::RecordingNotifier;
    use crate::port::page::mocks::{RecordingStore, StaticCapturer, StaticTextDetector};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        dir: PathBuf,
        capturer: Arc<StaticCapturer>,
        detector: Arc<StaticTextDetector>,
        store: Arc<RecordingStore>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            Self {
                dir: tmp.path().join("shots"),
                _dir: tmp,
                capturer: Arc::new(StaticCapturer::new()),
                detector: Arc::new(StaticTextDetector::new()),
                store: Arc::new(RecordingStore::new()),
                notifier: Arc::new(RecordingNotifier::new()),
            }
        }

        fn checker(&self, pages: Vec<PageTarget>) -> PageChecker {
            PageChecker::new(
                pages,
                self.capturer.clone(),
                self.detector.clone(),
                self.store.clone(),
                Dispatcher::new(
                    self.notifier.clone(),
                    vec![Recipient::new("alice", "+15550000001")],
                ),
                PageCheckerSettings::new(&self.dir),
            )
        }
    }

    #[test]
    fn test_retailer_prefix() {
        assert_eq!(PageTarget::new("Costco-tv", "u").retailer(), "Costco");
        assert_eq!(PageTarget::new("Amazon", "u").retailer(), "Amazon");
    }

    #[test]
    fn test_find_marker_is_case_insensitive() {
        let markers = vec!["OUT OF STOCK".to_string(), "$--.--".to_string()];
        let lines = vec!["Sony 65\" TV".to_string(), "Out of Stock".to_string()];
        assert_eq!(find_marker(&lines, &markers), Some("OUT OF STOCK"));

        let lines = vec!["Price $--.--".to_string()];
        assert_eq!(find_marker(&lines, &markers), Some("$--.--"));

        let lines = vec!["Add to cart".to_string()];
        assert_eq!(find_marker(&lines, &markers), None);
    }

    #[tokio::test]
    async fn test_unavailable_page_does_not_notify() {
        let fx = Fixture::new();
        fx.detector.set_text("Costco-tv", &["TV", "OUT OF STOCK"]);
        let checker = fx.checker(vec![]);

        let verdict = checker
            .check_page(&PageTarget::new("Costco-tv", "https://costco.test/tv"))
            .await
            .unwrap();

        assert_eq!(
            verdict,
            PageVerdict::Unavailable {
                marker: "OUT OF STOCK".to_string()
            }
        );
        assert_eq!(fx.notifier.sent_count(), 0);
        assert!(fx.store.published().is_empty());

        let saved = std::fs::read_to_string(fx.dir.join("Costco-tv.txt")).unwrap();
        let lines: Vec<String> = serde_json::from_str(&saved).unwrap();
        assert_eq!(lines, vec!["TV", "OUT OF STOCK"]);
    }

    #[tokio::test]
    async fn test_available_page_publishes_and_notifies() {
        let fx = Fixture::new();
        fx.detector.set_text("Amazon-console", &["In Stock", "Add to Cart"]);
        let checker = fx.checker(vec![]);

        let verdict = checker
            .check_page(&PageTarget::new("Amazon-console", "https://amazon.test/c"))
            .await
            .unwrap();

        let url = "https://screenshots.test/page-checker-pictures/Amazon-console-new.png";
        assert_eq!(
            verdict,
            PageVerdict::Available {
                image_url: url.to_string()
            }
        );
        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].message,
            format!(
                "A page, 'Amazon-console', now has items available.\nURL: https://amazon.test/c\n\nScreenshot: {url}"
            )
        );
        assert_eq!(sent[0].attachment_url.as_deref(), Some(url));
    }

    #[tokio::test]
    async fn test_cycle_continues_after_failure_and_skips_unknown() {
        let fx = Fixture::new();
        fx.capturer.fail_for("https://costco.test/broken");
        fx.detector.set_text("Costco-ok", &["$499.99"]);
        let checker = fx.checker(vec![
            PageTarget::new("Costco-broken", "https://costco.test/broken"),
            PageTarget::new("BestBuy-tv", "https://bestbuy.test/tv"),
            PageTarget::new("Costco-ok", "https://costco.test/ok"),
        ]);

        let report = checker.run_cycle().await;

        assert_eq!(report, CycleReport { evaluated: 1, skipped: 2 });
        assert_eq!(fx.capturer.captured(), vec!["https://costco.test/ok"]);
        assert_eq!(fx.notifier.sent_count(), 1);
    }
}
