// Homewatch Infrastructure - System Adapters
// Implements: Probe, PageCapturer, TextDetector, ScreenshotStore

pub mod chromium_capturer;
pub mod command;
pub mod directory_store;
pub mod ping_probe;
pub mod tesseract_detector;

pub use chromium_capturer::ChromiumCapturer;
pub use command::{run_command, CommandError};
pub use directory_store::DirectoryStore;
pub use ping_probe::PingProbe;
pub use tesseract_detector::TesseractDetector;
