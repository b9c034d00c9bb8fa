// Domain Layer - Monitored targets and their identities

pub mod error;
pub mod recipient;
pub mod target;

// Re-exports
pub use error::DomainError;
pub use recipient::Recipient;
pub use target::{DeviceHandle, HostAddress, Target, TargetRegistry};
