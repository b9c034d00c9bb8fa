// Notification Recipient

use serde::{Deserialize, Serialize};

/// A person (or group) that receives alerts, addressed by phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub destination: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
        }
    }
}
