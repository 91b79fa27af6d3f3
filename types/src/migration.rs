//! Persisted migration bookkeeping.

use serde::{Deserialize, Serialize};

/// Singleton record stored under the `migration` key.
///
/// `version` is the application version that last wrote the store;
/// `completed` lists applied script versions in the order they were applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub version: String,
    #[serde(default)]
    pub completed: Vec<String>,
}

impl MigrationRecord {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            completed: Vec::new(),
        }
    }

    pub fn is_completed(&self, version: &str) -> bool {
        self.completed.iter().any(|v| v == version)
    }
}
