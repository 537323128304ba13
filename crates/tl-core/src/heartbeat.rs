//! Raw activity heartbeats.

use serde::{Deserialize, Serialize};

/// A single activity signal from an editor or tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Unix time in seconds. Fractions are kept.
    pub time: f64,
    /// Project the activity belongs to, usually a directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// VCS branch checked out at the time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// File being edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Heartbeat {
    /// Creates a heartbeat with no branch or file.
    pub fn new(time: f64, project: Option<String>) -> Self {
        Self {
            time,
            project,
            branch: None,
            file: None,
        }
    }
}
