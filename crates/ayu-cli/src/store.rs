//! Result store: persists the completion payload between the intake and
//! report screens so a restart mid-flow lands on the report instead of an
//! empty navigation state. Expired or missing results fall into the
//! NoReport screen deterministically.

use ayu_api::Report;
use ayu_intake::Completion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// How long a stored result stays loadable
pub const RESULT_TTL: Duration = Duration::from_secs(30 * 60);

const RESULT_FILE: &str = "latest.json";

/// A persisted completion payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResult {
    /// Milliseconds since the Unix epoch at save time
    pub saved_at: i64,
    pub report: Report,
    pub collected: BTreeMap<String, String>,
}

/// File-backed store for the most recent intake result
pub struct ResultStore {
    dir: PathBuf,
    ttl: Duration,
}

impl ResultStore {
    /// Store under the user's local data directory
    pub fn new() -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ayu")
            .join("reports");
        Self {
            dir,
            ttl: RESULT_TTL,
        }
    }

    /// Store under a specific directory with a specific TTL
    pub fn with_dir(dir: PathBuf, ttl: Duration) -> Self {
        Self { dir, ttl }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(RESULT_FILE)
    }

    /// Persist a completion payload, replacing any previous result
    pub fn save(&self, completion: &Completion) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stored = StoredResult {
            saved_at: chrono::Utc::now().timestamp_millis(),
            report: completion.report.clone(),
            collected: completion.collected.clone(),
        };
        let path = self.path();
        let content = serde_json::to_string_pretty(&stored).map_err(std::io::Error::other)?;
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Load the stored result if it exists and has not expired
    pub fn load(&self) -> Option<StoredResult> {
        let content = fs::read_to_string(self.path()).ok()?;
        let stored: StoredResult = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("discarding unreadable stored result: {e}");
                return None;
            }
        };

        let age_millis = chrono::Utc::now().timestamp_millis() - stored.saved_at;
        if age_millis < 0 || age_millis as u128 >= self.ttl.as_millis() {
            self.clear();
            return None;
        }
        Some(stored)
    }

    /// Remove the stored result
    pub fn clear(&self) {
        let _ = fs::remove_file(self.path());
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
