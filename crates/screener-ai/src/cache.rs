//! Date-keyed cache of model replies.

use chrono::NaiveDate;
use screener_core::error::AiError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CachedReply {
    model: String,
    response: String,
}

/// Caches one reply per prompt and day as
/// `<dir>/openai_response_<sha256(prompt)>_<YYYY-MM-DD>.json`.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file of `prompt` on `date`.
    pub fn path_for(&self, prompt: &str, date: NaiveDate) -> PathBuf {
        let hash = hex::encode(Sha256::digest(prompt.as_bytes()));
        self.dir
            .join(format!("openai_response_{}_{}.json", hash, date.format("%Y-%m-%d")))
    }

    /// Cached reply, if one was stored today for this prompt.
    pub fn load(&self, prompt: &str, date: NaiveDate) -> Result<Option<String>, AiError> {
        let path = self.path_for(prompt, date);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AiError::Cache(e.to_string())),
        };

        let cached: CachedReply =
            serde_json::from_str(&content).map_err(|e| AiError::Cache(e.to_string()))?;
        debug!(path = %path.display(), "Using cached model reply");
        Ok(Some(cached.response))
    }

    /// Store a reply.
    pub fn store(&self, prompt: &str, date: NaiveDate, model: &str, response: &str) -> Result<(), AiError> {
        fs::create_dir_all(&self.dir).map_err(|e| AiError::Cache(e.to_string()))?;

        let reply = CachedReply {
            model: model.to_string(),
            response: response.to_string(),
        };
        let content =
            serde_json::to_string_pretty(&reply).map_err(|e| AiError::Cache(e.to_string()))?;
        fs::write(self.path_for(prompt, date), content).map_err(|e| AiError::Cache(e.to_string()))
    }
}
