//! Runtime configuration shared by the server and the terminal runner

use std::sync::Arc;
use tracing::info;

use crate::core::content::ContentGenerator;
use crate::core::gemini::{GeminiClient, DEFAULT_MODEL};
use crate::core::shuffle::{RandomShuffler, Shuffler};
use crate::types::GenerationError;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub addr: String,
    /// Without a key only catalog goals and pre-baked lessons work
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    /// Fixed seed for reproducible matching layouts
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn content_generator(&self) -> Result<ContentGenerator, GenerationError> {
        match self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let client = GeminiClient::new(key, &self.model, self.timeout_secs)?;
                info!(model = %self.model, "content generator online");
                Ok(ContentGenerator::new(Arc::new(client)))
            }
            None => {
                info!("no API key, content generator offline (catalog only)");
                Ok(ContentGenerator::offline())
            }
        }
    }

    /// A fresh shuffler per session; seeded sessions all share one sequence
    pub fn shuffler(&self) -> Box<dyn Shuffler> {
        match self.seed {
            Some(seed) => Box::new(RandomShuffler::seeded(seed)),
            None => Box::new(RandomShuffler::new()),
        }
    }
}
