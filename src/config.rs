use crate::links::DEFAULT_QUIZ_BASE_URL;
use std::path::PathBuf;

/// Startup configuration, read from the environment after an optional `.env`.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub workspace: Option<PathBuf>,
    pub quiz_base_url: String,
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        let workspace = std::env::var("ATTENDANCED_WORKSPACE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let quiz_base_url = std::env::var("ATTENDANCED_QUIZ_BASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_QUIZ_BASE_URL.to_string());
        Self {
            workspace,
            quiz_base_url,
        }
    }
}
