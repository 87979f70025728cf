//! Shared configuration for PHA.
//!
//! Every tunable is read from the environment. Env files are loaded first so
//! that a developer can keep credentials in `.env.local` next to the binary.
//!
//! # Environment Variables
//!
//! - `GOOGLE_API_KEY`: credential for the Gemini provider
//! - `OPENROUTER_API_KEY`: credential for the OpenRouter provider
//! - `PHA_PROVIDER`: `gemini` (default) or `openrouter`
//! - `PHA_MODEL`: model identifier override
//! - `PHA_MAX_TOKENS`: output token cap per call
//! - `PHA_TIMEOUT_SECS`: per-call timeout
//! - `PHA_HISTORY_WINDOW`: conversation turns kept in memory
//! - `PHA_LIST_CAPACITY`: capacity of the bounded memory lists
//! - `PHA_MAX_GATEWAY_CALLS`: gateway call budget per traversal
//! - `PHA_PROMPT_HISTORY_TURNS`: turns rendered into the planning prompt
//! - `PHA_CONFIG_DIR`: override the user config directory

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::ConfigError;

/// Environment variable holding the Gemini API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable holding the OpenRouter API key.
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Environment variable selecting the LLM provider.
pub const PROVIDER_ENV: &str = "PHA_PROVIDER";

/// Environment variable overriding the model identifier.
pub const MODEL_ENV: &str = "PHA_MODEL";

/// Environment variable for the output token cap.
pub const MAX_TOKENS_ENV: &str = "PHA_MAX_TOKENS";

/// Environment variable for the per-call timeout in seconds.
pub const TIMEOUT_ENV: &str = "PHA_TIMEOUT_SECS";

/// Environment variable for the conversation history window.
pub const HISTORY_WINDOW_ENV: &str = "PHA_HISTORY_WINDOW";

/// Environment variable for the bounded list capacity.
pub const LIST_CAPACITY_ENV: &str = "PHA_LIST_CAPACITY";

/// Environment variable for the per-traversal gateway call budget.
pub const MAX_GATEWAY_CALLS_ENV: &str = "PHA_MAX_GATEWAY_CALLS";

/// Environment variable for the number of turns rendered into prompts.
pub const PROMPT_HISTORY_TURNS_ENV: &str = "PHA_PROMPT_HISTORY_TURNS";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "PHA_CONFIG_DIR";

/// Env files looked up in the working directory, in load order.
const LOCAL_ENV_FILES: &[&str] = &[".env.local", ".env"];

/// Default config directory name.
const CONFIG_SUBDIR: &str = "pha";

/// Get the user config directory.
///
/// Resolved from `PHA_CONFIG_DIR`, then the platform config directory
/// (`~/.config/pha` on Linux), then `.pha` in the working directory.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::config_dir()
                .map(|d| d.join(CONFIG_SUBDIR))
                .unwrap_or_else(|| PathBuf::from(".pha"))
        })
}

/// Load a single env file without overriding variables already set.
///
/// Returns `Ok(false)` when the file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Loaded env file");
            Ok(true)
        }
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::EnvFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

/// Load `.env.local`, `.env`, and `<config_dir>/.env` in that order.
///
/// Earlier files win because loading never overrides existing variables.
/// Returns the files that were actually loaded.
pub fn load_env_files() -> Result<Vec<PathBuf>, ConfigError> {
    let mut candidates: Vec<PathBuf> = LOCAL_ENV_FILES.iter().map(PathBuf::from).collect();
    candidates.push(config_dir().join(".env"));

    let mut loaded = Vec::new();
    for path in candidates {
        if load_env_file(&path)? {
            loaded.push(path);
        }
    }
    Ok(loaded)
}

/// Read a non-empty, trimmed environment variable.
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back to `default` when unset.
pub fn env_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_string(name) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
