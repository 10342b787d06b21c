//! Dispatch configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound on a single service call (seconds).
    #[serde(with = "vizor_pipeline::diagnostics::duration_serde")]
    pub timeout: Duration,

    /// Prompt sent with every region in a description pass.
    pub describe_prompt: String,

    /// Language code passed to the translator.
    pub target_language: String,
}

impl DispatchConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_DESCRIBE_PROMPT: &str =
        "Describe the image: I want the data presented in this way: Name, HP, Card number";
    pub const DEFAULT_TARGET_LANGUAGE: &str = "en";
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            describe_prompt: Self::DEFAULT_DESCRIBE_PROMPT.to_string(),
            target_language: Self::DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: DispatchConfig =
            serde_json::from_str(r#"{"timeout": 2.5, "target_language": "de"}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.target_language, "de");
        assert_eq!(config.describe_prompt, DispatchConfig::DEFAULT_DESCRIBE_PROMPT);
    }

    #[test]
    fn round_trip() {
        let config = DispatchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: DispatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
