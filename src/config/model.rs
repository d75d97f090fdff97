use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCAL_API_URL: &str = "http://127.0.0.1:11434/api/generate";
pub const DEFAULT_LOCAL_MODEL: &str = "deepseek-r1:8b";
pub const DEFAULT_REMOTE_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-4.1-mini";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ApiMode {
    #[default]
    Local,
    Remote,
}

impl std::fmt::Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiMode::Local => write!(f, "local"),
            ApiMode::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    pub mode: ApiMode,

    pub url: String,

    pub model: String,

    /// Bearer key for remote endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Reserved companion secret. Stored but never attached to requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            mode: ApiMode::Local,
            url: DEFAULT_LOCAL_API_URL.to_string(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
            key: None,
            secret: None,
        }
    }
}

impl ApiConfig {
    pub fn require_key(&self) -> miette::Result<&str> {
        self.key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                miette::miette!("remote mode requires an API key, set `api.key` in jsrecon.toml")
            })
    }

    /// Base URL for auxiliary endpoints, the configured URL truncated at `/v1/`.
    pub fn base_url(&self) -> &str {
        match self.url.find("/v1/") {
            Some(idx) => &self.url[..idx],
            None => self.url.trim_end_matches('/'),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RootConfig {
    pub api: ApiConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_truncates_at_v1() {
        let config = ApiConfig {
            url: "https://api.example.com/v1/chat/completions".to_string(),
            ..ApiConfig::default()
        };

        assert_eq!(config.base_url(), "https://api.example.com");
    }

    #[test]
    fn base_url_falls_back_to_trimmed_url() {
        let config = ApiConfig {
            url: "http://127.0.0.1:11434/".to_string(),
            ..ApiConfig::default()
        };

        assert_eq!(config.base_url(), "http://127.0.0.1:11434");
    }

    #[test]
    fn require_key_rejects_blank() {
        let config = ApiConfig {
            mode: ApiMode::Remote,
            key: Some("  ".to_string()),
            ..ApiConfig::default()
        };

        assert!(config.require_key().is_err());
    }
}
