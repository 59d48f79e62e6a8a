use url::Url;

use crate::LlmClientError;

/// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
#[derive(Debug, Clone)]
pub struct ApiURL(String);

impl AsRef<str> for ApiURL {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ApiURL {
    /// Validates the base URL. Only `http` and `https` are accepted.
    pub fn parse(base: &str) -> Result<Self, LlmClientError> {
        let url = Url::parse(base)
            .map_err(|e| LlmClientError::InvalidConfig(format!("invalid api base '{base}': {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(Self(base.trim_end_matches('/').to_string())),
            other => Err(LlmClientError::InvalidConfig(format!(
                "unsupported scheme '{other}' in api base"
            ))),
        }
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }
}
