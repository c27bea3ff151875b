#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Malformed API key in {env_var}")]
    MalformedApiKey { env_var: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    GeminiPro,
    GeminiFlash,
}

pub struct ProviderConfig {
    pub api_base: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::GeminiPro => ProviderConfig {
                api_base: GEMINI_API_BASE,
                model: "gemini-2.5-pro",
                env_var: "GEMINI_API_KEY",
            },
            Provider::GeminiFlash => ProviderConfig {
                api_base: GEMINI_API_BASE,
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::GeminiPro => "Gemini 2.5 Pro",
            Provider::GeminiFlash => "Gemini 2.5 Flash",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String, ProviderError> {
        self.api_key_from(|key| std::env::var(key).ok())
    }

    pub fn api_key_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ProviderError> {
        let env_var = self.config().env_var;
        let key = lookup(env_var)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                env_var: env_var.to_string(),
            })?;

        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ProviderError::MalformedApiKey {
                env_var: env_var.to_string(),
            });
        }

        Ok(key)
    }
}
