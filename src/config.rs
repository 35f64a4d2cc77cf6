// src/config.rs
use crate::errors::MermaiderError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub bind_addr: String,
}

impl Config {
    /// Reads configuration once at startup. A missing credential aborts here
    /// with a clear message instead of failing at the first generation call.
    pub fn from_env() -> Result<Self, MermaiderError> {
        Self::from_vars(
            std::env::var("OPENAI_API_KEY").ok(),
            std::env::var("BIND_ADDR").ok(),
        )
    }

    fn from_vars(
        api_key: Option<String>,
        bind_addr: Option<String>,
    ) -> Result<Self, MermaiderError> {
        let openai_api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            MermaiderError::Configuration(
                "OPENAI_API_KEY must be set in the environment".to_string(),
            )
        })?;
        Ok(Self {
            openai_api_key,
            bind_addr: bind_addr.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_fails_fast() {
        let err = Config::from_vars(None, None).unwrap_err();
        assert!(matches!(err, MermaiderError::Configuration(_)));

        let err = Config::from_vars(Some("  ".into()), None).unwrap_err();
        assert!(matches!(err, MermaiderError::Configuration(_)));
    }

    #[test]
    fn bind_addr_defaults() {
        let config = Config::from_vars(Some("sk-test".into()), None).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);

        let config =
            Config::from_vars(Some("sk-test".into()), Some("127.0.0.1:9000".into())).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }
}
