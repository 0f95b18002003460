use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::extract::url::DEFAULT_FETCH_TIMEOUT;
use crate::extract::DEFAULT_CHAR_LIMIT;
use crate::llm_client::sampling::DEFAULT_MAX_TOKENS;
use crate::llm_client::{
    cohere, groq, huggingface, ollama, ApiKey, CohereConfig, GroqConfig, HuggingFaceConfig,
    OllamaConfig, ProviderConfig, ProviderKind, SamplingPolicy,
};
use crate::proposal::builder::DEFAULT_FRAGMENT_CAP;

/// Application configuration loaded from environment variables.
/// Only API keys lack defaults; a provider without its key is simply not configured.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub default_provider: ProviderKind,
    pub fetch_timeout: Duration,
    pub extract_char_limit: usize,
    pub prompt_fragment_cap: usize,
    pub providers: ProviderSettings,
}

/// Typed settings for every provider, built once at startup and passed in explicitly.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub ollama: OllamaConfig,
    pub groq: Option<GroqConfig>,
    pub huggingface: Option<HuggingFaceConfig>,
    pub cohere: Option<CohereConfig>,
}

impl ProviderSettings {
    /// The config for `kind`, or `None` when its credentials are missing.
    pub fn resolve(&self, kind: ProviderKind) -> Option<ProviderConfig> {
        match kind {
            ProviderKind::Ollama => Some(ProviderConfig::Ollama(self.ollama.clone())),
            ProviderKind::Groq => self.groq.clone().map(ProviderConfig::Groq),
            ProviderKind::HuggingFace => self.huggingface.clone().map(ProviderConfig::HuggingFace),
            ProviderKind::Cohere => self.cohere.clone().map(ProviderConfig::Cohere),
        }
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Ollama => true,
            ProviderKind::Groq => self.groq.is_some(),
            ProviderKind::HuggingFace => self.huggingface.is_some(),
            ProviderKind::Cohere => self.cohere.is_some(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let llm_timeout = Duration::from_secs(env.parse("LLM_TIMEOUT_SECS", 60u64)?);
        let extract_char_limit = env.parse("EXTRACT_CHAR_LIMIT", DEFAULT_CHAR_LIMIT)?;
        let prompt_fragment_cap = env.parse("PROMPT_FRAGMENT_CAP", DEFAULT_FRAGMENT_CAP)?;
        if extract_char_limit == 0 || prompt_fragment_cap == 0 {
            bail!("EXTRACT_CHAR_LIMIT and PROMPT_FRAGMENT_CAP must be greater than zero");
        }

        let ollama = OllamaConfig {
            base_url: env.or("OLLAMA_BASE_URL", ollama::DEFAULT_BASE_URL),
            model: env.or("OLLAMA_MODEL", ollama::DEFAULT_MODEL),
            sampling: SamplingPolicy::default(),
            timeout: llm_timeout,
        };

        let groq = match env.get("GROQ_API_KEY") {
            Some(key) => Some(GroqConfig {
                base_url: env.or("GROQ_BASE_URL", groq::DEFAULT_BASE_URL),
                model: env.or("GROQ_MODEL", groq::DEFAULT_MODEL),
                fallback_model: env.or("GROQ_FALLBACK_MODEL", groq::DEFAULT_FALLBACK_MODEL),
                sampling: parse_groq_sampling(env.get("GROQ_SAMPLING").as_deref())?,
                timeout: llm_timeout,
                ..GroqConfig::new(ApiKey::new(key))
            }),
            None => None,
        };

        let huggingface = match env.get("HF_API_KEY") {
            Some(key) => Some(HuggingFaceConfig {
                base_url: env.or("HF_BASE_URL", huggingface::DEFAULT_BASE_URL),
                model: env.or("HF_MODEL", huggingface::DEFAULT_MODEL),
                loading_retry_delay: Duration::from_secs(env.parse(
                    "HF_LOADING_RETRY_SECS",
                    huggingface::DEFAULT_LOADING_RETRY_DELAY.as_secs(),
                )?),
                timeout: llm_timeout,
                ..HuggingFaceConfig::new(ApiKey::new(key))
            }),
            None => None,
        };

        let cohere = match env.get("COHERE_API_KEY") {
            Some(key) => Some(CohereConfig {
                base_url: env.or("COHERE_BASE_URL", cohere::DEFAULT_BASE_URL),
                model: env.or("COHERE_MODEL", cohere::DEFAULT_MODEL),
                timeout: llm_timeout,
                ..CohereConfig::new(ApiKey::new(key))
            }),
            None => None,
        };

        let default_provider = match env.get("DEFAULT_PROVIDER") {
            Some(raw) => raw
                .parse::<ProviderKind>()
                .map_err(|e| anyhow!("DEFAULT_PROVIDER: {e}"))?,
            None => ProviderKind::Ollama,
        };

        Ok(Config {
            port: env.parse("PORT", 8080u16)?,
            rust_log: env.or("RUST_LOG", "info"),
            default_provider,
            fetch_timeout: Duration::from_secs(
                env.parse("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT.as_secs())?,
            ),
            extract_char_limit,
            prompt_fragment_cap,
            providers: ProviderSettings {
                ollama,
                groq,
                huggingface,
                cohere,
            },
        })
    }
}

fn parse_groq_sampling(raw: Option<&str>) -> Result<SamplingPolicy> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None | Some("fixed") => Ok(SamplingPolicy::default()),
        Some("random") | Some("randomized") => Ok(SamplingPolicy::randomized(DEFAULT_MAX_TOKENS)),
        Some(other) => bail!("GROQ_SAMPLING must be 'fixed' or 'random', got '{other}'"),
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow!("{e}"))
                .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_any_variables() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.default_provider, ProviderKind::Ollama);
        assert_eq!(config.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.extract_char_limit, 8000);
        assert_eq!(config.prompt_fragment_cap, 4000);
        assert_eq!(config.providers.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.providers.ollama.timeout, Duration::from_secs(60));
        assert!(config.providers.groq.is_none());
        assert!(config.providers.huggingface.is_none());
        assert!(config.providers.cohere.is_none());
    }

    #[test]
    fn test_provider_is_configured_only_with_credentials() {
        let config = config_from(&[("GROQ_API_KEY", "gsk-1"), ("HF_API_KEY", "  ")]).unwrap();
        assert!(config.providers.is_configured(ProviderKind::Groq));
        assert!(!config.providers.is_configured(ProviderKind::HuggingFace));
        assert!(config.providers.resolve(ProviderKind::HuggingFace).is_none());

        let groq = config.providers.resolve(ProviderKind::Groq).unwrap();
        assert_eq!(groq.model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("DEFAULT_PROVIDER", "huggingface"),
            ("HF_API_KEY", "hf_x"),
            ("HF_MODEL", "tiiuae/falcon-7b-instruct"),
            ("HF_LOADING_RETRY_SECS", "5"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("PROMPT_FRAGMENT_CAP", "2500"),
            ("FETCH_TIMEOUT_SECS", "3"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.default_provider, ProviderKind::HuggingFace);
        assert_eq!(config.prompt_fragment_cap, 2500);
        assert_eq!(config.providers.ollama.base_url, "http://gpu-box:11434");
        let hf = config.providers.huggingface.unwrap();
        assert_eq!(hf.model, "tiiuae/falcon-7b-instruct");
        assert_eq!(hf.loading_retry_delay, Duration::from_secs(5));
        assert_eq!(hf.api_key.expose(), "hf_x");
    }

    #[test]
    fn test_groq_random_sampling() {
        let config = config_from(&[("GROQ_API_KEY", "k"), ("GROQ_SAMPLING", "random")]).unwrap();
        let groq = config.providers.groq.unwrap();
        assert!(matches!(groq.sampling, SamplingPolicy::Randomized { .. }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("DEFAULT_PROVIDER", "openai")]).is_err());
        assert!(config_from(&[("GROQ_API_KEY", "k"), ("GROQ_SAMPLING", "wild")]).is_err());
        assert!(config_from(&[("EXTRACT_CHAR_LIMIT", "0")]).is_err());
    }

    #[test]
    fn test_debug_output_hides_keys() {
        let config = config_from(&[("COHERE_API_KEY", "super-secret")]).unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
