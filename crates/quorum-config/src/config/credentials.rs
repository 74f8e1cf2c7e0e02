//! Credential resolution for service adapters
//!
//! Precedence: `api_key` in the file, then the variable named by
//! `api_key_env`, then the service's conventional variable. Empty values count
//! as absent. The environment is passed in as a lookup function so callers and
//! tests never mutate process state.

use std::fmt;

use super::Config;

/// Conventional environment variable for each service
#[must_use]
pub fn default_api_key_env(service: &str) -> Option<&'static str> {
    match service {
        "perplexity" => Some("PERPLEXITY_API_KEY"),
        "grok" => Some("XAI_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        "claude" => Some("ANTHROPIC_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `api_key` set in the configuration file
    Direct,
    /// Read from the named environment variable
    Env(String),
    /// Nothing found; names the variable that was consulted
    Missing(Option<String>),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "config file"),
            Self::Env(var) => write!(f, "${var}"),
            Self::Missing(Some(var)) => write!(f, "missing (${var} unset)"),
            Self::Missing(None) => write!(f, "missing"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub key: Option<String>,
    pub source: CredentialSource,
}

impl ResolvedCredential {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.key.is_some()
    }
}

// Keep keys out of debug output
impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("source", &self.source)
            .finish()
    }
}

impl Config {
    /// Resolve the credential for `service` using `env` for variable lookup
    pub fn resolve_credential_with<F>(&self, service: &str, env: F) -> ResolvedCredential
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = self.service(service);

        if let Some(key) = settings.api_key.filter(|k| !k.trim().is_empty()) {
            return ResolvedCredential {
                key: Some(key),
                source: CredentialSource::Direct,
            };
        }

        let var = settings
            .api_key_env
            .or_else(|| default_api_key_env(service).map(str::to_string));

        match var {
            Some(var) => match env(&var).filter(|v| !v.trim().is_empty()) {
                Some(key) => ResolvedCredential {
                    key: Some(key),
                    source: CredentialSource::Env(var),
                },
                None => ResolvedCredential {
                    key: None,
                    source: CredentialSource::Missing(Some(var)),
                },
            },
            None => ResolvedCredential {
                key: None,
                source: CredentialSource::Missing(None),
            },
        }
    }

    /// Resolve the credential for `service` from the process environment
    #[must_use]
    pub fn resolve_credential(&self, service: &str) -> ResolvedCredential {
        self.resolve_credential_with(service, |var| std::env::var(var).ok())
    }
}
