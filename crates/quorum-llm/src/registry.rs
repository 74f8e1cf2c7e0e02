//! Name-keyed adapter registry
//!
//! Built once at startup and passed explicitly to whatever needs adapters.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use quorum_config::{Config, CredentialSource, SERVICE_NAMES};
use quorum_utils::AdapterError;

use crate::adapter::{AdapterSettings, RetryPolicy, RetryingAdapter};
use crate::backends::backend_for;
use crate::persona::persona_for;
use crate::types::ServiceAdapter;

/// Availability summary for one registered service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub name: String,
    pub role: String,
    pub model: String,
    pub credential_source: CredentialSource,
    pub available: bool,
}

#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<dyn ServiceAdapter>>,
    statuses: BTreeMap<String, ServiceStatus>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an adapter under its own name
    pub fn register(&mut self, adapter: Arc<dyn ServiceAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ServiceAdapter>> {
        self.adapters.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Availability of every registered adapter, by name
    #[must_use]
    pub fn availability(&self) -> BTreeMap<String, bool> {
        self.adapters
            .iter()
            .map(|(name, adapter)| (name.clone(), adapter.is_available()))
            .collect()
    }

    /// Status rows for services built from configuration
    pub fn statuses(&self) -> impl Iterator<Item = &ServiceStatus> {
        self.statuses.values()
    }

    /// Build adapters for all five services from `config` and the process environment
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Misconfiguration` if a backend cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, AdapterError> {
        Self::from_config_with(config, |var| std::env::var(var).ok())
    }

    /// Build adapters using `env` for credential lookup
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Misconfiguration` if a backend cannot be built.
    pub fn from_config_with<F>(config: &Config, env: F) -> Result<Self, AdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut registry = Self::new();

        for name in SERVICE_NAMES {
            let persona = persona_for(name).ok_or_else(|| {
                AdapterError::Misconfiguration(format!("no persona for service '{name}'"))
            })?;
            let service = config.service(name);
            let credential = config.resolve_credential_with(name, &env);
            let available = credential.is_available();

            let settings = AdapterSettings {
                model: service
                    .model
                    .clone()
                    .unwrap_or_else(|| persona.default_model.to_string()),
                system_preamble: persona.system_preamble.to_string(),
                temperature: service.temperature.unwrap_or(persona.temperature),
                max_tokens: service.max_tokens.unwrap_or(persona.max_tokens),
                timeout: persona.default_timeout,
                pinned_timeout: service.timeout_secs.map(Duration::from_secs),
                retry: RetryPolicy {
                    max_attempts: service
                        .max_attempts
                        .unwrap_or(config.defaults.max_attempts),
                    delay: Duration::from_secs(
                        service
                            .retry_delay_secs
                            .unwrap_or(config.defaults.retry_delay_secs),
                    ),
                },
            };

            if available {
                debug!(service = name, model = %settings.model, "Service available");
            } else {
                warn!(
                    service = name,
                    credential = %credential.source,
                    "Service unavailable: credential missing"
                );
            }

            let backend = backend_for(name, credential.key.unwrap_or_default(), service.base_url)?;

            registry.statuses.insert(
                name.to_string(),
                ServiceStatus {
                    name: name.to_string(),
                    role: persona.role.to_string(),
                    model: settings.model.clone(),
                    credential_source: credential.source,
                    available,
                },
            );
            registry.register(Arc::new(RetryingAdapter::new(name, backend, settings, available)));
        }

        Ok(registry)
    }
}
