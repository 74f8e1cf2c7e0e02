use std::collections::BTreeSet;

use quorum_utils::ConfigError;
use quorum_utils::atomic_write::is_single_component;

use super::{Config, is_known_service};

fn invalid(key: impl Into<String>, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be greater than 0"));
        }

        let threshold = self.defaults.conflict_threshold;
        if !(threshold > 0.0 && threshold <= 10.0) {
            return Err(invalid(
                "conflict_threshold",
                format!("{threshold} is outside (0, 10]"),
            ));
        }

        for (name, service) in &self.services {
            if !is_known_service(name) {
                return Err(invalid(
                    format!("services.{name}"),
                    "unknown service (expected perplexity, grok, gemini, claude or openai)",
                ));
            }
            if service.max_attempts == Some(0) {
                return Err(invalid(
                    format!("services.{name}.max_attempts"),
                    "must be greater than 0",
                ));
            }
            if service.timeout_secs == Some(0) {
                return Err(invalid(
                    format!("services.{name}.timeout_secs"),
                    "must be greater than 0",
                ));
            }
            if let Some(t) = service.temperature
                && !(0.0..=2.0).contains(&t)
            {
                return Err(invalid(
                    format!("services.{name}.temperature"),
                    format!("{t} is outside [0, 2]"),
                ));
            }
        }

        let mut phase_names = BTreeSet::new();
        for phase in &self.phases {
            let key = |field: &str| format!("phases.{}.{field}", phase.name);

            if phase.name.trim().is_empty() {
                return Err(invalid("phases.name", "must not be empty"));
            }
            if !is_single_component(&phase.name) {
                return Err(invalid(key("name"), "not usable as an output directory name"));
            }
            // `all` selects every phase on the command line
            if phase.name == "all" {
                return Err(invalid(key("name"), "'all' is reserved"));
            }
            if !phase_names.insert(phase.name.as_str()) {
                return Err(invalid(key("name"), "duplicate phase name"));
            }
            if phase.parallel_limit == 0 {
                return Err(invalid(key("parallel_limit"), "must be greater than 0"));
            }
            if phase.task_timeout_secs == 0 {
                return Err(invalid(key("task_timeout_secs"), "must be greater than 0"));
            }
            if phase.tasks.is_empty() {
                return Err(invalid(key("tasks"), "must list at least one task"));
            }

            let mut seen = BTreeSet::new();
            for task in &phase.tasks {
                if !is_single_component(task) {
                    return Err(invalid(
                        key("tasks"),
                        format!("task '{task}' is not usable as an output file name"),
                    ));
                }
                if !seen.insert(task.as_str()) {
                    return Err(invalid(key("tasks"), format!("duplicate task '{task}'")));
                }
                match phase.services.get(task) {
                    None => {
                        return Err(invalid(
                            key("services"),
                            format!("task '{task}' has no service binding"),
                        ));
                    }
                    Some(service) if !is_known_service(service) => {
                        return Err(invalid(
                            key("services"),
                            format!("task '{task}' is bound to unknown service '{service}'"),
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PhaseConfig, ServiceConfig};
    use std::collections::BTreeMap;

    fn phase(name: &str, tasks: &[(&str, &str)]) -> PhaseConfig {
        PhaseConfig {
            name: name.to_string(),
            tasks: tasks.iter().map(|(t, _)| (*t).to_string()).collect(),
            services: tasks
                .iter()
                .map(|(t, s)| ((*t).to_string(), (*s).to_string()))
                .collect::<BTreeMap<_, _>>(),
            gate_required: true,
            parallel_limit: 2,
            task_timeout_secs: 60,
        }
    }

    fn assert_invalid(config: &Config, expected_key: &str) {
        match config.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected InvalidValue for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let mut config = Config::default();
        config.defaults.max_attempts = 0;
        assert_invalid(&config, "max_attempts");
    }

    #[test]
    fn test_threshold_bounds() {
        let mut config = Config::default();
        config.defaults.conflict_threshold = 0.0;
        assert_invalid(&config, "conflict_threshold");

        config.defaults.conflict_threshold = 10.5;
        assert_invalid(&config, "conflict_threshold");

        config.defaults.conflict_threshold = 10.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_service_section_rejected() {
        let mut config = Config::default();
        config
            .services
            .insert("mistral".to_string(), ServiceConfig::default());
        assert_invalid(&config, "services.mistral");
    }

    #[test]
    fn test_phase_bound_to_unknown_service_rejected() {
        let mut config = Config::default();
        config.phases.push(phase("extra", &[("scan", "llama")]));
        assert_invalid(&config, "phases.extra.services");
    }

    #[test]
    fn test_unbound_task_rejected() {
        let mut config = Config::default();
        let mut p = phase("extra", &[("scan", "grok")]);
        p.tasks.push("orphan".to_string());
        config.phases.push(p);
        assert_invalid(&config, "phases.extra.services");
    }

    #[test]
    fn test_duplicate_task_rejected() {
        let mut config = Config::default();
        let mut p = phase("extra", &[("scan", "grok")]);
        p.tasks.push("scan".to_string());
        config.phases.push(p);
        assert_invalid(&config, "phases.extra.tasks");
    }

    #[test]
    fn test_zero_parallel_limit_rejected() {
        let mut config = Config::default();
        let mut p = phase("extra", &[("scan", "grok")]);
        p.parallel_limit = 0;
        config.phases.push(p);
        assert_invalid(&config, "phases.extra.parallel_limit");
    }

    #[test]
    fn test_duplicate_phase_rejected() {
        let mut config = Config::default();
        config.phases.push(phase("extra", &[("scan", "grok")]));
        config.phases.push(phase("extra", &[("scan", "claude")]));
        assert_invalid(&config, "phases.extra.name");
    }

    #[test]
    fn test_task_name_must_be_a_file_name() {
        let mut config = Config::default();
        config.phases.push(phase("extra", &[("a/b", "grok")]));
        assert_invalid(&config, "phases.extra.tasks");
    }

    #[test]
    fn test_phase_name_must_be_a_directory_name() {
        let mut config = Config::default();
        config.phases.push(phase("..", &[("scan", "grok")]));
        assert_invalid(&config, "phases....name");

        let mut config = Config::default();
        config.phases.push(phase("all", &[("scan", "grok")]));
        assert_invalid(&config, "phases.all.name");
    }
}
