//! `quorum status`

use anyhow::{Context, Result};
use quorum_config::Config;
use quorum_llm::{AdapterRegistry, ServiceStatus};
use quorum_utils::canonicalization::emit_jcs;
use serde_json::{Value, json};

/// List every registered service with its model, credential source and
/// availability
pub fn execute_status_command(config: &Config, json: bool) -> Result<()> {
    let registry = AdapterRegistry::from_config(config).context("Failed to build service adapters")?;
    let statuses: Vec<&ServiceStatus> = registry.statuses().collect();

    if json {
        let output = emit_jcs(&status_document(config, &statuses))
            .context("Failed to emit status JSON")?;
        println!("{output}");
        return Ok(());
    }

    match &config.config_file {
        Some(path) => println!("Configuration: {}", path.display()),
        None => println!("Configuration: built-in defaults"),
    }
    for (key, value, source) in config.effective_defaults() {
        println!("  {key} = {value}  [{source}]");
    }

    println!("\nServices:");
    for status in &statuses {
        let mark = if status.available { "✓" } else { "✗" };
        println!(
            "  {mark} {:<11} {:<28} {:<26} {}",
            status.name, status.model, status.role, status.credential_source
        );
    }

    let available = statuses.iter().filter(|s| s.available).count();
    println!("\n{available}/{} services available", statuses.len());
    if available < statuses.len() {
        println!("Tasks bound to unavailable services are skipped during `quorum run`.");
    }
    Ok(())
}

fn status_document(config: &Config, statuses: &[&ServiceStatus]) -> Value {
    json!({
        "config_file": config.config_file.as_ref().map(|p| p.display().to_string()),
        "services": statuses
            .iter()
            .map(|s| json!({
                "name": s.name,
                "role": s.role,
                "model": s.model,
                "credential_source": s.credential_source.to_string(),
                "available": s.available,
            }))
            .collect::<Vec<_>>(),
    })
}
