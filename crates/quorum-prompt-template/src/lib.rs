//! Prompt templates for quorum tasks
//!
//! Templates are plain text files addressed by phase folder and task name:
//! `<prompts_dir>/<phase>/<task>.md` (or `.txt`). `{placeholder}` tokens are
//! substituted from a context map; unknown placeholders stay literal.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Extensions tried in order when resolving a template file
pub const TEMPLATE_EXTENSIONS: [&str; 2] = ["md", "txt"];

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("No template for {phase}/{task} under {}", dir.display())]
    TemplateNotFound {
        phase: String,
        task: String,
        dir: PathBuf,
    },

    #[error("Failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves a (phase, task) pair to a rendered prompt
pub trait PromptProvider: Send + Sync {
    /// # Errors
    ///
    /// `TemplateNotFound` when no template exists for the pair; callers fall
    /// back to [`synthetic_prompt`].
    fn resolve(
        &self,
        phase: &str,
        task: &str,
        context: &BTreeMap<String, String>,
    ) -> Result<String, PromptError>;
}

/// Substitute `{key}` tokens from `context`.
///
/// Keys are runs of ASCII letters, digits, `_`, `-` or `.`. A token whose key
/// is absent from `context`, or that is not a valid key, is copied through
/// unchanged. Substituted values are not rendered again.
#[must_use]
pub fn render(template: &str, context: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
            .unwrap_or(after.len());
        let key = &after[..key_len];
        let closed = after[key_len..].starts_with('}');

        match context.get(key) {
            Some(value) if closed && !key.is_empty() => {
                out.push_str(value);
                rest = &after[key_len + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Fallback prompt for a task with no template
#[must_use]
pub fn synthetic_prompt(phase: &str, task: &str, context: &BTreeMap<String, String>) -> String {
    let mut prompt = format!(
        "Phase: {phase}\nTask: {task}\n\nProduce a thorough analysis for this task. \
         End with a fenced json block summarizing key figures."
    );
    if !context.is_empty() {
        prompt.push_str("\n\nContext:");
        for (key, value) in context {
            prompt.push_str(&format!("\n- {key}: {value}"));
        }
    }
    prompt
}

/// Templates read from a directory tree
#[derive(Debug, Clone)]
pub struct FilePromptProvider {
    root: PathBuf,
}

impl FilePromptProvider {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_path(&self, phase: &str, task: &str) -> Option<PathBuf> {
        TEMPLATE_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(phase).join(format!("{task}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl PromptProvider for FilePromptProvider {
    fn resolve(
        &self,
        phase: &str,
        task: &str,
        context: &BTreeMap<String, String>,
    ) -> Result<String, PromptError> {
        let path = self
            .template_path(phase, task)
            .ok_or_else(|| PromptError::TemplateNotFound {
                phase: phase.to_string(),
                task: task.to_string(),
                dir: self.root.clone(),
            })?;

        debug!(phase = phase, task = task, path = %path.display(), "Loading prompt template");

        let template = std::fs::read_to_string(&path).map_err(|source| PromptError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(render(&template, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_known_keys() {
        let out = render(
            "Review {project} for {audience}.",
            &ctx(&[("project", "Acme"), ("audience", "investors")]),
        );
        assert_eq!(out, "Review Acme for investors.");
    }

    #[test]
    fn test_render_leaves_unknown_keys_literal() {
        let out = render("Hello {name}, see {missing}.", &ctx(&[("name", "Ada")]));
        assert_eq!(out, "Hello Ada, see {missing}.");
    }

    #[test]
    fn test_render_ignores_json_braces() {
        let template = "Return {\"total\": 1} for {project}. {unterminated";
        let out = render(template, &ctx(&[("project", "Acme")]));
        assert_eq!(out, "Return {\"total\": 1} for Acme. {unterminated");
    }

    #[test]
    fn test_render_does_not_recurse() {
        let out = render("{a}", &ctx(&[("a", "{b}"), ("b", "x")]));
        assert_eq!(out, "{b}");
    }

    #[test]
    fn test_render_adjacent_and_dotted_keys() {
        let out = render("{a}{b}-{c.d}", &ctx(&[("a", "1"), ("b", "2"), ("c.d", "3")]));
        assert_eq!(out, "12-3");
    }

    #[test]
    fn test_synthetic_prompt_includes_context() {
        let prompt = synthetic_prompt("spec_hardening", "edge_case_matrix", &ctx(&[("project", "Acme")]));
        assert!(prompt.starts_with("Phase: spec_hardening\nTask: edge_case_matrix\n\n"));
        assert!(prompt.contains("fenced json block"));
        assert!(prompt.ends_with("- project: Acme"));
    }

    #[test]
    fn test_file_provider_prefers_md_then_txt() {
        let dir = TempDir::new().unwrap();
        let phase_dir = dir.path().join("research_validation");
        fs::create_dir_all(&phase_dir).unwrap();
        fs::write(phase_dir.join("funding_scan.txt"), "txt {project}").unwrap();

        let provider = FilePromptProvider::new(dir.path());
        let context = ctx(&[("project", "Acme")]);

        assert_eq!(
            provider.resolve("research_validation", "funding_scan", &context).unwrap(),
            "txt Acme"
        );

        fs::write(phase_dir.join("funding_scan.md"), "md {project}").unwrap();
        assert_eq!(
            provider.resolve("research_validation", "funding_scan", &context).unwrap(),
            "md Acme"
        );
    }

    #[test]
    fn test_file_provider_missing_template() {
        let dir = TempDir::new().unwrap();
        let provider = FilePromptProvider::new(dir.path());

        let err = provider
            .resolve("vulnerability_audit", "assumption_audit", &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, PromptError::TemplateNotFound { .. }));
    }

    proptest! {
        #[test]
        fn prop_render_without_braces_is_identity(text in "[^{}]{0,80}") {
            prop_assert_eq!(render(&text, &ctx(&[("x", "y")])), text);
        }

        #[test]
        fn prop_render_with_empty_context_is_identity(text in ".{0,80}") {
            prop_assert_eq!(render(&text, &BTreeMap::new()), text);
        }

        #[test]
        fn prop_known_key_fully_substituted(key in "[a-z_]{1,12}", value in "[A-Za-z0-9 ]{0,20}") {
            let template = format!("<{{{key}}}>");
            prop_assert_eq!(render(&template, &ctx(&[(key.as_str(), value.as_str())])), format!("<{value}>"));
        }
    }
}
