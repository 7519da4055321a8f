//! Prompt Library for the generation calls
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/pocket/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! This allows users to customize prompts without modifying the source,
//! while automatically getting new default prompts on upgrade.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const EXTRACT_EXPENSE: &str = include_str!("../../../prompts/extract_expense.md");
    pub const SUGGEST_INVESTMENTS: &str = include_str!("../../../prompts/suggest_investments.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Expense extraction plus category, tips and savings plan
    ExtractExpense,
    /// Investment advice once the trailing window triggers
    SuggestInvestments,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractExpense => "extract_expense",
            Self::SuggestInvestments => "suggest_investments",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::ExtractExpense, Self::SuggestInvestments]
    }

    /// Get the default embedded content for this prompt
    fn default_content(&self) -> &'static str {
        match self {
            Self::ExtractExpense => defaults::EXTRACT_EXPENSE,
            Self::SuggestInvestments => defaults::SUGGEST_INVESTMENTS,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Metadata from frontmatter
    pub metadata: PromptMetadata,
    /// The prompt template
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    /// Path to override file (if any)
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Render the prompt with template variables replaced
    ///
    /// Conditional blocks are resolved on the template itself, then every
    /// `{{var}}` is replaced in one pass. Inserted values are never scanned
    /// again, so template syntax inside a value is kept verbatim.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        // Conditional blocks: {{#if var}}...{{/if}}
        let template = remove_unmatched_conditionals(&self.content, vars);

        // Simple mustache-style replacement: {{var}}
        substitute_vars(&template, vars)
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    /// Override directory path
    override_dir: Option<PathBuf>,
    /// Cached parsed prompts
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("prompt {}", id.as_str())))
    }

    /// Load and render a prompt in one step
    pub fn render(&mut self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        Ok(self.get(id)?.render(vars))
    }

    /// Load a prompt (checking override first, then default)
    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                tracing::debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    /// List all prompts with their status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let has_override = self.has_override(id);
                let version = self.get(id).map(|p| p.metadata.version).unwrap_or(0);
                PromptInfo {
                    id: id.as_str().to_string(),
                    version,
                    has_override,
                    override_path: if has_override {
                        self.override_dir
                            .as_ref()
                            .map(|d| d.join(format!("{}.md", id.as_str())))
                    } else {
                        None
                    },
                }
            })
            .collect()
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        match self.override_dir {
            Some(ref override_dir) => override_dir.join(format!("{}.md", id.as_str())).exists(),
            None => false,
        }
    }

    /// Get the override directory path
    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    /// Prompt identifier
    pub id: String,
    /// Version from metadata
    pub version: u32,
    /// Whether an override exists
    pub has_override: bool,
    /// Path to override file (if exists)
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pocket").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Remove unmatched conditional blocks from the template
/// Replace known `{{var}}` placeholders, leaving unknown ones untouched
fn substitute_vars(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        match vars.get(&after[..end]) {
            Some(value) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = &result[var_start..var_start + var_end];
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_content = &result[block_start..block_start + endif_pos];
        let full_end = block_start + endif_pos + 7;

        let should_include = vars.get(var_name).is_some_and(|v| !v.is_empty());

        result = if should_include {
            format!(
                "{}{}{}",
                &result[..if_start],
                block_content,
                &result[full_end..]
            )
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 1
---

Test prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 1);
        assert_eq!(body, "Test prompt with {{variable}}.");
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("no frontmatter").is_err());
        assert!(parse_prompt("---\nid: x\nversion: 1\n").is_err());
    }

    #[test]
    fn test_prompt_render() {
        let (metadata, body) =
            parse_prompt("---\nid: test\nversion: 1\n---\nHello {{name}}, your value is {{value}}.")
                .unwrap();
        let prompt = Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        };

        let mut vars = HashMap::new();
        vars.insert("name", "World");
        vars.insert("value", "42");

        let rendered = prompt.render(&vars);
        assert_eq!(rendered, "Hello World, your value is 42.");
    }

    #[test]
    fn test_conditional_blocks() {
        let content = "Start{{#if currency}} (in {{currency}}){{/if}} End";

        let mut vars = HashMap::new();
        vars.insert("currency", "INR");
        let result = remove_unmatched_conditionals(content, &vars);
        assert_eq!(result, "Start (in {{currency}}) End");

        let empty_vars: HashMap<&str, &str> = HashMap::new();
        assert_eq!(remove_unmatched_conditionals(content, &empty_vars), "Start End");
    }

    #[test]
    fn test_values_are_inserted_verbatim() {
        let (metadata, body) =
            parse_prompt("---\nid: test\nversion: 1\n---\nQ: '{{query}}' on {{day}}{{#if day}}!{{/if}}")
                .unwrap();
        let prompt = Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        };

        let mut vars = HashMap::new();
        vars.insert("query", "paid {{#if nope}}500{{/if}} on {{day}} {{unknown}}");
        vars.insert("day", "Monday");

        assert_eq!(
            prompt.render(&vars),
            "Q: 'paid {{#if nope}}500{{/if}} on {{day}} {{unknown}}' on Monday!"
        );
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders_are_kept() {
        let mut vars = HashMap::new();
        vars.insert("a", "1");
        assert_eq!(substitute_vars("{{a}} {{b}} {{a", &vars), "1 {{b}} {{a");
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let (metadata, body) = parse_prompt(id.default_content()).unwrap();
            assert_eq!(metadata.id, id.as_str(), "Prompt ID mismatch");
            assert!(body.contains("JSON"));
        }
    }

    #[test]
    fn test_extract_prompt_renders_all_vars() {
        let mut lib = PromptLibrary::embedded_only();
        let mut vars = HashMap::new();
        vars.insert("query", "Spent 500 on groceries yesterday");
        vars.insert("yesterday", "2024-05-01");
        vars.insert("currency", "INR");

        let rendered = lib.render(PromptId::ExtractExpense, &vars).unwrap();
        assert!(rendered.contains("'Spent 500 on groceries yesterday'"));
        assert!(rendered.contains("assume yesterday (2024-05-01)"));
        assert!(rendered.contains("(in INR)"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_investment_prompt_renders_all_vars() {
        let mut lib = PromptLibrary::embedded_only();
        let mut vars = HashMap::new();
        vars.insert("total_savings", "600");
        vars.insert("months_checked", "6");
        vars.insert("currency", "INR");

        let rendered = lib.render(PromptId::SuggestInvestments, &vars).unwrap();
        assert!(rendered.contains("User has saved 600 INR over 6 months."));
        assert!(rendered.contains("{\"investment_suggestions\""));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("suggest_investments.md"),
            "---\nid: suggest_investments\nversion: 7\n---\nCustom {{total_savings}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::SuggestInvestments));
        assert!(!lib.has_override(PromptId::ExtractExpense));

        let prompt = lib.get(PromptId::SuggestInvestments).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 7);

        let infos = lib.list();
        assert_eq!(infos.len(), 2);
        let info = infos
            .iter()
            .find(|i| i.id == "suggest_investments")
            .unwrap();
        assert!(info.has_override);
        assert_eq!(info.version, 7);
        assert!(info.override_path.is_some());
    }

    #[test]
    fn test_embedded_only_has_no_overrides() {
        let mut lib = PromptLibrary::embedded_only();
        for info in lib.list() {
            assert!(!info.has_override);
            assert!(info.version >= 1);
        }
        assert!(lib.override_dir().is_none());
    }
}
