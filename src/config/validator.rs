use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Flags configuration fields oxmon does not recognise
pub struct ConfigValidator {
    /// Known `section.field` keys
    known_fields: HashSet<&'static str>,
    /// Known section names
    known_sections: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_sections = ["watch", "notify", "logging"].into_iter().collect();
        let known_fields = [
            "watch.interval",
            "watch.max_cycles",
            "watch.threads",
            "watch.follow_symlinks",
            "watch.ignore_patterns",
            "notify.notifiers",
            "logging.level",
        ]
        .into_iter()
        .collect();

        Self {
            known_fields,
            known_sections,
        }
    }

    /// Validate a configuration file and warn about unknown fields
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<Vec<String>> {
        if !config_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let parsed: toml::Value = toml::from_str(&content)?;

        let unknown = self.unknown_fields(&parsed);
        if !unknown.is_empty() {
            eprintln!("{}", "Configuration warnings:".yellow().bold());
            for field in &unknown {
                eprintln!("  Unknown configuration field: {}", field.yellow());
            }
            eprintln!();
        }

        Ok(unknown)
    }

    /// Dotted paths of every unrecognised key in `root`
    #[must_use]
    pub fn unknown_fields(&self, root: &toml::Value) -> Vec<String> {
        let mut unknown = Vec::new();
        let toml::Value::Table(sections) = root else {
            return unknown;
        };

        for (section, value) in sections {
            if !self.known_sections.contains(section.as_str()) {
                unknown.push(section.clone());
                continue;
            }
            let toml::Value::Table(fields) = value else {
                unknown.push(section.clone());
                continue;
            };
            for key in fields.keys() {
                let full_key = format!("{section}.{key}");
                if !self.known_fields.contains(full_key.as_str()) {
                    unknown.push(full_key);
                }
            }
        }

        unknown.sort();
        unknown
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fields_pass() {
        let value: toml::Value = toml::from_str(
            r#"
[watch]
interval = "1s"
threads = 2

[notify]
notifiers = ["echo"]
"#,
        )
        .unwrap();
        assert!(ConfigValidator::new().unknown_fields(&value).is_empty());
    }

    #[test]
    fn test_unknown_fields_reported() {
        let value: toml::Value = toml::from_str(
            r#"
[watch]
intervall = "1s"

[remote]
url = "x"
"#,
        )
        .unwrap();
        assert_eq!(
            ConfigValidator::new().unknown_fields(&value),
            vec!["remote", "watch.intervall"]
        );
    }

    #[test]
    fn test_missing_file_has_no_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let warnings = ConfigValidator::new()
            .validate_config_file(&dir.path().join("absent.toml"))
            .unwrap();
        assert!(warnings.is_empty());
    }
}
