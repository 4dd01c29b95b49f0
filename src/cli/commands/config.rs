//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let config_path = Settings::default_config_path();
            let updated = set_config_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::info(&format!("Saved to {}", config_path.display()));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Apply a dotted-key assignment like `questions.batch_size = 8` on top of
/// the current settings.
fn set_config_value(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let mut target = &mut root;
    let segments: Vec<&str> = key.split('.').collect();
    let (last, path) = segments
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Empty configuration key"))?;

    for segment in path {
        target = target
            .get_mut(segment)
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration section: {}", segment))?;
    }

    let table = target
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("Not a configuration section: {}", key))?;
    let existing = table
        .get(*last)
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;

    // Parse the value with the same type as the current one.
    let parsed = match existing {
        toml::Value::Integer(_) => toml::Value::Integer(
            value
                .parse()
                .map_err(|_| anyhow::anyhow!("Expected an integer for {}", key))?,
        ),
        toml::Value::Float(_) => toml::Value::Float(
            value
                .parse()
                .map_err(|_| anyhow::anyhow!("Expected a number for {}", key))?,
        ),
        toml::Value::Boolean(_) => toml::Value::Boolean(
            value
                .parse()
                .map_err(|_| anyhow::anyhow!("Expected true or false for {}", key))?,
        ),
        toml::Value::Array(_) => toml::Value::Array(
            value
                .split(',')
                .map(|v| toml::Value::String(v.trim().to_string()))
                .collect(),
        ),
        _ => toml::Value::String(value.to_string()),
    };
    table.insert((*last).to_string(), parsed);

    let updated: Settings = root
        .try_into()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_integer_value() {
        let settings = Settings::default();
        let updated = set_config_value(&settings, "questions.batch_size", "8").unwrap();
        assert_eq!(updated.questions.batch_size, 8);
        // Untouched values survive.
        assert_eq!(updated.questions.max_per_video, 15);
    }

    #[test]
    fn test_set_string_and_bool_values() {
        let settings = Settings::default();
        let updated = set_config_value(&settings, "generator.model", "gpt-4o").unwrap();
        assert_eq!(updated.generator.model, "gpt-4o");

        let updated = set_config_value(&settings, "questions.auto_generate", "false").unwrap();
        assert!(!updated.questions.auto_generate);
    }

    #[test]
    fn test_set_array_value() {
        let settings = Settings::default();
        let updated = set_config_value(
            &settings,
            "questions.question_types",
            "comprehension, vocabulary",
        )
        .unwrap();
        assert_eq!(
            updated.questions.question_types,
            vec!["comprehension".to_string(), "vocabulary".to_string()]
        );
    }

    #[test]
    fn test_set_rejects_unknown_key_and_bad_type() {
        let settings = Settings::default();
        assert!(set_config_value(&settings, "questions.nope", "1").is_err());
        assert!(set_config_value(&settings, "nope.nope", "1").is_err());
        assert!(set_config_value(&settings, "questions.batch_size", "abc").is_err());
    }
}
