//! Configuration commands for managing kq settings.
//!
//! - `config set`: Set a configuration value
//! - `config show`: Display current configuration

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{Config, ENV_PASSWORD, ENV_SERVER, ENV_USERNAME};
use crate::error::Result;

const SENSITIVE_KEYS: &[&str] = &["password"];

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let entries = config.entries();

    let mut settings = serde_json::Map::new();
    for (key, value) in &entries {
        settings.insert(key.to_string(), json!(value));
    }
    let overrides: Vec<&str> = [ENV_SERVER, ENV_USERNAME, ENV_PASSWORD]
        .into_iter()
        .filter(|name| std::env::var(name).is_ok_and(|v| !v.is_empty()))
        .collect();

    let json_output = json!({
        "settings": settings,
        "env_overrides": overrides,
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));
    for (key, value) in &entries {
        let value = if value == "(not set)" {
            value.dimmed().to_string()
        } else {
            value.clone()
        };
        text_output.push_str(&format!("  {}: {}\n", key.cyan(), value));
    }
    if !overrides.is_empty() {
        text_output.push_str(&format!(
            "\n{} {}\n",
            "Overridden by environment:".yellow(),
            overrides.join(", ")
        ));
    }
    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    let sensitive = SENSITIVE_KEYS.contains(&key);
    let json_output = if sensitive {
        json!({
            "action": "config_set",
            "key": key,
            "success": true,
        })
    } else {
        json!({
            "action": "config_set",
            "key": key,
            "value": value,
            "success": true,
        })
    };
    let text_output = if sensitive {
        format!("Set {}", key.cyan())
    } else {
        format!("Set {} to {}", key.cyan(), value)
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}
