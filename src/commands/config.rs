//! Config subcommands handler

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufRead, Write};

use zvox::config::migrate_config;
use zvox::theme::{current_theme, Theme};
use zvox::Config;

/// Show current configuration as TOML.
#[cfg(not(tarpaulin_include))]
pub fn handle_show() -> Result<()> {
    let config = super::load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{}", current_theme().primary_text(toml_str.trim_end()));
    Ok(())
}

/// Open configuration file in the default editor.
///
/// Uses $EDITOR environment variable (defaults to 'vi').
#[cfg(not(tarpaulin_include))]
pub fn handle_edit() -> Result<()> {
    let config_path = Config::config_path()?;
    let theme = current_theme();

    if !config_path.exists() {
        Config::default().save()?;
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    println!(
        "{}",
        theme.primary_text(&format!("Opening {} with {}", config_path.display(), editor))
    );

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()
        .with_context(|| format!("Failed to open editor {editor}"))?;

    Ok(())
}

/// Migrate config file by adding missing fields.
///
/// Reads the existing config file (or empty if it doesn't exist), adds any
/// missing fields from the default config, shows the additions and asks
/// before writing unless `yes` is set.
pub fn handle_migrate(yes: bool) -> Result<()> {
    let theme = current_theme();
    let config_path = Config::config_path()?;
    let file_exists = config_path.exists();

    let content = if file_exists {
        fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?
    } else {
        String::new()
    };

    let result = migrate_config(&content)?;

    if !result.has_changes() {
        println!("{}", theme.primary_text("Config is already up to date."));
        return Ok(());
    }

    if file_exists {
        let fields = result.added_fields.len();
        let sections = result.sections_added.len();
        let summary = if sections > 0 {
            format!("Found {fields} missing field(s) in {sections} new section(s):")
        } else {
            format!("Found {fields} missing field(s):")
        };
        println!("{}", theme.primary_text(&summary));
    } else {
        println!(
            "{}",
            theme.primary_text("Config file does not exist. Will create with default settings.")
        );
    }
    println!();
    for line in diff_preview(
        &result.content,
        &result.added_fields,
        &result.sections_added,
        !file_exists,
    ) {
        match line.strip_prefix("+ ") {
            Some(added) => println!("{}", theme.added_line(added)),
            None => println!("{line}"),
        }
    }
    println!();

    let question = if file_exists {
        format!("Apply these changes to {}?", config_path.display())
    } else {
        format!("Create {}?", config_path.display())
    };
    if !yes && !prompt_confirmation(&theme, &question)? {
        println!("{}", theme.primary_text("No changes made."));
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, &result.content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    let done = if file_exists {
        "Config updated successfully."
    } else {
        "Config file created successfully."
    };
    println!("{}", theme.success_text(done));
    Ok(())
}

/// Lines showing what migration adds.
///
/// Added fields are prefixed with `+ `; the header of a section that gains
/// fields is shown once for context. For a new file everything is added.
fn diff_preview(
    new_content: &str,
    added_fields: &[String],
    new_sections: &[String],
    is_new_file: bool,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut section = String::new();
    let mut pending_header: Option<String> = None;
    let mut section_is_new = false;

    for line in new_content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            section = trimmed[1..trimmed.len() - 1].to_string();
            section_is_new = is_new_file || new_sections.contains(&section);
            pending_header = Some(line.to_string());
            continue;
        }
        let Some(eq) = trimmed.find('=') else {
            continue;
        };
        let key = trimmed[..eq].trim();
        let added = is_new_file || added_fields.contains(&format!("{section}.{key}"));
        if !added {
            continue;
        }
        if let Some(header) = pending_header.take() {
            if section_is_new {
                lines.push(format!("+ {header}"));
            } else {
                lines.push(format!("  {header}"));
            }
        }
        lines.push(format!("+ {line}"));
    }
    lines
}

/// Prompt user for yes/no confirmation.
///
/// If stdin is not a TTY (non-interactive), returns false.
fn prompt_confirmation(theme: &Theme, message: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        println!(
            "{}",
            theme.secondary_text("Non-interactive mode: use --yes to apply changes automatically")
        );
        return Ok(false);
    }

    print!("{} [y/N] ", theme.primary_text(message));
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
