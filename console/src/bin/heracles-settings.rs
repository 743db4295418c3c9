//! Command-line front end for the Heracles settings panels.
//!
//! Each command opens a fresh panel, applies its edits and saves through the
//! same code paths the interactive console uses.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;

use heracles_console_lib::config::defaults::all_settings;
use heracles_console_lib::notices::NoticeLevel;
use heracles_console_lib::panel::{PanelError, SaveOutcome, SettingsBackend, SettingsConsole};
use settings_engine::{ConfirmationPrompt, FieldDescriptor, SettingsForm};

/// Inspect and edit Heracles configuration.
#[derive(Parser)]
#[command(name = "heracles-settings")]
#[command(about = "Inspect and edit Heracles settings and plugin configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List settings categories.
    Categories,

    /// Show the settings of one category.
    Show {
        category: String,
    },

    /// Change settings in a category.
    ///
    /// Each changed setting is written separately; the first rejected write
    /// stops the run.
    Set {
        category: String,
        /// Assignments as `key=value`; lists are comma separated
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Reset every setting of a category to its default.
    Reset {
        category: String,
    },

    /// List plugins.
    Plugins,

    /// Show a plugin's configuration.
    Plugin {
        name: String,
    },

    /// Change a plugin's configuration.
    ///
    /// Changes that rename existing directory entries need `--yes`.
    #[command(name = "plugin-set")]
    PluginSet {
        name: String,
        #[arg(required = true)]
        assignments: Vec<String>,
        /// Confirm RDN changes that affect existing entries
        #[arg(short, long)]
        yes: bool,
        /// Leave existing entries in place when confirming an RDN change
        #[arg(long)]
        no_migrate: bool,
    },

    /// Enable or disable a plugin.
    #[command(name = "plugin-toggle")]
    PluginToggle {
        name: String,
        #[arg(long, conflicts_with = "disable", required_unless_present = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
    },

    /// Show the environment variables the console reads.
    Env,
}

#[tokio::main]
async fn main() -> Result<()> {
    heracles_console_lib::init_tracing();
    let cli = Cli::parse();

    if let Commands::Env = cli.command {
        heracles_console_lib::load_dotenv();
        print_env();
        return Ok(());
    }

    let (_config, client) = heracles_console_lib::init_foundation()?;
    let mut console = SettingsConsole::new(client);
    let result = run(&mut console, cli.command).await;

    for notice in console.notices_mut().drain() {
        match notice.level {
            NoticeLevel::Error => eprintln!("{}", notice.message),
            _ => println!("{}", notice.message),
        }
    }
    result
}

async fn run<B: SettingsBackend>(console: &mut SettingsConsole<B>, command: Commands) -> Result<()> {
    match command {
        Commands::Categories => {
            for category in console.backend().list_categories().await? {
                println!(
                    "{:<20} {} ({} settings)",
                    category.name,
                    category.label,
                    category.settings.len()
                );
            }
        }
        Commands::Show { category } => {
            console.open_category(&category).await?;
            let panel = console.category().context("category panel not open")?;
            println!("{}", panel.label());
            if let Some(description) = panel.description() {
                println!("{description}");
            }
            print_fields(panel.descriptors().iter(), panel.form());
        }
        Commands::Set {
            category,
            assignments,
        } => {
            console.open_category(&category).await?;
            let panel = console.category_mut().context("category panel not open")?;
            for assignment in &assignments {
                let (key, raw) = parse_assignment(assignment)?;
                panel.edit_input(key, raw)?;
            }
            save(console).await?;
        }
        Commands::Reset { category } => {
            console.open_category(&category).await?;
            console
                .category_mut()
                .context("category panel not open")?
                .reset_to_defaults();
            save(console).await?;
        }
        Commands::Plugins => {
            for plugin in console.backend().list_plugins().await? {
                let state = if plugin.enabled { "enabled" } else { "disabled" };
                println!(
                    "{:<20} {:<10} {:<9} {}",
                    plugin.name, plugin.version, state, plugin.description
                );
            }
        }
        Commands::Plugin { name } => {
            console.open_plugin(&name).await?;
            let panel = console.plugin().context("plugin panel not open")?;
            let plugin = panel.plugin();
            println!("{} {}", plugin.name, plugin.version);
            if !panel.is_enabled() {
                println!("(disabled)");
            }
            for section in panel.visible_sections() {
                println!();
                println!("[{}] {}", section.id, section.label);
                print_fields(section.fields.iter(), panel.form());
            }
        }
        Commands::PluginSet {
            name,
            assignments,
            yes,
            no_migrate,
        } => {
            console.open_plugin(&name).await?;
            let panel = console.plugin_mut().context("plugin panel not open")?;
            for assignment in &assignments {
                let (key, raw) = parse_assignment(assignment)?;
                panel.edit_input(key, raw)?;
            }
            if let SaveOutcome::NeedsConfirmation(prompt) = save(console).await? {
                print_prompt(&prompt);
                if !yes {
                    console.cancel()?;
                    bail!("change not applied; rerun with --yes to confirm");
                }
                console.confirm(!no_migrate).await?;
            }
        }
        Commands::PluginToggle { name, enable, .. } => {
            console.open_plugin(&name).await?;
            let current = console
                .plugin()
                .context("plugin panel not open")?
                .is_enabled();
            if current == enable {
                println!("{name} is already {}", if enable { "enabled" } else { "disabled" });
            } else {
                console.toggle_plugin().await?;
            }
        }
        Commands::Env => print_env(),
    }
    Ok(())
}

async fn save<B: SettingsBackend>(console: &mut SettingsConsole<B>) -> Result<SaveOutcome> {
    match console.save().await {
        Ok(outcome) => Ok(outcome),
        Err(PanelError::Validation(errors)) => {
            for (key, message) in errors.iter() {
                eprintln!("  {key}: {message}");
            }
            bail!("{errors}")
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("expected key=value, got '{assignment}'"),
    }
}

fn print_fields<'a>(fields: impl Iterator<Item = &'a FieldDescriptor>, form: &SettingsForm) {
    for field in fields {
        let value = form.value(&field.key).unwrap_or(&Value::Null);
        let mut line = format!(
            "  {:<24} = {}",
            field.key,
            display_value(value, field.sensitive)
        );
        if !field.sensitive {
            let _ = write!(line, "  (default {})", display_value(&field.default_value, false));
        }
        if field.requires_restart {
            line.push_str("  [restart]");
        }
        println!("{line}");
    }
}

fn display_value(value: &Value, sensitive: bool) -> String {
    match value {
        Value::Null => "(unset)".into(),
        _ if sensitive => "********".into(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| display_value(v, false))
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn print_prompt(prompt: &ConfirmationPrompt) {
    let check = &prompt.check;
    println!(
        "Changing the RDN attribute from '{}' to '{}' affects {} existing entries.",
        check.old_rdn, check.new_rdn, check.entries_count
    );
    for dn in &check.entries_dns {
        println!("  {dn}");
    }
    let hidden = check.hidden_entries();
    if hidden > 0 {
        println!("  ... and {hidden} more");
    }
    for warning in &check.warnings {
        println!("warning: {warning}");
    }
    println!("{}", prompt.guidance);
}

fn print_env() {
    for def in all_settings() {
        let value = std::env::var(def.key).ok().filter(|v| !v.is_empty());
        let shown = match value {
            Some(_) if def.secret => "********".to_string(),
            Some(v) => v,
            None if def.default.is_empty() => "(unset)".to_string(),
            None => format!("{} (default)", def.default),
        };
        println!("{:<20} {:<40} {}", def.key, shown, def.description);
    }
}
