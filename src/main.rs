mod cli;

use std::io::{BufRead as _, Write as _};

use anyhow::{bail, Context, Result};
use clap::Parser;

use claude_helper::config::{Config, Env, Overrides};
use claude_helper::model::ComponentKind;
use claude_helper::ops::{self, ListFilter, NewTemplate};
use claude_helper::output;
use claude_helper::templates::LayeredTemplates;

use cli::{Cli, Command, ConfigTarget, MappingAction};

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read answer")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if cli::is_informational(&e) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    setup_logging(cli.verbose || config.verbose.unwrap_or(false));

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let env = Env::resolve(
        &config,
        Overrides {
            project_dir: cli.project,
            settings_path: cli.settings,
            templates_dir: cli.templates,
        },
        &cwd,
    )?;
    log::debug!("project {}", env.project_dir.display());
    log::debug!("settings {}", env.settings_path.display());
    let store = LayeredTemplates::standard(env.templates_dir.as_deref());

    match cli.command {
        Command::Install { name, force } => {
            let kind = ops::install(&env, &store, &name, force)
                .with_context(|| format!("failed to install '{name}'"))?;
            eprintln!("Installed {kind} '{name}'");
            if kind == ComponentKind::Hook {
                eprintln!("Settings: {}", env.settings_path.display());
            }
        }

        Command::Remove { name, yes } => {
            if !yes && !confirm(&format!("Remove '{name}'?"))? {
                eprintln!("Cancelled");
                return Ok(());
            }
            let kind =
                ops::remove(&env, &name).with_context(|| format!("failed to remove '{name}'"))?;
            eprintln!("Removed {kind} '{name}'");
        }

        Command::List {
            agents,
            hooks,
            installed,
            json,
        } => {
            let filter = ListFilter {
                agents,
                hooks,
                installed,
            };
            let components = ops::list_components(&env, &store, filter)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&components)?);
            } else if components.is_empty() {
                eprintln!("No components found");
            } else {
                print!("{}", output::format_component_table(&components));
            }
        }

        Command::Enable { name } => {
            let kind = ops::enable(&env, &store, &name)
                .with_context(|| format!("failed to enable '{name}'"))?;
            eprintln!("Enabled {kind} '{name}'");
        }

        Command::Disable { name } => {
            let kind =
                ops::disable(&env, &name).with_context(|| format!("failed to disable '{name}'"))?;
            eprintln!("Disabled {kind} '{name}'");
        }

        Command::Config {
            target: ConfigTarget::TextExpander { action },
        } => match action {
            MappingAction::Add {
                marker,
                replacement,
                force,
                ..
            } => {
                if ops::add_mapping(&env, &marker, &replacement, force)? {
                    eprintln!("Updated mapping '{marker}'");
                } else {
                    eprintln!("Added mapping '{marker}'");
                }
            }
            MappingAction::List { json } => {
                let config = ops::list_mappings(&env)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else if config.mappings.is_empty() {
                    eprintln!("No mappings configured");
                } else {
                    print!("{}", output::format_mappings(&config));
                }
            }
            MappingAction::Remove { marker, .. } => {
                ops::remove_mapping(&env, &marker)?;
                eprintln!("Removed mapping '{marker}'");
            }
        },

        Command::Create {
            kind,
            name,
            description,
            tools,
            event,
            matcher,
        } => {
            let kind = ComponentKind::parse(&kind)?;
            let Some(dir) = env.templates_dir.as_deref() else {
                bail!("no templates directory; set templates_dir in the config file");
            };
            let path = ops::create_template(
                dir,
                &NewTemplate {
                    kind,
                    name: name.clone(),
                    description,
                    tools,
                    event,
                    matcher,
                },
            )?;
            println!("{}", path.display());
            eprintln!("Created {kind} template '{name}'; install it with: cchp install {name}");
        }
    }

    Ok(())
}
