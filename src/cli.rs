use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cchp",
    version,
    about = "Install and manage Claude Code agents and hooks"
)]
pub struct Cli {
    /// Project root [default: current directory]
    #[arg(long, env = "CCHP_PROJECT", global = true)]
    pub project: Option<PathBuf>,

    /// Settings file to edit [default: .claude/settings.json if .claude/ exists, else the global one]
    #[arg(long, env = "CCHP_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// User template directory [default: ~/.claude-helper/templates]
    #[arg(long, env = "CCHP_TEMPLATES", global = true)]
    pub templates: Option<PathBuf>,

    /// Config file [default: ~/.claude-helper.yaml]
    #[arg(long, env = "CCHP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install an agent or hook
    Install {
        /// Template name
        name: String,
        /// Replace an existing installation
        #[arg(short, long)]
        force: bool,
    },

    /// Remove an installed agent or hook
    Remove {
        /// Component name
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List available and installed components
    List {
        /// Only agents
        #[arg(short, long)]
        agents: bool,
        /// Only hooks
        #[arg(short = 'k', long)]
        hooks: bool,
        /// Only installed components
        #[arg(short, long)]
        installed: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-enable a disabled component
    Enable {
        /// Component name
        name: String,
    },

    /// Disable a component without removing its files
    Disable {
        /// Component name
        name: String,
    },

    /// Configure installed hooks
    Config {
        #[command(subcommand)]
        target: ConfigTarget,
    },

    /// Create a new agent or hook template
    Create {
        /// Component type (agent, hook)
        kind: String,
        /// Template name (lowercase letters, numbers, hyphens)
        name: String,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Tools the agent may use, comma-separated
        #[arg(short, long, value_delimiter = ',')]
        tools: Vec<String>,
        /// Event the hook fires on
        #[arg(short, long, default_value = "PreToolUse")]
        event: String,
        /// Tool matcher for the hook
        #[arg(short, long, default_value = "*")]
        matcher: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigTarget {
    /// Manage text-expander mappings
    TextExpander {
        #[command(subcommand)]
        action: MappingAction,
    },
}

#[derive(Subcommand)]
pub enum MappingAction {
    /// Add a mapping
    #[command(disable_help_flag = true)]
    Add {
        /// Marker, e.g. -d or --explain
        #[arg(allow_hyphen_values = true)]
        marker: String,
        /// Text the marker expands to
        replacement: String,
        /// Replace an existing mapping
        #[arg(short, long)]
        force: bool,
        /// Print help (-h is a valid marker here)
        #[arg(long, action = ArgAction::Help)]
        help: Option<bool>,
    },

    /// List mappings
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a mapping
    #[command(disable_help_flag = true)]
    Remove {
        /// Marker to remove
        #[arg(allow_hyphen_values = true)]
        marker: String,
        /// Print help (-h is a valid marker here)
        #[arg(long, action = ArgAction::Help)]
        help: Option<bool>,
    },
}

/// Help and version output leave through clap's own exit path with status 0.
pub fn is_informational(err: &clap::Error) -> bool {
    use clap::error::ErrorKind;
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}
