//! Centralized path resolution for project-local and global Claude files.
//!
//! Project layout, relative to the project root:
//!
//! ```text
//! .claude/settings.json          hook settings (when .claude/ exists)
//! .claude/agents/<name>.md       installed agents
//! .claude/hooks/<script>         hook scripts and launchers
//! .claude/config/<file>          per-hook configuration
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const CLAUDE_DIR: &str = ".claude";
pub const SETTINGS_FILE: &str = "settings.json";

/// Script extensions copied alongside a hook and cleaned up on removal.
pub const SCRIPT_EXTENSIONS: &[&str] = &["py", "sh", "js", "ts"];

/// Suffix appended to a disabled agent's file name.
pub const DISABLED_SUFFIX: &str = ".disabled";

/// The host's per-user configuration directory:
/// `~/Library/Application Support/Claude` on macOS, `~/.config/Claude` on
/// Linux, `%APPDATA%\Claude` on Windows.
pub fn global_claude_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Claude"))
}

/// Resolve the settings file for `project`.
/// Uses `<project>/.claude/settings.json` when `<project>/.claude` is a
/// directory, otherwise the global settings file.
pub fn settings_path(project: &Path) -> Result<PathBuf> {
    let local = project.join(CLAUDE_DIR);
    if local.is_dir() {
        return Ok(local.join(SETTINGS_FILE));
    }
    global_claude_dir()
        .map(|d| d.join(SETTINGS_FILE))
        .ok_or_else(|| Error::NotFound("global Claude configuration directory".into()))
}

pub fn claude_dir(project: &Path) -> PathBuf {
    project.join(CLAUDE_DIR)
}

pub fn agents_dir(project: &Path) -> PathBuf {
    claude_dir(project).join("agents")
}

pub fn agent_file(project: &Path, name: &str) -> PathBuf {
    agents_dir(project).join(format!("{name}.md"))
}

/// `foo.md` -> `foo.md.disabled`
pub fn disabled_agent_file(project: &Path, name: &str) -> PathBuf {
    agents_dir(project).join(format!("{name}.md{DISABLED_SUFFIX}"))
}

pub fn hooks_dir(project: &Path) -> PathBuf {
    claude_dir(project).join("hooks")
}

pub fn hook_config_dir(project: &Path) -> PathBuf {
    claude_dir(project).join("config")
}

pub fn text_expander_config(project: &Path) -> PathBuf {
    hook_config_dir(project).join("text-expander.json")
}

/// Configuration files a hook may own: `<name>.json` and `<name>-config.json`.
pub fn hook_config_files(project: &Path, name: &str) -> Vec<PathBuf> {
    let dir = hook_config_dir(project);
    vec![
        dir.join(format!("{name}.json")),
        dir.join(format!("{name}-config.json")),
    ]
}

/// `~/.claude-helper.yaml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".claude-helper.yaml"))
}

/// `~/.claude-helper/templates`, where `create` writes new templates.
pub fn default_templates_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".claude-helper").join("templates"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_settings_when_claude_dir_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".claude")).unwrap();
        let path = settings_path(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(".claude").join("settings.json"));
    }

    #[test]
    fn global_settings_without_claude_dir() {
        let dir = tempfile::tempdir().unwrap();
        if let Ok(path) = settings_path(dir.path()) {
            assert!(!path.starts_with(dir.path()));
            assert!(path.ends_with(Path::new("Claude").join("settings.json")));
        }
    }

    #[test]
    fn claude_file_is_not_a_project_dir() {
        // A stray `.claude` file must not be mistaken for the directory.
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".claude"), "").unwrap();
        if let Ok(path) = settings_path(dir.path()) {
            assert!(!path.starts_with(dir.path()));
        }
    }

    #[test]
    fn agent_paths() {
        let root = Path::new("/proj");
        assert_eq!(
            agent_file(root, "reviewer"),
            Path::new("/proj/.claude/agents/reviewer.md")
        );
        assert_eq!(
            disabled_agent_file(root, "reviewer"),
            Path::new("/proj/.claude/agents/reviewer.md.disabled")
        );
    }

    #[test]
    fn hook_config_candidates() {
        let files = hook_config_files(Path::new("/p"), "text-expander");
        assert_eq!(
            files,
            vec![
                PathBuf::from("/p/.claude/config/text-expander.json"),
                PathBuf::from("/p/.claude/config/text-expander-config.json"),
            ]
        );
    }
}
