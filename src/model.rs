use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle events the host dispatches hooks for. The set is open: unknown
/// events are accepted and written as-is, but the host ignores them.
pub const KNOWN_EVENTS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "UserPromptSubmit",
    "Notification",
    "Stop",
    "SubagentStop",
    "PreCompact",
    "SessionStart",
    "SessionEnd",
];

/// Seconds applied when a hook definition omits `timeout` or sets it to 0.
pub const DEFAULT_HOOK_TIMEOUT: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Agent,
    Hook,
}

impl ComponentKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "agent" => Ok(Self::Agent),
            "hook" => Ok(Self::Hook),
            _ => Err(Error::Validation(format!(
                "invalid component type '{s}': must be agent or hook"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Hook => "hook",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Available,
    Installed,
    Disabled,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Installed => "installed",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `list`: a template and where it stands in the project.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub description: String,
    pub status: Status,
}

/// A hook definition as written in a YAML template.
///
/// The name never reaches the settings file; see [`crate::settings`] for how
/// an installed hook is recognised afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub matcher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Hook {
    /// Parse and validate a YAML hook definition.
    pub fn parse(yaml: &str) -> Result<Self> {
        let mut hook: Hook = serde_yaml::from_str(yaml).map_err(|source| Error::Yaml {
            what: "hook definition".into(),
            source,
        })?;
        hook.validate()?;
        if hook.timeout == 0 {
            hook.timeout = DEFAULT_HOOK_TIMEOUT;
        }
        if !KNOWN_EVENTS.contains(&hook.event.as_str()) {
            log::warn!(
                "hook '{}' uses unknown event '{}'; the host will ignore it",
                hook.name,
                hook.event
            );
        }
        Ok(hook)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("event", &self.event),
            ("command", &self.command),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("hook {field} is required")));
            }
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| Error::Yaml {
            what: format!("hook '{}'", self.name),
            source,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AgentFrontmatter {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    /// Comma-separated, the way the host writes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tools: Option<String>,
}

/// A sub-agent prompt file: YAML frontmatter followed by the prompt body.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
    pub prompt: String,
}

impl Agent {
    pub fn parse_markdown(content: &str) -> Result<Self> {
        let (yaml, body) = split_frontmatter(content).ok_or_else(|| {
            Error::Validation("invalid agent format: missing frontmatter".into())
        })?;
        let front: AgentFrontmatter = serde_yaml::from_str(yaml).map_err(|source| Error::Yaml {
            what: "agent frontmatter".into(),
            source,
        })?;
        let tools = front
            .tools
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Agent {
            name: front.name,
            description: front.description,
            tools,
            prompt: body.trim().to_string(),
        })
    }

    pub fn to_markdown(&self) -> Result<String> {
        let front = AgentFrontmatter {
            name: self.name.clone(),
            description: self.description.clone(),
            tools: (!self.tools.is_empty()).then(|| self.tools.join(", ")),
        };
        let yaml = serde_yaml::to_string(&front).map_err(|source| Error::Yaml {
            what: format!("agent '{}'", self.name),
            source,
        })?;
        Ok(format!("---\n{yaml}---\n\n{}\n", self.prompt))
    }
}

/// Split `---` delimited frontmatter from the body. Returns `None` when the
/// content does not open with a delimiter or never closes it.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');
    let rest = content.strip_prefix("---")?;
    let rest = &rest[rest.find('\n')? + 1..];

    let mut pos = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim() == "---" {
            return Some((&rest[..pos], &rest[pos + line.len()..]));
        }
        pos += line.len();
    }
    None
}

/// Contents of `.claude/config/text-expander.json`, read by the installed
/// text-expander hook script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextExpanderConfig {
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
    #[serde(default = "default_escape_char")]
    pub escape_char: String,
}

fn default_escape_char() -> String {
    "\\".into()
}

impl Default for TextExpanderConfig {
    fn default() -> Self {
        TextExpanderConfig {
            mappings: BTreeMap::new(),
            escape_char: default_escape_char(),
        }
    }
}

impl TextExpanderConfig {
    /// Starter mappings written on first install of the text-expander hook.
    pub fn with_defaults() -> Self {
        let mappings = [
            ("-d", "Explain in detail what this code does and how it works"),
            ("-v", "Show verbose details"),
            ("-h", "Show help information"),
            ("-l", "List all items"),
            ("-s", "Summarize the current status"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        TextExpanderConfig {
            mappings,
            ..Default::default()
        }
    }
}
