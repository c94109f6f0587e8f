//! Where component templates come from.
//!
//! A template is either an agent (`agents/<name>.md`) or a hook
//! (`hooks/<name>.yaml`, plus any `hooks/<name>.{py,sh,js,ts}` scripts it
//! runs). The built-in set is compiled into the binary; a user directory of
//! the same shape can add to or shadow it.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::ComponentKind;
use crate::paths::SCRIPT_EXTENSIONS;

/// A resolved template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub kind: ComponentKind,
    pub content: String,
}

/// A file copied into `.claude/hooks/` next to a hook.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportFile {
    pub name: String,
    pub content: String,
    pub executable: bool,
}

impl SupportFile {
    fn script(name: impl Into<String>, content: impl Into<String>) -> Self {
        SupportFile {
            name: name.into(),
            content: content.into(),
            executable: true,
        }
    }
}

/// A source of agent and hook templates.
pub trait TemplateStore {
    /// Raw template text, or `None` if this store has no such template.
    fn get(&self, kind: ComponentKind, name: &str) -> Result<Option<String>>;

    /// Template names of one kind, sorted.
    fn list(&self, kind: ComponentKind) -> Result<Vec<String>>;

    /// Scripts that belong to the hook `name`.
    fn support_files(&self, name: &str) -> Result<Vec<SupportFile>>;

    /// Find `name` as an agent first, then as a hook.
    fn resolve(&self, name: &str) -> Result<Template> {
        for kind in [ComponentKind::Agent, ComponentKind::Hook] {
            if let Some(content) = self.get(kind, name)? {
                return Ok(Template {
                    name: name.to_string(),
                    kind,
                    content,
                });
            }
        }
        Err(Error::NotFound(format!("template '{name}'")))
    }
}

const AGENTS: &[(&str, &str)] = &[
    (
        "code-reviewer",
        include_str!("../templates/agents/code-reviewer.md"),
    ),
    ("doc-writer", include_str!("../templates/agents/doc-writer.md")),
    (
        "test-writer",
        include_str!("../templates/agents/test-writer.md"),
    ),
];

const HOOKS: &[(&str, &str)] = &[
    (
        "auto-format",
        include_str!("../templates/hooks/auto-format.yaml"),
    ),
    (
        "auto-review",
        include_str!("../templates/hooks/auto-review.yaml"),
    ),
    (
        "commit-helper",
        include_str!("../templates/hooks/commit-helper.yaml"),
    ),
    (
        "security-check",
        include_str!("../templates/hooks/security-check.yaml"),
    ),
    (
        "text-expander",
        include_str!("../templates/hooks/text-expander.yaml"),
    ),
];

const HOOK_SCRIPTS: &[(&str, &str)] = &[
    (
        "auto-format.py",
        include_str!("../templates/hooks/auto-format.py"),
    ),
    (
        "auto-review.py",
        include_str!("../templates/hooks/auto-review.py"),
    ),
    (
        "commit-helper.py",
        include_str!("../templates/hooks/commit-helper.py"),
    ),
    (
        "security-check.py",
        include_str!("../templates/hooks/security-check.py"),
    ),
    (
        "text-expander.py",
        include_str!("../templates/hooks/text-expander.py"),
    ),
];

/// Interpreter launcher referenced by the built-in hook commands.
pub const RUN_PYTHON_SH: &str = include_str!("../templates/support/run-python.sh");

/// Windows counterpart of [`RUN_PYTHON_SH`].
pub const RUN_PYTHON_BAT: &str = include_str!("../templates/support/run-python.bat");

/// Starting point written next to a hook made by `create`.
pub const HOOK_SCRIPT_STUB: &str = r#"#!/usr/bin/env python3
"""Hook script. The host sends the event as JSON on stdin."""
import json
import sys


def main():
    try:
        event = json.load(sys.stdin)
    except ValueError:
        return 0
    # Exit 2 with a message on stderr to block the action.
    return 0


if __name__ == "__main__":
    sys.exit(main())
"#;

/// Launchers every hook install drops into `.claude/hooks/`.
pub fn launchers() -> Vec<SupportFile> {
    vec![
        SupportFile::script("run-python.sh", RUN_PYTHON_SH),
        SupportFile {
            name: "run-python.bat".into(),
            content: RUN_PYTHON_BAT.into(),
            executable: false,
        },
    ]
}

fn script_stem(file: &str) -> Option<&str> {
    let (stem, ext) = file.rsplit_once('.')?;
    SCRIPT_EXTENSIONS.contains(&ext).then_some(stem)
}

/// Templates compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

impl EmbeddedTemplates {
    fn table(kind: ComponentKind) -> &'static [(&'static str, &'static str)] {
        match kind {
            ComponentKind::Agent => AGENTS,
            ComponentKind::Hook => HOOKS,
        }
    }
}

impl TemplateStore for EmbeddedTemplates {
    fn get(&self, kind: ComponentKind, name: &str) -> Result<Option<String>> {
        Ok(Self::table(kind)
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, content)| content.to_string()))
    }

    fn list(&self, kind: ComponentKind) -> Result<Vec<String>> {
        let mut names: Vec<String> = Self::table(kind).iter().map(|(n, _)| n.to_string()).collect();
        names.sort();
        Ok(names)
    }

    fn support_files(&self, name: &str) -> Result<Vec<SupportFile>> {
        Ok(HOOK_SCRIPTS
            .iter()
            .filter(|(file, _)| script_stem(file) == Some(name))
            .map(|(file, content)| SupportFile::script(*file, *content))
            .collect())
    }
}

/// Templates in a directory laid out as `agents/<name>.md` and
/// `hooks/<name>.yaml`. A missing directory is an empty store.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    root: PathBuf,
}

impl DirTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirTemplates { root: root.into() }
    }

    /// Where a template of `kind` called `name` lives in this directory.
    pub fn template_path(&self, kind: ComponentKind, name: &str) -> PathBuf {
        match kind {
            ComponentKind::Agent => self.root.join("agents").join(format!("{name}.md")),
            ComponentKind::Hook => self.root.join("hooks").join(format!("{name}.yaml")),
        }
    }

    fn kind_dir(&self, kind: ComponentKind) -> PathBuf {
        match kind {
            ComponentKind::Agent => self.root.join("agents"),
            ComponentKind::Hook => self.root.join("hooks"),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io("failed to read", path)(e)),
    }
}

impl TemplateStore for DirTemplates {
    fn get(&self, kind: ComponentKind, name: &str) -> Result<Option<String>> {
        read_optional(&self.template_path(kind, name))
    }

    fn list(&self, kind: ComponentKind) -> Result<Vec<String>> {
        let dir = self.kind_dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io("failed to read directory", &dir)(e)),
        };
        let wanted = match kind {
            ComponentKind::Agent => "md",
            ComponentKind::Hook => "yaml",
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(Error::io("failed to read directory", &dir))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(wanted) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn support_files(&self, name: &str) -> Result<Vec<SupportFile>> {
        let mut files = Vec::new();
        for ext in SCRIPT_EXTENSIONS {
            let file = format!("{name}.{ext}");
            if let Some(content) = read_optional(&self.root.join("hooks").join(&file))? {
                files.push(SupportFile::script(file, content));
            }
        }
        Ok(files)
    }
}

/// Several stores searched in order; the first that has a template wins.
pub struct LayeredTemplates {
    layers: Vec<Box<dyn TemplateStore>>,
}

impl LayeredTemplates {
    pub fn new(layers: Vec<Box<dyn TemplateStore>>) -> Self {
        LayeredTemplates { layers }
    }

    /// The user directory (when there is one) over the built-in templates.
    pub fn standard(user_dir: Option<&Path>) -> Self {
        let mut layers: Vec<Box<dyn TemplateStore>> = Vec::new();
        if let Some(dir) = user_dir {
            layers.push(Box::new(DirTemplates::new(dir)));
        }
        layers.push(Box::new(EmbeddedTemplates));
        LayeredTemplates { layers }
    }
}

impl TemplateStore for LayeredTemplates {
    fn get(&self, kind: ComponentKind, name: &str) -> Result<Option<String>> {
        for layer in &self.layers {
            if let Some(content) = layer.get(kind, name)? {
                return Ok(Some(content));
            }
        }
        Ok(None)
    }

    fn list(&self, kind: ComponentKind) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        for layer in &self.layers {
            names.extend(layer.list(kind)?);
        }
        Ok(names.into_iter().collect())
    }

    /// Scripts come from the same layer as the hook definition so a user
    /// override never runs a built-in script by accident.
    fn support_files(&self, name: &str) -> Result<Vec<SupportFile>> {
        for layer in &self.layers {
            if layer.get(ComponentKind::Hook, name)?.is_some() {
                return layer.support_files(name);
            }
        }
        Ok(Vec::new())
    }
}
