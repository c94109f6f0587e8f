//! The hook settings document read by the host.
//!
//! The file is owned by the host and may carry keys this tool knows nothing
//! about, so every level of the model keeps an ordered bag of unknown fields
//! and writes it back untouched.
//!
//! An installed hook has no stored name. It is recognised by its command line
//! containing the hook name (for example `text-expander` inside
//! `.claude/hooks/run-python.sh .claude/hooks/text-expander.py`). Membership,
//! force-replace and removal all go through [`command_matches`] so the three
//! always agree on what "this hook" means.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::Hook;

/// The only entry type this tool writes.
pub const COMMAND_TYPE: &str = "command";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    /// Event name -> matcher groups, in the order the host evaluates them.
    #[serde(default, deserialize_with = "events_from_json")]
    pub hooks: IndexMap<String, Vec<MatcherGroup>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hooks: Vec<CommandEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEntry {
    #[serde(rename = "type", default = "command_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn command_type() -> String {
    COMMAND_TYPE.into()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A `null` hooks object is empty, and an event mapped to `null` (older
/// writers emitted this after removing an event's last hook) becomes `[]`.
fn events_from_json<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, Vec<MatcherGroup>>, D::Error>
where
    D: Deserializer<'de>,
{
    let events: Option<IndexMap<String, Option<Vec<MatcherGroup>>>> =
        Option::deserialize(deserializer)?;
    Ok(events
        .unwrap_or_default()
        .into_iter()
        .map(|(event, groups)| (event, groups.unwrap_or_default()))
        .collect())
}

/// Whether `command` belongs to the hook called `name`.
///
/// Plain substring containment: `review` also matches `auto-review.py`.
/// An empty name matches nothing. This is stricter than bare
/// `str::contains`, where `""` would match every command.
pub fn command_matches(command: &str, name: &str) -> bool {
    !name.is_empty() && command.contains(name)
}

impl CommandEntry {
    pub fn for_hook(hook: &Hook) -> Self {
        CommandEntry {
            kind: command_type(),
            command: hook.command.clone(),
            timeout: (hook.timeout > 0).then_some(hook.timeout),
            extra: Map::new(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        command_matches(&self.command, name)
    }
}

impl MatcherGroup {
    pub fn for_hook(hook: &Hook) -> Self {
        MatcherGroup {
            matcher: Some(hook.matcher.clone()),
            hooks: vec![CommandEntry::for_hook(hook)],
            extra: Map::new(),
        }
    }

    /// True if any entry in the group belongs to `name`.
    pub fn mentions(&self, name: &str) -> bool {
        self.hooks.iter().any(|entry| entry.matches(name))
    }
}

impl SettingsDocument {
    /// Parse settings text. Blank content is an empty document; anything else
    /// that is not valid JSON is an error carrying `path`.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the settings file. A missing file is an empty document.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} does not exist; starting empty", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::io("failed to read", path)(e)),
        }
    }

    pub fn contains_hook(&self, name: &str) -> bool {
        self.hooks
            .values()
            .flatten()
            .any(|group| group.mentions(name))
    }

    /// Add `hook` under its event.
    ///
    /// Without `force` the new group is appended even if the hook is already
    /// present. With `force` every group that mentions the hook is dropped
    /// first, whole, and the new group goes to the end. Disabled hooks leave
    /// the document untouched.
    pub fn merge_in(&mut self, hook: &Hook, force: bool) {
        if !hook.enabled {
            log::debug!("hook '{}' is disabled; not merging", hook.name);
            return;
        }
        let group = MatcherGroup::for_hook(hook);
        match self.hooks.get_mut(&hook.event) {
            None => {
                self.hooks.insert(hook.event.clone(), vec![group]);
            }
            Some(groups) => {
                if force {
                    let before = groups.len();
                    groups.retain(|g| !g.mentions(&hook.name));
                    log::debug!(
                        "replacing {} existing group(s) for '{}' under {}",
                        before - groups.len(),
                        hook.name,
                        hook.event
                    );
                }
                groups.push(group);
            }
        }
    }

    /// Drop every command entry belonging to `name`. Groups emptied by the
    /// removal are dropped; events emptied by it stay as `[]`.
    ///
    /// Returns the number of entries removed. When nothing matches the
    /// document is unchanged and the result is `NotFound`.
    pub fn remove_hook(&mut self, name: &str) -> Result<usize> {
        if !self.contains_hook(name) {
            return Err(Error::NotFound(format!("hook '{name}' in settings")));
        }
        let mut removed = 0;
        for groups in self.hooks.values_mut() {
            groups.retain_mut(|group| {
                let before = group.hooks.len();
                group.hooks.retain(|entry| !entry.matches(name));
                let dropped = before - group.hooks.len();
                removed += dropped;
                dropped == 0 || !group.hooks.is_empty()
            });
        }
        Ok(removed)
    }

    /// Two-space indented JSON with a trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Write the whole document to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_json_string()?.as_bytes())?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }
}

/// Replace `path` with `contents`, creating parent directories.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over `path`, so an interrupted write leaves the old file. The old
/// file's permissions carry over. A symlinked `path` is followed and the link
/// target is replaced, leaving the link itself in place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let target = follow_symlinks(path)?;
    let path = target.as_path();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(Error::io("failed to create directory", dir))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(Error::io("failed to create temporary file in", dir))?;
    tmp.write_all(contents)
        .map_err(Error::io("failed to write", tmp.path()))?;
    let perms = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    };
    if let Some(perms) = perms {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(Error::io("failed to set permissions on", path))?;
    }
    tmp.persist(path)
        .map_err(|e| Error::io("failed to write", path)(e.error))?;
    Ok(())
}

const MAX_SYMLINK_HOPS: usize = 40;

/// Resolve `path` through any chain of symlinks. Dangling links resolve to
/// the path they point at, so the write creates the target.
fn follow_symlinks(path: &Path) -> Result<PathBuf> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = fs::read_link(&current)
                    .map_err(Error::io("failed to read symlink", &current))?;
                current = match current.parent() {
                    Some(parent) if link.is_relative() => parent.join(link),
                    _ => link,
                };
            }
            _ => return Ok(current),
        }
    }
    Err(Error::Validation(format!(
        "too many levels of symbolic links at {}",
        path.display()
    )))
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

pub fn load(path: &Path) -> Result<SettingsDocument> {
    SettingsDocument::load(path)
}

pub fn save(path: &Path, document: &SettingsDocument) -> Result<()> {
    document.save(path)
}

/// Whether a hook called `name` appears in the settings file at `path`.
/// A missing file means nothing is installed.
pub fn is_installed(path: &Path, name: &str) -> Result<bool> {
    Ok(SettingsDocument::load(path)?.contains_hook(name))
}

/// Load, merge `hook`, save.
pub fn install_hook(path: &Path, hook: &Hook, force: bool) -> Result<()> {
    let mut doc = SettingsDocument::load(path)?;
    doc.merge_in(hook, force);
    doc.save(path)
}

/// Load, remove `name`, save. The file is not written when nothing matched.
pub fn uninstall_hook(path: &Path, name: &str) -> Result<usize> {
    let mut doc = SettingsDocument::load(path)?;
    let removed = doc.remove_hook(name)?;
    doc.save(path)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(name: &str, event: &str, matcher: &str, command: &str) -> Hook {
        Hook {
            name: name.into(),
            description: String::new(),
            event: event.into(),
            matcher: matcher.into(),
            setup: None,
            command: command.into(),
            timeout: 30,
            enabled: true,
        }
    }

    fn doc(json: &str) -> SettingsDocument {
        SettingsDocument::parse(json, Path::new("settings.json")).unwrap()
    }

    fn commands(doc: &SettingsDocument, event: &str) -> Vec<String> {
        doc.hooks[event]
            .iter()
            .flat_map(|g| g.hooks.iter().map(|e| e.command.clone()))
            .collect()
    }

    #[test]
    fn null_and_missing_hooks_are_empty() {
        assert!(doc(r#"{"hooks": null}"#).hooks.is_empty());
        assert!(doc("{}").hooks.is_empty());
        assert!(doc("  \n").hooks.is_empty());
    }

    #[test]
    fn null_event_and_null_group_hooks_are_empty_lists() {
        let d = doc(
            r#"{"hooks":{"Stop":null,"PreToolUse":[{"matcher":"*","hooks":null}]}}"#,
        );
        assert!(d.hooks["Stop"].is_empty());
        assert!(d.hooks["PreToolUse"][0].hooks.is_empty());
        let text = d.to_json_string().unwrap();
        assert!(text.contains("\"Stop\": []"));
        assert_eq!(doc(&text), d);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = SettingsDocument::parse("{not json", Path::new("s.json")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn wrong_shape_is_parse_error() {
        let err =
            SettingsDocument::parse(r#"{"hooks":{"Stop":"oops"}}"#, Path::new("s.json"))
                .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let d = doc(
            r#"{"model":"opus","hooks":{"Stop":[{"matcher":"","hooks":[{"type":"command","command":"x","shell":"bash"}],"note":1}]},"env":{"A":"1"}}"#,
        );
        assert_eq!(d.extra["model"], "opus");
        assert_eq!(d.extra["env"]["A"], "1");
        let group = &d.hooks["Stop"][0];
        assert_eq!(group.extra["note"], 1);
        assert_eq!(group.hooks[0].extra["shell"], "bash");

        let again = doc(&d.to_json_string().unwrap());
        assert_eq!(again, d);
    }

    #[test]
    fn group_without_matcher_stays_without() {
        let d = doc(r#"{"hooks":{"Stop":[{"hooks":[{"type":"command","command":"x"}]}]}}"#);
        assert!(d.hooks["Stop"][0].matcher.is_none());
        assert!(!d.to_json_string().unwrap().contains("matcher"));
    }

    #[test]
    fn merge_into_new_event() {
        let mut d = SettingsDocument::default();
        d.merge_in(&hook("fmt", "PostToolUse", "Edit|Write", "fmt.sh"), false);
        let groups = &d.hooks["PostToolUse"];
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].matcher.as_deref(), Some("Edit|Write"));
        assert_eq!(groups[0].hooks[0].kind, "command");
        assert_eq!(groups[0].hooks[0].timeout, Some(30));
    }

    #[test]
    fn non_force_merge_appends_duplicates() {
        let mut d = SettingsDocument::default();
        let h = hook("fmt", "PostToolUse", "*", "fmt.sh");
        d.merge_in(&h, false);
        d.merge_in(&h, false);
        assert_eq!(d.hooks["PostToolUse"].len(), 2);
    }

    #[test]
    fn force_merge_drops_whole_groups() {
        let mut d = doc(
            r#"{"hooks":{"Stop":[
                {"matcher":"a","hooks":[{"type":"command","command":"keep-1"}]},
                {"matcher":"b","hooks":[{"type":"command","command":"other"},{"type":"command","command":"run foo.py"}]},
                {"matcher":"c","hooks":[{"type":"command","command":"keep-2"}]}
            ]}}"#,
        );
        d.merge_in(&hook("foo", "Stop", "*", "run foo.py --new"), true);
        assert_eq!(
            commands(&d, "Stop"),
            vec!["keep-1", "keep-2", "run foo.py --new"]
        );
    }

    #[test]
    fn force_merge_only_touches_target_event() {
        let mut d = doc(
            r#"{"hooks":{"PreToolUse":[{"matcher":"*","hooks":[{"type":"command","command":"foo.py"}]}]}}"#,
        );
        d.merge_in(&hook("foo", "Stop", "*", "foo.py"), true);
        assert_eq!(d.hooks["PreToolUse"].len(), 1);
        assert_eq!(d.hooks["Stop"].len(), 1);
    }

    #[test]
    fn disabled_hook_is_not_merged() {
        let mut d = SettingsDocument::default();
        let mut h = hook("fmt", "Stop", "*", "fmt.sh");
        h.enabled = false;
        d.merge_in(&h, true);
        assert!(d.hooks.is_empty());
    }

    #[test]
    fn remove_drops_entries_then_empty_groups() {
        let mut d = doc(
            r#"{"hooks":{"Stop":[
                {"matcher":"a","hooks":[{"type":"command","command":"other"},{"type":"command","command":"foo.py"}]},
                {"matcher":"b","hooks":[{"type":"command","command":"foo.py --x"}]}
            ]}}"#,
        );
        assert_eq!(d.remove_hook("foo").unwrap(), 2);
        let groups = &d.hooks["Stop"];
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].matcher.as_deref(), Some("a"));
        assert_eq!(commands(&d, "Stop"), vec!["other"]);
    }

    #[test]
    fn remove_keeps_emptied_event_as_empty_list() {
        let mut d = doc(
            r#"{"hooks":{"Stop":[{"matcher":"*","hooks":[{"type":"command","command":"foo.py"}]}]}}"#,
        );
        d.remove_hook("foo").unwrap();
        assert!(d.hooks["Stop"].is_empty());
        assert!(d.to_json_string().unwrap().contains("\"Stop\": []"));
    }

    #[test]
    fn remove_leaves_pre_existing_empty_groups() {
        let mut d = doc(
            r#"{"hooks":{"Stop":[{"matcher":"x","hooks":[]},{"matcher":"*","hooks":[{"type":"command","command":"foo.py"}]}]}}"#,
        );
        d.remove_hook("foo").unwrap();
        assert_eq!(d.hooks["Stop"].len(), 1);
        assert_eq!(d.hooks["Stop"][0].matcher.as_deref(), Some("x"));
    }

    #[test]
    fn remove_miss_is_not_found_and_unchanged() {
        let original = doc(
            r#"{"hooks":{"Stop":[{"matcher":"*","hooks":[{"type":"command","command":"bar.py"}]}]}}"#,
        );
        let mut d = original.clone();
        let err = d.remove_hook("foo").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(d, original);
    }

    #[test]
    fn empty_name_matches_no_command() {
        assert!(!command_matches("anything.py", ""));
        assert!(!command_matches("", ""));
        assert!(command_matches("run foo.py", "foo"));
    }

    #[test]
    fn substring_identity_over_matches() {
        let d = doc(
            r#"{"hooks":{"UserPromptSubmit":[{"matcher":"*","hooks":[{"type":"command","command":"auto-review.py"}]}]}}"#,
        );
        assert!(d.contains_hook("review"));
        assert!(d.contains_hook("auto-review"));
        assert!(!d.contains_hook(""));
    }
}
