use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Env;
use crate::error::{Error, Result};
use crate::model::{
    Agent, Component, ComponentKind, Hook, Status, TextExpanderConfig, DEFAULT_HOOK_TIMEOUT,
};
use crate::paths;
use crate::settings::{self, SettingsDocument};
use crate::templates::{self, DirTemplates, SupportFile, TemplateStore};
use crate::validate::{validate_component_name, validate_marker};

const TEXT_EXPANDER: &str = "text-expander";

/// Rewrite a hook command for the platform it will run on.
pub fn platform_command(command: &str) -> String {
    command_for(command, cfg!(windows))
}

fn command_for(command: &str, windows: bool) -> String {
    if windows {
        command.replace("run-python.sh", "run-python.bat")
    } else {
        command.to_string()
    }
}

fn parse_hook_template(store: &dyn TemplateStore, name: &str) -> Result<Option<Hook>> {
    let Some(content) = store.get(ComponentKind::Hook, name)? else {
        return Ok(None);
    };
    let mut hook = Hook::parse(&content)?;
    if hook.name != name {
        log::warn!(
            "hook template '{name}' declares name '{}'; using '{name}'",
            hook.name
        );
        hook.name = name.to_string();
    }
    hook.command = platform_command(&hook.command);
    Ok(Some(hook))
}

fn write_file(path: &Path, content: &str, executable: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(Error::io("failed to create directory", parent))?;
    }
    fs::write(path, content).map_err(Error::io("failed to write", path))?;
    if executable {
        make_executable(path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(Error::io("failed to set permissions on", path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Copy the hook's scripts and the interpreter launchers into
/// `.claude/hooks/`. Existing files are replaced only when `overwrite` is set.
fn write_hook_files(
    env: &Env,
    store: &dyn TemplateStore,
    name: &str,
    overwrite: bool,
) -> Result<()> {
    let dir = paths::hooks_dir(&env.project_dir);
    let files: Vec<SupportFile> = store
        .support_files(name)?
        .into_iter()
        .chain(templates::launchers())
        .collect();
    for file in files {
        let dest = dir.join(&file.name);
        if !overwrite && dest.exists() {
            log::debug!("keeping existing {}", dest.display());
            continue;
        }
        write_file(&dest, &file.content, file.executable)?;
        log::debug!("wrote {}", dest.display());
    }
    Ok(())
}

fn installed_scripts(env: &Env, name: &str) -> Vec<PathBuf> {
    let dir = paths::hooks_dir(&env.project_dir);
    paths::SCRIPT_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .filter(|p| p.exists())
        .collect()
}

fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("failed to remove {}: {e}", path.display()),
    }
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(Error::io("failed to rename", from))
}

pub fn agent_status(env: &Env, name: &str) -> Status {
    if paths::agent_file(&env.project_dir, name).exists() {
        Status::Installed
    } else if paths::disabled_agent_file(&env.project_dir, name).exists() {
        Status::Disabled
    } else {
        Status::Available
    }
}

/// Installed when the settings mention the hook; disabled when only its
/// scripts are left in `.claude/hooks/`.
pub fn hook_status(env: &Env, settings: &SettingsDocument, name: &str) -> Status {
    if settings.contains_hook(name) {
        Status::Installed
    } else if !installed_scripts(env, name).is_empty() {
        Status::Disabled
    } else {
        Status::Available
    }
}

pub fn is_agent_installed(env: &Env, name: &str) -> bool {
    agent_status(env, name) == Status::Installed
}

pub fn is_hook_installed(env: &Env, name: &str) -> Result<bool> {
    settings::is_installed(&env.settings_path, name)
}

/// Install the template `name` into the project. Returns what kind of
/// component it turned out to be.
pub fn install(
    env: &Env,
    store: &dyn TemplateStore,
    name: &str,
    force: bool,
) -> Result<ComponentKind> {
    validate_component_name(name)?;
    let template = store.resolve(name)?;
    match template.kind {
        ComponentKind::Agent => install_agent(env, name, &template.content, force)?,
        ComponentKind::Hook => install_hook(env, store, name, force)?,
    }
    Ok(template.kind)
}

fn install_agent(env: &Env, name: &str, content: &str, force: bool) -> Result<()> {
    let dest = paths::agent_file(&env.project_dir, name);
    let disabled = paths::disabled_agent_file(&env.project_dir, name);
    if !force {
        match agent_status(env, name) {
            Status::Installed => return Err(Error::AlreadyExists(format!("agent '{name}'"))),
            Status::Disabled => {
                return Err(Error::AlreadyExists(format!("disabled agent '{name}'")))
            }
            Status::Available => {}
        }
    }
    write_file(&dest, content, false)?;
    remove_if_exists(&disabled);
    log::info!("installed agent to {}", dest.display());
    Ok(())
}

fn install_hook(env: &Env, store: &dyn TemplateStore, name: &str, force: bool) -> Result<()> {
    let hook = parse_hook_template(store, name)?
        .ok_or_else(|| Error::NotFound(format!("hook template '{name}'")))?;

    // Read settings first so a corrupt file stops the install before any
    // script lands on disk.
    let mut doc = SettingsDocument::load(&env.settings_path)?;
    if !force && doc.contains_hook(name) {
        return Err(Error::AlreadyExists(format!("hook '{name}'")));
    }

    write_hook_files(env, store, name, true)?;
    if name == TEXT_EXPANDER {
        seed_text_expander_config(env)?;
    }
    if let Some(setup) = &hook.setup {
        log::info!("hook '{name}' has a setup step; run it yourself: {setup}");
    }
    if !hook.enabled {
        log::warn!("hook '{name}' is marked disabled in its template; not adding it to settings");
    }

    doc.merge_in(&hook, force);
    doc.save(&env.settings_path)
}

fn seed_text_expander_config(env: &Env) -> Result<()> {
    let path = paths::text_expander_config(&env.project_dir);
    if path.exists() {
        return Ok(());
    }
    save_text_expander(&path, &TextExpanderConfig::with_defaults())?;
    log::info!("wrote default mappings to {}", path.display());
    Ok(())
}

/// Remove an installed component and every file it owns.
pub fn remove(env: &Env, name: &str) -> Result<ComponentKind> {
    validate_component_name(name)?;
    if agent_status(env, name) != Status::Available {
        remove_if_exists(&paths::agent_file(&env.project_dir, name));
        remove_if_exists(&paths::disabled_agent_file(&env.project_dir, name));
        return Ok(ComponentKind::Agent);
    }

    let mut doc = SettingsDocument::load(&env.settings_path)?;
    let scripts = installed_scripts(env, name);
    if !doc.contains_hook(name) && scripts.is_empty() {
        return Err(Error::NotFound(format!("component '{name}'")));
    }
    if doc.contains_hook(name) {
        let removed = doc.remove_hook(name)?;
        doc.save(&env.settings_path)?;
        log::debug!("removed {removed} settings entries for '{name}'");
    }
    for path in scripts
        .iter()
        .chain(paths::hook_config_files(&env.project_dir, name).iter())
    {
        remove_if_exists(path);
    }
    Ok(ComponentKind::Hook)
}

/// Switch a component off without deleting it: agents are renamed aside,
/// hooks are taken out of the settings but keep their scripts.
pub fn disable(env: &Env, name: &str) -> Result<ComponentKind> {
    validate_component_name(name)?;
    match agent_status(env, name) {
        Status::Installed => {
            rename(
                &paths::agent_file(&env.project_dir, name),
                &paths::disabled_agent_file(&env.project_dir, name),
            )?;
            return Ok(ComponentKind::Agent);
        }
        Status::Disabled => {
            return Err(Error::Validation(format!("agent '{name}' is already disabled")))
        }
        Status::Available => {}
    }

    match settings::uninstall_hook(&env.settings_path, name) {
        Ok(_) => Ok(ComponentKind::Hook),
        Err(e) if e.is_not_found() => {
            Err(Error::NotFound(format!("installed component '{name}'")))
        }
        Err(e) => Err(e),
    }
}

/// Undo [`disable`]. A hook is re-read from its template and put back in the
/// settings, replacing any stale entries.
pub fn enable(env: &Env, store: &dyn TemplateStore, name: &str) -> Result<ComponentKind> {
    validate_component_name(name)?;
    match agent_status(env, name) {
        Status::Disabled => {
            rename(
                &paths::disabled_agent_file(&env.project_dir, name),
                &paths::agent_file(&env.project_dir, name),
            )?;
            return Ok(ComponentKind::Agent);
        }
        Status::Installed => {
            return Err(Error::Validation(format!("agent '{name}' is already enabled")))
        }
        Status::Available => {}
    }

    let mut hook = parse_hook_template(store, name)?
        .ok_or_else(|| Error::NotFound(format!("component '{name}'")))?;
    hook.enabled = true;
    let mut doc = SettingsDocument::load(&env.settings_path)?;
    if hook_status(env, &doc, name) == Status::Available {
        return Err(Error::NotFound(format!(
            "installed or disabled component '{name}'"
        )));
    }
    write_hook_files(env, store, name, false)?;
    doc.merge_in(&hook, true);
    doc.save(&env.settings_path)?;
    Ok(ComponentKind::Hook)
}

/// Which rows `list` shows. Setting both `agents` and `hooks` is the same as
/// setting neither.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
    pub agents: bool,
    pub hooks: bool,
    pub installed: bool,
}

impl ListFilter {
    fn wants(&self, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Agent => self.agents || !self.hooks,
            ComponentKind::Hook => self.hooks || !self.agents,
        }
    }
}

fn describe(kind: ComponentKind, name: &str, content: &str) -> String {
    let parsed = match kind {
        ComponentKind::Agent => Agent::parse_markdown(content).map(|a| a.description),
        ComponentKind::Hook => Hook::parse(content).map(|h| h.description),
    };
    parsed.unwrap_or_else(|e| {
        log::warn!("{kind} template '{name}': {e}");
        String::new()
    })
}

/// Every known template with its status in this project, agents first.
pub fn list_components(
    env: &Env,
    store: &dyn TemplateStore,
    filter: ListFilter,
) -> Result<Vec<Component>> {
    let doc = SettingsDocument::load(&env.settings_path)?;
    let mut components = Vec::new();
    for kind in [ComponentKind::Agent, ComponentKind::Hook] {
        if !filter.wants(kind) {
            continue;
        }
        for name in store.list(kind)? {
            let status = match kind {
                ComponentKind::Agent => agent_status(env, &name),
                ComponentKind::Hook => hook_status(env, &doc, &name),
            };
            if filter.installed && status != Status::Installed {
                continue;
            }
            let description = match store.get(kind, &name)? {
                Some(content) => describe(kind, &name, &content),
                None => String::new(),
            };
            components.push(Component {
                name,
                kind,
                description,
                status,
            });
        }
    }
    Ok(components)
}

/// Parameters for [`create_template`].
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub kind: ComponentKind,
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
    pub event: String,
    pub matcher: String,
}

/// Write a new template into the user template directory. Hooks also get a
/// starter Python script. Returns the template path.
pub fn create_template(templates_dir: &Path, new: &NewTemplate) -> Result<PathBuf> {
    validate_component_name(&new.name)?;
    let store = DirTemplates::new(templates_dir);
    let path = store.template_path(new.kind, &new.name);
    if path.exists() {
        return Err(Error::AlreadyExists(format!(
            "{} template '{}'",
            new.kind, new.name
        )));
    }

    let description = if new.description.trim().is_empty() {
        format!("Custom {} {}", new.kind, new.name)
    } else {
        new.description.clone()
    };
    match new.kind {
        ComponentKind::Agent => {
            let agent = Agent {
                name: new.name.clone(),
                description,
                tools: new.tools.clone(),
                prompt: format!(
                    "You are the {} agent. Describe its role, process and output format here.",
                    new.name
                ),
            };
            write_file(&path, &agent.to_markdown()?, false)?;
        }
        ComponentKind::Hook => {
            let hook = Hook {
                name: new.name.clone(),
                description,
                event: new.event.clone(),
                matcher: new.matcher.clone(),
                setup: None,
                command: format!(
                    ".claude/hooks/run-python.sh .claude/hooks/{}.py",
                    new.name
                ),
                timeout: DEFAULT_HOOK_TIMEOUT,
                enabled: true,
            };
            // Validate before anything is written.
            let yaml = hook.to_yaml()?;
            Hook::parse(&yaml)?;
            let script = path.with_file_name(format!("{}.py", new.name));
            if !script.exists() {
                write_file(&script, templates::HOOK_SCRIPT_STUB, true)?;
            }
            write_file(&path, &yaml, false)?;
        }
    }
    Ok(path)
}

fn load_text_expander(path: &Path) -> Result<TextExpanderConfig> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(TextExpanderConfig::default()),
        Ok(text) => serde_json::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TextExpanderConfig::default()),
        Err(e) => Err(Error::io("failed to read", path)(e)),
    }
}

fn save_text_expander(path: &Path, config: &TextExpanderConfig) -> Result<()> {
    let mut text = serde_json::to_string_pretty(config)?;
    text.push('\n');
    settings::write_atomic(path, text.as_bytes())
}

/// Add a text-expander mapping. Replacing an existing marker needs `force`.
/// Returns true when an existing mapping was replaced.
pub fn add_mapping(env: &Env, marker: &str, replacement: &str, force: bool) -> Result<bool> {
    validate_marker(marker)?;
    if replacement.trim().is_empty() {
        return Err(Error::Validation("replacement text must not be empty".into()));
    }
    let path = paths::text_expander_config(&env.project_dir);
    let mut config = load_text_expander(&path)?;
    let replaced = config.mappings.contains_key(marker);
    if replaced && !force {
        return Err(Error::AlreadyExists(format!("mapping '{marker}'")));
    }
    config
        .mappings
        .insert(marker.to_string(), replacement.to_string());
    save_text_expander(&path, &config)?;
    Ok(replaced)
}

pub fn list_mappings(env: &Env) -> Result<TextExpanderConfig> {
    load_text_expander(&paths::text_expander_config(&env.project_dir))
}

pub fn remove_mapping(env: &Env, marker: &str) -> Result<String> {
    let path = paths::text_expander_config(&env.project_dir);
    let mut config = load_text_expander(&path)?;
    let old = config
        .mappings
        .remove(marker)
        .ok_or_else(|| Error::NotFound(format!("mapping '{marker}'")))?;
    save_text_expander(&path, &config)?;
    Ok(old)
}
