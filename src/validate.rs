use crate::error::{Error, Result};

/// Validate a component name: lowercase letters, digits and hyphens, not
/// starting or ending with a hyphen.
pub fn validate_component_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("component name must not be empty".into()));
    }
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars || name.starts_with('-') || name.ends_with('-') {
        return Err(Error::Validation(format!(
            "invalid component name '{name}': use lowercase letters, numbers, and hyphens only"
        )));
    }
    Ok(())
}

/// Validate a text-expander marker such as `-d`, `--explain` or `debug`:
/// at most two leading hyphens, then an alphanumeric character, then
/// alphanumerics, `_` or `-`.
pub fn validate_marker(marker: &str) -> Result<()> {
    let body = marker
        .strip_prefix("--")
        .or_else(|| marker.strip_prefix('-'))
        .unwrap_or(marker);
    let mut chars = body.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    };
    if !valid {
        return Err(Error::Validation(format!(
            "invalid marker '{marker}': use a format like -d, -v, --explain, debug"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_component_name("foo").is_ok());
        assert!(validate_component_name("foo-bar").is_ok());
        assert!(validate_component_name("agent2").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_component_name("").is_err());
        assert!(validate_component_name("Foo").is_err());
        assert!(validate_component_name("foo_bar").is_err());
        assert!(validate_component_name("-foo").is_err());
        assert!(validate_component_name("foo-").is_err());
        assert!(validate_component_name("foo/bar").is_err());
    }

    #[test]
    fn valid_markers() {
        for m in ["-d", "-v", "--explain", "debug", "-x_1", "--dry-run"] {
            assert!(validate_marker(m).is_ok(), "{m}");
        }
    }

    #[test]
    fn invalid_markers() {
        for m in ["", "-", "--", "---x", "- d", "-d!", "a b"] {
            assert!(validate_marker(m).is_err(), "{m}");
        }
    }
}
