//! Error type shared by the library modules.
//!
//! The binary wraps these in `anyhow` and adds call-site context; library
//! callers (and tests) can match on the variant.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Validation(String),

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {what}")]
    Yaml {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Adapter for `map_err` that attaches the path and the attempted action.
    pub(crate) fn io<'a>(
        action: &'static str,
        path: &'a Path,
    ) -> impl FnOnce(std::io::Error) -> Error + 'a {
        move |source| Error::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_adapter_keeps_action_and_path() {
        let path = Path::new("/tmp/settings.json");
        let err = Error::io("failed to write", path)(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "failed to write /tmp/settings.json");
        assert!(matches!(err, Error::Io { ref path, .. } if path == Path::new("/tmp/settings.json")));
        assert!(!err.is_not_found());
    }
}

pub type Result<T> = std::result::Result<T, Error>;
