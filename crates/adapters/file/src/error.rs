//! File adapter error types.

use std::path::PathBuf;

use humivent_domain::error::HumiventError;

/// Errors specific to the file adapters.
#[derive(Debug, thiserror::Error)]
pub enum FileAdapterError {
    /// Reading or writing a file failed.
    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings file is not valid TOML for [`Settings`](humivent_domain::settings::Settings).
    #[error("failed to parse {}", path.display())]
    TomlDecode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode settings")]
    TomlEncode(#[source] toml::ser::Error),

    /// A JSON document could not be parsed or produced.
    #[error("invalid json")]
    Json(#[source] serde_json::Error),
}

impl FileAdapterError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    /// Convert into a [`HumiventError::Storage`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HumiventError {
        HumiventError::Storage(Box::new(self))
    }
}

impl From<FileAdapterError> for HumiventError {
    fn from(err: FileAdapterError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_path_of_io_error() {
        let err = FileAdapterError::io("/tmp/settings.toml")(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "i/o error on /tmp/settings.toml");
    }

    #[test]
    fn should_convert_into_storage_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err: HumiventError = FileAdapterError::Json(json_err).into();
        assert!(matches!(err, HumiventError::Storage(_)));
    }
}
