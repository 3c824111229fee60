use std::path::PathBuf;

/// Errors raised while building or querying a model.
///
/// A title that is not in the catalog is not an error: `recommend` returns an
/// empty recommendation for it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad configuration value, unknown weighting mode, or invalid `n`.
    #[error("configuration error: {0}")]
    Config(String),

    /// The dataset could not be read or is missing required columns.
    #[error("failed to load {}{}: {message}", .path.display(), .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    DataLoad {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn data_load(path: impl Into<PathBuf>, line: Option<u64>, message: impl Into<String>) -> Self {
        Self::DataLoad {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_load_message_includes_line() {
        let err = Error::data_load("movies.csv", Some(7), "bad rating \"x\"");
        assert_eq!(err.to_string(), "failed to load movies.csv (line 7): bad rating \"x\"");
    }

    #[test]
    fn data_load_message_without_line() {
        let err = Error::data_load("movies.csv", None, "missing column Genre");
        assert_eq!(err.to_string(), "failed to load movies.csv: missing column Genre");
    }

    #[test]
    fn config_message() {
        let err = Error::config("unknown weighting mode \"bm25\"");
        assert!(err.to_string().starts_with("configuration error:"));
    }
}
