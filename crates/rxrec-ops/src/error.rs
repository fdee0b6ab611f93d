//! Error types for operational tasks.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from operational tasks.
#[derive(Debug, Error)]
pub enum OpsError {
    /// The program could not be started at all.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A required step exited unsuccessfully.
    #[error("`{command}` {}", describe_exit(.code))]
    CommandFailed { command: String, code: Option<i32> },

    /// SQL text that cannot be passed to the MySQL client safely.
    #[error("SQL must not contain double quotes: {sql}")]
    UnsafeSql { sql: String },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `~` was used in a path but no home directory is known.
    #[error("cannot expand '~' in {path}: no home directory")]
    NoHomeDirectory { path: PathBuf },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Result type for operational tasks.
pub type Result<T> = std::result::Result<T, OpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_names_the_command() {
        let err = OpsError::CommandFailed {
            command: "git pull".into(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "`git pull` exited with status 1");

        let err = OpsError::CommandFailed {
            command: "mvn openmrs-sdk:run".into(),
            code: None,
        };
        assert_eq!(err.to_string(), "`mvn openmrs-sdk:run` was terminated by a signal");
    }
}
