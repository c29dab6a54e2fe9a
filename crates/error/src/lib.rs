use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PkgverError {
    #[error("command failed: '{command}' (exit code: {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("command timed out: '{command}'")]
    CommandTimeout { command: String },

    #[error("failed to decode {context}: {message}")]
    DecodeError { context: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("backup error: {message}")]
    BackupError { message: String },

    #[error("nothing to back up")]
    EmptySnapshot,

    #[error("error reading requirements file {}: {message}", .path.display())]
    RequirementsError { path: PathBuf, message: String },
}

impl PkgverError {
    /// Stderr captured from a failed command, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            PkgverError::CommandFailed { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PkgverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message() {
        let err = PkgverError::CommandFailed {
            command: "python3 -m pip show nope".to_string(),
            exit_code: 1,
            stderr: "WARNING: Package(s) not found: nope".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code: 1"));
        assert!(message.contains("not found"));
        assert_eq!(err.stderr(), Some("WARNING: Package(s) not found: nope"));
    }

    #[test]
    fn test_io_conversion() {
        let err: PkgverError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, PkgverError::Io(_)));
        assert!(err.stderr().is_none());
    }
}
