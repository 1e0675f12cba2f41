// DriveGate - Tool Errors
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Failure taxonomy for the tool boundary. Every variant is reported to the
// caller as a structured payload, never as a transport fault.

use serde_json::{json, Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Caller-facing failure of a single tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Only paths under {root} are allowed")]
    PathOutsideAllowedRoot { path: String, root: String },

    #[error("Path does not exist")]
    NotFound { path: PathBuf },

    #[error("Path is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Path is not a file")]
    NotAFile { path: PathBuf },

    #[error("File too large to read ({size} > {limit} bytes)")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("File is not valid UTF-8 text")]
    NotText { path: PathBuf },

    /// Catch-all for OS faults during I/O. `paths` carries labelled
    /// offenders, e.g. `("src", ..)` and `("dest", ..)` for a move.
    #[error("{message}")]
    Io {
        message: String,
        paths: Vec<(&'static str, PathBuf)>,
    },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool")]
    UnknownTool(String),
}

impl ToolError {
    /// OS fault on a mutation, labelled with every path involved
    pub fn io<I>(err: io::Error, paths: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, PathBuf)>,
    {
        ToolError::Io {
            message: err.to_string(),
            paths: paths.into_iter().collect(),
        }
    }

    /// Classify an I/O error from a read-only inspection of `path`.
    /// A missing target is `NotFound`; anything else stays an OS fault.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ToolError::NotFound { path: path.to_path_buf() },
            _ => ToolError::io(err, [("path", path.to_path_buf())]),
        }
    }

    /// Stable machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::PathOutsideAllowedRoot { .. } => "path_outside_allowed_root",
            ToolError::NotFound { .. } => "not_found",
            ToolError::NotADirectory { .. } => "not_a_directory",
            ToolError::NotAFile { .. } => "not_a_file",
            ToolError::TooLarge { .. } => "too_large",
            ToolError::NotText { .. } => "not_text",
            ToolError::Io { .. } => "io",
            ToolError::InvalidArguments(_) => "invalid_arguments",
            ToolError::UnknownTool(_) => "unknown_tool",
        }
    }

    /// Failure mapping: `{error, kind, path?, ...offending identifiers}`
    pub fn to_payload(&self) -> Value {
        let mut map = Map::new();
        map.insert("error".into(), json!(self.to_string()));
        map.insert("kind".into(), json!(self.kind()));

        match self {
            ToolError::PathOutsideAllowedRoot { path, root } => {
                map.insert("path".into(), json!(path));
                map.insert("allowed_root".into(), json!(root));
            }
            ToolError::NotFound { path }
            | ToolError::NotADirectory { path }
            | ToolError::NotAFile { path }
            | ToolError::NotText { path } => {
                map.insert("path".into(), json!(path.display().to_string()));
            }
            ToolError::TooLarge { path, size, limit } => {
                map.insert("path".into(), json!(path.display().to_string()));
                map.insert("size_bytes".into(), json!(size));
                map.insert("limit_bytes".into(), json!(limit));
            }
            ToolError::Io { paths, .. } => {
                for (label, path) in paths {
                    map.insert((*label).to_string(), json!(path.display().to_string()));
                }
            }
            ToolError::InvalidArguments(_) => {}
            ToolError::UnknownTool(name) => {
                map.insert("tool".into(), json!(name));
            }
        }

        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let mapped = ToolError::from_io(err, Path::new("/data/a.txt"));
        assert_eq!(mapped.kind(), "not_found");
        assert_eq!(mapped.to_payload()["path"], "/data/a.txt");
    }

    #[test]
    fn permission_fault_stays_io() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let mapped = ToolError::from_io(err, Path::new("/data/a.txt"));
        assert_eq!(mapped.kind(), "io");
        assert_eq!(mapped.to_payload()["error"], "nope");
    }

    #[test]
    fn io_payload_lists_labelled_paths() {
        let err = ToolError::io(
            io::Error::new(io::ErrorKind::Other, "boom"),
            [("src", PathBuf::from("/a")), ("dest", PathBuf::from("/b"))],
        );
        let payload = err.to_payload();
        assert_eq!(payload["src"], "/a");
        assert_eq!(payload["dest"], "/b");
        assert!(payload.get("path").is_none());
    }

    #[test]
    fn too_large_reports_sizes() {
        let err = ToolError::TooLarge { path: PathBuf::from("/big"), size: 10, limit: 5 };
        let payload = err.to_payload();
        assert_eq!(payload["kind"], "too_large");
        assert_eq!(payload["size_bytes"], 10);
        assert_eq!(payload["limit_bytes"], 5);
    }
}
