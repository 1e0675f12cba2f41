// DriveGate - Tool Outcomes
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Tagged result of one invocation: success payload per operation,
// approval denial, or structured failure. Converted to JSON only at the
// boundary.

use crate::error::ToolError;
use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DENIED_MESSAGE: &str = "Action denied by user";

/// Nested directory listing. Serializes as a map of entry name to
/// `"file"` or a nested map; a subtree that could not be enumerated
/// carries an extra `"error"` key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirTree {
    pub entries: BTreeMap<String, TreeNode>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    File,
    Dir(DirTree),
}

impl DirTree {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.error.is_none()
    }

    pub fn subtree(&self, name: &str) -> Option<&DirTree> {
        match self.entries.get(name) {
            Some(TreeNode::Dir(tree)) => Some(tree),
            _ => None,
        }
    }
}

impl Serialize for DirTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.entries.len() + usize::from(self.error.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        if let Some(ref error) = self.error {
            map.serialize_entry("error", error)?;
        }
        map.end()
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeNode::File => serializer.serialize_str("file"),
            TreeNode::Dir(tree) => tree.serialize(serializer),
        }
    }
}

/// Metadata snapshot returned by get_file_info
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// `None` where the platform does not record birth time
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub is_file: bool,
    pub is_directory: bool,
}

/// Success payload, one variant per operation family
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Listing {
        path: PathBuf,
        files: Vec<String>,
        folders: Vec<String>,
    },
    Tree {
        path: PathBuf,
        tree: DirTree,
    },
    Content {
        path: PathBuf,
        content: String,
    },
    Info(FileInfo),
    Matches {
        path: PathBuf,
        query: String,
        results: Vec<PathBuf>,
    },
    /// Confirmation of a completed mutation
    Done {
        message: String,
    },
}

/// Paths go out as text; non-UTF-8 bytes are replaced rather than rejected.
fn text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl ToolOutput {
    pub fn to_payload(&self) -> Value {
        match self {
            ToolOutput::Listing { path, files, folders } => json!({
                "path": text(path),
                "files": files,
                "folders": folders,
            }),
            ToolOutput::Tree { path, tree } => json!({
                "path": text(path),
                "tree": tree,
            }),
            ToolOutput::Content { path, content } => json!({
                "path": text(path),
                "content": content,
            }),
            ToolOutput::Info(info) => json!({
                "path": text(&info.path),
                "size_bytes": info.size_bytes,
                "created_time": info.created_time,
                "modified_time": info.modified_time,
                "is_file": info.is_file,
                "is_directory": info.is_directory,
            }),
            ToolOutput::Matches { path, query, results } => json!({
                "path": text(path),
                "query": query,
                "results": results.iter().map(|p| text(p)).collect::<Vec<_>>(),
            }),
            ToolOutput::Done { message } => json!({ "message": message }),
        }
    }
}

/// Terminal outcome of one tool invocation
#[derive(Debug)]
pub enum Outcome {
    Success(ToolOutput),
    /// Approval policy rejected the action; nothing was touched
    Denied { action: String, target: String },
    Failed(ToolError),
}

impl Outcome {
    pub fn done(message: impl Into<String>) -> Self {
        Outcome::Success(ToolOutput::Done { message: message.into() })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Short label for logs and statistics
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Denied { .. } => "denied",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn to_payload(&self) -> Value {
        match self {
            Outcome::Success(output) => output.to_payload(),
            Outcome::Denied { action, target } => json!({
                "denied": true,
                "message": DENIED_MESSAGE,
                "action": action,
                "target": target,
            }),
            Outcome::Failed(err) => err.to_payload(),
        }
    }
}

impl From<Result<ToolOutput, ToolError>> for Outcome {
    fn from(result: Result<ToolOutput, ToolError>) -> Self {
        match result {
            Ok(output) => Outcome::Success(output),
            Err(err) => Outcome::Failed(err),
        }
    }
}

impl From<ToolError> for Outcome {
    fn from(err: ToolError) -> Self {
        Outcome::Failed(err)
    }
}

// ============================================================================
// TESTS
// ============================================================================
