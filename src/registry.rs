// DriveGate - Tool Table
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Static table of every callable tool: name, description, typed parameters,
// result keys, and handler. The transport lists and dispatches through this
// table only.

use crate::error::ToolError;
use crate::fs::{FileTools, DEFAULT_TREE_DEPTH};
use crate::outcome::Outcome;
use serde_json::{json, Map, Value};

pub type Handler = fn(&FileTools, &ToolArgs) -> Result<Outcome, ToolError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<i64>,
    pub description: &'static str,
}

const fn string(name: &'static str, required: bool, description: &'static str) -> Param {
    Param { name, kind: ParamKind::String, required, default: None, description }
}

#[derive(Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    /// Keys of the success mapping
    pub returns: &'static [&'static str],
    /// Gated behind the approval policy
    pub destructive: bool,
    pub handler: Handler,
}

impl ToolSpec {
    /// MCP tool definition
    pub fn definition(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            let mut prop = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if let Some(default) = param.default {
                prop["default"] = json!(default);
            }
            properties.insert(param.name.to_string(), prop);
        }
        let required: Vec<&str> = self.params.iter().filter(|p| p.required).map(|p| p.name).collect();
        let output: Map<String, Value> = self
            .returns
            .iter()
            .map(|key| (key.to_string(), json!({})))
            .collect();

        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
            "outputSchema": {
                "type": "object",
                "properties": output,
            },
            "annotations": {
                "readOnlyHint": !self.destructive,
                "destructiveHint": self.destructive,
            },
        })
    }
}

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Typed view over the JSON argument object of one call
pub struct ToolArgs<'a> {
    args: &'a Map<String, Value>,
}

impl<'a> ToolArgs<'a> {
    /// `null` or absent arguments are an empty object; any other
    /// non-object is rejected.
    pub fn parse(value: &'a Value, empty: &'a Map<String, Value>) -> Result<Self, ToolError> {
        match value {
            Value::Object(args) => Ok(Self { args }),
            Value::Null => Ok(Self { args: empty }),
            other => Err(ToolError::InvalidArguments(format!(
                "arguments must be an object, got {}",
                other
            ))),
        }
    }

    pub fn opt_string(&self, key: &str) -> Result<Option<&'a str>, ToolError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(ToolError::InvalidArguments(format!(
                "'{}' must be a string, got {}",
                key, other
            ))),
        }
    }

    pub fn string(&self, key: &str) -> Result<&'a str, ToolError> {
        self.opt_string(key)?
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing required argument '{}'", key)))
    }

    pub fn integer_or(&self, key: &str, default: i64) -> Result<i64, ToolError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v.as_i64().ok_or_else(|| {
                ToolError::InvalidArguments(format!("'{}' must be an integer, got {}", key, v))
            }),
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

fn list_directory(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.list_directory(args.opt_string("path")?))
}

fn directory_tree(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    let max_depth = args.integer_or("max_depth", DEFAULT_TREE_DEPTH)?;
    Ok(tools.directory_tree(args.opt_string("path")?, max_depth))
}

fn read_file(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.read_file(args.string("path")?))
}

fn get_file_info(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.get_file_info(args.string("path")?))
}

fn search_files(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.search_files(args.string("path")?, args.string("query")?))
}

fn write_file(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.write_file(args.string("path")?, args.string("content")?))
}

fn append_to_file(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.append_to_file(args.string("path")?, args.string("content")?))
}

fn move_file(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.move_file(args.string("src_path")?, args.string("dest_path")?))
}

fn rename_file(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.rename_file(args.string("old_path")?, args.string("new_name")?))
}

fn create_directory(tools: &FileTools, args: &ToolArgs) -> Result<Outcome, ToolError> {
    Ok(tools.create_directory(args.string("path")?))
}

// ============================================================================
// TABLE
// ============================================================================

pub static TOOLS: &[ToolSpec] = &[
    // ====== READ-ONLY ======
    ToolSpec {
        name: "list_directory",
        description: "List the files and folders directly inside a directory. Defaults to the allowed root.",
        params: &[string("path", false, "Absolute directory path under the allowed root")],
        returns: &["path", "files", "folders"],
        destructive: false,
        handler: list_directory,
    },
    ToolSpec {
        name: "directory_tree",
        description: "Nested tree of a directory: entry name maps to \"file\" or a nested object. Unreadable folders carry an \"error\" key.",
        params: &[
            string("path", false, "Absolute directory path under the allowed root"),
            Param {
                name: "max_depth",
                kind: ParamKind::Integer,
                required: false,
                default: Some(DEFAULT_TREE_DEPTH),
                description: "Levels of subdirectories to expand; negative yields an empty tree",
            },
        ],
        returns: &["path", "tree"],
        destructive: false,
        handler: directory_tree,
    },
    ToolSpec {
        name: "read_file",
        description: "Read a UTF-8 text file. Files above the read ceiling are refused.",
        params: &[string("path", true, "Absolute file path under the allowed root")],
        returns: &["path", "content"],
        destructive: false,
        handler: read_file,
    },
    ToolSpec {
        name: "get_file_info",
        description: "Size, creation and modification time, and file/directory flags for a path.",
        params: &[string("path", true, "Absolute path under the allowed root")],
        returns: &["path", "size_bytes", "created_time", "modified_time", "is_file", "is_directory"],
        destructive: false,
        handler: get_file_info,
    },
    ToolSpec {
        name: "search_files",
        description: "Recursively find files whose name contains the query (case-insensitive). Unreadable folders are skipped.",
        params: &[
            string("path", true, "Directory to search under"),
            string("query", true, "Substring to match against file names"),
        ],
        returns: &["path", "query", "results"],
        destructive: false,
        handler: search_files,
    },
    // ====== GATED ======
    ToolSpec {
        name: "write_file",
        description: "Create or overwrite a text file. Requires approval.",
        params: &[
            string("path", true, "Absolute file path under the allowed root"),
            string("content", true, "Text to write"),
        ],
        returns: &["message"],
        destructive: true,
        handler: write_file,
    },
    ToolSpec {
        name: "append_to_file",
        description: "Append text to a file, creating it if absent. Requires approval.",
        params: &[
            string("path", true, "Absolute file path under the allowed root"),
            string("content", true, "Text to append"),
        ],
        returns: &["message"],
        destructive: true,
        handler: append_to_file,
    },
    ToolSpec {
        name: "move_file",
        description: "Move a file or folder. Moving onto an existing folder places the entry inside it. Requires approval.",
        params: &[
            string("src_path", true, "Entry to move"),
            string("dest_path", true, "Destination path or existing folder"),
        ],
        returns: &["message"],
        destructive: true,
        handler: move_file,
    },
    ToolSpec {
        name: "rename_file",
        description: "Rename an entry within its parent folder. Requires approval.",
        params: &[
            string("old_path", true, "Entry to rename"),
            string("new_name", true, "New name, resolved against the entry's parent folder"),
        ],
        returns: &["message"],
        destructive: true,
        handler: rename_file,
    },
    ToolSpec {
        name: "create_directory",
        description: "Create a folder and any missing parents. Succeeds if it already exists. Requires approval.",
        params: &[string("path", true, "Absolute folder path under the allowed root")],
        returns: &["message"],
        destructive: true,
        handler: create_directory,
    },
];

/// Look up a tool by name
pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|spec| spec.name == name)
}

/// All MCP tool definitions, in table order
pub fn definitions() -> Vec<Value> {
    TOOLS.iter().map(ToolSpec::definition).collect()
}

/// Run one named tool. Unknown names and malformed arguments come back as
/// structured failures like any other.
pub fn dispatch(tools: &FileTools, name: &str, args: &Value) -> Outcome {
    let spec = match find(name) {
        Some(spec) => spec,
        None => return Outcome::Failed(ToolError::UnknownTool(name.to_string())),
    };

    let empty = Map::new();
    let result = ToolArgs::parse(args, &empty).and_then(|args| (spec.handler)(tools, &args));
    result.unwrap_or_else(Outcome::Failed)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::AutoApprove;
    use crate::paths::AllowedRoot;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[test]
    fn table_names_are_unique() {
        let names: HashSet<&str> = TOOLS.iter().map(|t| t.name).collect();
        assert_eq!(names.len(), TOOLS.len());
        assert_eq!(TOOLS.len(), 10);
    }

    #[test]
    fn destructive_flags_match_operation_set() {
        let gated: HashSet<&str> = TOOLS.iter().filter(|t| t.destructive).map(|t| t.name).collect();
        let expected: HashSet<&str> =
            ["write_file", "append_to_file", "move_file", "rename_file", "create_directory"].into();
        assert_eq!(gated, expected);
    }

    #[test]
    fn definition_lists_required_params() {
        let def = find("move_file").unwrap().definition();
        assert_eq!(def["inputSchema"]["required"], json!(["src_path", "dest_path"]));
        assert_eq!(def["inputSchema"]["properties"]["src_path"]["type"], "string");
        assert!(def["outputSchema"]["properties"].get("message").is_some());

        let tree = find("directory_tree").unwrap().definition();
        assert_eq!(tree["inputSchema"]["properties"]["max_depth"]["default"], 3);
        assert_eq!(tree["inputSchema"]["required"], json!([]));
        assert_eq!(tree["annotations"]["readOnlyHint"], true);
        assert_eq!(tree["annotations"]["destructiveHint"], false);
        assert_eq!(def["annotations"]["destructiveHint"], true);
    }

    #[test]
    fn args_type_checks() {
        let empty = Map::new();
        let value = json!({"path": 7, "max_depth": "deep", "query": "x"});
        let args = ToolArgs::parse(&value, &empty).unwrap();

        assert_eq!(args.opt_string("path").unwrap_err().kind(), "invalid_arguments");
        assert_eq!(args.integer_or("max_depth", 3).unwrap_err().kind(), "invalid_arguments");
        assert_eq!(args.string("query").unwrap(), "x");
        assert_eq!(args.string("content").unwrap_err().kind(), "invalid_arguments");
        assert_eq!(args.integer_or("absent", 3).unwrap(), 3);

        assert!(ToolArgs::parse(&json!("nope"), &empty).is_err());
        assert!(ToolArgs::parse(&Value::Null, &empty).is_ok());
    }

    #[test]
    fn dispatch_routes_and_reports() {
        let dir = tempdir().unwrap();
        let root = AllowedRoot::new(&dir.path().to_string_lossy()).unwrap();
        let tools = FileTools::new(root, 1024, Box::new(AutoApprove));
        let file = dir.path().join("a.txt").to_string_lossy().into_owned();

        let written = dispatch(&tools, "write_file", &json!({"path": &file, "content": "hi"}));
        assert!(!written.is_failure());

        let read = dispatch(&tools, "read_file", &json!({"path": &file}));
        assert_eq!(read.to_payload()["content"], "hi");

        let missing_arg = dispatch(&tools, "read_file", &json!({}));
        assert_eq!(missing_arg.to_payload()["kind"], "invalid_arguments");

        let unknown = dispatch(&tools, "delete_everything", &json!({}));
        assert_eq!(unknown.to_payload()["kind"], "unknown_tool");
        assert_eq!(unknown.to_payload()["tool"], "delete_everything");

        let listing = dispatch(&tools, "list_directory", &Value::Null);
        assert_eq!(listing.to_payload()["files"], json!(["a.txt"]));
    }
}
