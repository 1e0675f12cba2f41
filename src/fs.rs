// DriveGate - Guarded Filesystem
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Filesystem operations exposed as tools, confined to the allowed root.
// Read-only: list_directory, directory_tree, read_file, get_file_info,
//            search_files.
// Gated:     write_file, append_to_file, move_file, rename_file,
//            create_directory.
// Every path is normalized first; every gated call asks the approver
// before the mutating system call. Faults come back as Outcome::Failed.

use crate::approval::Approver;
use crate::error::ToolError;
use crate::gate;
use crate::outcome::{DirTree, FileInfo, Outcome, ToolOutput, TreeNode};
use crate::paths::AllowedRoot;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_TREE_DEPTH: i64 = 3;

// ============================================================================
// FILE TOOLS
// ============================================================================

pub struct FileTools {
    root: AllowedRoot,
    max_read_size: u64,
    approver: Box<dyn Approver>,
}

impl FileTools {
    pub fn new(root: AllowedRoot, max_read_size: u64, approver: Box<dyn Approver>) -> Self {
        Self { root, max_read_size, approver }
    }

    pub fn root(&self) -> &AllowedRoot {
        &self.root
    }

    pub fn max_read_size(&self) -> u64 {
        self.max_read_size
    }

    // ------------------------------------------------------------------------
    // Read-only
    // ------------------------------------------------------------------------

    /// Files and subdirectories directly under `path`, each sorted by name
    pub fn list_directory(&self, path: Option<&str>) -> Outcome {
        self.try_list_directory(path).into()
    }

    fn try_list_directory(&self, path: Option<&str>) -> Result<ToolOutput, ToolError> {
        let path = self.root.normalize(path)?;
        require_dir(&path)?;

        let mut files = Vec::new();
        let mut folders = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| ToolError::from_io(e, &path))? {
            let entry = entry.map_err(|e| ToolError::from_io(e, &path))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follows symlinks; dangling links are neither
            let full = entry.path();
            if full.is_dir() {
                folders.push(name);
            } else if full.is_file() {
                files.push(name);
            }
        }
        files.sort();
        folders.sort();

        Ok(ToolOutput::Listing { path, files, folders })
    }

    /// Nested map of the subtree. Unreadable subdirectories carry an
    /// `error` marker; siblings are still reported.
    pub fn directory_tree(&self, path: Option<&str>, max_depth: i64) -> Outcome {
        self.try_directory_tree(path, max_depth).into()
    }

    fn try_directory_tree(&self, path: Option<&str>, max_depth: i64) -> Result<ToolOutput, ToolError> {
        let path = self.root.normalize(path)?;
        if max_depth < 0 {
            return Ok(ToolOutput::Tree { path, tree: DirTree::default() });
        }
        require_dir(&path)?;

        let tree = build_tree(&path, max_depth);
        Ok(ToolOutput::Tree { path, tree })
    }

    /// Whole regular file as UTF-8 text, refused above the read ceiling
    pub fn read_file(&self, path: &str) -> Outcome {
        self.try_read_file(path).into()
    }

    fn try_read_file(&self, path: &str) -> Result<ToolOutput, ToolError> {
        let path = self.root.normalize(Some(path))?;
        let meta = fs::metadata(&path).map_err(|e| ToolError::from_io(e, &path))?;
        // Directories, FIFOs and device nodes are refused before any open
        if !meta.is_file() {
            return Err(ToolError::NotAFile { path });
        }
        if meta.len() > self.max_read_size {
            return Err(ToolError::TooLarge {
                path,
                size: meta.len(),
                limit: self.max_read_size,
            });
        }

        // Bounded read: a file that grew after the size check is still refused
        let mut bytes = Vec::with_capacity(meta.len() as usize);
        File::open(&path)
            .and_then(|f| f.take(self.max_read_size.saturating_add(1)).read_to_end(&mut bytes))
            .map_err(|e| ToolError::from_io(e, &path))?;
        if bytes.len() as u64 > self.max_read_size {
            return Err(ToolError::TooLarge {
                path,
                size: bytes.len() as u64,
                limit: self.max_read_size,
            });
        }

        let content = String::from_utf8(bytes).map_err(|_| ToolError::NotText { path: path.clone() })?;

        Ok(ToolOutput::Content { path, content })
    }

    pub fn get_file_info(&self, path: &str) -> Outcome {
        self.try_get_file_info(path).into()
    }

    fn try_get_file_info(&self, path: &str) -> Result<ToolOutput, ToolError> {
        let path = self.root.normalize(Some(path))?;
        let meta = fs::metadata(&path).map_err(|e| ToolError::from_io(e, &path))?;

        Ok(ToolOutput::Info(FileInfo {
            size_bytes: meta.len(),
            created_time: meta.created().ok().map(DateTime::<Utc>::from),
            modified_time: meta.modified().ok().map(DateTime::<Utc>::from),
            is_file: meta.is_file(),
            is_directory: meta.is_dir(),
            path,
        }))
    }

    /// Case-insensitive filename substring search below `path`.
    /// Directories that cannot be enumerated are skipped without a trace
    /// in the result.
    pub fn search_files(&self, path: &str, query: &str) -> Outcome {
        self.try_search_files(path, query).into()
    }

    fn try_search_files(&self, path: &str, query: &str) -> Result<ToolOutput, ToolError> {
        let path = self.root.normalize(Some(path))?;
        require_dir(&path)?;

        let needle = query.to_lowercase();
        let results = WalkDir::new(&path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            // Links are not followed into, but a link to a directory is not a file hit
            .filter(|entry| !entry.file_type().is_dir())
            .filter(|entry| !(entry.path_is_symlink() && entry.path().is_dir()))
            .filter(|entry| entry.file_name().to_string_lossy().to_lowercase().contains(&needle))
            .map(|entry| entry.into_path())
            .collect();

        Ok(ToolOutput::Matches {
            path,
            query: query.to_string(),
            results,
        })
    }

    // ------------------------------------------------------------------------
    // Gated
    // ------------------------------------------------------------------------

    /// Create or truncate `path` with `content`
    pub fn write_file(&self, path: &str, content: &str) -> Outcome {
        let path = match self.root.normalize(Some(path)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };
        let target = path.display().to_string();

        self.guarded("write", &target, || {
            fs::write(&path, content).map_err(|e| ToolError::io(e, [("path", path.clone())]))?;
            Ok(format!("File saved: {}", path.display()))
        })
    }

    /// Append `content`, creating the file if absent
    pub fn append_to_file(&self, path: &str, content: &str) -> Outcome {
        let path = match self.root.normalize(Some(path)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };
        let target = path.display().to_string();

        self.guarded("append", &target, || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut f| f.write_all(content.as_bytes()))
                .map_err(|e| ToolError::io(e, [("path", path.clone())]))?;
            Ok(format!("Content appended to {}", path.display()))
        })
    }

    /// Move `src` to `dest`. An existing directory at `dest` receives the
    /// entry under its current name. Single rename: nothing is copied, so a
    /// failure leaves the source where it was.
    pub fn move_file(&self, src: &str, dest: &str) -> Outcome {
        let (src, dest) = match self.resolve_move(src, dest) {
            Ok(pair) => pair,
            Err(e) => return e.into(),
        };
        let target = format!("{} -> {}", src.display(), dest.display());

        self.guarded("move", &target, || {
            fs::rename(&src, &dest)
                .map_err(|e| ToolError::io(e, [("src", src.clone()), ("dest", dest.clone())]))?;
            Ok(format!("Moved {} to {}", src.display(), dest.display()))
        })
    }

    fn resolve_move(&self, src: &str, dest: &str) -> Result<(PathBuf, PathBuf), ToolError> {
        let src = self.root.normalize(Some(src))?;
        let dest = self.root.normalize(Some(dest))?;

        if dest.is_dir() {
            let name = src
                .file_name()
                .ok_or_else(|| ToolError::InvalidArguments("cannot move the allowed root".into()))?;
            let inside = self.root.confine(&dest.join(name))?;
            return Ok((src, inside));
        }
        Ok((src, dest))
    }

    /// Rename within the parent directory. The computed target is
    /// re-confined, so `new_name` cannot walk out of the root.
    pub fn rename_file(&self, old_path: &str, new_name: &str) -> Outcome {
        let (old, new) = match self.resolve_rename(old_path, new_name) {
            Ok(pair) => pair,
            Err(e) => return e.into(),
        };
        let target = format!("{} -> {}", old.display(), new.display());

        self.guarded("rename", &target, || {
            fs::rename(&old, &new)
                .map_err(|e| ToolError::io(e, [("old", old.clone()), ("new", new.clone())]))?;
            Ok(format!("Renamed {} to {}", old.display(), new.display()))
        })
    }

    fn resolve_rename(&self, old_path: &str, new_name: &str) -> Result<(PathBuf, PathBuf), ToolError> {
        if new_name.trim().is_empty() {
            return Err(ToolError::InvalidArguments("new_name must not be empty".into()));
        }
        let old = self.root.normalize(Some(old_path))?;
        let parent = old
            .parent()
            .ok_or_else(|| ToolError::InvalidArguments("cannot rename the allowed root".into()))?;
        let new = self.root.confine(&parent.join(new_name))?;
        Ok((old, new))
    }

    /// Create `path` and any missing parents; already present is success
    pub fn create_directory(&self, path: &str) -> Outcome {
        let path = match self.root.normalize(Some(path)) {
            Ok(p) => p,
            Err(e) => return e.into(),
        };
        let target = path.display().to_string();

        self.guarded("create directory", &target, || {
            fs::create_dir_all(&path).map_err(|e| ToolError::io(e, [("path", path.clone())]))?;
            Ok(format!("Directory created: {}", path.display()))
        })
    }

    /// Gate then mutate. A denial returns before `mutate` runs.
    fn guarded<F>(&self, action: &str, target: &str, mutate: F) -> Outcome
    where
        F: FnOnce() -> Result<String, ToolError>,
    {
        let decision = gate::process(self.approver.as_ref(), action, target);
        if !decision.allowed {
            return Outcome::Denied {
                action: decision.action,
                target: decision.target,
            };
        }

        match mutate() {
            Ok(message) => Outcome::done(message),
            Err(e) => Outcome::Failed(e),
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn require_dir(path: &Path) -> Result<(), ToolError> {
    let meta = fs::metadata(path).map_err(|e| ToolError::from_io(e, path))?;
    if meta.is_dir() {
        Ok(())
    } else {
        Err(ToolError::NotADirectory { path: path.to_path_buf() })
    }
}

/// Depth 0 still lists the entries of `dir`; its subdirectories come back
/// empty. An enumeration failure is recorded in this subtree only.
fn build_tree(dir: &Path, depth: i64) -> DirTree {
    let mut tree = DirTree::default();
    if depth < 0 {
        return tree;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tree.error = Some(e.to_string());
            return tree;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tree.error = Some(e.to_string());
                break;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let full = entry.path();
        let node = if full.is_dir() {
            TreeNode::Dir(build_tree(&full, depth - 1))
        } else {
            TreeNode::File
        };
        tree.entries.insert(name, node);
    }

    tree
}

// ============================================================================
// TESTS
// ============================================================================
