// DriveGate - Path Resolution
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Single source of truth for path confinement. Every tool argument naming a
// location goes through AllowedRoot::normalize before any I/O happens.
// Normalization is purely lexical: separators unified, `.`/`..` collapsed,
// then a component-aware prefix check against the allowed root.
//
// Also resolves the default locations for config and audit files.

use crate::error::ToolError;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use std::sync::OnceLock;

static HOME_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Roots compare case-insensitively where the filesystem does.
const FOLD_CASE: bool = cfg!(any(windows, target_os = "macos"));

/// The single filesystem prefix outside of which no operation may act
#[derive(Debug, Clone)]
pub struct AllowedRoot {
    root: PathBuf,
    /// Comparison key of the root without trailing separators
    base: String,
    /// `base` followed by exactly one separator
    base_with_sep: String,
}

impl AllowedRoot {
    /// Build from a configured root. The root itself must be absolute
    /// once normalized.
    pub fn new(raw: &str) -> anyhow::Result<Self> {
        let root = normalize_lexical(Path::new(&to_platform_separators(raw.trim())));
        if !root.is_absolute() {
            anyhow::bail!("Allowed root must be an absolute path, got {:?}", raw);
        }

        let key = comparison_key(&root);
        let base = key.trim_end_matches(MAIN_SEPARATOR).to_string();
        let base_with_sep = format!("{}{}", base, MAIN_SEPARATOR);

        Ok(Self { root, base, base_with_sep })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Normalize a caller-supplied path and confine it to the root.
    ///
    /// Absent or blank input resolves to the root itself.
    pub fn normalize(&self, raw: Option<&str>) -> Result<PathBuf, ToolError> {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r,
            _ => return Ok(self.root.clone()),
        };

        let normalized = normalize_lexical(Path::new(&to_platform_separators(raw)));
        if self.contains(&normalized) {
            Ok(normalized)
        } else {
            Err(self.outside(raw))
        }
    }

    /// Re-validate a path computed from already-normalized pieces,
    /// e.g. a rename target joined onto a parent directory.
    pub fn confine(&self, candidate: &Path) -> Result<PathBuf, ToolError> {
        let text = candidate.to_string_lossy();
        let normalized = normalize_lexical(Path::new(&to_platform_separators(&text)));
        if self.contains(&normalized) {
            Ok(normalized)
        } else {
            Err(self.outside(&text))
        }
    }

    /// True if `path` is lexically the root or beneath it.
    /// `/srv/data` admits `/srv/data/x` but not `/srv/database`.
    pub fn contains(&self, path: &Path) -> bool {
        if !path.is_absolute() {
            return false;
        }
        let key = comparison_key(path);
        key == self.base || key.starts_with(&self.base_with_sep)
    }

    fn outside(&self, raw: &str) -> ToolError {
        ToolError::PathOutsideAllowedRoot {
            path: raw.to_string(),
            root: self.root.display().to_string(),
        }
    }
}

/// Map both `/` and `\` to the platform separator so mixed input cannot
/// hide a traversal segment from the component parser.
fn to_platform_separators(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}

/// Resolve `.` and `..` without touching the filesystem.
/// A `..` at the root or drive prefix is dropped: it cannot climb higher.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                // Relative path with leading `..`: keep it, confinement rejects it
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    out
}

fn comparison_key(path: &Path) -> String {
    let text = path.to_string_lossy();
    if FOLD_CASE {
        text.to_lowercase()
    } else {
        text.into_owned()
    }
}

// ============================================================================
// DEFAULT LOCATIONS
// ============================================================================

/// User home directory.
///
/// Resolution order:
///   1. HOME environment variable
///   2. USERPROFILE environment variable (Windows)
///   3. Filesystem root
pub fn home_dir() -> &'static Path {
    HOME_CACHE.get_or_init(|| {
        for var in ["HOME", "USERPROFILE"] {
            if let Ok(home) = std::env::var(var) {
                if !home.trim().is_empty() {
                    return PathBuf::from(home);
                }
            }
        }
        PathBuf::from(MAIN_SEPARATOR.to_string())
    })
}

/// Default allowed root, platform-detected at compile time.
/// Windows: the `D:\` data drive. Elsewhere: the user's home directory.
pub fn default_root() -> String {
    if cfg!(windows) {
        r"D:\".to_string()
    } else {
        home_dir().to_string_lossy().to_string()
    }
}

/// State directory for config and audit files
pub fn state_dir() -> PathBuf {
    home_dir().join(".drivegate")
}

pub fn default_config_path() -> PathBuf {
    state_dir().join("config.json")
}

pub fn default_audit_path() -> PathBuf {
    state_dir().join("audit.log")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::MAIN_SEPARATOR_STR as SEP;

    fn sample_root() -> (AllowedRoot, String) {
        let root = if cfg!(windows) { r"D:\".to_string() } else { "/srv/data".to_string() };
        (AllowedRoot::new(&root).unwrap(), root)
    }

    fn join(parts: &[&str]) -> PathBuf {
        let (_, root) = sample_root();
        let mut p = PathBuf::from(root);
        for part in parts {
            p.push(part);
        }
        p
    }

    #[test]
    fn relative_root_rejected() {
        assert!(AllowedRoot::new("data/files").is_err());
        assert!(AllowedRoot::new("").is_err());
    }

    #[test]
    fn blank_input_resolves_to_root() {
        let (root, _) = sample_root();
        assert_eq!(root.normalize(None).unwrap(), root.path());
        assert_eq!(root.normalize(Some("")).unwrap(), root.path());
        assert_eq!(root.normalize(Some("   ")).unwrap(), root.path());
    }

    #[test]
    fn collapses_dot_segments_and_repeated_separators() {
        let (root, base) = sample_root();
        let raw = format!("{base}{SEP}T{SEP}.{SEP}{SEP}sub{SEP}..{SEP}a.txt");
        assert_eq!(root.normalize(Some(&raw)).unwrap(), join(&["T", "a.txt"]));
    }

    #[test]
    fn mixed_separators_are_unified() {
        let (root, base) = sample_root();
        let raw = format!("{}/T\\nested/a.txt", base.trim_end_matches(MAIN_SEPARATOR));
        assert_eq!(root.normalize(Some(&raw)).unwrap(), join(&["T", "nested", "a.txt"]));
    }

    #[test]
    fn traversal_cannot_escape_root() {
        let (root, base) = sample_root();
        let trimmed = base.trim_end_matches(MAIN_SEPARATOR);
        for raw in [
            format!("{trimmed}/../../etc/passwd"),
            format!("{trimmed}\\..\\..\\..\\Windows"),
            format!("{trimmed}/T/../../outside"),
        ] {
            match root.normalize(Some(&raw)) {
                Ok(p) => assert!(root.contains(&p), "{:?} escaped to {:?}", raw, p),
                Err(e) => assert_eq!(e.kind(), "path_outside_allowed_root"),
            }
        }
    }

    #[test]
    fn relative_input_rejected() {
        let (root, _) = sample_root();
        for raw in ["a.txt", "../a.txt", "./T"] {
            let err = root.normalize(Some(raw)).unwrap_err();
            assert_eq!(err.kind(), "path_outside_allowed_root", "{}", raw);
        }
    }

    #[test]
    fn sibling_with_shared_prefix_rejected() {
        let root = if cfg!(windows) {
            AllowedRoot::new(r"D:\data").unwrap()
        } else {
            AllowedRoot::new("/srv/data").unwrap()
        };
        let sibling = if cfg!(windows) { r"D:\database\x" } else { "/srv/database/x" };
        assert!(root.normalize(Some(sibling)).is_err());
    }

    #[test]
    fn foreign_absolute_path_rejected() {
        let (root, _) = sample_root();
        let foreign = if cfg!(windows) { r"C:\Windows\system32" } else { "/etc/passwd" };
        let err = root.normalize(Some(foreign)).unwrap_err();
        assert_eq!(err.kind(), "path_outside_allowed_root");
        assert_eq!(err.to_payload()["path"], foreign);
    }

    #[test]
    fn confine_rechecks_joined_paths() {
        let (root, _) = sample_root();
        let parent = join(&["T"]);
        assert_eq!(root.confine(&parent.join("b.txt")).unwrap(), join(&["T", "b.txt"]));

        // D:\T\..\..\x collapses at the drive; /srv/data/T/../../x leaves the root
        let climbed = root.confine(&parent.join("..").join("..").join("x"));
        if cfg!(windows) {
            assert_eq!(climbed.unwrap(), join(&["x"]));
        } else {
            assert_eq!(climbed.unwrap_err().kind(), "path_outside_allowed_root");
        }
    }

    #[cfg(windows)]
    #[test]
    fn drive_letter_compared_case_insensitively() {
        let root = AllowedRoot::new(r"D:\").unwrap();
        assert!(root.normalize(Some(r"d:\T\a.txt")).is_ok());
        assert!(root.normalize(Some("d:/T/a.txt")).is_ok());
        assert!(root.normalize(Some(r"C:\T")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn root_traversal_collapses_at_filesystem_root() {
        let root = AllowedRoot::new("/").unwrap();
        assert_eq!(root.normalize(Some("/../../etc")).unwrap(), PathBuf::from("/etc"));
    }
}
