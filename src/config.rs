// DriveGate - Configuration
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Allowed root, read ceiling, approval policy, audit log location.
// Loaded once at startup from JSON, overridden by CLI flags. Fixed for the
// life of the process.

use crate::paths::{self, AllowedRoot};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 5 MiB read ceiling
pub const DEFAULT_MAX_READ_SIZE: u64 = 5 * 1024 * 1024;

/// Master gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub allowed_root: String,
    pub max_read_size: u64,
    pub approval: ApprovalMode,
    /// `None` keeps audit records in the process log only
    pub audit_log: Option<PathBuf>,
}

/// How destructive operations are approved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    /// Approve everything
    Auto,
    /// Reject every destructive operation
    Deny,
    /// Ask a human on the terminal
    Interactive,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            allowed_root: paths::default_root(),
            max_read_size: DEFAULT_MAX_READ_SIZE,
            approval: ApprovalMode::Auto,
            audit_log: Some(paths::default_audit_path()),
        }
    }
}

impl GateConfig {
    /// Load config from JSON file, falling back to defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {:?}", path))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in config {:?}", path))?;
            Ok(config)
        } else {
            log::warn!("Config not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save config to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve and validate the configured root
    pub fn allowed_root(&self) -> anyhow::Result<AllowedRoot> {
        AllowedRoot::new(&self.allowed_root)
            .with_context(|| format!("Invalid allowed_root {:?}", self.allowed_root))
    }
}

// ============================================================================
// TESTS
// ============================================================================
