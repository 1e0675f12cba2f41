// DriveGate - Session Context
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Explicit context for one server run: the guarded tools, the audit sink,
// and call statistics. Created when serving starts, closed when the input
// stream ends. Every tool call goes through Session::invoke.

use crate::approval::Approver;
use crate::audit::AuditLog;
use crate::config::GateConfig;
use crate::fs::FileTools;
use crate::outcome::Outcome;
use crate::registry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Call statistics for the session's lifetime (RAM only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub started: DateTime<Utc>,
    pub calls: u64,
    pub succeeded: u64,
    pub denied: u64,
    pub failed: u64,
    pub last_tool: Option<String>,
    pub last_call: Option<DateTime<Utc>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            started: Utc::now(),
            calls: 0,
            succeeded: 0,
            denied: 0,
            failed: 0,
            last_tool: None,
            last_call: None,
        }
    }

    fn record(&mut self, tool: &str, outcome: &Outcome) {
        self.calls += 1;
        match outcome {
            Outcome::Success(_) => self.succeeded += 1,
            Outcome::Denied { .. } => self.denied += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
        self.last_tool = Some(tool.to_string());
        self.last_call = Some(Utc::now());
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Session {
    tools: FileTools,
    audit: AuditLog,
    stats: SessionStats,
}

impl Session {
    pub fn new(tools: FileTools, audit: AuditLog) -> Self {
        Self { tools, audit, stats: SessionStats::new() }
    }

    /// Build a session from configuration and an approval policy
    pub fn start(config: &GateConfig, approver: Box<dyn Approver>) -> anyhow::Result<Self> {
        let root = config.allowed_root()?;
        log::info!(
            "Session start | root={} | max_read={} | approval={:?}",
            root.path().display(),
            config.max_read_size,
            config.approval
        );
        let tools = FileTools::new(root, config.max_read_size, approver);
        let audit = AuditLog::open(config.audit_log.clone());
        Ok(Self::new(tools, audit))
    }

    pub fn tools(&self) -> &FileTools {
        &self.tools
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Run one tool call to completion and audit it
    pub fn invoke(&mut self, name: &str, args: &Value) -> Outcome {
        let outcome = registry::dispatch(&self.tools, name, args);

        self.stats.record(name, &outcome);
        self.audit.record(name, args, &outcome.to_payload());
        match outcome {
            Outcome::Failed(ref e) => log::warn!("FAIL {} | {}", name, e),
            _ => log::debug!("{} | {}", outcome.label(), name),
        }

        outcome
    }

    /// Status summary string
    pub fn status_summary(&self) -> String {
        format!(
            "Calls: {} | Succeeded: {} | Denied: {} | Failed: {} | Last: {}",
            self.stats.calls,
            self.stats.succeeded,
            self.stats.denied,
            self.stats.failed,
            self.stats.last_tool.as_deref().unwrap_or("none"),
        )
    }

    /// End of session. Returns the final statistics.
    pub fn close(self) -> SessionStats {
        log::info!("Session end | {}", self.status_summary());
        self.stats
    }
}

// ============================================================================
// TESTS
// ============================================================================
