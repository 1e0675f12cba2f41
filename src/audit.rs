// DriveGate - Audit Log
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Append-only record of every tool invocation: timestamp, tool, arguments,
// result. Side channel only. A failing log write is reported on stderr and
// never changes the outcome of the call.

use chrono::Local;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Large string values are cut to this many characters in a record
const MAX_VALUE_CHARS: usize = 200;

pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    /// `None` keeps records in the process log only
    pub fn open(path: Option<PathBuf>) -> Self {
        if let Some(ref p) = path {
            if let Some(parent) = p.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::warn!("Audit log directory {:?} unavailable: {}", parent, e);
                }
            }
            log::info!("Audit log at {:?}", p);
        }
        Self { path }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one record. Never fails.
    pub fn record(&self, tool: &str, args: &Value, result: &Value) {
        let line = format!(
            "{} | args={} | result={}",
            tool,
            summarize(args),
            summarize(result)
        );
        log::debug!("AUDIT {}", line);

        let Some(ref path) = self.path else {
            return;
        };
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "[{}] {}", ts, line));
        if let Err(e) = written {
            log::warn!("Audit write to {:?} failed: {}", path, e);
        }
    }
}

/// Compact JSON with long strings truncated (file contents, mostly)
fn summarize(value: &Value) -> String {
    truncate_strings(value).to_string()
}

fn truncate_strings(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > MAX_VALUE_CHARS => {
            let cut: String = s.chars().take(MAX_VALUE_CHARS).collect();
            Value::String(format!("{}… ({} chars)", cut, s.chars().count()))
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_strings(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(truncate_strings).collect()),
        other => other.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
