// DriveGate - Gate (Destructive Operation Checkpoint)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every destructive tool call passes through here after its paths are
// validated and before the filesystem is touched. The approver decides;
// the gate records the decision.

use crate::approval::Approver;
use serde::Serialize;

/// Gate decision: whether a mutation proceeds
#[derive(Debug, Clone, Serialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub action: String,
    pub target: String,
    pub message: String,
}

/// Ask the approver about one action on one already-validated target
pub fn process(approver: &dyn Approver, action: &str, target: &str) -> GateDecision {
    let allowed = approver.approve(action, target);

    let message = if allowed {
        format!("ALLOWED | {} | {}", action, target)
    } else {
        format!("DENIED | {} | {}", action, target)
    };

    if allowed {
        log::info!("{}", message);
    } else {
        log::warn!("{}", message);
    }

    GateDecision {
        allowed,
        action: action.to_string(),
        target: target.to_string(),
        message,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{AlwaysDeny, AutoApprove};
    use std::cell::RefCell;

    #[test]
    fn auto_policy_allows() {
        let decision = process(&AutoApprove, "write", "/data/a.txt");
        assert!(decision.allowed);
        assert_eq!(decision.message, "ALLOWED | write | /data/a.txt");

        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["allowed"], true);
        assert_eq!(value["target"], "/data/a.txt");
    }

    #[test]
    fn deny_policy_blocks() {
        let decision = process(&AlwaysDeny, "create directory", "/data/new");
        assert!(!decision.allowed);
        assert!(decision.message.starts_with("DENIED"));
    }

    struct Recorder(RefCell<Vec<(String, String)>>);

    impl Approver for Recorder {
        fn approve(&self, action: &str, target: &str) -> bool {
            self.0.borrow_mut().push((action.into(), target.into()));
            true
        }
    }

    #[test]
    fn approver_sees_exact_action_and_target() {
        let recorder = Recorder(RefCell::new(Vec::new()));
        process(&recorder, "move", "/a -> /b");
        process(&recorder, "move", "/a -> /b");
        // Consulted on every call, never cached
        assert_eq!(recorder.0.borrow().len(), 2);
        assert_eq!(recorder.0.borrow()[0], ("move".to_string(), "/a -> /b".to_string()));
    }
}
