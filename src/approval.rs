// DriveGate - Approval Policy
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Pluggable decision consulted before every destructive operation.
// Variants: auto-approve, always-deny, interactive prompt.

use crate::config::ApprovalMode;
use anyhow::Context;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};

/// Decides whether one destructive action on one target may proceed.
/// Called immediately before the mutation; the answer is never cached.
pub trait Approver {
    fn approve(&self, action: &str, target: &str) -> bool;
}

/// Approves everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn approve(&self, _action: &str, _target: &str) -> bool {
        true
    }
}

/// Rejects everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysDeny;

impl Approver for AlwaysDeny {
    fn approve(&self, _action: &str, _target: &str) -> bool {
        false
    }
}

/// Human-in-the-loop checkpoint: writes a question, blocks on one answer line.
/// `y` / `yes` approves; anything else, EOF, or an I/O error denies.
pub struct PromptApprover<R, W> {
    io: RefCell<(R, W)>,
}

impl<R: BufRead, W: Write> PromptApprover<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { io: RefCell::new((reader, writer)) }
    }

    fn ask(&self, action: &str, target: &str) -> io::Result<bool> {
        let mut io = self.io.borrow_mut();
        let (reader, writer) = &mut *io;

        write!(writer, "Approve {} on {}? (y/n): ", action, target)?;
        writer.flush()?;

        let mut answer = String::new();
        if reader.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        let answer = answer.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

impl<R: BufRead, W: Write> Approver for PromptApprover<R, W> {
    fn approve(&self, action: &str, target: &str) -> bool {
        match self.ask(action, target) {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Approval prompt failed, denying {} on {}: {}", action, target, e);
                false
            }
        }
    }
}

/// Where an interactive prompt talks to the human
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChannel {
    /// Controlling terminal, since stdin/stdout carry the protocol
    Terminal,
    /// stdin for answers, stderr for questions (one-shot CLI use)
    Stdio,
}

#[cfg(windows)]
const TERMINAL_IN: &str = "CONIN$";
#[cfg(windows)]
const TERMINAL_OUT: &str = "CONOUT$";
#[cfg(not(windows))]
const TERMINAL_IN: &str = "/dev/tty";
#[cfg(not(windows))]
const TERMINAL_OUT: &str = "/dev/tty";

/// Build the approver for a configured mode
pub fn build(mode: ApprovalMode, channel: PromptChannel) -> anyhow::Result<Box<dyn Approver>> {
    let approver: Box<dyn Approver> = match mode {
        ApprovalMode::Auto => Box::new(AutoApprove),
        ApprovalMode::Deny => Box::new(AlwaysDeny),
        ApprovalMode::Interactive => match channel {
            PromptChannel::Stdio => Box::new(PromptApprover::new(
                BufReader::new(io::stdin()),
                io::stderr(),
            )),
            PromptChannel::Terminal => {
                let input = File::open(TERMINAL_IN)
                    .with_context(|| format!("Interactive approval needs a terminal: cannot open {}", TERMINAL_IN))?;
                let output = OpenOptions::new()
                    .write(true)
                    .open(TERMINAL_OUT)
                    .with_context(|| format!("Interactive approval needs a terminal: cannot open {}", TERMINAL_OUT))?;
                Box::new(PromptApprover::new(BufReader::new(input), output))
            }
        },
    };
    Ok(approver)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn fixed_policies() {
        assert!(AutoApprove.approve("write", "/x"));
        assert!(!AlwaysDeny.approve("write", "/x"));
    }

    #[test]
    fn prompt_accepts_yes_variants() {
        let approver = PromptApprover::new(Cursor::new("y\nYES\n"), Vec::new());
        assert!(approver.approve("write", "/x"));
        assert!(approver.approve("append", "/x"));
    }

    #[test]
    fn prompt_denies_other_answers_and_eof() {
        let approver = PromptApprover::new(Cursor::new("n\nmaybe\n"), Vec::new());
        assert!(!approver.approve("write", "/x"));
        assert!(!approver.approve("write", "/x"));
        assert!(!approver.approve("write", "/x"), "EOF must deny");
    }

    #[test]
    fn prompt_names_action_and_target() {
        let approver = PromptApprover::new(Cursor::new("y\n"), Vec::new());
        approver.approve("rename", "/a -> /b");
        let written = String::from_utf8(approver.io.borrow().1.clone()).unwrap();
        assert_eq!(written, "Approve rename on /a -> /b? (y/n): ");
    }

    #[test]
    fn build_fixed_modes_without_terminal() {
        let auto = build(ApprovalMode::Auto, PromptChannel::Terminal).unwrap();
        assert!(auto.approve("write", "/x"));
        let deny = build(ApprovalMode::Deny, PromptChannel::Terminal).unwrap();
        assert!(!deny.approve("write", "/x"));
    }
}
