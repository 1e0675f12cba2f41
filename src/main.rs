// DriveGate - Main Entry Point
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CLI and MCP stdio server. All filesystem tool calls route through the gate.
// Usage:
//   drivegate serve                          # Run MCP server (stdio)
//   drivegate call <tool> <json_args>        # One-shot tool call
//   drivegate tools                          # Print tool definitions
//   drivegate normalize <path>               # Show how a path resolves
//   drivegate config                         # Print effective config

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drivegate::{
    approval::{self, PromptChannel},
    config::{ApprovalMode, GateConfig},
    mcp, paths, registry,
    outcome::Outcome,
    session::Session,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "drivegate")]
#[command(author = "Joseph Stone")]
#[command(version)]
#[command(about = "DriveGate - MCP filesystem tools confined to one allowed root")]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, env = "DRIVEGATE_CONFIG", default_value_os_t = paths::default_config_path())]
    config: PathBuf,

    /// Allowed root directory (overrides config)
    #[arg(short, long, env = "DRIVEGATE_ROOT")]
    root: Option<String>,

    /// Approval policy for destructive operations (overrides config)
    #[arg(short, long, value_enum)]
    approval: Option<ApprovalMode>,

    /// Audit log file (overrides config)
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Disable the audit log file
    #[arg(long, conflicts_with = "audit_log")]
    no_audit: bool,

    /// Read ceiling in bytes (overrides config)
    #[arg(long)]
    max_read_size: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server (stdio JSON-RPC)
    Serve,

    /// One-shot tool call through the gate. Exits 1 unless the call succeeds.
    Call {
        /// Tool name (read_file, write_file, list_directory, etc.)
        tool: String,

        /// Arguments as JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Print the tool definitions served by tools/list
    Tools,

    /// Normalize a path against the allowed root
    Normalize {
        /// Path as an agent would send it
        path: String,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Config file first, then CLI flags and env vars on top
fn effective_config(cli: &Cli) -> Result<GateConfig> {
    let mut config = GateConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    if let Some(ref root) = cli.root {
        config.allowed_root = root.clone();
    }
    if let Some(mode) = cli.approval {
        config.approval = mode;
    }
    if let Some(limit) = cli.max_read_size {
        config.max_read_size = limit;
    }
    if cli.no_audit {
        config.audit_log = None;
    } else if let Some(ref path) = cli.audit_log {
        config.audit_log = Some(path.clone());
    }

    Ok(config)
}

fn main() -> Result<()> {
    // Initialize logging (safe if already init)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    match &cli.command {
        Commands::Serve => {
            // Prompts go to the terminal; stdin/stdout belong to the protocol
            let approver = approval::build(config.approval, PromptChannel::Terminal)?;
            let session = Session::start(&config, approver)?;
            mcp::run(session).context("MCP server I/O failed")?;
        }

        Commands::Call { tool, args } => {
            let args: serde_json::Value = serde_json::from_str(args)
                .with_context(|| format!("Invalid args JSON: {}", args))?;

            let approver = approval::build(config.approval, PromptChannel::Stdio)?;
            let mut session = Session::start(&config, approver)?;
            let outcome = session.invoke(tool, &args);

            println!("{}", serde_json::to_string_pretty(&outcome.to_payload())?);
            session.close();

            if !matches!(outcome, Outcome::Success(_)) {
                std::process::exit(1);
            }
        }

        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&registry::definitions())?);
        }

        Commands::Normalize { path } => {
            let root = config.allowed_root()?;
            match root.normalize(Some(path)) {
                Ok(resolved) => println!("{}", resolved.display()),
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&e.to_payload())?);
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { save } => {
            // Validate before showing or saving
            let root = config.allowed_root()?;
            println!("DriveGate v{}", env!("CARGO_PKG_VERSION"));
            println!("Config file:   {:?}", cli.config);
            println!("Allowed root:  {}", root.path().display());
            println!("Max read size: {} bytes", config.max_read_size);
            println!("Approval:      {:?}", config.approval);
            match config.audit_log {
                Some(ref p) => println!("Audit log:     {}", p.display()),
                None => println!("Audit log:     (disabled)"),
            }

            if *save {
                config.save(&cli.config)
                    .with_context(|| format!("Failed to write config to {:?}", cli.config))?;
                println!();
                println!("Saved to {:?}", cli.config);
            }
        }
    }

    Ok(())
}
