//! # pf-cli
//!
//! Command-line interface for Policy Forge.
//!
//! - `pf compile`: compile scope configurations into deny-policy manifests
//! - `pf level`: show the compliance level a framework set and classification demand
//! - `pf plan`: diff a scope against a previously applied manifest
//! - `pf audit verify/tail/violation`: inspect and extend the audit trail

mod commands;
mod config;
mod resolver;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::ForgeConfig;

/// Policy Forge: compile compliance choices into deny policies.
#[derive(Parser)]
#[command(name = "pf", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Log at debug level (overrides RUST_LOG and the configured filter).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile one or more scope configurations into manifests.
    Compile {
        /// Scope configuration files (.yaml, .yml, or .json).
        #[arg(required = true)]
        configs: Vec<PathBuf>,
        /// Output directory (defaults to .pf/manifests).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Evaluation time as RFC 3339 (defaults to now).
        #[arg(long)]
        at: Option<String>,
        /// Print manifests to stdout instead of writing files.
        #[arg(long)]
        stdout: bool,
    },
    /// Show the compliance level for a set of frameworks and a classification.
    Level {
        /// Enabled framework (repeatable): iso27001, soc2, pci_dss, hipaa, gdpr.
        #[arg(long = "framework")]
        frameworks: Vec<String>,
        /// Data classification: public, internal, confidential, restricted.
        #[arg(long, default_value = "public")]
        classification: String,
    },
    /// Show what applying a scope configuration would change.
    Plan {
        /// Scope configuration file.
        config: PathBuf,
        /// Previously applied manifest (omit to plan from scratch).
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Evaluation time as RFC 3339 (defaults to now).
        #[arg(long)]
        at: Option<String>,
    },
    /// Inspect or extend the audit trail.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
}

fn init_tracing(config: &ForgeConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pf_policy=debug,pf_audit=debug,pf_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = ForgeConfig::load(&project_root)?;
    init_tracing(&config, cli.verbose);

    match &cli.command {
        Commands::Compile {
            configs,
            out,
            at,
            stdout,
        } => commands::compile::execute(&config, configs, out.as_deref(), at.as_deref(), *stdout),
        Commands::Level {
            frameworks,
            classification,
        } => commands::level::execute(frameworks, classification),
        Commands::Plan {
            config: input,
            previous,
            at,
        } => commands::plan::execute(&config, input, previous.as_deref(), at.as_deref()),
        Commands::Audit { command } => commands::audit::execute(command, &config),
    }
}
