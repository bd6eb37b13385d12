//! Rapman CLI
//!
//! The `rapman` command turns a test/publish configuration into a build plan.
//!
//! ## Commands
//!
//! - `plan`: render the build script, optionally writing test artifacts
//! - `materialize`: write permission manifests and imagefiles only
//! - `permissions`: print one test's `permissions.json`
//! - `imagefile`: print the base or output imagefile
//! - `validate`: load and check a configuration
//! - `condition`: print the run-gating condition

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rapman_core::{
    build_base_image, build_output_image, generate_permissions, materialize, Buildfile,
    PlanContext, Rapman,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "rapman")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate test build plans, sandbox manifests and imagefiles", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the build script for a configuration
    Plan {
        /// Configuration file (.yml, .toml or .json)
        #[arg(short, long, default_value = "rapman.toml")]
        config: PathBuf,

        /// Directory to write per-test artifacts into
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Build identifier scoping the registry scratch directory
        #[arg(long, env = "RAPMAN_BUILD_ID")]
        build_id: Option<String>,

        /// Write the script to this file instead of stdout
        #[arg(short, long)]
        script: Option<PathBuf>,
    },

    /// Write permission manifests and imagefiles without planning
    Materialize {
        #[arg(short, long, default_value = "rapman.toml")]
        config: PathBuf,

        /// Artifact root directory
        #[arg(short, long)]
        out: PathBuf,

        /// Only this test (default: every enabled test)
        #[arg(short, long)]
        test: Option<String>,
    },

    /// Print the permission manifest for one test
    Permissions {
        #[arg(short, long, default_value = "rapman.toml")]
        config: PathBuf,

        /// Test name
        #[arg(short, long)]
        test: String,
    },

    /// Print the base imagefile (or the output imagefile with --output)
    Imagefile {
        #[arg(short, long, default_value = "rapman.toml")]
        config: PathBuf,

        /// Print the output image instead of the base image
        #[arg(long)]
        output: bool,
    },

    /// Load and validate a configuration
    Validate {
        #[arg(short, long, default_value = "rapman.toml")]
        config: PathBuf,
    },

    /// Print the run-gating condition as JSON
    Condition {
        #[arg(short, long, default_value = "rapman.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    rapman_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Plan {
            config,
            out,
            build_id,
            script,
        } => cmd_plan(&config, out, build_id, script.as_deref()),
        Commands::Materialize { config, out, test } => {
            cmd_materialize(&config, &out, test.as_deref())
        }
        Commands::Permissions { config, test } => cmd_permissions(&config, &test),
        Commands::Imagefile { config, output } => cmd_imagefile(&config, output),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Condition { config } => cmd_condition(&config),
    }
}

fn load(path: &Path) -> Result<Rapman> {
    Rapman::from_path(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn cmd_plan(
    config: &Path,
    out: Option<PathBuf>,
    build_id: Option<String>,
    script_path: Option<&Path>,
) -> Result<()> {
    let cfg = load(config)?;

    let mut ctx = match build_id {
        Some(id) => PlanContext::new(id),
        None => PlanContext::default(),
    };
    if let Some(root) = out {
        ctx = ctx.with_artifacts_root(root);
    }

    let mut buildfile = Buildfile::new();
    let outcome = cfg
        .write(&mut buildfile, &ctx)
        .context("Failed to write build plan")?;

    info!(
        build_id = %ctx.build_id,
        tests = outcome.tests_written,
        artifacts = outcome.materialized.len(),
        state = ?outcome.final_state(),
        "plan written"
    );

    let rendered = buildfile.render();
    match script_path {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write script {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn cmd_materialize(config: &Path, out: &Path, only: Option<&str>) -> Result<()> {
    let cfg = load(config)?;

    let selected: Vec<_> = match only {
        Some(name) => vec![cfg
            .tests
            .iter()
            .find(|t| t.name == name)
            .with_context(|| format!("No test named {name:?}"))?],
        None => cfg.enabled_tests().collect(),
    };

    for test in selected {
        let written = materialize(out, test, &cfg)?;
        println!("{}  {}", written.permissions.sha256, written.permissions.path.display());
        println!(
            "{}  {}",
            written.base_imagefile.sha256,
            written.base_imagefile.path.display()
        );
        println!("{}  {}", written.imagefile.sha256, written.imagefile.path.display());
    }
    Ok(())
}

fn cmd_permissions(config: &Path, name: &str) -> Result<()> {
    let cfg = load(config)?;
    let test = cfg
        .tests
        .iter()
        .find(|t| t.name == name)
        .with_context(|| format!("No test named {name:?}"))?;
    print!("{}", generate_permissions(test));
    Ok(())
}

fn cmd_imagefile(config: &Path, output: bool) -> Result<()> {
    let cfg = load(config)?;
    let image = if output {
        build_output_image(&cfg)
    } else {
        build_base_image(&cfg)
    };
    print!("{}", image.render());
    Ok(())
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    base_image: &'a str,
    tests: usize,
    enabled_tests: usize,
    repo_configured: bool,
    repo_missing_fields: Vec<&'static str>,
    has_condition: bool,
}

fn cmd_validate(config: &Path) -> Result<()> {
    let cfg = load(config)?;
    let report = ValidationReport {
        base_image: &cfg.base_image_name,
        tests: cfg.tests.len(),
        enabled_tests: cfg.enabled_tests().count(),
        repo_configured: cfg.repo.is_some(),
        repo_missing_fields: cfg
            .repo
            .as_ref()
            .map(|r| r.missing_fields())
            .unwrap_or_default(),
        has_condition: cfg.condition().is_some(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_condition(config: &Path) -> Result<()> {
    let cfg = load(config)?;
    match cfg.condition() {
        Some(cond) => println!("{}", serde_json::to_string_pretty(cond)?),
        None => println!("none"),
    }
    Ok(())
}
