/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Canopy CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(version)]
#[command(about = "Render declarative markup templates", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against a JSON model
    Render {
        /// Markup template to render
        template: PathBuf,

        /// JSON file holding the model (defaults to an empty mapping)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// JSON array of model mutations to replay after the first render
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// YAML file with engine settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write output to FILE instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the tree after every script step, not just the last one
        #[arg(long, requires = "script")]
        snapshots: bool,
    },

    /// Parse a template and list the directives it contains
    Check {
        /// Markup template to check
        template: PathBuf,

        /// YAML file with engine settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "canopy=info",
        1 => "canopy=debug",
        _ => "canopy=trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. RUST_LOG wins over -v.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Render {
            template,
            model,
            script,
            config,
            output,
            snapshots,
        } => commands::render::execute(commands::render::RenderArgs {
            template,
            model,
            script,
            config,
            output,
            snapshots,
        }),
        Commands::Check { template, config } => {
            commands::check::execute(commands::check::CheckArgs { template, config })
        }
    }
}
