//! iam-atlas command-line tool
//!
//! Loads an authorization export and prints lookups as JSON

use anyhow::Context;
use clap::{Parser, Subcommand};
use iam_atlas::{search, AtlasConfig, EntityKind, ExportLoader, ModelSummary};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "iam-atlas")]
#[command(about = "Explore AWS IAM authorization exports")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Export produced by `aws iam get-account-authorization-details`
    export: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Entity counts per kind and category
    Summary,
    /// A user with its groups, policies and assumable roles
    User { id: String },
    /// A role with its policies and the users who can assume it
    Role { id: String },
    /// A policy with its default document and attached entities
    Policy { id: String },
    /// A group with its policies and members
    Group { id: String },
    /// Entities whose name or ARN contains the query
    Search { query: String },
    /// Graph neighbourhood of one entity
    Related { kind: EntityKind, id: String },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AtlasConfig::load(path)
            .with_context(|| format!("failed to read config {:?}", path))?,
        None => AtlasConfig::default(),
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let model = ExportLoader::new(config)
        .load_path(&args.export)
        .with_context(|| format!("failed to load export {:?}", args.export))?;
    let resolver = model.resolver();

    info!("Running {:?}", args.command);

    match &args.command {
        Command::Summary => print_json(&ModelSummary::of(&model))?,
        Command::User { id } => print_json(&resolver.user_details(id)?)?,
        Command::Role { id } => print_json(&resolver.role_details(id)?)?,
        Command::Policy { id } => print_json(&resolver.policy_details(id)?)?,
        Command::Group { id } => print_json(&resolver.group_details(id)?)?,
        Command::Search { query } => print_json(&search(&model, query))?,
        Command::Related { kind, id } => print_json(&resolver.related_entities(*kind, id)?)?,
    }

    Ok(())
}
