use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::generate::{GenerateArgs, KindArg};

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Atelier CLI - AI design tools directory and generative studio")]
#[command(long_about = None)]
struct Cli {
    /// Read config.toml and catalog.toml from this directory
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tool directory
    Catalog {
        /// Case-insensitive search over name, description and use cases
        #[arg(long, short)]
        search: Option<String>,
        /// Only show this category ("All" shows everything)
        #[arg(long, short)]
        category: Option<String>,
        /// List the categories instead of the tools
        #[arg(long)]
        categories: bool,
    },
    /// Run one generation task
    Generate {
        /// What to generate
        kind: KindArg,
        /// Room description, prompt idea or image prompt
        text: String,
        /// Target tool for prompt generation
        #[arg(long, default_value = atelier_core::generation::prompt::DEFAULT_TARGET_TOOL)]
        tool: String,
        /// Write a generated image to this file
        #[arg(long, short, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config_dir)?;

    match cli.command {
        Commands::Catalog {
            search,
            category,
            categories,
        } => commands::catalog::run(&ctx, search, category, categories)?,
        Commands::Generate {
            kind,
            text,
            tool,
            out,
        } => {
            commands::generate::run(
                &ctx,
                GenerateArgs {
                    kind,
                    text,
                    tool,
                    out,
                },
            )
            .await?
        }
        Commands::Config => commands::config::show(&ctx)?,
    }

    Ok(())
}
