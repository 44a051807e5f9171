//! CLI interface for code-assist.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod config;
pub mod tasks;

use crate::assist::language::SUPPORTED_LANGUAGES;

/// code-assist: explain, generate and translate code with language models.
#[derive(Parser)]
#[command(name = "code-assist")]
#[command(about = "Explain, generate and translate code with language models", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories.
#[derive(Subcommand)]
pub enum Commands {
    /// Explains what a code snippet does.
    Explain(tasks::ExplainCommand),
    /// Generates code from a description.
    Generate(tasks::GenerateCommand),
    /// Translates a code snippet into another language.
    Translate(tasks::TranslateCommand),
    /// Lists the languages offered by default.
    Languages,
    /// Configuration inspection.
    Config(config::ConfigCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Explain(cmd) => cmd.execute().await,
            Commands::Generate(cmd) => cmd.execute().await,
            Commands::Translate(cmd) => cmd.execute().await,
            Commands::Languages => {
                for language in SUPPORTED_LANGUAGES {
                    println!("{language}");
                }
                Ok(())
            }
            Commands::Config(cmd) => cmd.execute(),
        }
    }
}
