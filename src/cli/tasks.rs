//! Explain, generate and translate commands.

use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use tracing::debug;

use crate::assist::{CodeAssistant, TaskRequest, TaskResult};
use crate::config::AssistConfig;

/// Where a code snippet comes from.
#[derive(Args, Debug, Default)]
pub struct CodeInput {
    /// Code snippet; read from stdin when neither this nor --file is given.
    #[arg(value_name = "CODE", conflicts_with = "file")]
    pub code: Option<String>,

    /// Read the code snippet from a file.
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl CodeInput {
    /// Resolves the snippet from the argument, the file or stdin.
    pub fn read(&self) -> Result<String> {
        let code = match (&self.code, &self.file) {
            (Some(code), _) => code.clone(),
            (None, Some(path)) => read_file(path)?,
            (None, None) => read_stdin()?,
        };
        if code.trim().is_empty() {
            bail!("No code given");
        }
        Ok(code)
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("No code given; pass it as an argument, with --file, or on stdin");
    }
    let mut code = String::new();
    stdin
        .read_to_string(&mut code)
        .context("Failed to read code from stdin")?;
    Ok(code)
}

/// Output options shared by the task commands.
#[derive(Args, Debug, Default)]
pub struct OutputOptions {
    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Explain command options.
#[derive(Parser)]
pub struct ExplainCommand {
    /// Snippet to explain.
    #[command(flatten)]
    pub input: CodeInput,

    /// Output options.
    #[command(flatten)]
    pub output: OutputOptions,
}

/// Generate command options.
#[derive(Parser)]
pub struct GenerateCommand {
    /// Language to generate.
    #[arg(long, short = 'l')]
    pub language: String,

    /// What the code should do.
    #[arg(value_name = "DESCRIPTION")]
    pub description: String,

    /// Output options.
    #[command(flatten)]
    pub output: OutputOptions,
}

/// Translate command options.
#[derive(Parser)]
pub struct TranslateCommand {
    /// Target language.
    #[arg(long, short = 't')]
    pub to: String,

    /// Snippet to translate.
    #[command(flatten)]
    pub input: CodeInput,

    /// Output options.
    #[command(flatten)]
    pub output: OutputOptions,
}

impl ExplainCommand {
    /// Executes the explain command.
    pub async fn execute(self) -> Result<()> {
        let request = TaskRequest::Explain {
            code: self.input.read()?,
        };
        run_and_print(request, &self.output).await
    }
}

impl GenerateCommand {
    /// Executes the generate command.
    pub async fn execute(self) -> Result<()> {
        if self.description.trim().is_empty() {
            bail!("Description must not be empty");
        }
        let request = TaskRequest::Generate {
            description: self.description,
            language: self.language,
        };
        run_and_print(request, &self.output).await
    }
}

impl TranslateCommand {
    /// Executes the translate command.
    pub async fn execute(self) -> Result<()> {
        let request = TaskRequest::Translate {
            code: self.input.read()?,
            target_language: self.to,
        };
        run_and_print(request, &self.output).await
    }
}

async fn run_and_print(request: TaskRequest, output: &OutputOptions) -> Result<()> {
    let config = AssistConfig::load()?;
    let assistant = CodeAssistant::from_config(&config)?;
    debug!(task = %request.kind(), "Running task");

    let result = assistant.run(request).await;
    if output.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        write_result(&result, &mut io::stdout().lock(), &mut io::stderr().lock())
            .context("Failed to write result")?;
    }

    if let TaskResult::Failed { error } = result {
        bail!(error);
    }
    Ok(())
}

/// Writes code to `out` and labels to `notes`, so piped output stays valid code.
fn write_result(
    result: &TaskResult,
    out: &mut impl Write,
    notes: &mut impl Write,
) -> io::Result<()> {
    match result {
        TaskResult::Explanation(explanation) => {
            writeln!(out, "Language: {}", explanation.language)?;
            writeln!(out)?;
            writeln!(out, "{}", explanation.explanation)
        }
        TaskResult::GeneratedCode(generated) => writeln!(out, "{}", generated.generated_code),
        TaskResult::Translation(translation) => {
            writeln!(
                notes,
                "# {} -> {}",
                translation.source_language, translation.target_language
            )?;
            writeln!(out, "{}", translation.translated_code)
        }
        TaskResult::Failed { .. } => Ok(()),
    }
}
