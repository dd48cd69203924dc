//! pagecraft command-line tool
//!
//! Runs the reorganize, merge and scrub pipelines on local files or URLs.

mod input;
mod pages;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagecraft_core::{LopdfBuilder, MergeQueue, PageCraftConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::input::read_input;
use crate::pages::parse_pages;

#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(version, about = "Reorganize, merge and scrub PDF documents")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reorder, rotate and drop pages of one document
    Organize {
        /// File path or http(s) URL
        input: String,
        /// Pages to keep, in output order: "3, 1-2:90, 5:270"
        #[arg(short, long)]
        pages: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Concatenate documents in the order given
    Merge {
        #[arg(required = true)]
        inputs: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rebuild a document without its metadata
    Scrub {
        input: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Producer to stamp instead of the configured one
        #[arg(long)]
        producer: Option<String>,
    },
    /// Print page count, version and metadata
    Inspect {
        input: String,
        #[arg(long)]
        json: bool,
    },
    /// Write a labelled sample document
    Sample {
        #[arg(short = 'n', long, default_value = "3")]
        pages: u32,
        #[arg(short, long, default_value = "Sample")]
        label: String,
        #[arg(short, long, default_value = "sample.pdf")]
        output: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // Logs go to stderr so stdout stays clean for `inspect --json`.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PageCraftConfig> {
    match path {
        Some(path) if path.exists() => PageCraftConfig::from_file(path)
            .with_context(|| format!("Loading config {}", path.display())),
        Some(path) => {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(PageCraftConfig::default())
        }
        None => Ok(PageCraftConfig::default()),
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), size_bytes = bytes.len(), "output written");
    Ok(())
}

fn output_path(output: Option<PathBuf>, default: &str) -> PathBuf {
    output.unwrap_or_else(|| PathBuf::from(default))
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let builder = LopdfBuilder;

    match args.command {
        Command::Organize {
            input,
            pages,
            output,
        } => {
            let projection = parse_pages(&pages).context("Invalid --pages")?;
            let input = read_input(&input).await?;
            let bytes = pagecraft_core::reorganize(&builder, &input.bytes, &projection)
                .with_context(|| format!("Reorganizing {}", input.name))?;
            write_output(
                &output_path(output, &config.output.organize_filename),
                &bytes,
            )
            .await
        }
        Command::Merge { inputs, output } => {
            let mut queue = MergeQueue::new();
            for source in &inputs {
                let input = read_input(source).await?;
                queue.push(input.name, input.bytes);
            }
            let bytes = pagecraft_core::merge(&builder, &queue, |current, total, message| {
                if current < total {
                    info!(current = current + 1, total, "{}", message);
                }
            })?;
            write_output(&output_path(output, &config.output.merge_filename), &bytes).await
        }
        Command::Scrub {
            input,
            output,
            producer,
        } => {
            let input = read_input(&input).await?;
            let producer = producer.as_deref().unwrap_or(&config.producer);
            let bytes = pagecraft_core::scrub(&builder, &input.bytes, producer)
                .with_context(|| format!("Scrubbing {}", input.name))?;
            write_output(&output_path(output, &config.output.scrub_filename), &bytes).await
        }
        Command::Inspect { input, json } => {
            let input = read_input(&input).await?;
            let summary = pagecraft_core::inspect(&input.bytes)
                .with_context(|| format!("Inspecting {}", input.name))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("File:      {}", input.name);
                println!("Pages:     {}", summary.page_count);
                println!("Version:   {}", summary.version);
                println!("Encrypted: {}", summary.encrypted);
                if summary.header_offset > 0 {
                    println!("Skipped:   {} leading bytes", summary.header_offset);
                }
                if let Some(title) = &summary.title {
                    println!("Title:     {}", title);
                }
                if let Some(author) = &summary.author {
                    println!("Author:    {}", author);
                }
            }
            Ok(())
        }
        Command::Sample {
            pages,
            label,
            output,
        } => {
            let bytes = pagecraft_core::sample::sample_document(&label, pages.max(1))?;
            write_output(&output, &bytes).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_core::sample::sample_document;
    use pagecraft_core::{BuiltDocument, DocumentBuilder};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pagecraft").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_args_organize() {
        let args = parse(&["organize", "in.pdf", "--pages", "2,1:90"]);
        assert!(matches!(args.command, Command::Organize { .. }));
        assert!(!args.verbose);
    }

    #[test]
    fn test_merge_requires_inputs() {
        assert!(Args::try_parse_from(["pagecraft", "merge"]).is_err());
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/pagecraft.toml"))).unwrap();
        assert_eq!(config, PageCraftConfig::default());
    }

    #[tokio::test]
    async fn test_merge_command_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        let out = dir.path().join("out.pdf");
        std::fs::write(&a, sample_document("A", 1).unwrap()).unwrap();
        std::fs::write(&b, sample_document("B", 2).unwrap()).unwrap();

        run(parse(&[
            "merge",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ]))
        .await
        .unwrap();

        let merged = LopdfBuilder.load(std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(merged.page_count(), 3);
    }

    #[tokio::test]
    async fn test_organize_command_rejects_bad_pages() {
        let err = run(parse(&["organize", "in.pdf", "--pages", "0"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid --pages"));
    }
}
