//! JSON command boundary
//!
//! One request in, one [`ProcessResult`] out. Shells that cannot hold a
//! session (a worker message, a one-shot CLI call) drive the pipelines
//! through here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::builder::DocumentBuilder;
use crate::config::PageCraftConfig;
use crate::error::Result;
use crate::merge_queue::MergeQueue;
use crate::page_model::ProjectedPage;
use crate::pipeline::{merge, reorganize, scrub};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PdfCommand {
    Reorganize {
        file: Vec<u8>,
        pages: Vec<ProjectedPage>,
    },
    Merge {
        files: Vec<Vec<u8>>,
    },
    Scrub {
        file: Vec<u8>,
        /// Overrides the configured producer
        #[serde(default)]
        producer: Option<String>,
    },
}

impl PdfCommand {
    fn input_size(&self) -> usize {
        match self {
            PdfCommand::Reorganize { file, .. } | PdfCommand::Scrub { file, .. } => file.len(),
            PdfCommand::Merge { files } => files.iter().map(Vec::len).sum(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
}

impl ProcessResult {
    /// Decode the base64 payload of a successful result.
    pub fn decode_data(&self) -> Option<Vec<u8>> {
        self.data
            .as_deref()
            .and_then(|data| STANDARD.decode(data).ok())
    }
}

/// Run `command` and fold the outcome into a [`ProcessResult`].
pub fn execute<B: DocumentBuilder>(
    builder: &B,
    command: PdfCommand,
    config: &PageCraftConfig,
) -> ProcessResult {
    let input_size_bytes = command.input_size();
    match run(builder, command, config) {
        Ok(bytes) => ProcessResult {
            success: true,
            metrics: Some(ProcessMetrics {
                input_size_bytes,
                output_size_bytes: bytes.len(),
                page_count: crate::page_count(&bytes).unwrap_or(0),
            }),
            data: Some(STANDARD.encode(&bytes)),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "command failed");
            ProcessResult {
                success: false,
                data: None,
                error: Some(e.to_string()),
                metrics: None,
            }
        }
    }
}

fn run<B: DocumentBuilder>(
    builder: &B,
    command: PdfCommand,
    config: &PageCraftConfig,
) -> Result<Vec<u8>> {
    match command {
        PdfCommand::Reorganize { file, pages } => reorganize(builder, &file, &pages),
        PdfCommand::Merge { files } => {
            let mut queue = MergeQueue::new();
            for (i, file) in files.into_iter().enumerate() {
                queue.push(format!("document {}", i + 1), file);
            }
            merge(builder, &queue, |_, _, _| {})
        }
        PdfCommand::Scrub { file, producer } => scrub(
            builder,
            &file,
            producer.as_deref().unwrap_or(&config.producer),
        ),
    }
}
