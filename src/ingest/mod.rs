// Ingestion module
// PDF text extraction and batch loading of document directories


use console::user_attended_stderr;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};

use crate::rag::RagPipeline;
use crate::store::MetadataRecord;
use crate::{RagError, Result};

/// A file that could not be ingested and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of ingesting a directory; one bad file never stops the batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub succeeded: usize,
    pub chunks_added: usize,
    pub failed: Vec<IngestFailure>,
}

impl IngestReport {
    #[inline]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    fn record(&mut self, path: &Path, outcome: Result<usize>) {
        match outcome {
            Ok(chunks) => {
                self.succeeded += 1;
                self.chunks_added += chunks;
            }
            Err(e) => {
                warn!("Failed to ingest {}: {}", path.display(), e);
                self.failed.push(IngestFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Extract the text of each page of a PDF, in page order.
///
/// Extraction runs on its own thread so a panic inside the PDF parser is
/// reported as an error for this file.
#[inline]
pub fn extract_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let source = path.display().to_string();

    let handle = thread::spawn(move || pdf_extract::extract_text_from_mem_by_pages(&bytes));
    let pages = handle
        .join()
        .map_err(|_| RagError::Ingestion(format!("PDF parser crashed on {}", source)))?
        .map_err(|e| {
            RagError::Ingestion(format!("Failed to extract text from {}: {}", source, e))
        })?;

    debug!("Extracted {} pages from {}", pages.len(), source);
    Ok(pages)
}

/// Ingest every `.txt` file in `dir`, titling each after its file name
#[inline]
pub fn ingest_text_dir(pipeline: &mut RagPipeline, dir: &Path) -> Result<IngestReport> {
    let files = files_with_extension(dir, "txt")?;
    info!("Ingesting {} text files from {}", files.len(), dir.display());

    let progress = progress_bar(files.len());
    let mut report = IngestReport::default();

    for path in &files {
        progress.set_message(file_name(path));
        let outcome = fs::read_to_string(path)
            .map_err(RagError::from)
            .map(|text| pipeline.add_text(&text, &text_metadata(path)));
        report.record(path, outcome);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(report)
}

/// Ingest every `.pdf` file in `dir`, tagging chunks with `doc_type`
#[inline]
pub fn ingest_pdf_dir(
    pipeline: &mut RagPipeline,
    dir: &Path,
    doc_type: &str,
) -> Result<IngestReport> {
    let files = files_with_extension(dir, "pdf")?;
    info!("Ingesting {} PDF files from {}", files.len(), dir.display());

    let progress = progress_bar(files.len());
    let mut report = IngestReport::default();

    for path in &files {
        progress.set_message(file_name(path));
        let outcome = pipeline.add_pdf(path, doc_type);
        report.record(path, outcome);
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(report)
}

/// `hostel_rules.txt` becomes "Hostel Rules"
#[inline]
pub fn title_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().replace('_', " "));
    title_case(&stem)
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_metadata(path: &Path) -> MetadataRecord {
    MetadataRecord::titled(title_from_path(path))
        .with_source(file_name(path))
        .with_type("text")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RagError::Ingestion(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();
    Ok(files)
}

const PROGRESS_TEMPLATE: &str = "{bar:40} [{pos}/{len}] Ingesting {msg}";

fn progress_bar(len: usize) -> ProgressBar {
    if !user_attended_stderr() {
        return ProgressBar::hidden();
    }

    match ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        Ok(style) => ProgressBar::new(len as u64).with_style(style),
        Err(e) => {
            warn!("Progress display disabled: {}", e);
            ProgressBar::hidden()
        }
    }
}
