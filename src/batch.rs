//! Directory batches and multi-document collections.
//!
//! Per-document failures are logged and recorded and the run continues.
//! Errors for which [`Error::is_fatal`](crate::Error::is_fatal) holds abort
//! the run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Outline, Section};
use crate::pipeline::{document_name, Pipeline};
use crate::render::{outline_to_json, JsonFormat};
use crate::source::is_pdf;

/// List the PDF files directly inside `dir`, sorted by path.
///
/// Files are matched by a case-insensitive `.pdf` extension.
pub fn find_pdfs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// Write an outline as `<output_dir>/<stem>.json`, returning the path.
pub fn write_outline(outline: &Outline, pdf_path: &Path, output_dir: &Path, format: JsonFormat) -> Result<PathBuf> {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "outline".to_string());
    let out = output_dir.join(format!("{}.json", stem));
    std::fs::write(&out, outline_to_json(outline, format)?)?;
    Ok(out)
}

/// Outcome of one document in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub input: PathBuf,
    /// Written outline, if the document succeeded
    pub output: Option<PathBuf>,
    pub headings: usize,
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| !d.is_success())
    }
}

/// Build outlines for every PDF in `input_dir` and write them to
/// `output_dir` (created if missing).
pub fn process_directory(
    pipeline: &Pipeline,
    input_dir: &Path,
    output_dir: &Path,
    format: JsonFormat,
) -> Result<BatchReport> {
    let pdfs = find_pdfs(input_dir)?;
    process_files(pipeline, &pdfs, output_dir, format, |_, _| {})
}

/// Build and write outlines for `pdfs` in order, calling `progress` after
/// each document with its report and the number of documents done.
pub fn process_files<F>(
    pipeline: &Pipeline,
    pdfs: &[PathBuf],
    output_dir: &Path,
    format: JsonFormat,
    mut progress: F,
) -> Result<BatchReport>
where
    F: FnMut(&DocumentReport, usize),
{
    std::fs::create_dir_all(output_dir)?;
    let mut report = BatchReport::default();

    for (i, pdf) in pdfs.iter().enumerate() {
        let result = pipeline
            .outline_from_path(pdf)
            .and_then(|outline| {
                let out = write_outline(&outline, pdf, output_dir, format)?;
                Ok((outline, out))
            });

        let doc = match result {
            Ok((outline, out)) => DocumentReport {
                input: pdf.clone(),
                output: Some(out),
                headings: outline.headings.len(),
                error: None,
            },
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Failed to process {}: {}", pdf.display(), e);
                DocumentReport {
                    input: pdf.clone(),
                    output: None,
                    headings: 0,
                    error: Some(e.to_string()),
                }
            }
        };

        progress(&doc, i + 1);
        report.documents.push(doc);
    }

    log::debug!(
        "Batch finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

/// One document of a collection: a PDF and its persisted outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub pdf_path: PathBuf,
    pub outline_path: PathBuf,
}

/// Input description of a multi-document collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInput {
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub job_to_be_done: Option<String>,
    #[serde(default)]
    pub documents: Vec<CollectionDocument>,
}

impl CollectionInput {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Run metadata carried alongside a collection's sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub input_documents: Vec<String>,
    pub persona: Option<String>,
    pub job_to_be_done: Option<String>,
    pub processing_timestamp: DateTime<Utc>,
    pub total_sections: usize,
}

/// Sections of every document in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionOutput {
    pub metadata: CollectionMetadata,
    pub sections: Vec<Section>,
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Extract sections for every document of a collection.
///
/// Relative paths resolve against `base_dir`. Documents whose files are
/// missing or fail to process are skipped with a warning.
pub fn extract_collection(pipeline: &Pipeline, input: &CollectionInput, base_dir: &Path) -> Result<CollectionOutput> {
    let mut sections = Vec::new();

    for doc in &input.documents {
        let pdf_path = resolve(base_dir, &doc.pdf_path);
        let outline_path = resolve(base_dir, &doc.outline_path);

        if !is_pdf(&pdf_path) {
            log::warn!("PDF not found or unreadable: {}", pdf_path.display());
            continue;
        }
        if !outline_path.is_file() {
            log::warn!("Outline not found: {}", outline_path.display());
            continue;
        }

        let result = Outline::load(&outline_path)
            .and_then(|outline| pipeline.sections_from_path(&pdf_path, &outline));

        match result {
            Ok(doc_sections) => {
                log::debug!(
                    "{}: {} sections",
                    pdf_path.display(),
                    doc_sections.len()
                );
                sections.extend(doc_sections);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => log::warn!("Failed to process {}: {}", pdf_path.display(), e),
        }
    }

    let input_documents = input
        .documents
        .iter()
        .map(|d| document_name(&d.pdf_path))
        .collect();

    Ok(CollectionOutput {
        metadata: CollectionMetadata {
            input_documents,
            persona: input.persona.clone(),
            job_to_be_done: input.job_to_be_done.clone(),
            processing_timestamp: Utc::now(),
            total_sections: sections.len(),
        },
        sections,
    })
}

impl CollectionOutput {
    /// Sections paired with their stable identifiers.
    pub fn identified_sections(&self) -> impl Iterator<Item = (String, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.section_id(i), s))
    }
}
