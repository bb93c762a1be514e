//! Integration tests for directory batches and collections.

use std::path::Path;
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use pdfoutline::batch::{process_directory, write_outline};
use pdfoutline::error::Result;
use pdfoutline::{
    extract_collection, CollectionInput, Error, ExtractOptions, FeatureVector, Heading,
    HeadingClassifier, HeadingLevel, JsonFormat, Label, Outline, Pipeline,
};

/// Build a one-page PDF with one text line per `(font size, text)` entry,
/// 30 points apart.
fn write_pdf(path: &Path, lines: &[(i64, &str)]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for (i, (size, text)) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("Td", vec![0.into(), (-30).into()]));
        }
        operations.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(text.as_bytes().to_vec(), StringFormat::Literal)],
        ));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

const REPORT: &[(i64, &str)] = &[
    (24, "Quarterly Report"),
    (12, "Revenue grew"),
    (16, "Results"),
    (12, "Costs fell"),
];

/// Always fails with an error that should stop a batch.
struct BrokenModel;

impl HeadingClassifier for BrokenModel {
    fn name(&self) -> &str {
        "broken"
    }

    fn predict(&self, _rows: &[FeatureVector]) -> Result<Vec<Label>> {
        Err(Error::InvalidModel("tree 0 is empty".to_string()))
    }
}

#[test]
fn test_batch_records_failures_and_continues() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_pdf(&input.path().join("report.pdf"), REPORT);
    std::fs::write(input.path().join("broken.pdf"), "not really a pdf").unwrap();
    std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let pipeline = Pipeline::with_heuristics(ExtractOptions::new().lenient());
    let out_dir = output.path().join("outlines");
    let report = process_directory(&pipeline, input.path(), &out_dir, JsonFormat::Pretty).unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let failure = report.failures().next().unwrap();
    assert!(failure.input.ends_with("broken.pdf"));
    assert!(failure.output.is_none());

    let outline = Outline::load(out_dir.join("report.json")).unwrap();
    assert_eq!(outline.title, "Quarterly Report");
    assert!(outline
        .headings
        .iter()
        .any(|h| h.text == "Results" && h.page == 1));
    assert!(!out_dir.join("broken.json").exists());
}

#[test]
fn test_fatal_classifier_error_aborts_batch() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_pdf(&input.path().join("a.pdf"), REPORT);
    write_pdf(&input.path().join("b.pdf"), REPORT);

    let pipeline = Pipeline::new(Arc::new(BrokenModel), ExtractOptions::new());
    let err = process_directory(&pipeline, input.path(), output.path(), JsonFormat::Compact)
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(!output.path().join("b.json").exists());
}

#[test]
fn test_collection_skips_missing_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_pdf(&dir.path().join("report.pdf"), REPORT);

    let outline = Outline::new(
        "Quarterly Report",
        vec![Heading::new(HeadingLevel::H1, "Results", 1)],
    );
    write_outline(&outline, Path::new("report.pdf"), dir.path(), JsonFormat::Pretty).unwrap();

    let input: CollectionInput = serde_json::from_str(
        r#"{
            "persona": "Financial analyst",
            "job_to_be_done": "Summarize results",
            "documents": [
                {"pdf_path": "report.pdf", "outline_path": "report.json"},
                {"pdf_path": "missing.pdf", "outline_path": "missing.json"}
            ]
        }"#,
    )
    .unwrap();

    let pipeline = Pipeline::with_heuristics(ExtractOptions::new().lenient());
    let output = extract_collection(&pipeline, &input, dir.path()).unwrap();

    assert_eq!(output.sections.len(), 1);
    assert_eq!(output.sections[0].section_title, "Results");
    assert_eq!(output.sections[0].content, "Costs fell");
    assert_eq!(output.sections[0].document_name, "report.pdf");

    assert_eq!(output.metadata.total_sections, 1);
    assert_eq!(
        output.metadata.input_documents,
        vec!["report.pdf".to_string(), "missing.pdf".to_string()]
    );
    assert_eq!(output.metadata.persona.as_deref(), Some("Financial analyst"));

    let ids: Vec<String> = output.identified_sections().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["report.pdf_1_0"]);
}
