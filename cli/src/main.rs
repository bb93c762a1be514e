//! pdfoutline CLI - PDF heading outline and section extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfoutline::batch::{find_pdfs, process_files, write_outline};
use pdfoutline::layout::DEFAULT_Y_TOLERANCE;
use pdfoutline::render::{features_to_json, outline_to_json, sections_to_json, to_json};
use pdfoutline::{
    extract_collection, CollectionInput, ExtractOptions, ForestClassifier, JsonFormat, LopdfSource,
    Outline, PageTextMode, Pipeline, SpanSource,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdfoutline")]
#[command(version)]
#[command(about = "Extract heading outlines and sections from PDF files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that run the extraction pipeline.
#[derive(clap::Args)]
struct PipelineArgs {
    /// Decision-forest model (JSON); the font-size heuristic is used if omitted
    #[arg(long, value_name = "FILE", env = "PDFOUTLINE_MODEL")]
    model: Option<PathBuf>,

    /// Number of page ranges extracted concurrently
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Extract pages on a single thread
    #[arg(long)]
    sequential: bool,

    /// Vertical tolerance for grouping spans into lines, in points
    #[arg(long, value_name = "PT", default_value_t = DEFAULT_Y_TOLERANCE)]
    y_tolerance: f32,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the outline of a PDF, or of every PDF in a directory
    Outline {
        /// Input PDF file or directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output directory (stdout for a single file if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Extract section content using a persisted outline
    Sections {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Outline JSON produced by the `outline` command
        #[arg(long, value_name = "FILE")]
        outline: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Use the PDF's plain page text instead of assembled lines
        #[arg(long)]
        raw_text: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Extract sections for every document listed in a collection file
    Collection {
        /// Collection JSON ({persona, job_to_be_done, documents})
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Base directory for relative paths (defaults to the collection file's directory)
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Export per-line classification features
    Features {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Outline {
            input,
            output,
            compact,
            pipeline,
        } => cmd_outline(&input, output.as_deref(), json_format(compact), &pipeline),
        Commands::Sections {
            input,
            outline,
            output,
            raw_text,
            pipeline,
        } => cmd_sections(&input, &outline, output.as_deref(), raw_text, &pipeline),
        Commands::Collection {
            input,
            output,
            base_dir,
            pipeline,
        } => cmd_collection(&input, output.as_deref(), base_dir.as_deref(), &pipeline),
        Commands::Features {
            input,
            output,
            compact,
            pipeline,
        } => cmd_features(&input, output.as_deref(), json_format(compact), &pipeline),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

impl PipelineArgs {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new()
            .lenient()
            .with_y_tolerance(self.y_tolerance);
        if self.sequential {
            options = options.sequential();
        }
        if let Some(workers) = self.workers {
            options = options.with_workers(workers);
        }
        options
    }

    /// Build the pipeline; a model that fails to load aborts the command.
    fn build(&self, options: ExtractOptions) -> Result<Pipeline, pdfoutline::Error> {
        match &self.model {
            Some(path) => {
                let model = ForestClassifier::from_path(path)?;
                log::info!(
                    "Loaded {} trees from {}",
                    model.tree_count(),
                    path.display()
                );
                Ok(Pipeline::new(Arc::new(model), options))
            }
            None => Ok(Pipeline::with_heuristics(options)),
        }
    }
}

fn write_or_print(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_outline(input: &Path, output: Option<&Path>, format: JsonFormat, args: &PipelineArgs) -> CliResult {
    let pipeline = args.build(args.options())?;

    if !input.is_dir() {
        let outline = pipeline.outline_from_path(input)?;
        return match output {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = write_outline(&outline, input, dir, format)?;
                println!("{} {}", "Saved to".green(), path.display());
                Ok(())
            }
            None => write_or_print(None, &outline_to_json(&outline, format)?),
        };
    }

    let output_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("output"));
    let pdfs = find_pdfs(input)?;
    if pdfs.is_empty() {
        println!("{} {}", "No PDF files in".yellow(), input.display());
        return Ok(());
    }

    let pb = ProgressBar::new(pdfs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let report = process_files(&pipeline, &pdfs, &output_dir, format, |doc, done| {
        if let Some(name) = doc.input.file_name() {
            pb.set_message(name.to_string_lossy().to_string());
        }
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} outlines written to {}",
        "Done!".green().bold(),
        report.succeeded(),
        output_dir.display()
    );
    if report.failed() > 0 {
        println!("{}", format!("{} documents failed:", report.failed()).yellow());
        for failure in report.failures() {
            println!(
                "  {} {}: {}",
                "└─".dimmed(),
                failure.input.display(),
                failure.error.as_deref().unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn cmd_sections(
    input: &Path,
    outline_path: &Path,
    output: Option<&Path>,
    raw_text: bool,
    args: &PipelineArgs,
) -> CliResult {
    let mut options = args.options();
    if raw_text {
        options = options.with_text_mode(PageTextMode::Raw);
    }
    let pipeline = args.build(options)?;

    let outline = Outline::load(outline_path)?;
    let sections = pipeline.sections_from_path(input, &outline)?;

    write_or_print(output, &sections_to_json(&sections, JsonFormat::Pretty)?)
}

fn cmd_collection(
    input: &Path,
    output: Option<&Path>,
    base_dir: Option<&Path>,
    args: &PipelineArgs,
) -> CliResult {
    let pipeline = args.build(args.options())?;
    let collection = CollectionInput::load(input)?;
    let base_dir = base_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let result = extract_collection(&pipeline, &collection, &base_dir)?;
    log::info!(
        "{} sections from {} documents",
        result.metadata.total_sections,
        result.metadata.input_documents.len()
    );

    write_or_print(output, &to_json(&result, JsonFormat::Pretty)?)
}

fn cmd_features(input: &Path, output: Option<&Path>, format: JsonFormat, args: &PipelineArgs) -> CliResult {
    let pipeline = args.build(args.options())?;
    let lines = pipeline.features_from_path(input)?;
    write_or_print(output, &features_to_json(&lines, format)?)
}

fn cmd_info(input: &Path) -> CliResult {
    let source = LopdfSource::open(input)?;
    let metadata = source.metadata();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);
    if let Some((width, height)) = source.page_size(1) {
        println!("{}: {} x {} pt", "Page size".bold(), width, height);
    }
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref subject) = metadata.subject {
        println!("{}: {}", "Subject".bold(), subject);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    let pipeline = Pipeline::with_heuristics(ExtractOptions::new().lenient());
    match pipeline.outline_from_path(input) {
        Ok(outline) => {
            println!();
            println!("{}", "Outline".cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
            println!("{}: {}", "Title".bold(), outline.title);
            println!("{}: {}", "Headings".bold(), outline.headings.len());
        }
        Err(e) => log::warn!("No outline: {}", e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_outline_args() {
        let cli = Cli::try_parse_from([
            "pdfoutline",
            "outline",
            "docs",
            "-o",
            "out",
            "--compact",
            "--workers",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Outline {
                input,
                output,
                compact,
                pipeline,
            } => {
                assert_eq!(input, PathBuf::from("docs"));
                assert_eq!(output, Some(PathBuf::from("out")));
                assert!(compact);
                assert_eq!(pipeline.options().worker_count(), 4);
            }
            _ => panic!("expected outline command"),
        }
    }

    #[test]
    fn test_sections_requires_outline() {
        assert!(Cli::try_parse_from(["pdfoutline", "sections", "a.pdf"]).is_err());
    }

    #[test]
    fn test_missing_model_aborts() {
        let args = PipelineArgs {
            model: Some(PathBuf::from("/nonexistent/model.json")),
            workers: None,
            sequential: false,
            y_tolerance: DEFAULT_Y_TOLERANCE,
        };
        let err = args.build(args.options()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_single_outline_written_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = write_outline(
            &Outline::default(),
            Path::new("input/report.pdf"),
            dir.path(),
            JsonFormat::Pretty,
        )
        .unwrap();
        assert!(out.ends_with("report.json"));
    }
}
