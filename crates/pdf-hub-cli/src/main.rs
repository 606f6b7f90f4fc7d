//! PDF Hub CLI - merge, reduce and convert PDF documents from the shell.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_hub_core::util::{format_mb, reduced_filename};
use pdf_hub_core::{AppConfig, CombinePhase, OptimizeOptions, PdfToolkit, UploadedFile};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "pdf-hub")]
#[command(author, version, about = "Merge, reduce and convert PDF documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Combined size ceiling in MB
    #[arg(long, global = true, env = "PDF_HUB_CEILING_MB")]
    ceiling_mb: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine PDFs into one document, in the order given
    Merge {
        /// Input PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (default: arquivos_combinados.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Shrink a PDF by recompressing images and dropping metadata
    Reduce {
        /// Input PDF file
        input: PathBuf,

        /// Output file (default: <input>_reduzido.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JPEG quality for images (10-100)
        #[arg(short, long)]
        quality: Option<u8>,

        /// Target image resolution (50-300)
        #[arg(short, long)]
        dpi: Option<u32>,
    },

    /// Convert a PDF to an editable DOCX document
    Convert {
        /// Input PDF file
        input: PathBuf,

        /// Output file (default: documento_convertido.docx next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    if let Some(ceiling_mb) = args.ceiling_mb {
        config.combine.ceiling_mb = ceiling_mb;
    }

    let toolkit = Arc::new(PdfToolkit::new(config).context("Invalid configuration")?);

    match args.command {
        Command::Merge { inputs, output } => merge(&toolkit, &inputs, output).await,
        Command::Reduce {
            input,
            output,
            quality,
            dpi,
        } => reduce(&toolkit, &input, output, quality, dpi).await,
        Command::Convert { input, output } => convert(&toolkit, &input, output).await,
    }
}

/// `RUST_LOG` wins unless `-v` was given.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };

    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[allow(clippy::print_stdout)]
async fn merge(toolkit: &PdfToolkit, inputs: &[PathBuf], output: Option<PathBuf>) -> Result<()> {
    let pb = progress_bar(inputs.len() as u64);
    let mut files = Vec::with_capacity(inputs.len());

    for path in inputs {
        let name = display_name(path);
        pb.set_message(name.clone());
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(UploadedFile::new(name, bytes));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mut workflow = toolkit.combine_workflow();
    let report = workflow.add_files(files)?.clone();

    for (file, size_mb) in workflow.files().iter().zip(&report.file_sizes_mb) {
        println!("  {:<40} {:>12}", file.name(), format_mb(*size_mb));
    }
    println!(
        "Total: {} of {} ({}%)",
        format_mb(report.total_mb),
        format_mb(report.ceiling_mb),
        report.percent_used()
    );

    if workflow.phase() == CombinePhase::OverBudget {
        bail!(
            "Combined size exceeds the {} limit by {}; remove some files",
            format_mb(report.ceiling_mb),
            format_mb(report.delta_mb)
        );
    }

    let merger = toolkit.merger();
    let buffers = workflow.begin_merge()?;
    let outcome = tokio::task::spawn_blocking(move || merger.merge(&buffers))
        .await
        .context("Merge task failed")?;

    if workflow.finish_merge(outcome)? != CombinePhase::MergeSucceeded {
        bail!(
            "Merge failed: {}",
            workflow.last_error().unwrap_or("unknown error")
        );
    }

    let document = workflow.result().context("Merge produced no document")?;
    let output_path = output.unwrap_or_else(|| PathBuf::from(document.filename()));
    write_atomically(&output_path, document.bytes())?;

    println!(
        "Combined PDF saved to: {} ({})",
        output_path.display(),
        format_mb(document.size_mb())
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn reduce(
    toolkit: &Arc<PdfToolkit>,
    input: &Path,
    output: Option<PathBuf>,
    quality: Option<u8>,
    dpi: Option<u32>,
) -> Result<()> {
    let defaults = &toolkit.config().optimize;
    let options = OptimizeOptions::new(
        quality.unwrap_or(defaults.image_quality),
        dpi.unwrap_or(defaults.image_dpi),
    )?;

    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    info!(
        "Reducing {} (quality {}, {} dpi)",
        input.display(),
        options.image_quality,
        options.image_dpi
    );

    let worker = Arc::clone(toolkit);
    let optimized = tokio::task::spawn_blocking(move || worker.optimize(&bytes, Some(options)))
        .await
        .context("Reduce task failed")??;

    let output_path =
        output.unwrap_or_else(|| input.with_file_name(reduced_filename(&display_name(input))));
    write_atomically(&output_path, &optimized.bytes)?;

    let report = optimized.report;
    println!(
        "Reduced PDF saved to: {} ({} -> {}, {:.0}% of original, {}/{} images recompressed)",
        output_path.display(),
        format_mb(pdf_hub_core::size::bytes_to_mb(report.original_bytes as u64)),
        format_mb(pdf_hub_core::size::bytes_to_mb(report.optimized_bytes as u64)),
        report.percent_of_original(),
        report.images_rewritten,
        report.images_total
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn convert(toolkit: &Arc<PdfToolkit>, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Converting {}", display_name(input)));
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    let worker = Arc::clone(toolkit);
    let converted = tokio::task::spawn_blocking(move || worker.convert(&bytes))
        .await
        .context("Convert task failed")??;
    pb.finish_and_clear();

    let output_path = output.unwrap_or_else(|| input.with_file_name(&converted.filename));
    write_atomically(&output_path, &converted.bytes)?;

    println!(
        "Converted document saved to: {} ({} pages, {} paragraphs)",
        output_path.display(),
        converted.page_count,
        converted.paragraph_count
    );
    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("documento.pdf")
        .to_string()
}

/// Stage `data` in a temp file beside `path` and move it into place, so a
/// failed run never leaves a truncated output behind.
fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    staged
        .write_all(data)
        .context("Failed to write temp file")?;
    staged.flush().context("Failed to flush temp file")?;
    staged
        .persist(path)
        .with_context(|| format!("Failed to write output: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_merge_with_global_flags() {
        let args = Args::try_parse_from([
            "pdf-hub",
            "merge",
            "a.pdf",
            "b.pdf",
            "--ceiling-mb",
            "50",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        assert_eq!(args.ceiling_mb, Some(50.0));
        match args.command {
            Command::Merge { inputs, output } => {
                assert_eq!(inputs, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_merge_requires_inputs() {
        assert!(Args::try_parse_from(["pdf-hub", "merge"]).is_err());
    }

    #[test]
    fn test_parse_reduce_options() {
        let args =
            Args::try_parse_from(["pdf-hub", "reduce", "scan.pdf", "-q", "40", "-d", "96"]).unwrap();
        match args.command {
            Command::Reduce { quality, dpi, .. } => {
                assert_eq!(quality, Some(40));
                assert_eq!(dpi, Some(96));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_write_atomically_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"old").unwrap();

        write_atomically(&path, b"new contents").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new contents");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/in/report.pdf")), "report.pdf");
    }
}
