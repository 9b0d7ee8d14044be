//! CLI binary for edgequake-pdf2img.
//!
//! A thin shim over the library crate: convert the first page of one PDF,
//! write the PNG, print a summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2img::{
    convert_pdf_to_image, revoke_object_url, ConversionResult, ImageFile, PdfFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render page 1 next to the input (report.pdf → report.png)
  pdf2img report.pdf

  # Choose the output path
  pdf2img report.pdf -o thumbnails/report.png

  # Print the result as JSON
  pdf2img --json report.pdf

  # Emit a data: URL on stdout instead of writing a file
  pdf2img --data-url report.pdf > report.txt

OUTPUT:
  The first page is rendered at 4× its native size (1 pt → 4 px) and saved
  as PNG. Later pages are ignored.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  PDFIUM_CACHE_DIR        Override the default pdfium cache directory
  RUST_LOG                Override the log filter (e.g. edgequake_pdf2img=debug)

SETUP:
  If no local PDFium is found, the matching release (~30 MB) is downloaded on
  first use and cached in ~/.cache/pdf2img/pdfium-<VERSION>/.
"#;

/// Render the first page of a PDF to PNG.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Render the first page of a PDF to a PNG image",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write the PNG here instead of next to the input.
    #[arg(short, long, env = "PDF2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the ConversionResult as JSON.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Print a base64 data: URL to stdout instead of writing a file.
    #[arg(long, conflicts_with = "output")]
    data_url: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already tells the user what is happening; keep library
    // INFO logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Convert ──────────────────────────────────────────────────────────
    let file = PdfFile::from_path(&cli.input);
    let spinner = show_progress.then(|| start_spinner(file.name()));

    let start = Instant::now();
    let result = convert_pdf_to_image(&file).await;
    let elapsed_ms = start.elapsed().as_millis();

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let outcome = report(&cli, &result, elapsed_ms).await;

    // The object URL is ours to release; nothing else in this process uses it.
    if !result.image_url.is_empty() {
        revoke_object_url(&result.image_url);
    }

    outcome
}

fn start_spinner(name: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Rendering");
    bar.set_message(name.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Print or write the result; failures become the process error.
async fn report(cli: &Cli, result: &ConversionResult, elapsed_ms: u128) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(result).context("Failed to serialise result")?;
        println!("{json}");
    }

    let image = match (&result.file, &result.error) {
        (Some(image), None) => image,
        (_, Some(err)) => {
            if !cli.quiet && !cli.json {
                eprintln!("{} {}", red("✘"), err);
            }
            anyhow::bail!("{err}");
        }
        (None, None) => anyhow::bail!("Conversion returned neither an image nor an error"),
    };

    if cli.data_url {
        println!("{}", image.to_data_url());
        return Ok(());
    }

    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, image));
    image
        .write_to(&out_path)
        .await
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            dim(&format!("{} bytes", image.len())),
            dim(&format!("{elapsed_ms}ms")),
            bold(&out_path.display().to_string()),
        );
    }

    Ok(())
}

/// `<input dir>/<image name>`, e.g. `docs/report.pdf` → `docs/report.png`.
fn default_output_path(input: &Path, image: &ImageFile) -> PathBuf {
    input
        .parent()
        .map(|dir| dir.join(image.name()))
        .unwrap_or_else(|| PathBuf::from(image.name()))
}
