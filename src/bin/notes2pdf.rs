//! CLI binary for notes2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, prompts for the image path when none is given, and
//! prints results. Pipeline failures are reported on stderr and the process
//! still exits normally.

use anyhow::{Context, Result};
use clap::Parser;
use notes2pdf::config::DEFAULT_VISION_ENDPOINT;
use notes2pdf::{
    convert, extract_text, ConversionConfig, ConversionProgressCallback, IntermediatePath,
    ProgressCallback, Stage, VisionCredentials, DEFAULT_INTERMEDIATE_PATH, DEFAULT_OUTPUT_PATH,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "Enter the path to the handwritten note image (e.g., note.png): ";

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the running stage and logs one line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening image…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &str) {
        self.bar.set_prefix("Converting");
        self.bar.set_message(input.to_string());
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.label());
        self.bar.set_message("…");
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<20} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_conversion_error(&self, stage: Stage, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {:<20} {}", red("✗"), stage.label(), red(first_line)));
        self.bar.finish_and_clear();
    }

    fn on_conversion_complete(&self, _output_path: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive: prompts for the image path
  notes2pdf

  # Convert a photo, writing handwritten_output.pdf
  notes2pdf note.jpg

  # Choose the output file and keep the binarized image for inspection
  notes2pdf note.jpg -o monday.pdf --keep-intermediate

  # Just print the recognized text
  notes2pdf --text-only note.jpg

  # Safe for concurrent runs: use a private temporary intermediate
  notes2pdf --temp-intermediate note.jpg -o "$(date +%s).pdf"

ENVIRONMENT VARIABLES:
  GOOGLE_APPLICATION_CREDENTIALS  Service-account key file (preferred)
  GOOGLE_VISION_API_KEY           Vision API key (used when no key file is set)
  NOTES2PDF_OUTPUT                Default output PDF path
  NOTES2PDF_INTERMEDIATE          Default conditioned-image path
  RUST_LOG                        Override log filter (e.g. notes2pdf=debug)
"#;

/// Convert a photographed handwritten note into a formatted PDF.
#[derive(Parser, Debug)]
#[command(
    name = "notes2pdf",
    version,
    about = "Convert photographed handwritten notes into formatted PDFs",
    long_about = "Enhance a photo of a handwritten note for OCR, read it with Google Cloud \
Vision document-text detection, and lay the text out as a paginated Letter PDF with a title \
and a generation date.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image path or HTTP/HTTPS URL. Prompted for when omitted.
    input: Option<String>,

    /// Write the PDF to this file.
    #[arg(short, long, env = "NOTES2PDF_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Path for the conditioned (binarized) image.
    #[arg(long, env = "NOTES2PDF_INTERMEDIATE", default_value = DEFAULT_INTERMEDIATE_PATH)]
    intermediate: PathBuf,

    /// Use a unique temporary file for the conditioned image instead of --intermediate.
    #[arg(long)]
    temp_intermediate: bool,

    /// Do not delete the conditioned image after a successful run.
    #[arg(long)]
    keep_intermediate: bool,

    /// Service-account key file for Google Cloud Vision.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Google Cloud Vision API key (used when no key file is given).
    #[arg(long, env = "GOOGLE_VISION_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Vision REST endpoint.
    #[arg(long, env = "NOTES2PDF_VISION_ENDPOINT", default_value = DEFAULT_VISION_ENDPOINT)]
    endpoint: String,

    /// Language hint for recognition (BCP-47, repeatable).
    #[arg(long = "language-hint", value_name = "LANG")]
    language_hints: Vec<String>,

    /// Print the recognized text only; do not render a PDF.
    #[arg(long)]
    text_only: bool,

    /// Output structured JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "NOTES2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "NOTES2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the recognized text.
    #[arg(short, long, env = "NOTES2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports stage progress, so library INFO logs are
    // suppressed while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    if let Err(e) = run(&cli, show_progress).await {
        eprintln!("{} An error occurred: {:#}", red("❌"), e);
    }
    Ok(())
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let input = match cli.input {
        Some(ref input) => input.trim().to_string(),
        None => prompt_for_input()?,
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    if cli.text_only {
        let text = extract_text(&input, &config)
            .await
            .context("Text recognition failed")?;
        if cli.json {
            println!("{}", serde_json::json!({ "text": text }));
        } else {
            println!("{text}");
        }
        if !cli.keep_intermediate {
            if let IntermediatePath::Fixed(ref path) = config.intermediate {
                remove_if_exists(path);
            }
        }
        return Ok(());
    }

    let output = convert(&input, &config).await.context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        if !cli.quiet {
            println!("\n{}", bold("📄 Extracted Text:"));
        }
        println!("{}", output.text);
        if !cli.quiet {
            println!(
                "{} PDF generated at: {}  {}",
                green("✅"),
                bold(&output.output_path.display().to_string()),
                dim(&format!(
                    "({} paragraphs, {} pages, {}ms)",
                    output.body_paragraphs, output.page_count, output.stats.total_duration_ms
                )),
            );
        }
    }

    if !cli.keep_intermediate {
        if let Err(e) = output.remove_conditioned() {
            warn!("Could not remove conditioned image: {}", e);
        }
    }

    Ok(())
}

/// Ask for the image path on stdin.
fn prompt_for_input() -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{PROMPT}").context("Failed to write prompt")?;
    stdout.flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read image path")?;
    Ok(line.trim().to_string())
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let intermediate = if cli.temp_intermediate {
        IntermediatePath::Temporary
    } else {
        IntermediatePath::Fixed(cli.intermediate.clone())
    };

    let mut builder = ConversionConfig::builder()
        .output_path(cli.output.clone())
        .intermediate(intermediate)
        .endpoint(cli.endpoint.clone())
        .language_hints(cli.language_hints.clone());

    if let Some(credentials) = resolve_credentials(cli) {
        builder = builder.credentials(credentials);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// A key file wins over an API key; blank values count as unset.
fn resolve_credentials(cli: &Cli) -> Option<VisionCredentials> {
    if let Some(ref path) = cli.credentials {
        if !path.as_os_str().is_empty() {
            return Some(VisionCredentials::ServiceAccountFile(path.clone()));
        }
    }
    cli.api_key
        .as_ref()
        .filter(|k| !k.trim().is_empty())
        .map(|k| VisionCredentials::ApiKey(k.clone()))
}
