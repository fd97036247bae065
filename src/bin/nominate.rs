//! CLI binary for nominate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `NominateConfig`, feeds every input through one `ProcessingQueue` and
//! prints the suggestions.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use nominate::document::display_name;
use nominate::{
    DocumentId, DocumentStatus, NominateConfig, PdfiumExtractor, ProcessingQueue, ProgressCallback,
    QueueProgressCallback, Stage,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS_PER_DOCUMENT: u64 = Stage::ALL.len() as u64;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar tick per completed pipeline stage and
/// one log line per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Display name, start time and completed stages of the running documents.
    running: Mutex<HashMap<DocumentId, (String, Instant, u64)>>,
}

impl CliProgressCallback {
    fn new(documents: usize) -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {percent:>3}%  {msg}  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(documents as u64 * TICKS_PER_DOCUMENT);
        bar.set_style(style);
        bar.set_prefix("Naming");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            running: Mutex::new(HashMap::new()),
        })
    }

    /// Remove `id` from the running set; returns its name, elapsed time and ticks.
    fn finish_document(&self, id: DocumentId) -> (String, f64, u64) {
        self.running
            .lock()
            .remove(&id)
            .map(|(name, start, ticks)| (name, start.elapsed().as_secs_f64(), ticks))
            .unwrap_or_else(|| (id.to_string(), 0.0, 0))
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl QueueProgressCallback for CliProgressCallback {
    fn on_document_start(&self, id: DocumentId, source: &str) {
        let name = display_name(source).to_string();
        self.bar.set_message(name.clone());
        self.running.lock().insert(id, (name, Instant::now(), 0));
    }

    fn on_stage_complete(&self, id: DocumentId, stage: Stage, _progress: f32) {
        if let Some(entry) = self.running.lock().get_mut(&id) {
            entry.2 += 1;
        }
        self.bar.inc(1);
        tracing::debug!("{} finished stage {}", id, stage);
    }

    fn on_document_complete(&self, id: DocumentId, filename: &str) {
        let (name, secs, _) = self.finish_document(id);
        self.bar.println(format!(
            "  {} {}  →  {}  {}",
            green("✓"),
            name,
            bold(filename),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_document_failed(&self, id: DocumentId, error: &str) {
        let (name, secs, ticks) = self.finish_document(id);
        self.bar.inc(TICKS_PER_DOCUMENT.saturating_sub(ticks));

        // First line only, truncated to keep output tidy.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {}  {}  {}",
            red("✗"),
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Suggest names (nothing is renamed)
  nominate scan_0001.pdf scan_0002.pdf

  # Rename every document to its suggestion
  nominate --apply ~/Downloads/*.pdf

  # Use a hosted model
  nominate --provider openai --model gpt-4.1-nano invoice.pdf

  # Name a PDF from a URL
  nominate https://example.com/files/report.pdf

  # Machine-readable output
  nominate --json --no-progress *.pdf > names.json

NAMING:
  Each document goes through three model calls at temperature 0:
    1. most relevant date   → YYYY-MM-DD prefix (omitted when none is found)
    2. summary (≤ 250 words)
    3. descriptive name     → stop words removed, capped at 255 bytes
  Example: "2023-11-15 Acme Corp Q4 Financial Report.pdf"

ENVIRONMENT VARIABLES:
  EDGEQUAKE_LLM_PROVIDER  Provider when --provider is not given (with EDGEQUAKE_MODEL)
  EDGEQUAKE_MODEL         Model when --model is not given (with EDGEQUAKE_LLM_PROVIDER)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)

SETUP:
  1. Start a local model:  ollama pull llama3.2
  2. Name documents:       nominate scan.pdf

  Without any provider setting, nominate talks to Ollama on localhost and no
  document text leaves the machine.
"#;

/// Suggest descriptive filenames for PDF documents using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "nominate",
    version,
    about = "Suggest descriptive filenames for PDF documents using an LLM",
    long_about = "Read the text of PDF documents (local files or URLs), find their most relevant \
date, summarise them and derive a concise, filesystem-safe filename. Works with local models \
through Ollama and with hosted providers (OpenAI, Anthropic, Gemini, …).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file paths or HTTP/HTTPS URLs, processed in order.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// LLM model ID (e.g. llama3.2, gpt-4.1-nano).
    #[arg(long, env = "NOMINATE_MODEL")]
    model: Option<String>,

    /// LLM provider: ollama, openai, anthropic, gemini, azure.
    #[arg(long, env = "NOMINATE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "NOMINATE_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "NOMINATE_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Per model call timeout in seconds.
    #[arg(long, env = "NOMINATE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "NOMINATE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "NOMINATE_PASSWORD")]
    password: Option<String>,

    /// Rename each file to its suggestion (never overwrites).
    #[arg(long, env = "NOMINATE_APPLY")]
    apply: bool,

    /// Print document states as JSON instead of text.
    #[arg(long, env = "NOMINATE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "NOMINATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "NOMINATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "NOMINATE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── Ensure PDFium engine is available ────────────────────────────────
    PdfiumExtractor::check_available().context("PDFium engine is not available")?;

    // ── Build config and queue ───────────────────────────────────────────
    let progress = show_progress.then(|| CliProgressCallback::new(cli.inputs.len()));
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn QueueProgressCallback>),
    )?;
    let queue = ProcessingQueue::from_config(&config).context("Failed to set up the model")?;

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Naming {} document(s)…", cli.inputs.len()))
        );
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let started = Instant::now();
    for input in &cli.inputs {
        queue.enqueue(input.clone()).context("Failed to enqueue document")?;
    }
    queue.wait_idle().await;
    if let Some(ref cb) = progress {
        cb.finish();
    }

    // ── Report / apply ───────────────────────────────────────────────────
    let mut failed = 0usize;
    for doc in queue.snapshot() {
        match doc.status {
            DocumentStatus::Succeeded => {
                let Some(name) = doc.generated_filename.clone() else {
                    continue;
                };
                if cli.apply {
                    match queue.accept(doc.id).await {
                        Ok(path) => {
                            if !cli.json {
                                println!("{} → {}", doc.source, path.display());
                            }
                        }
                        Err(e) => {
                            failed += 1;
                            eprintln!("{} {}: {}", red("✗"), doc.source, e);
                        }
                    }
                } else if !cli.json {
                    println!("{} → {}", doc.source, name);
                }
            }
            DocumentStatus::Failed => {
                failed += 1;
                if !show_progress {
                    let reason = doc.error.map(|e| e.message).unwrap_or_default();
                    eprintln!("{} {}: {}", red("✗"), doc.source, reason);
                }
            }
            DocumentStatus::Pending | DocumentStatus::Running => {}
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&queue.snapshot())
            .context("Failed to serialise documents")?;
        println!("{json}");
    }

    queue.shutdown().await;

    let total = cli.inputs.len();
    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {}/{} named  {}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&(total.saturating_sub(failed)).to_string()),
            total,
            dim(&format!("{:.1}s", started.elapsed().as_secs_f64())),
        );
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {total} document(s) failed");
    }
    Ok(())
}

/// Map CLI args to `NominateConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<NominateConfig> {
    let mut builder = NominateConfig::builder()
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
