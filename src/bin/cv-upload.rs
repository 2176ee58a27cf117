//! CLI binary for jobmagnetic-cv.
//!
//! Drives one upload widget through a full session: select the file, wait
//! for extraction, create the profile, print the URL.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use jobmagnetic_cv::{
    analyzing_label, creating_profile_label, extraction_unavailable_label, profile_ready_label,
    upload_hint, AcceptedTypes, CvUploadWidget, DocumentExtractor, ExtractionState, Locale,
    Notice, SimulatedProfileService, UploadConfig, UploadEvent, UploadFile, UploadObserver,
    UploadSnapshot, UploadStatus, ENV_API_BASE_URL, ENV_SAMPLE_PROFILE_URL, ENV_VIEWER_BASE_URL,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;
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

/// Endpoints used by `--simulate` when none are configured.
const SIMULATED_SITE: &str = "https://jobmagnetic.dev";

const AFTER_HELP: &str = r#"EXAMPLES:
  # Create a profile from a PDF CV
  cv-upload --api-base https://api.jobmagnetic.dev \
            --viewer-base https://jobmagnetic.dev \
            --sample-profile-url https://jobmagnetic.dev/es/demo cv.pdf

  # English profile URL, JSON session snapshot
  cv-upload --locale en --json cv.docx

  # No backend: simulated profile service, no UX delay
  cv-upload --simulate --floor-ms 0 cv.txt

ENVIRONMENT VARIABLES:
  JOBMAGNETIC_API_BASE_URL        Profile API root
  JOBMAGNETIC_VIEWER_BASE_URL     Root where profiles are served
  JOBMAGNETIC_SAMPLE_PROFILE_URL  Demo profile linked from the upload card
  JOBMAGNETIC_LOCALE              es (default) or en
  PDFIUM_LIB_PATH                 Path to an existing libpdfium
  RUST_LOG                        Overrides -v / -q log filtering
"#;

/// Turn a CV into a public Job Magnetic profile.
#[derive(Parser, Debug)]
#[command(
    name = "cv-upload",
    version,
    about = "Extract the text of a CV and create a Job Magnetic profile from it",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// CV file: PDF, DOCX or TXT (DOC is accepted but cannot be read).
    file: PathBuf,

    /// Site locale: es or en. Selects messages and the profile URL segment.
    #[arg(long, env = "JOBMAGNETIC_LOCALE", default_value = "es")]
    locale: Locale,

    /// Profile API root.
    #[arg(long, env = ENV_API_BASE_URL)]
    api_base: Option<String>,

    /// Root where generated profiles are served.
    #[arg(long, env = ENV_VIEWER_BASE_URL)]
    viewer_base: Option<String>,

    /// Demo profile URL.
    #[arg(long, env = ENV_SAMPLE_PROFILE_URL)]
    sample_profile_url: Option<String>,

    /// Use the in-process simulated profile service instead of the API.
    #[arg(long)]
    simulate: bool,

    /// Minimum extraction time in milliseconds.
    #[arg(long, env = "JOBMAGNETIC_FLOOR_MS", default_value_t = 5000)]
    floor_ms: u64,

    /// Accept PDF uploads only.
    #[arg(long)]
    pdf_only: bool,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the final session snapshot as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "JOBMAGNETIC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "JOBMAGNETIC_QUIET")]
    quiet: bool,
}

/// Prints notices above the spinner.
struct CliObserver {
    bar: ProgressBar,
    locale: Locale,
}

impl UploadObserver for CliObserver {
    fn on_notice(&self, notice: &Notice) {
        self.bar
            .println(format!("{} {}", red("✗"), notice.render(self.locale)));
    }

    fn on_profile_created(&self, url: &str) {
        self.bar.println(format!(
            "{} {} {}",
            green("✔"),
            bold(profile_ready_label(self.locale)),
            url
        ));
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback that matters; keep library INFO logs
    // out of its way unless asked.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || !cli.json {
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

    let config = build_config(&cli)?;
    let locale = config.locale;

    let widget = if cli.simulate {
        CvUploadWidget::from_parts(
            config.clone(),
            Arc::new(DocumentExtractor::from_config(&config)),
            Arc::new(SimulatedProfileService::default()),
        )
    } else {
        CvUploadWidget::new(config)
    };

    let bar = spinner(cli.quiet || cli.json);
    widget.add_observer(Arc::new(CliObserver {
        bar: bar.clone(),
        locale,
    }));

    // Spinner follows the session status.
    let mut updates = widget.updates();
    let ticker = bar.clone();
    let spinner_task = tokio::spawn(async move {
        while let Some(snapshot) = updates.next().await {
            match snapshot.status {
                UploadStatus::Analyzing => {
                    ticker.set_message(analyzing_label(locale));
                    ticker.enable_steady_tick(Duration::from_millis(80));
                }
                UploadStatus::CreatingProfile => {
                    ticker.set_message(creating_profile_label(locale));
                    ticker.enable_steady_tick(Duration::from_millis(80));
                }
                _ => ticker.disable_steady_tick(),
            }
        }
    });

    if !cli.quiet && !cli.json {
        eprintln!("{}", dim(upload_hint(locale)));
        if let Some(sample) = widget.sample_profile_url() {
            eprintln!("{}", dim(&format!("Sample: {sample}")));
        }
    }

    // ── Select ───────────────────────────────────────────────────────────
    let file = UploadFile::from_path(&cli.file)
        .await
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;
    widget
        .dispatch(UploadEvent::SelectFile(file))
        .context("File selection was refused")?;
    let snapshot = widget.settled().await;

    // ── Submit ───────────────────────────────────────────────────────────
    let snapshot = if snapshot.can_submit {
        widget
            .dispatch(UploadEvent::Submit)
            .context("Submission was refused")?;
        widget.settled().await
    } else {
        if snapshot.extraction == Some(ExtractionState::Unavailable) {
            bar.println(format!("{} {}", red("✗"), extraction_unavailable_label(locale)));
        } else if snapshot.status == UploadStatus::FileSelected && snapshot.notice.is_none() {
            // Extraction succeeded but found no text.
            widget
                .dispatch(UploadEvent::Submit)
                .context("Submission was refused")?;
        }
        widget.snapshot()
    };

    bar.finish_and_clear();
    spinner_task.abort();

    report(&cli, &snapshot)
}

/// Print the outcome and pick the exit code.
fn report(cli: &Cli, snapshot: &UploadSnapshot) -> Result<ExitCode> {
    if cli.json {
        let json = serde_json::to_string_pretty(snapshot).context("Failed to serialise snapshot")?;
        println!("{json}");
    } else if let Some(url) = &snapshot.generated_site_url {
        println!("{url}");
    }

    if snapshot.status == UploadStatus::Success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Map CLI args to `UploadConfig`.
fn build_config(cli: &Cli) -> Result<UploadConfig> {
    let mut builder = UploadConfig::builder()
        .locale(cli.locale)
        .extraction_floor(Duration::from_millis(cli.floor_ms));

    if cli.pdf_only {
        builder = builder.accepted_types(AcceptedTypes::pdf_only());
    }
    if let Some(path) = &cli.pdfium_lib {
        builder = builder.pdfium_library_path(path);
    }

    let fallback = |value: &Option<String>, default: &str| -> Option<String> {
        match value {
            Some(v) => Some(v.clone()),
            None if cli.simulate => Some(default.to_string()),
            None => None,
        }
    };
    if let Some(url) = fallback(&cli.api_base, SIMULATED_SITE) {
        builder = builder.api_base_url(url);
    }
    if let Some(url) = fallback(&cli.viewer_base, SIMULATED_SITE) {
        builder = builder.viewer_base_url(url);
    }
    if let Some(url) = fallback(
        &cli.sample_profile_url,
        &format!("{SIMULATED_SITE}/{}/demo", cli.locale),
    ) {
        builder = builder.sample_profile_url(url);
    }

    builder.build().context("Invalid configuration")
}
