//! CLI binary for badgepress.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use badgepress::config::parse_dimensions;
use badgepress::{
    generate, ColumnMapping, GenerationConfig, GenerationProgressCallback, PaperSize,
    ProgressCallback, WrapMode,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar for rendering, a spinner while the
/// document is packed, and one log line per failed badge.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// The bar starts as a spinner; `on_generation_start` sets its length.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading spreadsheet…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} badges  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_badges: usize) {
        self.activate_bar(total_badges);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_badges} badges…"))
        ));
    }

    fn on_badge_complete(&self, _index: usize, _total: usize, _path: &Path) {
        self.bar.inc(1);
    }

    fn on_badge_error(&self, index: usize, total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Badge {:>4}/{:<4}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_packing_start(&self, images: usize) {
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        self.bar.set_style(spinner_style);
        self.bar.set_prefix("Packing");
        self.bar.set_message(format!("{images} images → PDF…"));
    }

    fn on_generation_complete(&self, total_badges: usize, written: usize) {
        let failed = total_badges.saturating_sub(written);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} badges rendered",
                green("✔"),
                bold(&written.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} badges rendered  ({} failed)",
                if written == 0 { red("✘") } else { cyan("⚠") },
                bold(&written.to_string()),
                total_badges,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default run: 94x75 mm badges, A3 pages, output under ./_output
  badgepress attendees.xlsx

  # Different output directory and document name
  badgepress attendees.xlsx -o print --document-name day1.pdf

  # A4 paper, larger margin, lower resolution for a proof print
  badgepress attendees.xlsx --page-size a4 --margin 8 --dpi 150

  # English column headers
  badgepress guests.xlsx --surname-column "Last name" --name-column "First name" \
      --organization-column Company --role-column Title

  # Keep organisation and role on one line each
  badgepress attendees.xlsx --wrap single-line

  # Machine-readable report
  badgepress attendees.xlsx --json > report.json

OUTPUT:
  <output-dir>/images/image001.png …   one PNG per spreadsheet row
  <output-dir>/<document-name>         all badges packed into one PDF

SPREADSHEET:
  Every sheet is read in order. The first row of each sheet must hold the
  column headers; by default: Фамилия, Имя, Компания или учебное заведение,
  Должность. A missing column renders as empty text.

ENVIRONMENT VARIABLES:
  Every option can also be set as BADGEPRESS_<OPTION>, e.g.
  BADGEPRESS_PAGE_SIZE=a4 or BADGEPRESS_FONT=/path/to/font.ttf.
  RUST_LOG overrides the log filter (e.g. RUST_LOG=badgepress=debug).
"#;

/// Generate printable badges from an attendee spreadsheet.
#[derive(Parser, Debug)]
#[command(
    name = "badgepress",
    version,
    about = "Generate printable attendee badges from a spreadsheet into one PDF",
    long_about = "Read every row of an attendee spreadsheet, render one badge image per row, \
and pack all badges onto large pages of a single PDF ready to print and cut.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Attendee spreadsheet (.xlsx, .xls, .ods).
    input: PathBuf,

    /// Output root; badges go to <DIR>/images.
    #[arg(short, long, env = "BADGEPRESS_OUTPUT_DIR", default_value = "_output")]
    output_dir: PathBuf,

    /// File name of the PDF inside the output directory.
    #[arg(long, env = "BADGEPRESS_DOCUMENT_NAME", default_value = "output.pdf")]
    document_name: String,

    /// Badge size in millimetres, WIDTHxHEIGHT.
    #[arg(long, env = "BADGEPRESS_BADGE_SIZE", default_value = "94x75",
          value_parser = parse_badge_size)]
    badge_size: (f64, f64),

    /// Paper size: a3, a4, a5, letter, or WIDTHxHEIGHT in millimetres.
    #[arg(long, env = "BADGEPRESS_PAGE_SIZE", default_value = "a3")]
    page_size: PaperSize,

    /// Page margin in millimetres.
    #[arg(long, env = "BADGEPRESS_MARGIN", default_value_t = 5.0)]
    margin: f64,

    /// Gap between badges in millimetres.
    #[arg(long, env = "BADGEPRESS_SPACING", default_value_t = 2.0)]
    spacing: f64,

    /// Badge rendering resolution (72–1200).
    #[arg(long, env = "BADGEPRESS_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=1200))]
    dpi: u32,

    /// Font for organisation and role text.
    #[arg(long, env = "BADGEPRESS_FONT")]
    font: Option<PathBuf>,

    /// Font for name and surname text.
    #[arg(long, env = "BADGEPRESS_BOLD_FONT")]
    bold_font: Option<PathBuf>,

    /// Organisation/role layout.
    #[arg(long, env = "BADGEPRESS_WRAP", value_enum, default_value = "split")]
    wrap: WrapArg,

    /// Header of the surname column.
    #[arg(long, env = "BADGEPRESS_SURNAME_COLUMN")]
    surname_column: Option<String>,

    /// Header of the first-name column.
    #[arg(long, env = "BADGEPRESS_NAME_COLUMN")]
    name_column: Option<String>,

    /// Header of the organisation column.
    #[arg(long, env = "BADGEPRESS_ORGANIZATION_COLUMN")]
    organization_column: Option<String>,

    /// Header of the role column.
    #[arg(long, env = "BADGEPRESS_ROLE_COLUMN")]
    role_column: Option<String>,

    /// Delete the images directory before rendering.
    #[arg(long, env = "BADGEPRESS_CLEAN")]
    clean: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "BADGEPRESS_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "BADGEPRESS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BADGEPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BADGEPRESS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum WrapArg {
    Split,
    SingleLine,
}

impl From<WrapArg> for WrapMode {
    fn from(v: WrapArg) -> Self {
        match v {
            WrapArg::Split => WrapMode::Split,
            WrapArg::SingleLine => WrapMode::SingleLine,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs when it is active.
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = generate(&cli.input, &config)
        .await
        .with_context(|| format!("Badge generation failed for {}", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet && !cli.json {
        let stats = &report.stats;
        eprintln!(
            "{}  {}/{} badges  {} page(s)  {}ms  →  {}",
            if stats.failed_badges == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.written_badges,
            stats.total_records,
            stats.pages,
            stats.total_duration_ms,
            bold(&report.document_path.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!("images in {}", config.images_dir().display()))
        );
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let defaults = ColumnMapping::default();
    let columns = ColumnMapping {
        surname: cli.surname_column.clone().unwrap_or(defaults.surname),
        name: cli.name_column.clone().unwrap_or(defaults.name),
        organization: cli
            .organization_column
            .clone()
            .unwrap_or(defaults.organization),
        role: cli.role_column.clone().unwrap_or(defaults.role),
    };

    let (badge_w, badge_h) = cli.badge_size;
    let mut builder = GenerationConfig::builder()
        .badge_size_mm(badge_w, badge_h)
        .page_size(cli.page_size)
        .margin_mm(cli.margin)
        .spacing_mm(cli.spacing)
        .dpi(cli.dpi)
        .output_dir(&cli.output_dir)
        .document_name(&cli.document_name)
        .clean_images(cli.clean)
        .wrap_mode(cli.wrap.clone().into())
        .columns(columns);

    if let Some(ref font) = cli.font {
        builder = builder.regular_font(font);
    }
    if let Some(ref font) = cli.bold_font {
        builder = builder.bold_font(font);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--badge-size` ("94x75") into millimetres.
fn parse_badge_size(s: &str) -> std::result::Result<(f64, f64), String> {
    let size = parse_dimensions(s).map_err(|e| e.to_string())?;
    Ok((size.width.0, size.height.0))
}
