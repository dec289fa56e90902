//! # badgepress
//!
//! Turn an attendee spreadsheet into printable name badges: one PNG per row,
//! then every PNG packed onto large pages of a single PDF ready for the
//! printer and the guillotine.
//!
//! ## Pipeline Overview
//!
//! ```text
//! workbook (.xlsx)
//!  │
//!  ├─ 1. Extract  every sheet, header row → column names (calamine)
//!  ├─ 2. Layout   name / surname / organisation / role, long lines split
//!  ├─ 3. Render   rasterise each badge at the configured DPI (rusttype)
//!  │              └─▶ <output>/images/image001.png, image002.png, …
//!  └─ 4. Pack     grid-place the PNGs on A3 pages (lopdf)
//!                 └─▶ <output>/output.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use badgepress::{generate, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 94 × 75 mm badges at 300 DPI on A3, written under ./_output
//!     let config = GenerationConfig::default();
//!     let report = generate("attendees.xlsx", &config).await?;
//!     eprintln!(
//!         "{} badges on {} page(s) → {}",
//!         report.stats.written_badges,
//!         report.stats.pages,
//!         report.document_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `badgepress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! badgepress = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod units;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ColumnMapping, FontPaths, GenerationConfig, GenerationConfigBuilder, PaperSize, WrapMode,
};
pub use error::{BadgeError, BadgePressError};
pub use generate::{generate, generate_sync};
pub use output::{BadgeResult, GenerationReport, GenerationStats};
pub use pipeline::extract::AttendeeRecord;
pub use pipeline::layout::BadgeTemplate;
pub use pipeline::pack::{PageGeometry, Placement};
pub use pipeline::render::RenderedBadge;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{render_stream, BadgeStream};
pub use units::{Mm, Pt, SizeMm};
