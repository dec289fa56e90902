//! Full-run entry points: spreadsheet in, badge images and PDF out.
//!
//! [`generate`] drives every stage in order and returns only after the
//! document is on disk. A badge that cannot be written is recorded in the
//! report and left out of the document; anything else that goes wrong ends
//! the run with a [`BadgePressError`].

use crate::config::GenerationConfig;
use crate::error::BadgePressError;
use crate::output::{written_paths, BadgeResult, GenerationReport, GenerationStats};
use crate::pipeline::extract;
use crate::pipeline::pack::{self, PageGeometry};
use crate::stream::{prepare_render_job, records_stream};
use futures::StreamExt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate badges for every row of `input` and pack them into one PDF.
///
/// # Arguments
/// * `input`: path to an `.xlsx` / `.xls` / `.ods` workbook
/// * `config`: generation configuration
///
/// # Returns
/// `Ok(GenerationReport)` once the document is written, even if some badges
/// failed (check `report.stats.failed_badges`).
///
/// # Errors
/// Returns `Err(BadgePressError)` only for fatal errors:
/// - spreadsheet missing or unreadable
/// - fonts missing or invalid
/// - output directory cannot be created
/// - a written badge cannot be embedded, or the PDF cannot be written
///
/// # Example
/// ```rust,no_run
/// use badgepress::{generate, GenerationConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = GenerationConfig::builder().output_dir("badges").build()?;
///     let report = generate("attendees.xlsx", &config).await?;
///     println!("{} badges on {} pages", report.stats.written_badges, report.stats.pages);
///     Ok(())
/// }
/// ```
pub async fn generate(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationReport, BadgePressError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("Starting generation: {}", input.display());

    // ── Step 1: Validate geometry before touching the filesystem ─────────
    config.validate_geometry()?;
    let geometry = PageGeometry::from_config(config);
    geometry.validate()?;

    // ── Step 2: Read records ─────────────────────────────────────────────
    let extract_start = Instant::now();
    let records = extract::read_records(input, &config.columns).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    let total = records.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(total);
    }

    // ── Step 3: Prepare output dir and fonts ─────────────────────────────
    let job = prepare_render_job(config).await?;
    debug!(
        "Rendering {}x{} px badges into {}",
        job.width_px,
        job.height_px,
        job.images_dir.display()
    );

    // ── Step 4: Render badges in record order ────────────────────────────
    let render_start = Instant::now();
    let mut badges: Vec<BadgeResult> = Vec::with_capacity(total);
    let mut rendered = records_stream(records.clone(), job);

    for index in 1..=total {
        if let Some(ref cb) = config.progress_callback {
            cb.on_badge_start(index, total);
        }

        let Some(result) = rendered.next().await else {
            break;
        };

        if let Some(ref cb) = config.progress_callback {
            match &result {
                Ok(badge) => cb.on_badge_complete(index, total, &badge.path),
                Err(e) => cb.on_badge_error(index, total, &e.to_string()),
            }
        }
        if let Err(ref e) = result {
            warn!("{}", e);
        }
        badges.push(BadgeResult::from_result(index, result));
    }
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let images = written_paths(&badges);
    let failed = total - images.len();

    if failed > 0 {
        warn!(
            "{} of {} badge(s) could not be written; the document will hold {}",
            failed,
            total,
            images.len()
        );
    }
    info!("Rendered {} badge(s) in {}ms", images.len(), render_duration_ms);

    // ── Step 5: Pack into the document ───────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_packing_start(images.len());
    }
    let pack_start = Instant::now();
    let packed = pack::pack_images(&images, geometry, &config.document_path()).await?;
    let pack_duration_ms = pack_start.elapsed().as_millis() as u64;

    let stats = GenerationStats {
        total_records: total,
        written_badges: images.len(),
        failed_badges: failed,
        pages: packed.pages,
        extract_duration_ms,
        render_duration_ms,
        pack_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Generation complete: {}/{} badges, {} page(s), {}ms total",
        stats.written_badges, total, stats.pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(total, images.len());
    }

    Ok(GenerationReport {
        records,
        badges,
        placements: packed.placements,
        document_path: packed.path,
        stats,
    })
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationReport, BadgePressError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BadgePressError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input, config))
}
