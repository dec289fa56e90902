//! Streaming render API: emit badges as they are written.
//!
//! [`render_stream`] reads the spreadsheet, loads the fonts and prepares the
//! images directory up front (any of which can fail fatally), then yields one
//! `Result<RenderedBadge, BadgeError>` per record. Badges are rendered one at
//! a time, so items arrive in record order and `image###.png` numbering
//! matches it. Nothing is packed into a document; use
//! [`crate::generate::generate`] for the full pipeline.

use crate::config::GenerationConfig;
use crate::error::{BadgeError, BadgePressError};
use crate::pipeline::extract::{self, AttendeeRecord};
use crate::pipeline::render::{FontSet, RenderJob, RenderedBadge};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of badge results.
pub type BadgeStream = Pin<Box<dyn Stream<Item = Result<RenderedBadge, BadgeError>> + Send>>;

/// Read `input` and render one badge per record, streaming results.
///
/// # Returns
/// - `Ok(BadgeStream)`: one item per record, in order
/// - `Err(BadgePressError)`: fatal error (spreadsheet, fonts, output dir)
///
/// # Example
/// ```rust,no_run
/// use badgepress::{render_stream, GenerationConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GenerationConfig::default();
/// let mut badges = render_stream("attendees.xlsx", &config).await?;
/// while let Some(badge) = badges.next().await {
///     match badge {
///         Ok(b) => println!("{}", b.path.display()),
///         Err(e) => eprintln!("{e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn render_stream(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<BadgeStream, BadgePressError> {
    let input = input.as_ref();
    info!("Starting streaming render: {}", input.display());

    config.validate_geometry()?;
    let records = extract::read_records(input, &config.columns).await?;
    let job = prepare_render_job(config).await?;
    Ok(records_stream(records, job))
}

/// Load fonts and create the images directory.
pub(crate) async fn prepare_render_job(
    config: &GenerationConfig,
) -> Result<RenderJob, BadgePressError> {
    let images_dir = config.images_dir();
    prepare_images_dir(&images_dir, config.clean_images).await?;

    let paths = config.fonts.clone();
    let fonts = tokio::task::spawn_blocking(move || FontSet::load(&paths))
        .await
        .map_err(|e| BadgePressError::Internal(format!("Font task panicked: {}", e)))??;

    let (width_px, height_px) = config.badge_pixels();
    Ok(RenderJob {
        fonts: Arc::new(fonts),
        template: config.template.clone(),
        width_px,
        height_px,
        images_dir,
    })
}

/// Create `dir` (and parents); with `clean`, remove it first.
pub(crate) async fn prepare_images_dir(dir: &Path, clean: bool) -> Result<(), BadgePressError> {
    let fail = |source| BadgePressError::OutputDirFailed {
        path: dir.to_path_buf(),
        source,
    };

    if clean && tokio::fs::try_exists(dir).await.map_err(fail)? {
        info!("Removing previous badges in {}", dir.display());
        tokio::fs::remove_dir_all(dir).await.map_err(fail)?;
    }
    tokio::fs::create_dir_all(dir).await.map_err(fail)
}

/// Render `records` sequentially; badge `i` (1-based) is `records[i - 1]`.
pub(crate) fn records_stream(records: Vec<AttendeeRecord>, job: RenderJob) -> BadgeStream {
    let s = stream::iter(records.into_iter().enumerate()).then(move |(i, record)| {
        let job = job.clone();
        async move { job.render(record, i + 1).await }
    });
    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::BadgeTemplate;
    use crate::pipeline::render::tests::test_fonts;

    #[tokio::test]
    async fn stream_preserves_record_order() {
        let Some(fonts) = test_fonts() else { return };
        let dir = tempfile::tempdir().unwrap();
        let job = RenderJob {
            fonts: Arc::new(fonts),
            template: BadgeTemplate::default(),
            width_px: 120,
            height_px: 90,
            images_dir: dir.path().to_path_buf(),
        };
        let records = vec![
            AttendeeRecord::new("A", "a", "", ""),
            AttendeeRecord::new("B", "b", "", ""),
            AttendeeRecord::new("C", "c", "", ""),
        ];

        let badges: Vec<_> = records_stream(records, job).collect().await;
        let indices: Vec<usize> = badges.iter().map(|b| b.as_ref().unwrap().index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(dir.path().join("image003.png").exists());
    }

    #[tokio::test]
    async fn write_failures_are_per_badge() {
        let Some(fonts) = test_fonts() else { return };
        let dir = tempfile::tempdir().unwrap();
        let job = RenderJob {
            fonts: Arc::new(fonts),
            template: BadgeTemplate::default(),
            width_px: 60,
            height_px: 40,
            images_dir: dir.path().join("never-created"),
        };
        let records = vec![AttendeeRecord::default(), AttendeeRecord::default()];

        let badges: Vec<_> = records_stream(records, job).collect().await;
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[1].as_ref().unwrap_err().index(), 2);
    }

    #[tokio::test]
    async fn clean_removes_stale_images() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("image099.png"), b"stale").unwrap();

        prepare_images_dir(&images, false).await.unwrap();
        assert!(images.join("image099.png").exists());

        prepare_images_dir(&images, true).await.unwrap();
        assert!(images.is_dir());
        assert!(!images.join("image099.png").exists());
    }

    #[tokio::test]
    async fn images_dir_under_a_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"").unwrap();
        let err = prepare_images_dir(&file.join("images"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, BadgePressError::OutputDirFailed { .. }));
    }

    #[tokio::test]
    async fn missing_spreadsheet_fails_before_streaming() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig::builder()
            .output_dir(dir.path())
            .build()
            .unwrap();
        let err = render_stream(dir.path().join("absent.xlsx"), &config)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BadgePressError::SpreadsheetNotFound { .. }));
    }
}
