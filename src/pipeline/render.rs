//! Badge rasterisation: [`AttendeeRecord`] → PNG on disk.
//!
//! Glyph outlines come from rusttype; every line produced by
//! [`crate::pipeline::layout::badge_lines`] is centred on the canvas and
//! alpha-blended onto a solid background, then the canvas is PNG-encoded with
//! the `image` crate.
//!
//! Rasterisation and PNG encoding are CPU-bound, so the async entry point
//! hands the work to `spawn_blocking`.

use crate::config::FontPaths;
use crate::error::{BadgeError, BadgePressError};
use crate::pipeline::extract::AttendeeRecord;
use crate::pipeline::layout::{badge_lines, BadgeTemplate, TextLine};
use image::{ImageFormat, Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// The regular and bold faces used for badge text.
pub struct FontSet {
    regular: Font<'static>,
    bold: Font<'static>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("regular_glyphs", &self.regular.glyph_count())
            .field("bold_glyphs", &self.bold.glyph_count())
            .finish()
    }
}

impl FontSet {
    /// Read and parse both font files.
    pub fn load(paths: &FontPaths) -> Result<Self, BadgePressError> {
        Ok(Self {
            regular: load_font(&paths.regular)?,
            bold: load_font(&paths.bold)?,
        })
    }

    fn face(&self, bold: bool) -> &Font<'static> {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }
}

fn load_font(path: &Path) -> Result<Font<'static>, BadgePressError> {
    let bytes = std::fs::read(path).map_err(|e| BadgePressError::FontLoadFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Font::try_from_vec(bytes).ok_or_else(|| BadgePressError::FontLoadFailed {
        path: path.to_path_buf(),
        detail: "not a TrueType/OpenType font".to_string(),
    })
}

/// A badge image written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedBadge {
    /// 1-indexed position of the record in the spreadsheet.
    pub index: usize,
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
}

/// `image001.png`, `image002.png`, …
pub fn badge_file_name(index: usize) -> String {
    format!("image{:03}.png", index)
}

/// Rasterise one badge to an in-memory RGB canvas of `width` × `height` pixels.
pub fn rasterize_badge(
    record: &AttendeeRecord,
    template: &BadgeTemplate,
    fonts: &FontSet,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, Rgb(template.background));
    for line in badge_lines(record, template, height) {
        draw_centered_line(&mut canvas, fonts.face(line.bold), &line, template.text_color);
    }
    canvas
}

/// rusttype scales by line height (ascent − descent); badge sizes are em sizes.
fn em_scale(font: &Font<'_>, size_px: f32) -> Scale {
    let v = font.v_metrics_unscaled();
    let units_per_em = f32::from(font.units_per_em());
    let line_height = v.ascent - v.descent;
    if units_per_em <= 0.0 || line_height <= 0.0 {
        return Scale::uniform(size_px);
    }
    Scale::uniform(size_px * line_height / units_per_em)
}

/// Advance width of `text` laid out at `scale`, kerning included.
pub fn text_width(font: &Font<'_>, size_px: f32, text: &str) -> f32 {
    font.layout(text, em_scale(font, size_px), point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

fn draw_centered_line(canvas: &mut RgbImage, font: &Font<'_>, line: &TextLine, color: [u8; 3]) {
    let scale = em_scale(font, line.size_px);
    let width = text_width(font, line.size_px, &line.text);
    let origin = point(canvas.width() as f32 / 2.0 - width / 2.0, line.baseline_y);

    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    for glyph in font.layout(&line.text, scale, origin) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = bb.min.x + gx as i32;
            let py = bb.min.y + gy as i32;
            if px < 0 || py < 0 || px >= cw || py >= ch {
                return;
            }
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            for i in 0..3 {
                let blended =
                    color[i] as f32 * coverage + pixel[i] as f32 * (1.0 - coverage);
                pixel[i] = blended.round().clamp(0.0, 255.0) as u8;
            }
        });
    }
}

/// Encode `canvas` as `<images_dir>/image###.png`.
pub fn write_badge(
    canvas: &RgbImage,
    index: usize,
    images_dir: &Path,
) -> Result<RenderedBadge, BadgeError> {
    let path = images_dir.join(badge_file_name(index));
    canvas
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|e| BadgeError::WriteFailed {
            index,
            path: path.clone(),
            detail: e.to_string(),
        })?;

    debug!(
        "Wrote badge {} → {} ({}x{} px)",
        index,
        path.display(),
        canvas.width(),
        canvas.height()
    );

    Ok(RenderedBadge {
        index,
        path,
        width_px: canvas.width(),
        height_px: canvas.height(),
    })
}

/// Everything the renderer needs besides the record itself.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub fonts: Arc<FontSet>,
    pub template: BadgeTemplate,
    pub width_px: u32,
    pub height_px: u32,
    pub images_dir: PathBuf,
}

impl RenderJob {
    /// Blocking: rasterise and write one badge.
    pub fn render_blocking(
        &self,
        record: &AttendeeRecord,
        index: usize,
    ) -> Result<RenderedBadge, BadgeError> {
        let canvas = rasterize_badge(
            record,
            &self.template,
            &self.fonts,
            self.width_px,
            self.height_px,
        );
        write_badge(&canvas, index, &self.images_dir)
    }

    /// Rasterise and write one badge on the blocking thread pool.
    pub async fn render(
        &self,
        record: AttendeeRecord,
        index: usize,
    ) -> Result<RenderedBadge, BadgeError> {
        let job = self.clone();
        let images_dir = self.images_dir.clone();
        tokio::task::spawn_blocking(move || job.render_blocking(&record, index))
            .await
            .unwrap_or_else(|e| {
                Err(BadgeError::WriteFailed {
                    index,
                    path: images_dir.join(badge_file_name(index)),
                    detail: format!("render task panicked: {}", e),
                })
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Load the configured default fonts, or `None` when they aren't installed.
    pub(crate) fn test_fonts() -> Option<FontSet> {
        let paths = match (
            std::env::var("BADGEPRESS_TEST_FONT"),
            std::env::var("BADGEPRESS_TEST_BOLD_FONT"),
        ) {
            (Ok(regular), Ok(bold)) => FontPaths {
                regular: regular.into(),
                bold: bold.into(),
            },
            _ => FontPaths::default(),
        };
        match FontSet::load(&paths) {
            Ok(fonts) => Some(fonts),
            Err(e) => {
                println!("SKIP — {e}");
                None
            }
        }
    }

    #[test]
    fn file_names_are_zero_padded_and_one_based() {
        assert_eq!(badge_file_name(1), "image001.png");
        assert_eq!(badge_file_name(42), "image042.png");
        assert_eq!(badge_file_name(1000), "image1000.png");
    }

    #[test]
    fn missing_font_is_fatal() {
        let err = FontSet::load(&FontPaths {
            regular: "/no/such/font.ttf".into(),
            bold: "/no/such/font-bold.ttf".into(),
        })
        .unwrap_err();
        assert!(matches!(err, BadgePressError::FontLoadFailed { .. }));
    }

    #[test]
    fn garbage_font_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = FontSet::load(&FontPaths {
            regular: path.clone(),
            bold: path,
        })
        .unwrap_err();
        assert!(err.to_string().contains("fake.ttf"), "got: {err}");
    }

    #[test]
    fn write_into_missing_directory_is_non_fatal_error() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let err = write_badge(&canvas, 3, &dir.path().join("absent")).unwrap_err();
        assert_eq!(err.index(), 3);
        assert!(err.to_string().contains("image003.png"), "got: {err}");
    }

    #[test]
    fn write_produces_png_with_canvas_size() {
        let dir = tempfile::tempdir().unwrap();
        let canvas = RgbImage::from_pixel(20, 10, Rgb([255, 255, 255]));
        let badge = write_badge(&canvas, 1, dir.path()).unwrap();
        assert_eq!(badge.path, dir.path().join("image001.png"));
        let decoded = image::open(&badge.path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn blank_record_renders_solid_background() {
        let Some(fonts) = test_fonts() else { return };
        let template = BadgeTemplate::default();
        let canvas = rasterize_badge(&AttendeeRecord::default(), &template, &fonts, 100, 80);
        assert!(canvas.pixels().all(|p| p.0 == template.background));
    }

    #[test]
    fn text_is_drawn_centred() {
        let Some(fonts) = test_fonts() else { return };
        let record = AttendeeRecord::new("", "Ada", "", "");
        let canvas = rasterize_badge(&record, &BadgeTemplate::default(), &fonts, 1110, 886);
        assert_eq!((canvas.width(), canvas.height()), (1110, 886));

        let dark: Vec<u32> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 128)
            .map(|(x, _, _)| x)
            .collect();
        assert!(!dark.is_empty(), "name should leave ink on the canvas");

        let min = *dark.iter().min().unwrap() as f32;
        let max = *dark.iter().max().unwrap() as f32;
        let centre = (min + max) / 2.0;
        assert!((centre - 555.0).abs() < 20.0, "ink centred at {centre}");
    }

    #[test]
    fn name_ink_sits_above_its_baseline() {
        let Some(fonts) = test_fonts() else { return };
        let record = AttendeeRecord::new("", "HELLO", "", "");
        let canvas = rasterize_badge(&record, &BadgeTemplate::default(), &fonts, 1110, 886);
        let baseline = 886.0 * 0.30;
        let max_y = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 128)
            .map(|(_, y, _)| y as f32)
            .fold(0.0_f32, f32::max);
        assert!(max_y <= baseline + 2.0, "ink reaches y={max_y}");
        assert!(max_y >= baseline - 10.0, "ink ends far above baseline: {max_y}");
    }

    #[test]
    fn bold_text_is_wider_than_regular() {
        let Some(fonts) = test_fonts() else { return };
        let regular = text_width(fonts.face(false), 90.0, "BADGE");
        let bold = text_width(fonts.face(true), 90.0, "BADGE");
        assert!(regular > 0.0);
        assert!(bold > regular);
    }

    #[tokio::test]
    async fn render_job_writes_numbered_png() {
        let Some(fonts) = test_fonts() else { return };
        let dir = tempfile::tempdir().unwrap();
        let job = RenderJob {
            fonts: Arc::new(fonts),
            template: BadgeTemplate::default(),
            width_px: 1110,
            height_px: 886,
            images_dir: dir.path().to_path_buf(),
        };
        let record = AttendeeRecord::new("Иванов", "Иван", "ООО Ромашка", "Инженер");
        let badge = job.render(record, 5).await.unwrap();
        assert_eq!(badge.index, 5);
        assert_eq!(badge.path.file_name().unwrap(), "image005.png");
        assert_eq!((badge.width_px, badge.height_px), (1110, 886));
        assert!(badge.path.exists());
    }
}
