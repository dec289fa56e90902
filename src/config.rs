//! Configuration types for badge generation.
//!
//! Every physical constant of a run (badge size, paper size, margin, spacing,
//! DPI), every path and the text template live in one immutable
//! [`GenerationConfig`], built via its [`GenerationConfigBuilder`] and passed
//! by reference into each pipeline stage.

use crate::error::BadgePressError;
use crate::pipeline::layout::BadgeTemplate;
use crate::progress::ProgressCallback;
use crate::units::{Mm, SizeMm};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the subdirectory of the output root holding badge PNGs.
pub const IMAGES_DIR_NAME: &str = "images";

/// Configuration for one badge-generation run.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use badgepress::{GenerationConfig, PaperSize};
///
/// let config = GenerationConfig::builder()
///     .page_size(PaperSize::A4)
///     .margin_mm(8.0)
///     .output_dir("badges")
///     .build()
///     .unwrap();
/// assert_eq!(config.images_dir(), std::path::Path::new("badges/images"));
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Physical badge size. Default: 94 × 75 mm.
    pub badge_size: SizeMm,

    /// Paper size of every page in the document. Default: A3 (297 × 420 mm).
    pub page_size: PaperSize,

    /// Blank border kept on every page edge. Default: 5 mm.
    pub margin: Mm,

    /// Gap between neighbouring badges, horizontally and vertically. Default: 2 mm.
    pub spacing: Mm,

    /// Rasterisation resolution of badge images. Range: 72–1200. Default: 300.
    pub dpi: u32,

    /// Output root; badge PNGs go to `<output_dir>/images`. Default: `_output`.
    pub output_dir: PathBuf,

    /// File name of the final document inside `output_dir`. Default: `output.pdf`.
    pub document_name: String,

    /// Remove a pre-existing images directory before rendering. Default: false.
    pub clean_images: bool,

    /// Regular and bold font files used by the renderer.
    pub fonts: FontPaths,

    /// Text layout of a badge.
    pub template: BadgeTemplate,

    /// Spreadsheet header names of the four attendee columns.
    pub columns: ColumnMapping,

    /// Optional per-badge progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            badge_size: SizeMm::new(94.0, 75.0),
            page_size: PaperSize::A3,
            margin: Mm(5.0),
            spacing: Mm(2.0),
            dpi: 300,
            output_dir: PathBuf::from("_output"),
            document_name: "output.pdf".to_string(),
            clean_images: false,
            fonts: FontPaths::default(),
            template: BadgeTemplate::default(),
            columns: ColumnMapping::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("badge_size", &self.badge_size)
            .field("page_size", &self.page_size)
            .field("margin", &self.margin)
            .field("spacing", &self.spacing)
            .field("dpi", &self.dpi)
            .field("output_dir", &self.output_dir)
            .field("document_name", &self.document_name)
            .field("clean_images", &self.clean_images)
            .field("fonts", &self.fonts)
            .field("template", &self.template)
            .field("columns", &self.columns)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory receiving `image###.png` files.
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join(IMAGES_DIR_NAME)
    }

    /// Full path of the final document.
    pub fn document_path(&self) -> PathBuf {
        self.output_dir.join(&self.document_name)
    }

    /// Badge size in whole pixels at the configured DPI.
    pub fn badge_pixels(&self) -> (u32, u32) {
        self.badge_size.to_pixels(self.dpi)
    }

    /// Check that at least one badge fits on a page.
    ///
    /// The row-wrap packer never terminates a row when a single badge is wider
    /// than the printable width, so this is rejected up front.
    pub fn validate_geometry(&self) -> Result<(), BadgePressError> {
        let page = self.page_size.size_mm();
        let badge = self.badge_size;

        let values = [
            badge.width.0,
            badge.height.0,
            page.width.0,
            page.height.0,
            self.margin.0,
            self.spacing.0,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            return Err(BadgePressError::InvalidConfig(format!(
                "geometry must be finite (badge {badge}, page {page}, margin {}, spacing {})",
                self.margin, self.spacing
            )));
        }
        if badge.width.0 <= 0.0 || badge.height.0 <= 0.0 {
            return Err(BadgePressError::InvalidConfig(format!(
                "badge size must be positive, got {badge}"
            )));
        }
        if page.width.0 <= 0.0 || page.height.0 <= 0.0 {
            return Err(BadgePressError::InvalidConfig(format!(
                "page size must be positive, got {page}"
            )));
        }
        if self.margin.0 < 0.0 || self.spacing.0 < 0.0 {
            return Err(BadgePressError::InvalidConfig(format!(
                "margin and spacing must not be negative (margin {}, spacing {})",
                self.margin, self.spacing
            )));
        }
        if badge.width + self.margin * 2.0 > page.width {
            return Err(BadgePressError::InvalidConfig(format!(
                "badge width {} plus two margins of {} exceeds page width {}",
                badge.width, self.margin, page.width
            )));
        }
        if badge.height + self.margin * 2.0 > page.height {
            return Err(BadgePressError::InvalidConfig(format!(
                "badge height {} plus two margins of {} exceeds page height {}",
                badge.height, self.margin, page.height
            )));
        }
        Ok(())
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn badge_size_mm(mut self, width: f64, height: f64) -> Self {
        self.config.badge_size = SizeMm::new(width, height);
        self
    }

    pub fn page_size(mut self, size: PaperSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin_mm(mut self, mm: f64) -> Self {
        self.config.margin = Mm(mm);
        self
    }

    pub fn spacing_mm(mut self, mm: f64) -> Self {
        self.config.spacing = Mm(mm);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 1200);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn document_name(mut self, name: impl Into<String>) -> Self {
        self.config.document_name = name.into();
        self
    }

    pub fn clean_images(mut self, v: bool) -> Self {
        self.config.clean_images = v;
        self
    }

    pub fn fonts(mut self, fonts: FontPaths) -> Self {
        self.config.fonts = fonts;
        self
    }

    pub fn regular_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.fonts.regular = path.into();
        self
    }

    pub fn bold_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.fonts.bold = path.into();
        self
    }

    pub fn template(mut self, template: BadgeTemplate) -> Self {
        self.config.template = template;
        self
    }

    pub fn wrap_mode(mut self, mode: WrapMode) -> Self {
        self.config.template = BadgeTemplate::for_wrap_mode(mode);
        self
    }

    pub fn columns(mut self, columns: ColumnMapping) -> Self {
        self.config.columns = columns;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, BadgePressError> {
        let c = &self.config;
        if !(72..=1200).contains(&c.dpi) {
            return Err(BadgePressError::InvalidConfig(format!(
                "DPI must be 72–1200, got {}",
                c.dpi
            )));
        }
        if c.document_name.trim().is_empty() {
            return Err(BadgePressError::InvalidConfig(
                "document name must not be empty".into(),
            ));
        }
        if Path::new(&c.document_name).components().count() != 1 {
            return Err(BadgePressError::InvalidConfig(format!(
                "document name must be a plain file name, got '{}'",
                c.document_name
            )));
        }
        c.validate_geometry()?;
        Ok(self.config)
    }
}

// ── Paper size ───────────────────────────────────────────────────────────

/// Paper size of the output document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    /// 297 × 420 mm (default).
    #[default]
    A3,
    /// 210 × 297 mm.
    A4,
    /// 148 × 210 mm.
    A5,
    /// US Letter, 215.9 × 279.4 mm.
    Letter,
    /// Any other portrait or landscape size.
    Custom(SizeMm),
}

impl PaperSize {
    pub fn size_mm(&self) -> SizeMm {
        match self {
            PaperSize::A3 => SizeMm::new(297.0, 420.0),
            PaperSize::A4 => SizeMm::new(210.0, 297.0),
            PaperSize::A5 => SizeMm::new(148.0, 210.0),
            PaperSize::Letter => SizeMm::new(215.9, 279.4),
            PaperSize::Custom(size) => *size,
        }
    }
}

static RE_DIMENSIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*[xX×*]\s*(\d+(?:\.\d+)?)\s*(?:mm)?\s*$").unwrap()
});

/// Parse a `"WIDTHxHEIGHT"` string in millimetres, e.g. `"94x75"` or `"297 x 420 mm"`.
pub fn parse_dimensions(s: &str) -> Result<SizeMm, BadgePressError> {
    let caps = RE_DIMENSIONS.captures(s).ok_or_else(|| {
        BadgePressError::InvalidConfig(format!(
            "expected dimensions as WIDTHxHEIGHT in millimetres, got '{s}'"
        ))
    })?;
    let parse = |m: &str| {
        m.parse::<f64>()
            .map_err(|e| BadgePressError::InvalidConfig(format!("invalid number '{m}': {e}")))
    };
    Ok(SizeMm::new(parse(&caps[1])?, parse(&caps[2])?))
}

impl FromStr for PaperSize {
    type Err = BadgePressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a3" => Ok(PaperSize::A3),
            "a4" => Ok(PaperSize::A4),
            "a5" => Ok(PaperSize::A5),
            "letter" => Ok(PaperSize::Letter),
            other => parse_dimensions(other).map(PaperSize::Custom),
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::A3 => write!(f, "A3"),
            PaperSize::A4 => write!(f, "A4"),
            PaperSize::A5 => write!(f, "A5"),
            PaperSize::Letter => write!(f, "Letter"),
            PaperSize::Custom(size) => write!(f, "{size}"),
        }
    }
}

// ── Fonts ────────────────────────────────────────────────────────────────

/// Font files used for regular and bold badge text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontPaths {
    pub regular: PathBuf,
    pub bold: PathBuf,
}

impl Default for FontPaths {
    /// DejaVu Sans, which ships with most Linux distributions and covers Cyrillic.
    fn default() -> Self {
        Self {
            regular: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
            bold: PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
        }
    }
}

// ── Columns ──────────────────────────────────────────────────────────────

/// Header names identifying the attendee columns of a sheet.
///
/// Matching is exact: no trimming and no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub surname: String,
    pub name: String,
    pub organization: String,
    pub role: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            surname: "Фамилия".to_string(),
            name: "Имя".to_string(),
            organization: "Компания или учебное заведение".to_string(),
            role: "Должность".to_string(),
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the organization and role fields are laid out on a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Long values are split over two lines (57%/63% and 82%/88%). (default)
    #[default]
    Split,
    /// Each value is drawn on one line (60% and 85%).
    SingleLine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_layout() {
        let c = GenerationConfig::default();
        assert_eq!(c.badge_size, SizeMm::new(94.0, 75.0));
        assert_eq!(c.page_size.size_mm(), SizeMm::new(297.0, 420.0));
        assert_eq!(c.margin, Mm(5.0));
        assert_eq!(c.spacing, Mm(2.0));
        assert_eq!(c.dpi, 300);
        assert_eq!(c.badge_pixels(), (1110, 886));
        assert_eq!(c.document_path(), PathBuf::from("_output/output.pdf"));
        assert_eq!(c.images_dir(), PathBuf::from("_output/images"));
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = GenerationConfig::builder().dpi(10_000).build().unwrap();
        assert_eq!(c.dpi, 1200);
        let c = GenerationConfig::builder().dpi(1).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn builder_rejects_badge_wider_than_page() {
        let err = GenerationConfig::builder()
            .page_size(PaperSize::A5)
            .badge_size_mm(140.0, 50.0)
            .margin_mm(5.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, BadgePressError::InvalidConfig(_)));
        assert!(err.to_string().contains("width"), "got: {err}");
    }

    #[test]
    fn builder_rejects_badge_taller_than_page() {
        let err = GenerationConfig::builder()
            .page_size(PaperSize::Custom(SizeMm::new(300.0, 80.0)))
            .badge_size_mm(94.0, 75.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("height"), "got: {err}");
    }

    #[test]
    fn badge_exactly_filling_printable_width_is_accepted() {
        let c = GenerationConfig::builder()
            .page_size(PaperSize::Custom(SizeMm::new(104.0, 85.0)))
            .badge_size_mm(94.0, 75.0)
            .margin_mm(5.0)
            .build();
        assert!(c.is_ok());
    }

    #[test]
    fn builder_rejects_negative_margin() {
        let err = GenerationConfig::builder().margin_mm(-1.0).build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_rejects_nan_spacing() {
        let err = GenerationConfig::builder()
            .spacing_mm(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, BadgePressError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_infinite_margin() {
        let err = GenerationConfig::builder()
            .margin_mm(f64::INFINITY)
            .build()
            .unwrap_err();
        assert!(matches!(err, BadgePressError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_nested_document_name() {
        let err = GenerationConfig::builder()
            .document_name("sub/out.pdf")
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn paper_size_parses_names_and_dimensions() {
        assert_eq!("A3".parse::<PaperSize>().unwrap(), PaperSize::A3);
        assert_eq!(" letter ".parse::<PaperSize>().unwrap(), PaperSize::Letter);
        assert_eq!(
            "297x420".parse::<PaperSize>().unwrap().size_mm(),
            SizeMm::new(297.0, 420.0)
        );
        assert_eq!(
            "100.5 X 200 mm".parse::<PaperSize>().unwrap().size_mm(),
            SizeMm::new(100.5, 200.0)
        );
        assert!("b4".parse::<PaperSize>().is_err());
        assert!("12x".parse::<PaperSize>().is_err());
    }

    #[test]
    fn parse_dimensions_accepts_badge_sizes() {
        assert_eq!(parse_dimensions("94x75").unwrap(), SizeMm::new(94.0, 75.0));
        assert!(parse_dimensions("ninety by seventy").is_err());
    }

    #[test]
    fn wrap_mode_selects_template() {
        let c = GenerationConfig::builder()
            .wrap_mode(WrapMode::SingleLine)
            .build()
            .unwrap();
        assert_eq!(c.template.wrap, WrapMode::SingleLine);
    }

    #[test]
    fn debug_hides_callback() {
        let dbg = format!("{:?}", GenerationConfig::default());
        assert!(dbg.contains("progress_callback: None"), "got: {dbg}");
    }
}
