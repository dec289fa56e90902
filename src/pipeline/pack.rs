//! Page packing: badge PNGs → one multi-page PDF.
//!
//! Placement is a single deterministic pass. Badges fill a page in reading
//! order (left to right, then top to bottom) with a fixed margin around the
//! page and fixed spacing between badges. PDF coordinates grow upward, so the
//! first row sits at `page_height - margin - badge_height`.
//!
//! After each placement the cursor advances; if the *next* badge would cross
//! the right margin the cursor wraps to a new row, and if that row would start
//! below the bottom margin the next badge opens a new page.
//!
//! All geometry handled here is in points ([`Pt`]). Millimetre values from the
//! configuration are converted once in [`PageGeometry::from_config`].

use crate::config::GenerationConfig;
use crate::error::BadgePressError;
use crate::units::{Pt, SizePt};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Slack for comparisons after the millimetre → point conversion.
const FIT_TOLERANCE: f64 = 1e-6;

/// Page and badge geometry, all in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page: SizePt,
    pub image: SizePt,
    pub margin: Pt,
    pub spacing: Pt,
}

impl PageGeometry {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            page: config.page_size.size_mm().to_points(),
            image: config.badge_size.to_points(),
            margin: config.margin.to_points(),
            spacing: config.spacing.to_points(),
        }
    }

    /// Reject geometry on which no badge fits.
    pub fn validate(&self) -> Result<(), BadgePressError> {
        let non_negative = |v: Pt| v.0.is_finite() && v.0 >= 0.0;
        if !non_negative(self.margin) || !non_negative(self.spacing) {
            return Err(BadgePressError::InvalidConfig(format!(
                "margin {} and spacing {} must be finite and not negative",
                self.margin, self.spacing
            )));
        }
        let fits = |image: Pt, page: Pt| {
            image.0 > 0.0 && (image + self.margin * 2.0).0 <= page.0 + FIT_TOLERANCE
        };
        if !fits(self.image.width, self.page.width) {
            return Err(BadgePressError::InvalidConfig(format!(
                "badge width {} plus two margins of {} exceeds page width {}",
                self.image.width, self.margin, self.page.width
            )));
        }
        if !fits(self.image.height, self.page.height) {
            return Err(BadgePressError::InvalidConfig(format!(
                "badge height {} plus two margins of {} exceeds page height {}",
                self.image.height, self.margin, self.page.height
            )));
        }
        Ok(())
    }

    fn top_row_y(&self) -> Pt {
        self.page.height - self.margin - self.image.height
    }
}

/// Where one badge lands in the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// 0-based page number.
    pub page: usize,
    /// 0-based position on that page, in reading order.
    pub slot: usize,
    /// Lower-left corner, in points.
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

/// Compute the position of `count` badges.
///
/// Pages are numbered from 0. A page only appears in the result once a badge
/// is placed on it; the document itself always has at least one page.
/// Running off the bottom of a page moves the cursor without opening the next
/// page, so a run that exactly fills its last page ends without a blank one.
pub fn plan_placements(
    count: usize,
    geometry: &PageGeometry,
) -> Result<Vec<Placement>, BadgePressError> {
    geometry.validate()?;

    let g = geometry;
    let mut placements = Vec::with_capacity(count);
    let mut page = 0;
    let mut slot = 0;
    let mut x = g.margin;
    let mut y = g.top_row_y();

    for _ in 0..count {
        placements.push(Placement {
            page,
            slot,
            x,
            y,
            width: g.image.width,
            height: g.image.height,
        });

        slot += 1;
        x = x + g.image.width + g.spacing;

        if (x + g.image.width).0 > (g.page.width - g.margin).0 + FIT_TOLERANCE {
            x = g.margin;
            y = y - (g.image.height + g.spacing);
        }

        if y.0 < g.margin.0 - FIT_TOLERANCE {
            page += 1;
            slot = 0;
            x = g.margin;
            y = g.top_row_y();
        }
    }

    Ok(placements)
}

/// Number of pages the document will have for these placements.
pub fn page_count(placements: &[Placement]) -> usize {
    placements.last().map_or(1, |p| p.page + 1)
}

/// Summary of a written document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedDocument {
    pub path: PathBuf,
    pub pages: usize,
    pub placements: Vec<Placement>,
}

/// Build the document from `images` (in order) and write it to `output`.
///
/// Runs inside `spawn_blocking`: PNG decoding and PDF serialisation are
/// CPU-bound.
pub async fn pack_images(
    images: &[PathBuf],
    geometry: PageGeometry,
    output: &Path,
) -> Result<PackedDocument, BadgePressError> {
    let images = images.to_vec();
    let output = output.to_path_buf();

    tokio::task::spawn_blocking(move || pack_images_blocking(&images, &geometry, &output))
        .await
        .map_err(|e| BadgePressError::Internal(format!("Pack task panicked: {}", e)))?
}

/// Blocking implementation of [`pack_images`].
pub fn pack_images_blocking(
    images: &[PathBuf],
    geometry: &PageGeometry,
    output: &Path,
) -> Result<PackedDocument, BadgePressError> {
    let placements = plan_placements(images.len(), geometry)?;
    let bytes = build_document(images, &placements, geometry, output)?;
    write_atomic(output, &bytes)?;

    let pages = page_count(&placements);
    info!(
        "Wrote {} badge(s) on {} page(s) → {}",
        placements.len(),
        pages,
        output.display()
    );

    Ok(PackedDocument {
        path: output.to_path_buf(),
        pages,
        placements,
    })
}

/// Assemble the PDF in memory. Any image that fails to load aborts the build.
fn build_document(
    images: &[PathBuf],
    placements: &[Placement],
    geometry: &PageGeometry,
    output: &Path,
) -> Result<Vec<u8>, BadgePressError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let total_pages = page_count(placements);
    let mut page_ops: Vec<Vec<Operation>> = vec![Vec::new(); total_pages];
    let mut page_xobjects: Vec<Dictionary> = vec![Dictionary::new(); total_pages];

    for (i, (path, placement)) in images.iter().zip(placements).enumerate() {
        let image_id = embed_png(&mut doc, path)?;
        let name = format!("Im{}", i + 1);

        page_xobjects[placement.page].set(name.as_bytes().to_vec(), image_id);
        page_ops[placement.page].extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (placement.width.0 as f32).into(),
                    0.into(),
                    0.into(),
                    (placement.height.0 as f32).into(),
                    (placement.x.0 as f32).into(),
                    (placement.y.0 as f32).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        debug!(
            "Placed {} on page {} at ({:.2}, {:.2})",
            path.display(),
            placement.page + 1,
            placement.x.0,
            placement.y.0
        );
    }

    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        (geometry.page.width.0 as f32).into(),
        (geometry.page.height.0 as f32).into(),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(total_pages);
    for (operations, xobjects) in page_ops.into_iter().zip(page_xobjects) {
        let content = Content { operations }
            .encode()
            .map_err(|e| BadgePressError::DocumentWriteFailed {
                path: output.to_path_buf(),
                detail: format!("content stream encoding failed: {}", e),
            })?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Resources" => dictionary! { "XObject" => xobjects },
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total_pages as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| BadgePressError::DocumentWriteFailed {
            path: output.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok(bytes)
}

/// Decode a PNG and add it as an RGB image XObject.
fn embed_png(doc: &mut Document, path: &Path) -> Result<ObjectId, BadgePressError> {
    let rgb = image::open(path)
        .map_err(|e| BadgePressError::ImageEmbedFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .to_rgb8();

    let (width, height) = rgb.dimensions();
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    );
    Ok(doc.add_object(stream))
}

/// Write to a temporary file next to `path`, then rename over it.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BadgePressError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let fail = |detail: String| BadgePressError::DocumentWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| fail(e.to_string()))?;
    tmp.write_all(bytes).map_err(|e| fail(e.to_string()))?;
    tmp.persist(path).map_err(|e| fail(e.error.to_string()))?;
    Ok(())
}
