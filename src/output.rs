//! Result types returned by a generation run.

use crate::error::BadgeError;
use crate::pipeline::extract::AttendeeRecord;
use crate::pipeline::pack::Placement;
use crate::pipeline::render::RenderedBadge;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of rendering one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeResult {
    /// 1-based record index; matches the `image###.png` file number.
    pub index: usize,
    /// Written badge, when rendering succeeded.
    pub badge: Option<RenderedBadge>,
    /// Why the badge is missing from the document.
    pub error: Option<BadgeError>,
}

impl BadgeResult {
    pub fn from_result(index: usize, result: Result<RenderedBadge, BadgeError>) -> Self {
        match result {
            Ok(badge) => Self {
                index,
                badge: Some(badge),
                error: None,
            },
            Err(e) => Self {
                index,
                badge: None,
                error: Some(e),
            },
        }
    }
}

/// Paths of the written badges among `badges`, in order.
pub(crate) fn written_paths(badges: &[BadgeResult]) -> Vec<PathBuf> {
    badges
        .iter()
        .filter_map(|b| b.badge.as_ref().map(|r| r.path.clone()))
        .collect()
}

/// Counters and timings for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Records read from the spreadsheet.
    pub total_records: usize,
    /// Badge images written to disk.
    pub written_badges: usize,
    /// Records whose badge could not be written.
    pub failed_badges: usize,
    /// Pages in the document.
    pub pages: usize,
    pub extract_duration_ms: u64,
    pub render_duration_ms: u64,
    pub pack_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Records in spreadsheet order (sheets in workbook order).
    pub records: Vec<AttendeeRecord>,
    /// One entry per record, same order.
    pub badges: Vec<BadgeResult>,
    /// Where each written badge landed, in document order.
    pub placements: Vec<Placement>,
    /// Path of the written PDF.
    pub document_path: PathBuf,
    pub stats: GenerationStats,
}

impl GenerationReport {
    /// Paths of the badges that made it into the document, in order.
    pub fn image_paths(&self) -> Vec<PathBuf> {
        written_paths(&self.badges)
    }
}
