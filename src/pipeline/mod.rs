//! Pipeline stages for spreadsheet-to-badge-sheet generation.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ layout ──▶ render ──▶ pack
//! (xlsx)      (text)     (PNG)      (PDF)
//! ```
//!
//! 1. [`extract`]: read every sheet of the workbook into [`extract::AttendeeRecord`]s
//! 2. [`layout`]: decide which strings are drawn where, splitting long lines
//! 3. [`render`]: rasterise a badge and write `image###.png`; runs in
//!    `spawn_blocking` because glyph rasterisation is CPU-bound
//! 4. [`pack`]: place the written images on pages and write the PDF

pub mod extract;
pub mod layout;
pub mod pack;
pub mod render;
