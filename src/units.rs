//! Physical measurement types: millimetres, points and pixels.
//!
//! Badge and page geometry is specified in millimetres but consumed in two
//! other unit systems: pixels (for rasterising a badge at a given DPI) and
//! PDF points (for placing images on a page). Wrapping each in its own
//! newtype means a millimetre value can never be handed to the page packer
//! by accident; it has to go through [`Mm::to_points`] first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Millimetres in one inch.
pub const MM_PER_INCH: f64 = 25.4;

/// PDF points in one inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// A length in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Mm(pub f64);

/// A length in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Pt(pub f64);

impl Mm {
    /// `mm / 25.4 * 72`
    pub fn to_points(self) -> Pt {
        Pt(self.0 / MM_PER_INCH * POINTS_PER_INCH)
    }

    /// Exact (unrounded) pixel length at `dpi`: `mm / 25.4 * dpi`.
    pub fn to_pixels_f64(self, dpi: u32) -> f64 {
        self.0 / MM_PER_INCH * f64::from(dpi)
    }

    /// Pixel length at `dpi`, rounded to the nearest whole pixel.
    pub fn to_pixels(self, dpi: u32) -> u32 {
        self.to_pixels_f64(dpi).round().max(0.0) as u32
    }
}

macro_rules! impl_length_ops {
    ($ty:ident, $suffix:literal) => {
        impl Add for $ty {
            type Output = $ty;
            fn add(self, rhs: $ty) -> $ty {
                $ty(self.0 + rhs.0)
            }
        }

        impl Sub for $ty {
            type Output = $ty;
            fn sub(self, rhs: $ty) -> $ty {
                $ty(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $ty {
            type Output = $ty;
            fn mul(self, rhs: f64) -> $ty {
                $ty(self.0 * rhs)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.2}{}", self.0, $suffix)
            }
        }
    };
}

impl_length_ops!(Mm, "mm");
impl_length_ops!(Pt, "pt");

/// A width × height pair in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeMm {
    pub width: Mm,
    pub height: Mm,
}

impl SizeMm {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width: Mm(width),
            height: Mm(height),
        }
    }

    pub fn to_points(self) -> SizePt {
        SizePt {
            width: self.width.to_points(),
            height: self.height.to_points(),
        }
    }

    /// Pixel dimensions at `dpi`.
    pub fn to_pixels(self, dpi: u32) -> (u32, u32) {
        (self.width.to_pixels(dpi), self.height.to_pixels(dpi))
    }
}

impl fmt::Display for SizeMm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}mm", self.width.0, self.height.0)
    }
}

/// A width × height pair in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizePt {
    pub width: Pt,
    pub height: Pt,
}
