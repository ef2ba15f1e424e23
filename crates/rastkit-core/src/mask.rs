//! Per-source mask evaluation.
//!
//! A [`MaskEvaluator`] binds the optional ROI and alpha channel of one source
//! and turns them into a [`MaskResult`] per pixel:
//!
//! | Present    | weight                                  | valid                |
//! |------------|-----------------------------------------|----------------------|
//! | alpha      | `alpha / divisor` (bitmask: 0 or 1)     | weight > 0 (bitmask) or always (weighted) |
//! | ROI only   | 1 inside, 0 outside                     | weight > 0           |
//! | nothing    | 1                                       | always               |
//!
//! No-data is not part of the evaluator: kernels test each band sample
//! against its [`NoData`](crate::NoData) and AND the answer into validity.
//!
//! [`MaskCase`] records, once per operator, which of the four inner loop
//! variants a kernel should run.

use crate::{AnyRaster, Roi};

/// How alpha samples become weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlphaMode {
    /// Any positive alpha counts as fully opaque.
    #[default]
    Bitmask,
    /// Alpha is normalized to a continuous weight.
    Weighted,
}

/// Result of evaluating a mask at one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskResult {
    /// Whether the source takes part at this pixel.
    pub valid: bool,
    /// Contribution weight in `[0, 1]` (unbounded above for float alpha).
    pub weight: f64,
}

impl MaskResult {
    /// Fully valid, unit weight.
    pub const OPAQUE: MaskResult = MaskResult {
        valid: true,
        weight: 1.0,
    };

    /// Excluded, zero weight.
    pub const EXCLUDED: MaskResult = MaskResult {
        valid: false,
        weight: 0.0,
    };

    /// Whether this result adds anything: valid with non-zero weight.
    #[inline]
    pub fn contributes(&self) -> bool {
        self.valid && self.weight > 0.0
    }
}

/// Which masking features an operator instance has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaskCase {
    /// No ROI, alpha or no-data anywhere.
    NoMask,
    /// ROI and/or alpha, no no-data.
    MaskOnly,
    /// No-data, no ROI or alpha.
    NoDataOnly,
    /// Both masks and no-data.
    General,
}

impl MaskCase {
    /// Selects the case from the two feature flags.
    #[inline]
    pub const fn select(has_mask: bool, has_no_data: bool) -> Self {
        match (has_mask, has_no_data) {
            (false, false) => Self::NoMask,
            (true, false) => Self::MaskOnly,
            (false, true) => Self::NoDataOnly,
            (true, true) => Self::General,
        }
    }

    /// Whether ROI/alpha evaluation is needed.
    #[inline]
    pub const fn has_mask(&self) -> bool {
        matches!(self, Self::MaskOnly | Self::General)
    }

    /// Whether no-data tests are needed.
    #[inline]
    pub const fn has_no_data(&self) -> bool {
        matches!(self, Self::NoDataOnly | Self::General)
    }
}

/// Binds one source's ROI and alpha channel for per-pixel evaluation.
#[derive(Debug, Clone, Copy)]
pub struct MaskEvaluator<'r> {
    roi: Option<&'r Roi>,
    alpha: Option<&'r AnyRaster<'r>>,
    divisor: f64,
    mode: AlphaMode,
}

impl<'r> MaskEvaluator<'r> {
    /// Evaluator with nothing bound; every pixel is opaque.
    pub fn unmasked() -> Self {
        Self {
            roi: None,
            alpha: None,
            divisor: 1.0,
            mode: AlphaMode::Bitmask,
        }
    }

    /// Creates an evaluator. Alpha takes precedence over the ROI.
    pub fn new(roi: Option<&'r Roi>, alpha: Option<&'r AnyRaster<'r>>, mode: AlphaMode) -> Self {
        let divisor = alpha.map_or(1.0, |a| a.kind().alpha_divisor());
        Self {
            roi,
            alpha,
            divisor,
            mode,
        }
    }

    /// Whether anything is bound.
    #[inline]
    pub fn is_masked(&self) -> bool {
        self.roi.is_some() || self.alpha.is_some()
    }

    /// Alpha handling mode.
    #[inline]
    pub fn mode(&self) -> AlphaMode {
        self.mode
    }

    /// Evaluates the mask at `(x, y)`.
    ///
    /// Pixels outside the alpha raster are excluded. Negative alpha counts
    /// as transparent.
    #[inline]
    pub fn evaluate(&self, x: i32, y: i32) -> MaskResult {
        if let Some(alpha) = self.alpha {
            if !alpha.bounds().contains(x, y) {
                return MaskResult::EXCLUDED;
            }
            let raw = alpha.sample_f64(x, y, 0);
            return match self.mode {
                AlphaMode::Bitmask => {
                    if raw > 0.0 {
                        MaskResult::OPAQUE
                    } else {
                        MaskResult::EXCLUDED
                    }
                }
                AlphaMode::Weighted => MaskResult {
                    valid: true,
                    weight: (raw / self.divisor).max(0.0),
                },
            };
        }
        if let Some(roi) = self.roi {
            return if roi.contains(x, y) {
                MaskResult::OPAQUE
            } else {
                MaskResult::EXCLUDED
            };
        }
        MaskResult::OPAQUE
    }
}
