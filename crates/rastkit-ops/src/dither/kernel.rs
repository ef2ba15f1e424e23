//! Error diffusion kernels.
//!
//! A kernel is a small grid of weights with a key cell marking the pixel
//! being quantized. Only cells right of the key on its row, and cells on the
//! rows below, may carry weight; weights sum to 1.
//!
//! ```text
//! Floyd-Steinberg (key = *)
//!
//!         *    7/16
//!   3/16  5/16 1/16
//! ```

use crate::{OpsError, OpsResult};

const SUM_TOLERANCE: f32 = 1e-6;

/// Validated error diffusion kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorKernel {
    width: usize,
    height: usize,
    key_x: usize,
    key_y: usize,
    data: Vec<f32>,
    taps: Vec<(i32, i32, f32)>,
}

impl ErrorKernel {
    /// Creates a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] if the grid is malformed, the key is
    /// outside it, weight sits at or before the key, or weights do not sum
    /// to 1.
    pub fn new(width: usize, height: usize, key_x: usize, key_y: usize, data: Vec<f32>) -> OpsResult<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(OpsError::InvalidParameter(format!(
                "kernel {}x{} needs {} weights, got {}",
                width,
                height,
                width * height,
                data.len()
            )));
        }
        if key_x >= width || key_y >= height {
            return Err(OpsError::InvalidParameter(format!(
                "kernel key ({key_x}, {key_y}) outside {width}x{height}"
            )));
        }
        let mut sum = 0.0f32;
        for y in 0..height {
            for x in 0..width {
                let w = data[y * width + x];
                if !w.is_finite() {
                    return Err(OpsError::InvalidParameter(format!(
                        "kernel weight at ({x}, {y}) is not finite"
                    )));
                }
                if w == 0.0 {
                    continue;
                }
                let ahead = y > key_y || (y == key_y && x > key_x);
                if !ahead {
                    return Err(OpsError::InvalidParameter(format!(
                        "kernel weight at ({x}, {y}) is not after the key ({key_x}, {key_y})"
                    )));
                }
                sum += w;
            }
        }
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(OpsError::InvalidParameter(format!(
                "kernel weights sum to {sum}, expected 1"
            )));
        }
        Ok(Self::build(width, height, key_x, key_y, data))
    }

    fn build(width: usize, height: usize, key_x: usize, key_y: usize, data: Vec<f32>) -> Self {
        let taps = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .filter(|&(x, y)| data[y * width + x] != 0.0)
            .map(|(x, y)| (x as i32 - key_x as i32, y as i32 - key_y as i32, data[y * width + x]))
            .collect();
        Self {
            width,
            height,
            key_x,
            key_y,
            data,
            taps,
        }
    }

    fn scaled(width: usize, height: usize, key_x: usize, weights: &[f32], divisor: f32) -> Self {
        Self::build(width, height, key_x, 0, weights.iter().map(|w| w / divisor).collect())
    }

    /// Floyd-Steinberg, 3x2.
    pub fn floyd_steinberg() -> Self {
        Self::scaled(3, 2, 1, &[0.0, 0.0, 7.0, 3.0, 5.0, 1.0], 16.0)
    }

    /// Jarvis, Judice and Ninke, 5x3.
    pub fn jarvis_judice_ninke() -> Self {
        #[rustfmt::skip]
        let w = [
            0.0, 0.0, 0.0, 7.0, 5.0,
            3.0, 5.0, 7.0, 5.0, 3.0,
            1.0, 3.0, 5.0, 3.0, 1.0,
        ];
        Self::scaled(5, 3, 2, &w, 48.0)
    }

    /// Stucki, 5x3.
    pub fn stucki() -> Self {
        #[rustfmt::skip]
        let w = [
            0.0, 0.0, 0.0, 8.0, 4.0,
            2.0, 4.0, 8.0, 4.0, 2.0,
            1.0, 2.0, 4.0, 2.0, 1.0,
        ];
        Self::scaled(5, 3, 2, &w, 42.0)
    }

    /// Burkes, 5x2.
    pub fn burkes() -> Self {
        #[rustfmt::skip]
        let w = [
            0.0, 0.0, 0.0, 8.0, 4.0,
            2.0, 4.0, 8.0, 4.0, 2.0,
        ];
        Self::scaled(5, 2, 2, &w, 32.0)
    }

    /// Three-row Sierra, 5x3.
    pub fn sierra() -> Self {
        #[rustfmt::skip]
        let w = [
            0.0, 0.0, 0.0, 5.0, 3.0,
            2.0, 4.0, 5.0, 4.0, 2.0,
            0.0, 2.0, 3.0, 2.0, 0.0,
        ];
        Self::scaled(5, 3, 2, &w, 32.0)
    }

    /// Grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Key cell `(x, y)`.
    pub fn key(&self) -> (usize, usize) {
        (self.key_x, self.key_y)
    }

    /// Row-major weights.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Rows of pending error a pass has to keep, the current one included.
    pub fn buffer_rows(&self) -> usize {
        self.height - self.key_y
    }

    /// Non-zero cells as `(dx, dy, weight)` relative to the key.
    pub fn taps(&self) -> &[(i32, i32, f32)] {
        &self.taps
    }

    /// Splits `error` over the taps.
    pub fn spread(&self, error: f32) -> impl Iterator<Item = (i32, i32, f32)> + '_ {
        self.taps.iter().map(move |&(dx, dy, w)| (dx, dy, error * w))
    }

    /// Whether this is exactly the Floyd-Steinberg layout.
    pub fn is_floyd_steinberg(&self) -> bool {
        *self == Self::floyd_steinberg()
    }
}

impl Default for ErrorKernel {
    fn default() -> Self {
        Self::floyd_steinberg()
    }
}
