//! Color maps for quantization.
//!
//! A [`ColorMap`] is an ordered list of N-band entries. [`ColorMap::cube`]
//! builds the common uniform partition of every band into a fixed number of
//! levels; the map then remembers its [`CubeGeometry`], which lets lookups
//! search each band independently.

use crate::{OpsError, OpsResult};

/// Band layout of a uniform color cube.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeGeometry {
    levels: Vec<Vec<f32>>,
    multipliers: Vec<usize>,
}

impl CubeGeometry {
    /// Levels of `band`, in index order.
    pub fn levels(&self, band: usize) -> &[f32] {
        &self.levels[band]
    }

    /// Index stride of `band`; band 0 varies fastest.
    pub fn multiplier(&self, band: usize) -> usize {
        self.multipliers[band]
    }

    /// Number of levels per band.
    pub fn dims(&self) -> Vec<usize> {
        self.levels.iter().map(Vec::len).collect()
    }

    /// Index of the level closest to `v`; ties go to the lower index.
    pub fn nearest_level(&self, band: usize, v: f32) -> usize {
        let mut best = 0;
        let mut best_d = f32::INFINITY;
        for (i, &level) in self.levels[band].iter().enumerate() {
            let d = (v - level).abs();
            if d < best_d {
                best = i;
                best_d = d;
            }
        }
        best
    }
}

/// Ordered list of color entries with nearest-entry lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    bands: usize,
    entries: Vec<f32>,
    cube: Option<CubeGeometry>,
}

impl ColorMap {
    /// Lookup map from explicit entries.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for an empty map or ragged entries.
    pub fn from_entries(entries: Vec<Vec<f32>>) -> OpsResult<Self> {
        let Some(first) = entries.first() else {
            return Err(OpsError::InvalidParameter("color map has no entries".into()));
        };
        let bands = first.len();
        if bands == 0 {
            return Err(OpsError::InvalidParameter("color map entries have no bands".into()));
        }
        if let Some(i) = entries.iter().position(|e| e.len() != bands) {
            return Err(OpsError::InvalidParameter(format!(
                "color map entry {} has {} bands, expected {}",
                i,
                entries[i].len(),
                bands
            )));
        }
        Ok(Self {
            bands,
            entries: entries.into_iter().flatten().collect(),
            cube: None,
        })
    }

    /// Uniform color cube with `dims[b]` levels in band `b`.
    ///
    /// Level `k` of `n` is `round(min + k * (max - min) / (n - 1))`; a band
    /// with one level sits at `round(min)`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for no bands, a band without levels,
    /// non-finite bounds or a level product that overflows `usize`.
    pub fn cube(dims: &[usize], min: f64, max: f64) -> OpsResult<Self> {
        if dims.is_empty() || dims.contains(&0) {
            return Err(OpsError::InvalidParameter(format!(
                "color cube dims {dims:?} must be non-empty and positive"
            )));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(OpsError::InvalidParameter(format!(
                "color cube bounds [{min}, {max}] must be finite"
            )));
        }
        let bands = dims.len();
        let too_large = || {
            OpsError::InvalidParameter(format!("color cube dims {dims:?} overflow the entry count"))
        };
        let mut multipliers = Vec::with_capacity(bands);
        let mut stride = 1usize;
        for &n in dims {
            multipliers.push(stride);
            stride = stride.checked_mul(n).ok_or_else(too_large)?;
        }
        let capacity = stride.checked_mul(bands).ok_or_else(too_large)?;

        let levels: Vec<Vec<f32>> = dims
            .iter()
            .map(|&n| {
                (0..n)
                    .map(|k| {
                        let step = if n > 1 { (max - min) / (n - 1) as f64 } else { 0.0 };
                        (min + k as f64 * step).round() as f32
                    })
                    .collect()
            })
            .collect();
        let mut entries = Vec::with_capacity(capacity);
        for index in 0..stride {
            for b in 0..bands {
                let li = (index / multipliers[b]) % dims[b];
                entries.push(levels[b][li]);
            }
        }
        Ok(Self {
            bands,
            entries,
            cube: Some(CubeGeometry {
                levels,
                multipliers,
            }),
        })
    }

    /// Number of bands per entry.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len() / self.bands
    }

    /// Always `false`; construction rejects empty maps.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry `index`.
    pub fn entry(&self, index: usize) -> &[f32] {
        &self.entries[index * self.bands..(index + 1) * self.bands]
    }

    /// Cube geometry when built by [`cube`](Self::cube).
    pub fn cube_geometry(&self) -> Option<&CubeGeometry> {
        self.cube.as_ref()
    }

    /// Entry closest to `sample` by squared Euclidean distance.
    ///
    /// Ties go to the lowest index. `sample` must have [`bands`](Self::bands)
    /// values.
    pub fn nearest(&self, sample: &[f32]) -> usize {
        if let Some(cube) = &self.cube {
            return sample
                .iter()
                .enumerate()
                .map(|(b, &v)| cube.nearest_level(b, v) * cube.multiplier(b))
                .sum();
        }
        let mut best = 0;
        let mut best_d = f32::INFINITY;
        for (i, entry) in self.entries.chunks_exact(self.bands).enumerate() {
            let d: f32 = entry
                .iter()
                .zip(sample)
                .map(|(e, s)| (s - e) * (s - e))
                .sum();
            if d < best_d {
                best = i;
                best_d = d;
            }
        }
        best
    }
}
