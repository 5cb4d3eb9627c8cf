//! Periodic grids of density samples.

use crate::{
    geometry::{
        Dim3::{self, X, Y, Z},
        In3D, Point3,
    },
    num::{fco, from_fco, round_coord, MFloat},
};
use ndarray::prelude::*;

/// How sample values should be rescaled before a grid is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StandardizationMode {
    /// Keep the raw sample values.
    Off,
    /// Subtract the grid mean and divide by the grid standard deviation.
    ZScore,
    /// Z-score, then shift so that the raw zero value still maps to zero.
    ZScoreZeroPreserving,
}

/// A 3D array of samples whose index arithmetic wraps periodically
/// at the grid extents.
///
/// The grid may carry a buffer of padding cells on every face, in which
/// case wrapped indices map into the padded index space
/// `[buffer, extent + buffer)` instead of `[0, extent)`. The logical
/// extents always refer to the unpadded sample region.
#[derive(Clone, Debug)]
pub struct PeriodicGrid3<F> {
    values: Array3<F>,
    shape: In3D<usize>,
    buffer: usize,
}

impl<F: MFloat> PeriodicGrid3<F> {
    /// Creates a new unpadded grid from the given sample values.
    pub fn from_values(values: Array3<F>) -> Self {
        Self::from_padded_values(values, 0)
    }

    /// Creates a new grid from a value array already padded with the
    /// given number of buffer cells on every face.
    pub fn from_padded_values(values: Array3<F>, buffer: usize) -> Self {
        let (size_x, size_y, size_z) = values.dim();
        for (dim, size) in [(X, size_x), (Y, size_y), (Z, size_z)] {
            assert!(
                size > 2 * buffer,
                "Grid must have at least one sample cell in the {}-dimension",
                dim
            );
        }
        let shape = In3D::new(
            size_x - 2 * buffer,
            size_y - 2 * buffer,
            size_z - 2 * buffer,
        );
        Self {
            values,
            shape,
            buffer,
        }
    }

    /// Returns the logical (unpadded) shape of the grid.
    pub fn shape(&self) -> &In3D<usize> {
        &self.shape
    }

    /// Returns the number of padding cells on each face.
    pub fn buffer(&self) -> usize {
        self.buffer
    }

    /// Returns a reference to the stored (possibly padded) value array.
    pub fn values(&self) -> &Array3<F> {
        &self.values
    }

    /// Returns a view of the logical sample region, excluding any padding.
    pub fn logical_values(&self) -> ArrayView3<'_, F> {
        let buffer = self.buffer;
        self.values.slice(s![
            buffer..buffer + self.shape[X],
            buffer..buffer + self.shape[Y],
            buffer..buffer + self.shape[Z]
        ])
    }

    /// Wraps a continuous coordinate into the canonical range for the given
    /// dimension by repeated addition or subtraction of the extent, then
    /// rounds away floating point noise.
    ///
    /// For an unpadded grid the canonical range is `[0, extent)`; for a
    /// padded grid it is `[buffer, extent + buffer)`, indexing directly
    /// into the padded value array.
    pub fn wrap_coord(&self, dim: Dim3, coord: fco) -> fco {
        let extent = self.shape[dim] as fco;
        let lower = self.buffer as fco;
        let upper = lower + extent;
        let mut wrapped = coord + lower;
        while wrapped < lower {
            wrapped += extent;
        }
        while wrapped >= upper {
            wrapped -= extent;
        }
        // Rounding can land exactly on the upper bound, so re-normalize.
        wrapped = round_coord(wrapped);
        while wrapped >= upper {
            wrapped -= extent;
        }
        while wrapped < lower {
            wrapped += extent;
        }
        wrapped
    }

    /// Wraps all components of a point into their canonical ranges.
    pub fn wrap_point(&self, point: &Point3<fco>) -> Point3<fco> {
        Point3::with_each_component(|dim| self.wrap_coord(dim, point[dim]))
    }

    /// Wraps an integer index into the storage index range for the given
    /// dimension.
    pub fn wrap_idx(&self, dim: Dim3, idx: isize) -> usize {
        let extent = self.shape[dim] as isize;
        let lower = self.buffer as isize;
        let upper = lower + extent;
        let mut wrapped = idx + lower;
        while wrapped < lower {
            wrapped += extent;
        }
        while wrapped >= upper {
            wrapped -= extent;
        }
        wrapped as usize
    }

    /// Returns the sample at the given integer coordinates, wrapping
    /// periodically. This never fails, however far outside the grid the
    /// coordinates lie.
    pub fn sample(&self, f: isize, m: isize, s: isize) -> F {
        let i = self.wrap_idx(X, f);
        let j = self.wrap_idx(Y, m);
        let k = self.wrap_idx(Z, s);
        self.values[[i, j, k]]
    }

    /// Finds the grid point closest to the given point by rounding each
    /// component to the nearer of its floor and ceiling.
    pub fn closest_point(&self, point: &Point3<fco>) -> Point3<fco> {
        Point3::with_each_component(|dim| {
            let coord = round_coord(point[dim]);
            let floor = coord.floor();
            let ceil = coord.ceil();
            if coord - floor <= ceil - coord {
                floor
            } else {
                ceil
            }
        })
    }

    /// Extracts the flattened cube of `width³` samples surrounding the
    /// given point, with the x-offset varying slowest and the z-offset
    /// fastest.
    ///
    /// Offsets run from `-width/2 + 1` to `width/2` around the
    /// rounded-and-floored center coordinate, and every lookup wraps
    /// periodically.
    pub fn neighborhood_cube(&self, center: &Point3<fco>, width: usize) -> Vec<F> {
        let half = (width / 2) as isize;
        let offsets = (1 - half)..=half;
        let mut cube = Vec::with_capacity(width * width * width);
        for i in offsets.clone() {
            let f = (round_coord(center[X]) + i as fco).floor() as isize;
            for j in offsets.clone() {
                let m = (round_coord(center[Y]) + j as fco).floor() as isize;
                for k in offsets.clone() {
                    let s = (round_coord(center[Z]) + k as fco).floor() as isize;
                    cube.push(self.sample(f, m, s));
                }
            }
        }
        cube
    }

    /// Creates a copy of the grid extended by the given number of cells on
    /// every face, with each padding cell filled by periodic wrap-lookup
    /// into the original samples (not mirrored).
    pub fn periodic_pad(&self, buffer: usize) -> Self {
        assert_eq!(
            self.buffer, 0,
            "Can only pad a grid that is not already padded"
        );
        let offset = buffer as isize;
        let padded = Array3::from_shape_fn(
            (
                self.shape[X] + 2 * buffer,
                self.shape[Y] + 2 * buffer,
                self.shape[Z] + 2 * buffer,
            ),
            |(i, j, k)| {
                self.sample(
                    i as isize - offset,
                    j as isize - offset,
                    k as isize - offset,
                )
            },
        );
        Self::from_padded_values(padded, buffer)
    }

    /// Computes the maximum-intensity projection of the samples along the
    /// given axis (a maximum, not a sum).
    pub fn max_projection(&self, axis: Dim3) -> Array2<F> {
        self.logical_values()
            .fold_axis(Axis(axis.num()), F::neg_infinity(), |&acc, &value| {
                acc.max(value)
            })
    }

    /// Computes a rectangular window of the maximum-intensity projection
    /// along the given axis, wrapping window indices periodically.
    ///
    /// The ranges are half-open and may extend outside the projection.
    pub fn max_projection_window(
        &self,
        axis: Dim3,
        row_range: (isize, isize),
        col_range: (isize, isize),
    ) -> Array2<F> {
        let projection = self.max_projection(axis);
        let (n_rows, n_cols) = projection.dim();
        let shape = (
            (row_range.1 - row_range.0) as usize,
            (col_range.1 - col_range.0) as usize,
        );
        Array2::from_shape_fn(shape, |(a, b)| {
            let mut row = row_range.0 + a as isize;
            let mut col = col_range.0 + b as isize;
            while row < 0 {
                row += n_rows as isize;
            }
            while col < 0 {
                col += n_cols as isize;
            }
            projection[[row as usize % n_rows, col as usize % n_cols]]
        })
    }

    /// Extracts the single-layer slice of samples with the given index
    /// along the given axis.
    pub fn cross_section(&self, axis: Dim3, layer: usize) -> Array2<F> {
        self.logical_values()
            .index_axis(Axis(axis.num()), layer)
            .to_owned()
    }

    /// Computes the mean of the logical sample values.
    pub fn mean(&self) -> fco {
        value_moments(&self.logical_values()).0
    }

    /// Computes the (population) standard deviation of the logical sample
    /// values.
    pub fn std_deviation(&self) -> fco {
        value_moments(&self.logical_values()).1
    }

    /// Returns the smallest logical sample value.
    pub fn min_value(&self) -> F {
        self.logical_values()
            .fold(F::infinity(), |acc, &value| acc.min(value))
    }

    /// Returns the largest logical sample value.
    pub fn max_value(&self) -> F {
        self.logical_values()
            .fold(F::neg_infinity(), |acc, &value| acc.max(value))
    }
}

/// Computes the mean and population standard deviation of the given values.
fn value_moments<F: MFloat>(values: &ArrayView3<'_, F>) -> (fco, fco) {
    let count = values.len() as fco;
    let mean = values.iter().map(|&value| value.into()).sum::<fco>() / count;
    let variance = values
        .iter()
        .map(|&value| {
            let deviation = value.into() - mean;
            deviation * deviation
        })
        .sum::<fco>()
        / count;
    (mean, variance.sqrt())
}

/// Applies the given standardization mode to raw sample values.
///
/// `ZScore` converts the values to a z-score distribution over the whole
/// grid; `ZScoreZeroPreserving` additionally shifts the distribution so
/// that the pre-standardization zero value maps to zero.
pub fn standardized_values<F: MFloat>(
    values: Array3<F>,
    mode: StandardizationMode,
) -> Array3<F> {
    if mode == StandardizationMode::Off {
        return values;
    }
    let (mean, std_deviation) = value_moments(&values.view());
    let mean = from_fco::<F>(mean);
    let std_deviation = from_fco::<F>(std_deviation);
    let mut standardized = values.mapv(|value| (value - mean) / std_deviation);
    if mode == StandardizationMode::ZScoreZeroPreserving {
        let standardized_zero = (F::zero() - mean) / std_deviation;
        standardized.mapv_inplace(|value| value - standardized_zero);
    }
    standardized
}
