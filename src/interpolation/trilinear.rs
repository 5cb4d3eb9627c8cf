//! Trilinear interpolation.

use super::{Interpolator3, InterpolatorConfig};
use crate::{
    geometry::{
        Dim3::{X, Y, Z},
        Point3,
    },
    grid::PeriodicGrid3,
    num::{fco, fip, MFloat},
};

/// Number of padding cells added around the sample grid, enough for the
/// eight-sample interpolation cell of any wrapped coordinate.
const PAD_BUFFER: usize = 1;

/// A 3D interpolator using trilinear interpolation within each grid cell.
///
/// Construction pads the grid by one cell periodically so that evaluation
/// can blend the eight surrounding samples with plain index arithmetic.
/// Gradients use centered numerical differentiation; the reconstruction is
/// not twice differentiable across cell boundaries, so Laplacians and
/// critical point classifications are defined as zero.
#[derive(Clone, Debug)]
pub struct TrilinearInterpolator3<F> {
    grid: PeriodicGrid3<F>,
    padded: PeriodicGrid3<F>,
    config: InterpolatorConfig,
}

impl<F: MFloat> TrilinearInterpolator3<F> {
    /// Creates a new trilinear interpolator over the given grid.
    pub fn new(grid: PeriodicGrid3<F>, config: InterpolatorConfig) -> Self {
        let padded = grid.periodic_pad(PAD_BUFFER);
        Self {
            grid,
            padded,
            config,
        }
    }
}

impl<F: MFloat> Interpolator3<F> for TrilinearInterpolator3<F> {
    fn grid(&self) -> &PeriodicGrid3<F> {
        &self.grid
    }

    fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    fn value(&self, point: &Point3<fco>) -> fip {
        let wrapped = self.grid.wrap_point(point);

        let lower_x = wrapped[X].floor();
        let lower_y = wrapped[Y].floor();
        let lower_z = wrapped[Z].floor();

        let frac_x = wrapped[X] - lower_x;
        let frac_y = wrapped[Y] - lower_y;
        let frac_z = wrapped[Z] - lower_z;

        // Wrapped coordinates lie in [0, extent), so all eight cell
        // corners index directly into the padded volume.
        let base_x = lower_x as usize + PAD_BUFFER;
        let base_y = lower_y as usize + PAD_BUFFER;
        let base_z = lower_z as usize + PAD_BUFFER;

        let values = self.padded.values();
        let mut interpolated = 0.0;
        for di in 0..2 {
            let weight_x = if di == 0 { 1.0 - frac_x } else { frac_x };
            for dj in 0..2 {
                let weight_y = if dj == 0 { 1.0 - frac_y } else { frac_y };
                for dk in 0..2 {
                    let weight_z = if dk == 0 { 1.0 - frac_z } else { frac_z };
                    let sample: fco = values[[base_x + di, base_y + dj, base_z + dk]].into();
                    interpolated += weight_x * weight_y * weight_z * sample;
                }
            }
        }
        interpolated
    }

    fn laplacian(&self, _point: &Point3<fco>) -> fip {
        0.0
    }

    fn critical_point(&self, _point: &Point3<fco>) -> i32 {
        0
    }
}
