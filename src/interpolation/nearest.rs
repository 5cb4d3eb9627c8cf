//! Nearest-neighbor interpolation.

use super::{Interpolator3, InterpolatorConfig};
use crate::{
    geometry::{
        Dim3::{X, Y, Z},
        Point3, Vec3,
    },
    grid::PeriodicGrid3,
    num::{fco, fip, MFloat},
};

/// A 3D interpolator that reconstructs the field as piecewise-constant
/// around the nearest sample.
///
/// The reconstructed field is not differentiable, so gradients, Laplacians
/// and critical point classifications are defined as zero. This is a
/// documented approximation of the strategy, not a failure mode.
#[derive(Clone, Debug)]
pub struct NearestInterpolator3<F> {
    grid: PeriodicGrid3<F>,
    config: InterpolatorConfig,
}

impl<F: MFloat> NearestInterpolator3<F> {
    /// Creates a new nearest-neighbor interpolator over the given grid.
    pub fn new(grid: PeriodicGrid3<F>, config: InterpolatorConfig) -> Self {
        Self { grid, config }
    }
}

impl<F: MFloat> Interpolator3<F> for NearestInterpolator3<F> {
    fn grid(&self) -> &PeriodicGrid3<F> {
        &self.grid
    }

    fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    fn value(&self, point: &Point3<fco>) -> fip {
        let closest = self.grid.closest_point(point);
        self.grid
            .sample(
                closest[X] as isize,
                closest[Y] as isize,
                closest[Z] as isize,
            )
            .into()
    }

    fn gradient(&self, _point: &Point3<fco>) -> Vec3<fip> {
        Vec3::zero()
    }

    fn laplacian(&self, _point: &Point3<fco>) -> fip {
        0.0
    }

    fn critical_point(&self, _point: &Point3<fco>) -> i32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::prelude::*;

    fn interpolator() -> NearestInterpolator3<f64> {
        let values =
            Array3::from_shape_fn((3, 3, 3), |(i, j, k)| (9 * i + 3 * j + k) as f64);
        NearestInterpolator3::new(
            PeriodicGrid3::from_values(values),
            InterpolatorConfig::default(),
        )
    }

    #[test]
    fn value_is_sample_at_closest_grid_point() {
        let interpolator = interpolator();
        assert_eq!(interpolator.value(&Point3::new(0.4, 1.6, 2.2)), 0.0 + 6.0 + 2.0);
        assert_eq!(interpolator.value(&Point3::new(1.9, 0.1, 0.9)), 18.0 + 0.0 + 1.0);
    }

    #[test]
    fn value_wraps_periodically() {
        let interpolator = interpolator();
        let inside = interpolator.value(&Point3::new(1.2, 2.7, 0.4));
        let shifted = interpolator.value(&Point3::new(1.2 + 3.0, 2.7 - 6.0, 0.4 + 9.0));
        assert_eq!(inside, shifted);
    }

    #[test]
    fn derivatives_are_zero_sentinels() {
        let interpolator = interpolator();
        let point = Point3::new(0.7, 1.3, 2.5);
        assert_eq!(interpolator.gradient(&point), Vec3::zero());
        assert_eq!(interpolator.laplacian(&point), 0.0);
        assert_eq!(interpolator.critical_point(&point), 0);
    }
}
