//! Interpolation by local fitting of a multivariate polynomial.

use super::{basis, classify_critical_point, Interpolator3, InterpolatorConfig, PolynomialDegree};
use crate::{
    geometry::{
        Dim3::{self, X, Y, Z},
        Point3, Vec3,
    },
    grid::PeriodicGrid3,
    num::{fco, fip, round_coord, MFloat},
};
use ndarray::prelude::*;

/// An interpolator fitting a full tensor-product polynomial of the
/// configured degree to the neighborhood cube around each query point.
///
/// The fitted coefficient tensor is differentiated algebraically, so
/// gradients, Laplacians and critical point classifications are exact
/// derivatives of the local polynomial rather than finite differences.
#[derive(Clone, Debug)]
pub struct PolyFitInterpolator3<F> {
    grid: PeriodicGrid3<F>,
    degree: PolynomialDegree,
    fitting_matrix: &'static Array2<fco>,
    config: InterpolatorConfig,
}

impl<F: MFloat> PolyFitInterpolator3<F> {
    /// Creates a new polynomial fitting interpolator of the given degree
    /// over the given grid.
    pub fn new(grid: PeriodicGrid3<F>, degree: PolynomialDegree, config: InterpolatorConfig) -> Self {
        Self {
            grid,
            degree,
            fitting_matrix: basis::fitting_matrix(degree),
            config,
        }
    }

    /// Returns the polynomial degree of the interpolator.
    pub fn degree(&self) -> PolynomialDegree {
        self.degree
    }

    /// Fits the local polynomial around the given point, returning the
    /// monomial coefficient tensor (x-exponent on the first axis) together
    /// with the query point expressed in the local node frame.
    fn fitted_coefficients(&self, point: &Point3<fco>) -> (Array3<fco>, Point3<fco>) {
        let wrapped = self.grid.wrap_point(point);
        let points = self.degree.points();
        let samples = Array1::from_iter(
            self.grid
                .neighborhood_cube(&wrapped, points)
                .into_iter()
                .map(|sample| sample.into()),
        );
        let flat = self.fitting_matrix.dot(&samples);
        let coefficients = Array3::from_shape_fn((points, points, points), |(a, b, c)| {
            flat[(a * points + b) * points + c]
        });
        // The first node of the neighborhood cube sits `points/2 - 1`
        // cells below the floored query coordinate.
        let node_shift = (points / 2) as fco - 1.0;
        let local = Point3::with_each_component(|dim| {
            let coord = round_coord(wrapped[dim]);
            coord - coord.floor() + node_shift
        });
        (coefficients, local)
    }
}

/// Evaluates a monomial coefficient tensor at the given local point.
fn evaluate_polynomial(coefficients: &Array3<fco>, local: &Point3<fco>) -> fco {
    coefficients
        .indexed_iter()
        .map(|((a, b, c), &coefficient)| {
            coefficient
                * local[X].powi(a as i32)
                * local[Y].powi(b as i32)
                * local[Z].powi(c as i32)
        })
        .sum()
}

/// Differentiates a monomial coefficient tensor along the given dimension,
/// shrinking that axis by one.
fn differentiated(coefficients: &Array3<fco>, dim: Dim3) -> Array3<fco> {
    let mut shape = [
        coefficients.shape()[0],
        coefficients.shape()[1],
        coefficients.shape()[2],
    ];
    shape[dim.num()] -= 1;
    Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(a, b, c)| {
        let mut source = [a, b, c];
        source[dim.num()] += 1;
        coefficients[source] * source[dim.num()] as fco
    })
}

impl<F: MFloat> Interpolator3<F> for PolyFitInterpolator3<F> {
    fn grid(&self) -> &PeriodicGrid3<F> {
        &self.grid
    }

    fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    fn value(&self, point: &Point3<fco>) -> fip {
        let (coefficients, local) = self.fitted_coefficients(point);
        evaluate_polynomial(&coefficients, &local)
    }

    fn gradient(&self, point: &Point3<fco>) -> Vec3<fip> {
        let (coefficients, local) = self.fitted_coefficients(point);
        Vec3::with_each_component(|dim| {
            evaluate_polynomial(&differentiated(&coefficients, dim), &local)
        })
    }

    fn laplacian(&self, point: &Point3<fco>) -> fip {
        let (coefficients, local) = self.fitted_coefficients(point);
        Dim3::slice()
            .iter()
            .map(|&dim| {
                let second = differentiated(&differentiated(&coefficients, dim), dim);
                evaluate_polynomial(&second, &local)
            })
            .sum()
    }

    fn critical_point(&self, point: &Point3<fco>) -> i32 {
        let (coefficients, local) = self.fitted_coefficients(point);
        let gradient_magnitude = Dim3::slice()
            .iter()
            .map(|&dim| evaluate_polynomial(&differentiated(&coefficients, dim), &local).abs())
            .sum();
        let second_partials = Vec3::with_each_component(|dim| {
            let second = differentiated(&differentiated(&coefficients, dim), dim);
            evaluate_polynomial(&second, &local)
        });
        classify_critical_point(
            gradient_magnitude,
            &second_partials,
            self.config.critical_point_tolerance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::trilinear::TrilinearInterpolator3;
    use approx::assert_abs_diff_eq;

    fn example_values() -> Array3<f64> {
        Array3::from_shape_fn((7, 7, 7), |(i, j, k)| ((5 * i + 3 * j + 2 * k) % 11) as f64)
    }

    fn example_interpolator(degree: PolynomialDegree) -> PolyFitInterpolator3<f64> {
        PolyFitInterpolator3::new(
            PeriodicGrid3::from_values(example_values()),
            degree,
            InterpolatorConfig::default(),
        )
    }

    #[test]
    fn all_degrees_reproduce_values_at_grid_points() {
        for degree in [
            PolynomialDegree::One,
            PolynomialDegree::Three,
            PolynomialDegree::Five,
        ] {
            let interpolator = example_interpolator(degree);
            for i in 0..7 {
                for j in 0..7 {
                    for k in 0..7 {
                        let point = Point3::new(i as fco, j as fco, k as fco);
                        // The fitting matrices are exact, but evaluating
                        // the fitted tensor still cancels terms much
                        // larger than the samples.
                        assert_abs_diff_eq!(
                            interpolator.value(&point),
                            example_values()[[i, j, k]],
                            epsilon = 1e-8
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn degree_one_fit_agrees_with_trilinear_interpolation() {
        let fitted = example_interpolator(PolynomialDegree::One);
        let trilinear = TrilinearInterpolator3::new(
            PeriodicGrid3::from_values(example_values()),
            InterpolatorConfig::default(),
        );
        for point in [
            Point3::new(1.3, 4.8, 2.1),
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(6.75, 6.25, 6.9),
        ] {
            assert_abs_diff_eq!(
                fitted.value(&point),
                trilinear.value(&point),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn values_are_periodic_in_all_dimensions() {
        let interpolator = example_interpolator(PolynomialDegree::Three);
        let point = Point3::new(2.4, 5.1, 0.6);
        let translated = Point3::new(2.4 + 7.0, 5.1 - 14.0, 0.6 + 7.0);
        assert_abs_diff_eq!(
            interpolator.value(&point),
            interpolator.value(&translated),
            epsilon = 1e-9
        );
    }

    #[test]
    fn analytic_gradient_matches_numerical_differentiation() {
        let interpolator = example_interpolator(PolynomialDegree::Three);
        let point = Point3::new(3.3, 2.6, 4.2);
        let analytic = interpolator.gradient(&point);
        let numerical = interpolator.gradient_numerical(&point);
        for dim in Dim3::slice() {
            assert_abs_diff_eq!(analytic[dim], numerical[dim], epsilon = 1e-5);
        }
    }

    #[test]
    fn analytic_laplacian_matches_numerical_differentiation() {
        // The second difference divides the fitted-value noise by step²,
        // so the default step would drown the comparison; probe with a
        // coarser one.
        let config = InterpolatorConfig {
            step: 1e-2,
            ..Default::default()
        };
        let interpolator = PolyFitInterpolator3::new(
            PeriodicGrid3::from_values(example_values()),
            PolynomialDegree::Five,
            config,
        );
        let point = Point3::new(1.7, 3.4, 5.8);
        assert_abs_diff_eq!(
            interpolator.laplacian(&point),
            interpolator.laplacian_numerical(&point),
            epsilon = 1e-3
        );
    }

    #[test]
    fn degree_one_laplacian_is_zero_inside_a_cell() {
        let interpolator = example_interpolator(PolynomialDegree::One);
        // The derivative tensor loses its quadratic terms entirely, so the
        // algebraic Laplacian vanishes everywhere.
        assert_abs_diff_eq!(
            interpolator.laplacian(&Point3::new(2.2, 3.7, 1.1)),
            0.0,
            epsilon = 1e-12
        );
    }
}
