//! Interpolation and differentiation of periodic density fields.

pub mod basis;
pub mod bspline;
pub mod nearest;
pub mod poly_fit;
pub mod trilinear;

use crate::{
    geometry::{Dim3, Point3, Vec3},
    grid::{standardized_values, PeriodicGrid3, StandardizationMode},
    num::{fco, fip, MFloat},
};
use bspline::BSplineInterpolator3;
use ndarray::prelude::*;
use ndarray::Zip;
use nearest::NearestInterpolator3;
use poly_fit::PolyFitInterpolator3;
use rayon::prelude::*;
use std::{io, str::FromStr};
use trilinear::TrilinearInterpolator3;

/// Whether or not to print non-critical status messages.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Verbosity {
    #[default]
    Quiet,
    Messages,
}

impl Verbosity {
    /// Whether status messages should be printed.
    pub fn print_messages(&self) -> bool {
        *self == Self::Messages
    }
}

/// Configuration parameters for interpolators.
#[derive(Clone, Debug)]
pub struct InterpolatorConfig {
    /// Step length used for numerical differentiation.
    pub step: fco,
    /// Gradient magnitudes at or above this value disqualify a point from
    /// being classified as a critical point.
    pub critical_point_tolerance: fco,
}

impl InterpolatorConfig {
    /// The default step length and tolerance are empirical constants kept
    /// for compatibility with existing density-map analyses; override them
    /// through the fields if a different regime is required.
    pub const DEFAULT_STEP: fco = 1e-4;
    pub const DEFAULT_CRITICAL_POINT_TOLERANCE: fco = 1.5;
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        Self {
            step: Self::DEFAULT_STEP,
            critical_point_tolerance: Self::DEFAULT_CRITICAL_POINT_TOLERANCE,
        }
    }
}

/// A quantity derived from the reconstructed field that can be evaluated
/// over a lattice of query points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Quantity {
    Value,
    GradientMagnitude,
    Laplacian,
    CriticalPoint,
}

/// Combines a gradient magnitude and the three second partial derivatives
/// into an integer critical point classification in `[-3, 3]`.
///
/// A point with gradient magnitude at or above the tolerance is not a
/// critical point and classifies as 0. Otherwise each dimension
/// contributes -1 if its second partial derivative is negative and +1 if
/// it is non-negative, making -3 a local maximum pattern, +3 a local
/// minimum pattern and intermediate values saddle-like mixed curvature.
pub fn classify_critical_point(
    gradient_magnitude: fip,
    second_partials: &Vec3<fip>,
    tolerance: fco,
) -> i32 {
    if gradient_magnitude.abs() >= tolerance {
        return 0;
    }
    Dim3::slice()
        .iter()
        .map(|&dim| if second_partials[dim] < 0.0 { -1 } else { 1 })
        .sum()
}

/// Defines the properties of an interpolator reconstructing a continuous
/// field from a periodic 3D sample grid.
///
/// Every implementation provides point-wise field values; gradients,
/// Laplacians and critical point classifications default to centered
/// numerical differentiation of the value but may be overridden with
/// analytic derivatives or documented zero sentinels. Evaluation reads
/// only immutable state, so the batch operations evaluate query points in
/// parallel.
pub trait Interpolator3<F: MFloat>: Sync + Send {
    /// Returns a reference to the unpadded sample grid.
    fn grid(&self) -> &PeriodicGrid3<F>;

    /// Returns the configuration parameters of the interpolator.
    fn config(&self) -> &InterpolatorConfig;

    /// Computes the reconstructed field value at the given point,
    /// wrapping periodically.
    fn value(&self, point: &Point3<fco>) -> fip;

    /// Computes the gradient of the reconstructed field at the given point.
    fn gradient(&self, point: &Point3<fco>) -> Vec3<fip> {
        self.gradient_numerical(point)
    }

    /// Computes the gradient magnitude, defined as the sum of the absolute
    /// partial derivatives (not the Euclidean norm).
    fn gradient_magnitude(&self, point: &Point3<fco>) -> fip {
        self.gradient(point).abs_sum()
    }

    /// Computes the Laplacian (sum of second partial derivatives) of the
    /// reconstructed field at the given point.
    fn laplacian(&self, point: &Point3<fco>) -> fip {
        self.laplacian_numerical(point)
    }

    /// Classifies the given point as a critical point.
    fn critical_point(&self, point: &Point3<fco>) -> i32 {
        self.critical_point_numerical(point)
    }

    /// Computes the gradient with centered finite differences of the value.
    fn gradient_numerical(&self, point: &Point3<fco>) -> Vec3<fip> {
        let step = self.config().step;
        Vec3::with_each_component(|dim| {
            (self.value(&point.shifted(dim, step)) - self.value(&point.shifted(dim, -step)))
                / (2.0 * step)
        })
    }

    /// Computes a second partial derivative with centered finite
    /// differences, given the already computed value at the point itself.
    fn second_partial_numerical(&self, point: &Point3<fco>, dim: Dim3, center_value: fip) -> fip {
        let step = self.config().step;
        (self.value(&point.shifted(dim, -step)) + self.value(&point.shifted(dim, step))
            - 2.0 * center_value)
            / (step * step)
    }

    /// Computes the Laplacian with centered finite differences of the value.
    fn laplacian_numerical(&self, point: &Point3<fco>) -> fip {
        let center_value = self.value(point);
        Dim3::slice()
            .iter()
            .map(|&dim| self.second_partial_numerical(point, dim, center_value))
            .sum()
    }

    /// Classifies the given point using numerically differentiated second
    /// partials together with the strategy's own gradient magnitude.
    fn critical_point_numerical(&self, point: &Point3<fco>) -> i32 {
        let center_value = self.value(point);
        let gradient_magnitude = self.gradient_magnitude(point);
        let second_partials = Vec3::with_each_component(|dim| {
            self.second_partial_numerical(point, dim, center_value)
        });
        classify_critical_point(
            gradient_magnitude,
            &second_partials,
            self.config().critical_point_tolerance,
        )
    }

    /// Computes field values for all the given points.
    fn values(&self, points: &[Point3<fco>]) -> Vec<fip> {
        points.par_iter().map(|point| self.value(point)).collect()
    }

    /// Computes gradients for all the given points.
    fn gradients(&self, points: &[Point3<fco>]) -> Vec<Vec3<fip>> {
        points
            .par_iter()
            .map(|point| self.gradient(point))
            .collect()
    }

    /// Computes gradient magnitudes for all the given points.
    fn gradient_magnitudes(&self, points: &[Point3<fco>]) -> Vec<fip> {
        points
            .par_iter()
            .map(|point| self.gradient_magnitude(point))
            .collect()
    }

    /// Computes Laplacians for all the given points.
    fn laplacians(&self, points: &[Point3<fco>]) -> Vec<fip> {
        points
            .par_iter()
            .map(|point| self.laplacian(point))
            .collect()
    }

    /// Classifies all the given points.
    fn critical_points(&self, points: &[Point3<fco>]) -> Vec<i32> {
        points
            .par_iter()
            .map(|point| self.critical_point(point))
            .collect()
    }

    /// Evaluates the given derived quantity at a single point.
    fn evaluate(&self, point: &Point3<fco>, quantity: Quantity) -> fip {
        match quantity {
            Quantity::Value => self.value(point),
            Quantity::GradientMagnitude => self.gradient_magnitude(point),
            Quantity::Laplacian => self.laplacian(point),
            Quantity::CriticalPoint => self.critical_point(point) as fip,
        }
    }

    /// Evaluates the given derived quantity over a 2D lattice of query
    /// points, producing a same-shaped array directly usable as a slice or
    /// rendering source.
    fn evaluate_slice(&self, points: &Array2<Point3<fco>>, quantity: Quantity) -> Array2<fip> {
        let mut result = Array2::zeros(points.raw_dim());
        Zip::from(&mut result)
            .and(points)
            .par_for_each(|out, point| *out = self.evaluate(point, quantity));
        result
    }

    /// Evaluates the given derived quantity over a 3D lattice of query
    /// points, producing a same-shaped array.
    fn evaluate_volume(&self, points: &Array3<Point3<fco>>, quantity: Quantity) -> Array3<fip> {
        let mut result = Array3::zeros(points.raw_dim());
        Zip::from(&mut result)
            .and(points)
            .par_for_each(|out, point| *out = self.evaluate(point, quantity));
        result
    }
}

/// Degree of the local fitting polynomial, determining a neighborhood
/// cube of `(degree + 1)³` samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolynomialDegree {
    One = 1,
    Three = 3,
    Five = 5,
}

impl PolynomialDegree {
    /// Returns the polynomial degree as a number.
    pub fn value(self) -> usize {
        self as usize
    }

    /// Returns the number of interpolation points along each dimension.
    pub fn points(self) -> usize {
        self.value() + 1
    }
}

/// Degree of the B-spline basis functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplineDegree {
    Three = 3,
    Five = 5,
    Seven = 7,
    Nine = 9,
}

impl SplineDegree {
    /// Returns the spline degree as a number.
    pub fn value(self) -> usize {
        self as usize
    }

    /// Returns the width of the basis function support, which is the
    /// number of interpolation points along each dimension.
    pub fn points(self) -> usize {
        self.value() + 1
    }
}

/// Identifies one of the available interpolation strategies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InterpolationMethod {
    Nearest,
    Trilinear,
    Polynomial(PolynomialDegree),
    BSpline(SplineDegree),
}

impl FromStr for InterpolationMethod {
    type Err = io::Error;

    fn from_str(name: &str) -> io::Result<Self> {
        Ok(match name {
            "nearest" | "mv0" => Self::Nearest,
            "linear" => Self::Trilinear,
            "mv1" => Self::Polynomial(PolynomialDegree::One),
            "mv3" | "cubic" => Self::Polynomial(PolynomialDegree::Three),
            "mv5" | "quintic" => Self::Polynomial(PolynomialDegree::Five),
            "bspline" | "bspline3" => Self::BSpline(SplineDegree::Three),
            "bspline5" => Self::BSpline(SplineDegree::Five),
            "bspline7" => Self::BSpline(SplineDegree::Seven),
            "bspline9" => Self::BSpline(SplineDegree::Nine),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid interpolation method name {}", name),
                ))
            }
        })
    }
}

/// Creates the interpolator for the given method over the given sample
/// values, applying the given standardization first.
///
/// All precomputation (periodic padding, fitting matrix selection, spline
/// coefficient filtering) happens here; the returned interpolator is
/// immutable and may afterwards be queried from multiple threads.
pub fn create_interpolator<F: MFloat + 'static>(
    method: InterpolationMethod,
    values: Array3<F>,
    mode: StandardizationMode,
    verbosity: Verbosity,
) -> Box<dyn Interpolator3<F>> {
    let values = standardized_values(values, mode);
    let grid = PeriodicGrid3::from_values(values);
    if verbosity.print_messages() {
        let min_value: fco = grid.min_value().into();
        let max_value: fco = grid.max_value().into();
        println!("Interpolator: {:?} over grid {}", method, grid.shape());
        println!("Mean = {}", grid.mean());
        println!("Std = {}", grid.std_deviation());
        println!("Min = {}", min_value);
        println!("Max = {}", max_value);
    }
    let config = InterpolatorConfig::default();
    match method {
        InterpolationMethod::Nearest => Box::new(NearestInterpolator3::new(grid, config)),
        InterpolationMethod::Trilinear => Box::new(TrilinearInterpolator3::new(grid, config)),
        InterpolationMethod::Polynomial(degree) => {
            Box::new(PolyFitInterpolator3::new(grid, degree, config))
        }
        InterpolationMethod::BSpline(degree) => {
            Box::new(BSplineInterpolator3::new(grid, degree, config))
        }
    }
}

/// Creates the interpolator identified by the given method name.
///
/// An unrecognized name is a configuration error reported at construction
/// time; there is no fallback method.
pub fn create_interpolator_from_name<F: MFloat + 'static>(
    name: &str,
    values: Array3<F>,
    mode: StandardizationMode,
    verbosity: Verbosity,
) -> io::Result<Box<dyn Interpolator3<F>>> {
    Ok(create_interpolator(name.parse()?, values, mode, verbosity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn factory_boxes_interpolators_for_any_storage_type() {
        let values = Array3::from_shape_fn((3, 3, 3), |(i, j, k)| (i + j + k) as f32);
        let interpolator = create_interpolator(
            InterpolationMethod::Trilinear,
            values,
            StandardizationMode::Off,
            Verbosity::Quiet,
        );
        assert_abs_diff_eq!(
            interpolator.value(&Point3::new(1.0, 1.0, 1.0)),
            3.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn method_names_resolve_to_strategies() {
        assert_eq!(
            "nearest".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Nearest
        );
        assert_eq!(
            "mv0".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Nearest
        );
        assert_eq!(
            "linear".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Trilinear
        );
        assert_eq!(
            "cubic".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Polynomial(PolynomialDegree::Three)
        );
        assert_eq!(
            "quintic".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Polynomial(PolynomialDegree::Five)
        );
        assert_eq!(
            "bspline".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::BSpline(SplineDegree::Three)
        );
    }

    #[test]
    fn unknown_method_name_is_a_construction_error() {
        let error = "spliny".parse::<InterpolationMethod>().unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn classification_requires_small_gradient_magnitude() {
        let negative_curvature = Vec3::new(-1.0, -2.0, -0.5);
        assert_eq!(classify_critical_point(2.0, &negative_curvature, 1.5), 0);
        assert_eq!(classify_critical_point(0.1, &negative_curvature, 1.5), -3);
    }

    #[test]
    fn classification_counts_second_partial_signs() {
        assert_eq!(
            classify_critical_point(0.0, &Vec3::new(1.0, 1.0, 1.0), 1.5),
            3
        );
        assert_eq!(
            classify_critical_point(0.0, &Vec3::new(-1.0, 1.0, -1.0), 1.5),
            -1
        );
        assert_eq!(
            classify_critical_point(0.0, &Vec3::new(0.0, -1.0, 1.0), 1.5),
            1
        );
    }
}
