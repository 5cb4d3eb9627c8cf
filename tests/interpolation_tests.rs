//! Integration tests for the interpolation strategies.

use approx::assert_abs_diff_eq;
use mapfield::{
    geometry::Point3,
    grid::StandardizationMode,
    interpolation::{
        self, create_interpolator_from_name, InterpolationMethod, Interpolator3, Quantity,
        Verbosity,
    },
    num::fco,
};
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io;

const ALL_METHOD_NAMES: [&str; 10] = [
    "nearest", "mv0", "linear", "mv1", "mv3", "mv5", "bspline3", "bspline5", "bspline7",
    "bspline9",
];

fn example_values() -> Array3<f64> {
    let mut rng = StdRng::seed_from_u64(31);
    Array3::from_shape_fn((6, 5, 7), |_| rng.gen_range(-1.0..1.0))
}

fn example_interpolator(method_name: &str) -> Box<dyn Interpolator3<f64>> {
    create_interpolator_from_name(
        method_name,
        example_values(),
        StandardizationMode::Off,
        Verbosity::Quiet,
    )
    .unwrap()
}

fn example_query_points() -> Vec<Point3<fco>> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.3, 4.8, 2.1),
        Point3::new(5.5, 0.5, 6.5),
        Point3::new(-2.4, 17.9, 0.1),
    ]
}

#[test]
fn every_method_name_constructs_an_interpolator() {
    for name in ALL_METHOD_NAMES {
        let interpolator = example_interpolator(name);
        assert_eq!(interpolator.grid().shape().to_tuple(), (6, 5, 7));
    }
}

#[test]
fn unknown_method_name_is_rejected() {
    let error = create_interpolator_from_name(
        "biquadratic",
        example_values(),
        StandardizationMode::Off,
        Verbosity::Quiet,
    )
    .err()
    .unwrap();
    assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn exactly_reconstructing_methods_reproduce_values_at_grid_points() {
    let values = example_values();
    for name in ["nearest", "linear", "mv1", "mv3", "mv5"] {
        let interpolator = example_interpolator(name);
        for i in 0..6 {
            for j in 0..5 {
                for k in 0..7 {
                    let point = Point3::new(i as fco, j as fco, k as fco);
                    assert_abs_diff_eq!(
                        interpolator.value(&point),
                        values[[i, j, k]],
                        epsilon = 1e-9
                    );
                }
            }
        }
    }
}

#[test]
fn all_methods_are_periodic() {
    let extents = (6.0, 5.0, 7.0);
    for name in ALL_METHOD_NAMES {
        let interpolator = example_interpolator(name);
        let point = Point3::new(2.3, 1.8, 5.6);
        let translated = Point3::new(
            2.3 + 2.0 * extents.0,
            1.8 - extents.1,
            5.6 + extents.2,
        );
        assert_abs_diff_eq!(
            interpolator.value(&point),
            interpolator.value(&translated),
            epsilon = 1e-12
        );
    }
}

#[test]
fn degree_one_polynomial_agrees_with_trilinear() {
    let fitted = example_interpolator("mv1");
    let trilinear = example_interpolator("linear");
    for point in example_query_points() {
        assert_abs_diff_eq!(
            fitted.value(&point),
            trilinear.value(&point),
            epsilon = 1e-9
        );
    }
}

#[test]
fn batch_evaluation_matches_individual_evaluation() {
    let points = example_query_points();
    for name in ALL_METHOD_NAMES {
        let interpolator = example_interpolator(name);
        let batch = interpolator.values(&points);
        for (point, &batch_value) in points.iter().zip(batch.iter()) {
            assert_eq!(interpolator.value(point), batch_value);
        }
        let magnitudes = interpolator.gradient_magnitudes(&points);
        for (point, &batch_magnitude) in points.iter().zip(magnitudes.iter()) {
            assert_eq!(interpolator.gradient_magnitude(point), batch_magnitude);
        }
        let classes = interpolator.critical_points(&points);
        for (point, &batch_class) in points.iter().zip(classes.iter()) {
            assert_eq!(interpolator.critical_point(point), batch_class);
        }
    }
}

#[test]
fn slice_evaluation_matches_pointwise_evaluation() {
    let interpolator = example_interpolator("mv3");
    let points = Array2::from_shape_fn((4, 3), |(a, b)| {
        Point3::new(0.7 * a as fco, 1.3 * b as fco, 0.4)
    });
    for quantity in [
        Quantity::Value,
        Quantity::GradientMagnitude,
        Quantity::Laplacian,
        Quantity::CriticalPoint,
    ] {
        let evaluated = interpolator.evaluate_slice(&points, quantity);
        for ((a, b), point) in points.indexed_iter() {
            assert_eq!(evaluated[[a, b]], interpolator.evaluate(point, quantity));
        }
    }
}

#[test]
fn volume_evaluation_matches_pointwise_evaluation() {
    let interpolator = example_interpolator("bspline3");
    let points = Array3::from_shape_fn((3, 2, 4), |(a, b, c)| {
        Point3::new(1.1 * a as fco, 0.9 * b as fco, 1.6 * c as fco)
    });
    let evaluated = interpolator.evaluate_volume(&points, Quantity::Value);
    for ((a, b, c), point) in points.indexed_iter() {
        assert_eq!(
            evaluated[[a, b, c]],
            interpolator.evaluate(point, Quantity::Value)
        );
    }
}

#[test]
fn trilinear_values_stay_within_sample_bounds() {
    let values = example_values();
    let min_value = *values.min().unwrap();
    let max_value = *values.max().unwrap();
    let interpolator = example_interpolator("linear");
    let points = Array2::from_shape_fn((11, 11), |(a, b)| {
        Point3::new(0.55 * a as fco, 0.45 * b as fco, 3.15)
    });
    let evaluated = interpolator.evaluate_slice(&points, Quantity::Value);
    assert!(*evaluated.min().unwrap() >= min_value - 1e-12);
    assert!(*evaluated.max().unwrap() <= max_value + 1e-12);
}

#[test]
fn z_scored_grids_have_standardized_moments() {
    let interpolator = create_interpolator_from_name(
        "linear",
        example_values(),
        StandardizationMode::ZScore,
        Verbosity::Quiet,
    )
    .unwrap();
    assert_abs_diff_eq!(interpolator.grid().mean(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(interpolator.grid().std_deviation(), 1.0, epsilon = 1e-9);
}

#[test]
fn zero_preserving_standardization_keeps_zero_samples_at_zero() {
    let mut values = example_values();
    values[[2, 3, 4]] = 0.0;
    let interpolator = create_interpolator_from_name(
        "nearest",
        values,
        StandardizationMode::ZScoreZeroPreserving,
        Verbosity::Quiet,
    )
    .unwrap();
    assert_abs_diff_eq!(
        interpolator.value(&Point3::new(2.0, 3.0, 4.0)),
        0.0,
        epsilon = 1e-12
    );
}

#[test]
fn spline_classification_detects_an_isolated_maximum() {
    let mut values = Array3::zeros((5, 5, 5));
    values[[2, 2, 2]] = 10.0;
    let interpolator = interpolation::create_interpolator(
        InterpolationMethod::BSpline(interpolation::SplineDegree::Three),
        values,
        StandardizationMode::Off,
        Verbosity::Quiet,
    );
    assert_eq!(
        interpolator.evaluate(&Point3::new(2.0, 2.0, 2.0), Quantity::CriticalPoint),
        -3.0
    );
    assert_eq!(
        interpolator.evaluate(&Point3::new(1.5, 2.0, 2.0), Quantity::CriticalPoint),
        0.0
    );
}

#[test]
fn non_differentiable_methods_report_zero_sentinels() {
    for name in ["nearest", "linear"] {
        let interpolator = example_interpolator(name);
        let point = Point3::new(1.2, 2.7, 3.4);
        assert_eq!(interpolator.laplacian(&point), 0.0);
        assert_eq!(interpolator.critical_point(&point), 0);
    }
    let nearest = example_interpolator("nearest");
    assert_eq!(nearest.gradient_magnitude(&Point3::new(0.5, 0.5, 0.5)), 0.0);
}
