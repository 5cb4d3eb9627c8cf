//! Precomputed polynomial fitting matrices for neighborhood cubes.
//!
//! For a degree-d fit, the matrix maps a flattened `(d+1)³` cube of
//! samples to the `(d+1)³` tensor of monomial coefficients of the unique
//! trivariate polynomial interpolating the samples at their local integer
//! offsets `0..=d` along each dimension. Because the sample nodes form a
//! tensor product, the matrix is the Kronecker cube of the inverted 1D
//! Vandermonde matrix of the nodes.

use super::PolynomialDegree;
use crate::num::fco;
use lazy_static::lazy_static;
use ndarray::prelude::*;
use num::{rational::Ratio, ToPrimitive, Zero};

lazy_static! {
    static ref FITTING_MATRIX_DEGREE_ONE: Array2<fco> = compute_fitting_matrix(2);
    static ref FITTING_MATRIX_DEGREE_THREE: Array2<fco> = compute_fitting_matrix(4);
    static ref FITTING_MATRIX_DEGREE_FIVE: Array2<fco> = compute_fitting_matrix(6);
}

/// Returns the fitting matrix for the given polynomial degree.
///
/// The matrix is computed once per process and shared between all
/// interpolators of the same degree.
pub fn fitting_matrix(degree: PolynomialDegree) -> &'static Array2<fco> {
    match degree {
        PolynomialDegree::One => &FITTING_MATRIX_DEGREE_ONE,
        PolynomialDegree::Three => &FITTING_MATRIX_DEGREE_THREE,
        PolynomialDegree::Five => &FITTING_MATRIX_DEGREE_FIVE,
    }
}

fn compute_fitting_matrix(points: usize) -> Array2<fco> {
    let inverted = inverted_vandermonde(points);
    let size = points * points * points;
    // Row (a, b, c) selects the coefficient of x^a y^b z^c, column
    // (i, j, k) the cube sample at offsets (i, j, k), with the first
    // index varying slowest in both flattenings.
    Array2::from_shape_fn((size, size), |(row, col)| {
        let (exp_x, exp_y, exp_z) = unflatten(row, points);
        let (node_x, node_y, node_z) = unflatten(col, points);
        inverted[[exp_x, node_x]] * inverted[[exp_y, node_y]] * inverted[[exp_z, node_z]]
    })
}

fn unflatten(flat: usize, points: usize) -> (usize, usize, usize) {
    (
        flat / (points * points),
        (flat / points) % points,
        flat % points,
    )
}

/// Inverts the 1D Vandermonde matrix on the nodes `0..points` by
/// Gauss-Jordan elimination in exact rational arithmetic.
///
/// The matrix is ill-conditioned enough at six points that a floating
/// point inversion would leak roundoff of order 1e-9 into the fitted
/// values, so the entries are only converted to floats at the end.
fn inverted_vandermonde(points: usize) -> Array2<fco> {
    let mut vandermonde = Array2::from_shape_fn((points, points), |(node, exponent)| {
        Ratio::from_integer((node as i64).pow(exponent as u32))
    });
    let mut inverted = Array2::from_shape_fn((points, points), |(row, col)| {
        Ratio::from_integer(i64::from(row == col))
    });

    for col in 0..points {
        let pivot_row = (col..points)
            .find(|&row| !vandermonde[[row, col]].is_zero())
            .expect("Singular Vandermonde matrix.");
        if pivot_row != col {
            for j in 0..points {
                vandermonde.swap([pivot_row, j], [col, j]);
                inverted.swap([pivot_row, j], [col, j]);
            }
        }

        let pivot = vandermonde[[col, col]];
        for j in 0..points {
            vandermonde[[col, j]] /= pivot;
            inverted[[col, j]] /= pivot;
        }

        for row in 0..points {
            if row != col && !vandermonde[[row, col]].is_zero() {
                let factor = vandermonde[[row, col]];
                for j in 0..points {
                    let elimination = factor * vandermonde[[col, j]];
                    vandermonde[[row, j]] -= elimination;
                    let elimination = factor * inverted[[col, j]];
                    inverted[[row, j]] -= elimination;
                }
            }
        }
    }
    inverted.mapv(|entry| entry.to_f64().expect("Rational outside float range."))
}
