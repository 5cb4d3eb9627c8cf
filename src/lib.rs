//! A toolkit for reconstructing continuous periodic 3D density fields
//! from discrete sample grids.
//!
//! Sample volumes are wrapped in a [`grid::PeriodicGrid3`], and an
//! [`interpolation::Interpolator3`] built by
//! [`interpolation::create_interpolator`] reconstructs values, gradients,
//! Laplacians and critical point classifications at arbitrary fractional
//! coordinates.

pub mod geometry;
pub mod grid;
pub mod interpolation;
pub mod num;
