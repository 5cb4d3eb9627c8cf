//! Interpolation with B-spline basis functions.
//!
//! Sample values are converted into B-spline coefficients with the
//! recursive filtering scheme of Thévenaz, Blu & Unser (2000), Image
//! Interpolation and Resampling. The filter assumes mirror boundaries,
//! so it runs over a periodically padded copy of the samples and the
//! boundary error is confined to the padding cells.

use super::{Interpolator3, InterpolatorConfig, SplineDegree};
use crate::{
    geometry::{
        Dim3::{X, Y, Z},
        In3D, Point3,
    },
    grid::PeriodicGrid3,
    num::{fco, fip, round_coord, MFloat},
};
use ndarray::prelude::*;

/// Number of padding cells added on every face before filtering.
const COEFFICIENT_BUFFER: usize = 8;

/// Truncation tolerance for the causal filter initialization.
const TOLERANCE: fco = fco::EPSILON;

/// An interpolator reconstructing the field as a sum of uniform B-spline
/// basis functions of the configured degree.
///
/// The coefficient volume is computed once at construction time;
/// evaluation is a separable weighted sum over `(degree + 1)³`
/// coefficients. Derivative quantities use the numerical defaults.
#[derive(Clone, Debug)]
pub struct BSplineInterpolator3<F> {
    grid: PeriodicGrid3<F>,
    coefficients: PeriodicGrid3<fco>,
    degree: SplineDegree,
    config: InterpolatorConfig,
}

impl<F: MFloat> BSplineInterpolator3<F> {
    /// Creates a new B-spline interpolator of the given degree over the
    /// given grid, prefiltering the samples into spline coefficients.
    pub fn new(grid: PeriodicGrid3<F>, degree: SplineDegree, config: InterpolatorConfig) -> Self {
        let padded = grid.periodic_pad(COEFFICIENT_BUFFER);
        let mut volume = padded.values().mapv(|value| value.into());
        filter_volume(&mut volume, degree);
        let coefficients = PeriodicGrid3::from_padded_values(volume, COEFFICIENT_BUFFER);
        Self {
            grid,
            coefficients,
            degree,
            config,
        }
    }

    /// Returns the degree of the spline basis functions.
    pub fn degree(&self) -> SplineDegree {
        self.degree
    }
}

impl<F: MFloat> Interpolator3<F> for BSplineInterpolator3<F> {
    fn grid(&self) -> &PeriodicGrid3<F> {
        &self.grid
    }

    fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    fn value(&self, point: &Point3<fco>) -> fip {
        let wrapped = self.grid.wrap_point(point);
        let points = self.degree.points();
        let margin = (self.degree.value() / 2) as isize;
        let start = In3D::with_each_component(|dim| {
            round_coord(wrapped[dim]).floor() as isize - margin
        });
        let weights = In3D::with_each_component(|dim| {
            let offset = wrapped[dim] - round_coord(wrapped[dim]).floor();
            spline_weights(self.degree, offset)
        });

        let mut value = 0.0;
        for k in 0..points {
            let mut slab = 0.0;
            for j in 0..points {
                let mut lane = 0.0;
                for i in 0..points {
                    lane += weights[X][i]
                        * self.coefficients.sample(
                            start[X] + i as isize,
                            start[Y] + j as isize,
                            start[Z] + k as isize,
                        );
                }
                slab += weights[Y][j] * lane;
            }
            value += weights[Z][k] * slab;
        }
        value
    }
}

/// Converts a sample volume into B-spline coefficients in place by
/// recursive filtering along each axis in turn.
fn filter_volume(volume: &mut Array3<fco>, degree: SplineDegree) {
    let poles = characteristic_poles(degree);
    let gain = poles
        .iter()
        .fold(1.0, |gain, &pole| gain * (1.0 - pole) * (1.0 - 1.0 / pole));
    for axis in [Axis(0), Axis(1), Axis(2)] {
        if volume.len_of(axis) > 1 {
            for mut lane in volume.lanes_mut(axis) {
                let mut line = lane.to_vec();
                filter_line(&mut line, &poles, gain);
                for (target, filtered) in lane.iter_mut().zip(line) {
                    *target = filtered;
                }
            }
        }
    }
}

/// Returns the poles of the direct B-spline filter for the given degree.
fn characteristic_poles(degree: SplineDegree) -> Vec<fco> {
    match degree {
        SplineDegree::Three => vec![3.0_f64.sqrt() - 2.0],
        SplineDegree::Five => vec![
            (135.0 / 2.0 - (17745.0_f64 / 4.0).sqrt()).sqrt() + (105.0_f64 / 4.0).sqrt()
                - 13.0 / 2.0,
            (135.0 / 2.0 + (17745.0_f64 / 4.0).sqrt()).sqrt() - (105.0_f64 / 4.0).sqrt()
                - 13.0 / 2.0,
        ],
        SplineDegree::Seven => vec![
            -0.53528043079643816554240378168164607183392315234269,
            -0.12255461519232669051527226435935734360548654942730,
            -0.0091486948096082769285930216516478534156925639545994,
        ],
        SplineDegree::Nine => vec![
            -0.60799738916862577900772082395428976943963471853991,
            -0.20175052019315323879606468505597043468089886575747,
            -0.043222608540481752133321142979429688265852380231497,
            -0.0021213069031808184203048965578486234220548560988624,
        ],
    }
}

/// Runs the direct B-spline filter over a single line of samples,
/// replacing them with the interpolation coefficients.
fn filter_line(line: &mut [fco], poles: &[fco], gain: fco) {
    for value in line.iter_mut() {
        *value *= gain;
    }
    for &pole in poles {
        line[0] = initial_causal_coefficient(line, pole);
        for n in 1..line.len() {
            line[n] += pole * line[n - 1];
        }
        let last = line.len() - 1;
        line[last] = initial_anticausal_coefficient(line, pole);
        for n in (0..last).rev() {
            line[n] = pole * (line[n + 1] - line[n]);
        }
    }
}

/// Computes the starting coefficient of the causal recursion, truncating
/// the geometric sum once additional terms drop below the tolerance.
fn initial_causal_coefficient(line: &[fco], pole: fco) -> fco {
    let length = line.len();
    let horizon = (TOLERANCE.ln() / pole.abs().ln()).ceil() as usize;
    if horizon < length {
        let mut zn = pole;
        let mut sum = line[0];
        for &value in &line[1..horizon] {
            sum += zn * value;
            zn *= pole;
        }
        sum
    } else {
        let mut zn = pole;
        let iz = 1.0 / pole;
        let mut z2n = pole.powi(length as i32 - 1);
        let mut sum = line[0] + z2n * line[length - 1];
        z2n *= z2n * iz;
        for &value in &line[1..length - 1] {
            sum += (zn + z2n) * value;
            zn *= pole;
            z2n *= iz;
        }
        sum / (1.0 - zn * zn)
    }
}

/// Computes the final coefficient of the anticausal recursion.
fn initial_anticausal_coefficient(line: &[fco], pole: fco) -> fco {
    let length = line.len();
    if length < 2 {
        return 0.0;
    }
    (pole / (pole * pole - 1.0)) * (pole * line[length - 2] + line[length - 1])
}

/// Evaluates the basis function weights of all interpolation points along
/// one dimension, for the given fractional offset in `[0, 1)`.
fn spline_weights(degree: SplineDegree, w: fco) -> Vec<fco> {
    match degree {
        SplineDegree::Three => weights_3(w),
        SplineDegree::Five => weights_5(w),
        SplineDegree::Seven => weights_7(w),
        SplineDegree::Nine => weights_9(w),
    }
}

fn weights_3(w: fco) -> Vec<fco> {
    let mut ws = vec![0.0; 4];
    ws[3] = (1.0 / 6.0) * w * w * w;
    ws[0] = 1.0 / 6.0 + (1.0 / 2.0) * w * (w - 1.0) - ws[3];
    ws[2] = w + ws[0] - 2.0 * ws[3];
    ws[1] = 1.0 - ws[0] - ws[2] - ws[3];
    ws
}

fn weights_5(w: fco) -> Vec<fco> {
    let mut ws = vec![0.0; 6];
    let mut w2 = w * w;
    ws[5] = (1.0 / 120.0) * w * w2 * w2;
    w2 -= w;
    let w4 = w2 * w2;
    let w = w - 1.0 / 2.0;
    let t = w2 * (w2 - 3.0);
    ws[0] = (1.0 / 24.0) * (1.0 / 5.0 + w2 + w4) - ws[5];
    let t0 = (1.0 / 24.0) * (w2 * (w2 - 5.0) + 46.0 / 5.0);
    let t1 = (-1.0 / 12.0) * w * (t + 4.0);
    ws[2] = t0 + t1;
    ws[3] = t0 - t1;
    let t0 = (1.0 / 16.0) * (9.0 / 5.0 - t);
    let t1 = (1.0 / 24.0) * w * (w4 - w2 - 5.0);
    ws[1] = t0 + t1;
    ws[4] = t0 - t1;
    ws
}

fn weights_7(w: fco) -> Vec<fco> {
    let mut ws = vec![0.0; 8];
    let u = 1.0 - w;
    ws[0] = u.powi(7) / 5040.0;
    let w2 = w * w;
    ws[1] = (120.0 / 7.0
        + w * (-56.0 + w * (72.0 + w * (-40.0 + w2 * (12.0 + w * (-6.0 + w))))))
        / 720.0;
    ws[2] = (397.0 / 7.0
        - w * (245.0 / 3.0
            + w * (-15.0 + w * (-95.0 / 3.0 + w * (15.0 + w * (5.0 + w * (-5.0 + w)))))))
        / 240.0;
    ws[3] = (2416.0 / 35.0 + w2 * (-48.0 + w2 * (16.0 + w2 * (-4.0 + w)))) / 144.0;
    ws[4] = (1191.0 / 35.0
        - w * (-49.0 + w * (-9.0 + w * (19.0 + w * (-3.0 + w) * (-3.0 + w2)))))
        / 144.0;
    ws[5] = (40.0 / 7.0
        + w * (56.0 / 3.0 + w * (24.0 + w * (40.0 / 3.0 + w2 * (-4.0 + w * (-2.0 + w))))))
        / 240.0;
    ws[7] = w2.powi(3) * w / 5040.0;
    ws[6] = 1.0 - ws[0] - ws[1] - ws[2] - ws[3] - ws[4] - ws[5] - ws[7];
    ws
}

fn weights_9(w: fco) -> Vec<fco> {
    let mut ws = vec![0.0; 10];
    let u = 1.0 - w;
    ws[0] = u.powi(9) / 362880.0;
    ws[1] = (502.0 / 9.0
        + w * (-246.0
            + w * (472.0
                + w * (-504.0
                    + w * (308.0
                        + w * (-84.0
                            + w * (-56.0 / 3.0 + w * (24.0 + w * (-8.0 + w)))))))))
        / 40320.0;
    ws[2] = (3652.0 / 9.0
        - w * (2023.0 / 2.0
            + w * (-952.0
                + w * (938.0 / 3.0
                    + w * (112.0
                        + w * (-119.0
                            + w * (56.0 / 3.0 + w * (14.0 + w * (-7.0 + w)))))))))
        / 10080.0;
    ws[3] = (44117.0 / 42.0
        + w * (-2427.0 / 2.0
            + w * (66.0
                + w * (434.0
                    + w * (-129.0
                        + w * (-69.0 + w * (34.0 + w * (6.0 + w * (-6.0 + w)))))))))
        / 4320.0;
    let w2 = w * w;
    ws[4] = (78095.0 / 63.0
        - w2 * (700.0 + w2 * (-190.0 + w2 * (100.0 / 3.0 + w2 * (-5.0 + w)))))
        / 2880.0;
    ws[5] = (44117.0 / 63.0
        + w * (809.0
            + w * (44.0
                + w * (-868.0 / 3.0
                    + w * (-86.0
                        + w * (46.0
                            + w * (68.0 / 3.0 + w * (-4.0 + w * (-4.0 + w)))))))))
        / 2880.0;
    ws[6] = (3652.0 / 21.0
        - w * (-867.0 / 2.0
            + w * (-408.0
                + w * (-134.0
                    + w * (48.0 + w * (51.0 + w * (-4.0 + w) * (-1.0 + w) * (2.0 + w)))))))
        / 4320.0;
    ws[7] = (251.0 / 18.0
        + w * (123.0 / 2.0
            + w * (118.0
                + w * (126.0
                    + w * (77.0
                        + w * (21.0
                            + w * (-14.0 / 3.0 + w * (-6.0 + w * (-2.0 + w)))))))))
        / 10080.0;
    ws[9] = w2.powi(4) * w / 362880.0;
    ws[8] = 1.0 - ws[0] - ws[1] - ws[2] - ws[3] - ws[4] - ws[5] - ws[6] - ws[7] - ws[9];
    ws
}
