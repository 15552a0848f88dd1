//! Gap repair for the hip channels.
//!
//! Each channel is fitted with one quadratic interpolating B-spline through
//! all of its valid samples, with row position as the abscissa. Interior
//! knots sit halfway between consecutive samples, skipping the first and
//! last midpoints, and both ends are clamped. Missing values enclosed by
//! valid samples are read off the spline. A channel with only two valid
//! samples is filled linearly. Values at the leading or trailing edge have
//! no enclosing samples; their rows are dropped.

use crate::{roles::Channel, table::RoleFrameTable};
use log::{debug, warn};

/// Spline degree
const DEGREE: usize = 2;

/// Clamped quadratic B-spline interpolating a set of samples
#[derive(Debug, Clone)]
struct QuadraticSpline {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
}

impl QuadraticSpline {
    /// Fit through `(xs[i], ys[i])`; `xs` must strictly increase
    ///
    /// Returns `None` for fewer than three samples or a singular system.
    fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n <= DEGREE || ys.len() != n {
            return None;
        }

        let mut knots = Vec::with_capacity(n + DEGREE + 1);
        knots.extend([xs[0]; DEGREE + 1]);
        knots.extend(xs.windows(2).skip(1).take(n - 3).map(|w| 0.5 * (w[0] + w[1])));
        knots.extend([xs[n - 1]; DEGREE + 1]);

        let mut spline = Self {
            knots,
            coefficients: Vec::new(),
        };

        // Collocation matrix is banded: row i touches columns i-2..=i+2
        let mut band = vec![[0.0; 5]; n];
        for (i, &x) in xs.iter().enumerate() {
            let span = spline.span(x);
            for (k, b) in spline.basis(span, x).into_iter().enumerate() {
                let offset = (span - DEGREE + k + 2).checked_sub(i).filter(|&d| d < 5)?;
                band[i][offset] = b;
            }
        }
        spline.coefficients = solve_banded(band, ys.to_vec())?;
        Some(spline)
    }

    /// Knot span containing `x`, clamped to the valid range
    fn span(&self, x: f64) -> usize {
        let n = self.knots.len() - DEGREE - 1;
        let inner = &self.knots[DEGREE..n];
        (DEGREE + inner.partition_point(|&t| t <= x)).saturating_sub(1).clamp(DEGREE, n - 1)
    }

    /// Non-zero basis functions on `span` (Cox-de Boor)
    fn basis(&self, span: usize, x: f64) -> [f64; DEGREE + 1] {
        let t = &self.knots;
        let mut values = [0.0; DEGREE + 1];
        let mut left = [0.0; DEGREE + 1];
        let mut right = [0.0; DEGREE + 1];
        values[0] = 1.0;
        for j in 1..=DEGREE {
            left[j] = x - t[span + 1 - j];
            right[j] = t[span + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = values[r] / (right[r + 1] + left[j - r]);
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }
        values
    }

    fn evaluate(&self, x: f64) -> f64 {
        let span = self.span(x);
        self.basis(span, x)
            .iter()
            .enumerate()
            .map(|(k, b)| b * self.coefficients[span - DEGREE + k])
            .sum()
    }
}

/// Gaussian elimination on a pentadiagonal system, `band[i][d]` holding
/// `A[i][i + d - 2]`
///
/// B-spline collocation matrices are totally positive, so no pivoting.
fn solve_banded(mut band: Vec<[f64; 5]>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    for p in 0..n {
        let pivot = band[p][2];
        if pivot.abs() < f64::EPSILON {
            return None;
        }
        for r in p + 1..n.min(p + 3) {
            let factor = band[r][p + 2 - r] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in p..n.min(p + 3) {
                band[r][c + 2 - r] -= factor * band[p][c + 2 - p];
            }
            rhs[r] -= factor * rhs[p];
        }
    }

    let mut solution = vec![0.0; n];
    for p in (0..n).rev() {
        let tail: f64 = (p + 1..n.min(p + 3)).map(|c| band[p][c + 2 - p] * solution[c]).sum();
        solution[p] = (rhs[p] - tail) / band[p][2];
    }
    Some(solution)
}

/// Fill enclosed gaps of a single channel; row position is the abscissa
#[must_use]
pub fn interpolate_channel(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .unzip();
    let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
        return values.to_vec();
    };

    let spline = QuadraticSpline::fit(&xs, &ys);
    if spline.is_none() && xs.len() > DEGREE {
        warn!("Quadratic fit failed on {} samples, filling linearly", xs.len());
    }

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let x = i as f64;
            if value.is_some() || x < first || x > last {
                return *value;
            }
            Some(match &spline {
                Some(spline) => spline.evaluate(x),
                None => {
                    let after = xs.partition_point(|&k| k < x);
                    let (x0, y0) = (xs[after - 1], ys[after - 1]);
                    let (x1, y1) = (xs[after], ys[after]);
                    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
                }
            })
        })
        .collect()
}

/// Interpolate all hip channels and drop rows still missing a hip value
///
/// Tibia channels pass through untouched.
#[must_use]
pub fn interpolate_missing(table: &RoleFrameTable) -> RoleFrameTable {
    let filled: Vec<(Channel, Vec<Option<f64>>)> = Channel::HIP
        .into_iter()
        .map(|ch| (ch, interpolate_channel(&table.channel(ch))))
        .collect();

    let rows: Vec<_> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            filled
                .iter()
                .fold(*row, |acc, (ch, values)| acc.with(*ch, values[i]))
        })
        .filter(|row| Channel::HIP.iter().all(|&ch| row.get(ch).is_some()))
        .collect();

    let dropped = table.len() - rows.len();
    if dropped > 0 {
        warn!("Dropped {} edge frames with unrecoverable hip positions", dropped);
    }
    debug!("Interpolated table has {} rows", rows.len());

    RoleFrameTable::from_rows(rows)
}
