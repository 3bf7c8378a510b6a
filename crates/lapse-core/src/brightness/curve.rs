//! Target brightness curve: smoothing, keyframe anchoring and edit propagation.

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ADVANCED2_SIGMA, DEFAULT_ADVANCED_WINDOW, METRIC_SMOOTHING_WINDOW, RENORMALIZE_MARGIN,
};
use crate::error::{LapseError, Result};

use super::CalculationMode;

/// Smallest value taken into the log domain.
const LOG_FLOOR: f64 = 1e-6;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveParams {
    /// Window (frames) of the `Advanced` moving average.
    pub advanced_window: usize,
    /// Sigma (frames) of the `AdvancedII` Gaussian.
    pub advanced2_sigma: f64,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            advanced_window: DEFAULT_ADVANCED_WINDOW,
            advanced2_sigma: DEFAULT_ADVANCED2_SIGMA,
        }
    }
}

/// Set `values[index]` and shift every later value by the same delta.
///
/// Returns the delta. Does not renormalize. Non-finite values are rejected
/// and leave `values` untouched.
pub fn propagate_edit(values: &mut [f64], index: usize, value: f64) -> Result<f64> {
    let total = values.len();
    let current = values
        .get(index)
        .copied()
        .ok_or(LapseError::FrameIndexOutOfRange { index, total })?;
    check_finite(&[value])?;
    let delta = value - current;
    if values[index + 1..].iter().any(|v| !(v + delta).is_finite()) {
        return Err(LapseError::invalid_state(
            format!("brightness {value} overflows later frames"),
            false,
        ));
    }
    values[index] = value;
    for v in &mut values[index + 1..] {
        *v += delta;
    }
    Ok(delta)
}

/// Fail with a hard-stop `InvalidState` if any value is NaN or infinite.
pub fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(LapseError::invalid_state(
            format!("brightness value {} at position {i} is not finite", values[i]),
            false,
        )),
        None => Ok(()),
    }
}

/// Lift all values by `|min| + margin` when the minimum is negative.
///
/// Returns the applied shift (0 when nothing moved).
pub fn renormalize(values: &mut [f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if min.is_nan() || min >= 0.0 {
        return 0.0;
    }
    let shift = min.abs() + RENORMALIZE_MARGIN;
    for v in values.iter_mut() {
        *v += shift;
    }
    shift
}

/// Compute the target brightness of every frame.
///
/// - `originals`: measured brightness, the exposure reference of each frame.
/// - `measurements`: the mode's measurement series used to detect flicker.
/// - `anchors`: `Some(target)` for keyframes, copied to the output verbatim.
pub fn calculate_curve(
    mode: CalculationMode,
    originals: &[f64],
    measurements: &[f64],
    anchors: &[Option<f64>],
    params: &CurveParams,
) -> Vec<f64> {
    let n = originals.len();
    debug_assert_eq!(measurements.len(), n);
    debug_assert_eq!(anchors.len(), n);

    let smoothed = smooth(mode, measurements, params);
    let provisional: Vec<f64> = originals
        .iter()
        .zip(measurements.iter().zip(&smoothed))
        .map(|(&orig, (&m, &s))| if m == 0.0 { orig } else { orig * s / m })
        .collect();

    let correction = anchor_correction(&provisional, anchors);
    let mut targets: Vec<f64> = provisional
        .iter()
        .zip(&correction)
        .zip(anchors)
        .map(|((&p, &c), anchor)| anchor.unwrap_or(p * c))
        .collect();

    if targets.iter().any(|&t| t < 0.0) {
        renormalize(&mut targets);
    }
    targets
}

/// The mode's smoothed version of `series`.
pub fn smooth(mode: CalculationMode, series: &[f64], params: &CurveParams) -> Vec<f64> {
    match mode {
        CalculationMode::Simple => linear_ramp(series),
        CalculationMode::Exif | CalculationMode::Lab => {
            moving_average(series, METRIC_SMOOTHING_WINDOW)
        }
        CalculationMode::Advanced => moving_average(series, params.advanced_window),
        CalculationMode::AdvancedII => gaussian_log(series, params.advanced2_sigma),
    }
}

fn linear_ramp(series: &[f64]) -> Vec<f64> {
    let n = series.len();
    match (series.first(), series.last()) {
        (Some(&first), Some(&last)) if n > 1 => (0..n)
            .map(|i| first + (last - first) * i as f64 / (n - 1) as f64)
            .collect(),
        _ => series.to_vec(),
    }
}

/// Centered moving average. Windows are truncated at the sequence edges.
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    if half == 0 {
        return series.to_vec();
    }
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n.saturating_sub(1));
            let slice = &series[lo..=hi];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

fn gaussian_log(series: &[f64], sigma: f64) -> Vec<f64> {
    if sigma.is_nan() || sigma <= 0.0 {
        return series.to_vec();
    }
    let n = series.len();
    let logs: Vec<f64> = series.iter().map(|&v| v.max(LOG_FLOOR).log2()).collect();
    let radius = (3.0 * sigma).ceil() as usize;
    let s2 = 2.0 * sigma * sigma;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(n.saturating_sub(1));
            let (mut sum, mut weight) = (0.0, 0.0);
            for (j, &l) in logs.iter().enumerate().take(hi + 1).skip(lo) {
                let d = j as f64 - i as f64;
                let k = (-d * d / s2).exp();
                sum += k * l;
                weight += k;
            }
            (sum / weight).exp2()
        })
        .collect()
}

/// Multiplicative correction that makes `provisional` pass through every anchor.
///
/// Linear between anchors, held constant outside, 1.0 without anchors.
fn anchor_correction(provisional: &[f64], anchors: &[Option<f64>]) -> Vec<f64> {
    let points: Vec<(usize, f64)> = anchors
        .iter()
        .enumerate()
        .filter_map(|(i, a)| {
            a.map(|target| {
                let p = provisional[i];
                (i, if p == 0.0 { 1.0 } else { target / p })
            })
        })
        .collect();

    let n = provisional.len();
    let (first, last) = match (points.first(), points.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return vec![1.0; n],
    };

    let mut correction = vec![1.0; n];
    for (i, c) in correction.iter_mut().enumerate() {
        *c = if i <= first.0 {
            first.1
        } else if i >= last.0 {
            last.1
        } else {
            let seg = points.windows(2).find(|w| w[0].0 <= i && i <= w[1].0);
            match seg {
                Some(w) => {
                    let (i0, c0) = w[0];
                    let (i1, c1) = w[1];
                    let t = (i - i0) as f64 / (i1 - i0) as f64;
                    c0 + (c1 - c0) * t
                }
                None => last.1,
            }
        };
    }
    correction
}
