//! Resampling windowed channels onto the percent-cycle grid.
//!
//! A windowed channel is rebuilt as a piecewise-linear interpolant over
//! its own time span and sampled at 101 evenly spaced points, so curves
//! from methods with different sample rates and clocks become directly
//! comparable. Endpoint samples are assigned from the source data rather
//! than interpolated, which keeps them bit-exact.

use crate::channel::{Channel, GaitCycle};
use crate::curve::{NormalizedCurve, CURVE_POINTS};
use crate::error::{AnalysisError, Result};
use crate::window::window_channel;

/// Minimum number of samples a window must contain to interpolate.
pub const MIN_WINDOW_SAMPLES: usize = 2;

/// Resample a windowed `(time, value)` series onto the percent-cycle grid.
///
/// `time` must be strictly increasing (guaranteed when the window came
/// from a [`Channel`]). The interpolant spans exactly
/// `[time[0], time[last]]`; interior grid points are linearly
/// interpolated, and the two endpoint samples equal `value[0]` and
/// `value[last]` exactly.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientSamples`] for fewer than
///   [`MIN_WINDOW_SAMPLES`] points.
/// - [`AnalysisError::InterpolationOutsideDomain`] if a grid point falls
///   outside the source span. The evenly spaced grid cannot produce one;
///   the guard exists so a regression fails loudly instead of clamping.
pub fn normalize_cycle(time: &[f64], value: &[f64]) -> Result<NormalizedCurve> {
    if time.len() < MIN_WINDOW_SAMPLES {
        return Err(AnalysisError::insufficient_samples(
            MIN_WINDOW_SAMPLES,
            time.len(),
        ));
    }
    if time.len() != value.len() {
        return Err(AnalysisError::sample_length_mismatch(time.len(), value.len()));
    }

    let t0 = time[0];
    let t_last = time[time.len() - 1];
    let step = (t_last - t0) / ((CURVE_POINTS - 1) as f64);

    let mut samples = [0.0f64; CURVE_POINTS];
    samples[0] = value[0];
    samples[CURVE_POINTS - 1] = value[value.len() - 1];

    // Source samples are strictly increasing and grid queries are
    // non-decreasing, so a single forward cursor finds each segment.
    let mut seg = 0usize;
    for (i, sample) in samples.iter_mut().enumerate().take(CURVE_POINTS - 1).skip(1) {
        let query = t0 + step * i as f64;
        if query < t0 || query > t_last {
            return Err(AnalysisError::InterpolationOutsideDomain {
                query,
                start: t0,
                end: t_last,
            });
        }
        while seg + 2 < time.len() && time[seg + 1] < query {
            seg += 1;
        }
        let (ta, tb) = (time[seg], time[seg + 1]);
        let (va, vb) = (value[seg], value[seg + 1]);
        let frac = (query - ta) / (tb - ta);
        *sample = va + frac * (vb - va);
    }

    Ok(NormalizedCurve::new(samples))
}

/// Window a channel to a gait cycle and resample it in one step.
///
/// # Errors
///
/// Propagates window resolution and normalization failures.
pub fn normalize_channel(channel: &Channel, cycle: &GaitCycle) -> Result<NormalizedCurve> {
    let (time, value) = window_channel(channel, cycle)?;
    normalize_cycle(time, value)
}
