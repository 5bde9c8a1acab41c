//! Mapping a gait-cycle time window onto channel index ranges.
//!
//! A channel's recording usually starts before the cycle of interest and
//! ends after it, and different methods run on their own clocks, so the
//! cycle window has to be located inside each channel's time base
//! independently.

use std::ops::RangeInclusive;

use crate::channel::{Channel, GaitCycle};
use crate::error::{AnalysisError, Result};

/// Resolve a cycle window to an inclusive index range of `time`.
///
/// The start index is the first `i` with `time[i] > initial_time`; the end
/// index is one before the first `i` with `time[i] > final_time`. A sample
/// exactly at `initial_time` is therefore excluded and a sample exactly at
/// `final_time` is included. The strict-`>` searches are deliberate and
/// must not be loosened to `>=`.
///
/// # Errors
///
/// Returns [`AnalysisError::CycleOutOfRange`] when either search finds no
/// index, or when the window falls entirely before the channel's first
/// sample.
pub fn resolve_window(time: &[f64], cycle: &GaitCycle) -> Result<RangeInclusive<usize>> {
    let out_of_range = || AnalysisError::CycleOutOfRange {
        initial: cycle.initial_time,
        end: cycle.final_time,
        domain_start: time.first().copied().unwrap_or(f64::NAN),
        domain_end: time.last().copied().unwrap_or(f64::NAN),
    };

    let start = time
        .iter()
        .position(|&t| t > cycle.initial_time)
        .ok_or_else(out_of_range)?;
    let past_end = time
        .iter()
        .position(|&t| t > cycle.final_time)
        .ok_or_else(out_of_range)?;
    // past_end == 0 means the whole channel sits after final_time, so the
    // window is not contained in the domain at all.
    let end = past_end.checked_sub(1).ok_or_else(out_of_range)?;

    Ok(start..=end)
}

/// Slice a channel's time and value arrays to a cycle window.
///
/// # Errors
///
/// Propagates [`resolve_window`] failures.
pub fn window_channel<'a>(channel: &'a Channel, cycle: &GaitCycle) -> Result<(&'a [f64], &'a [f64])> {
    let range = resolve_window(channel.time(), cycle)?;
    let (start, end) = (*range.start(), *range.end());
    if start > end {
        // Degenerate window: no sample falls strictly inside the cycle.
        return Err(AnalysisError::insufficient_samples(2, 0));
    }
    Ok((&channel.time()[start..=end], &channel.value()[start..=end]))
}
