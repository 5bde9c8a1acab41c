//! Per-subject pipelines and the batch worker pool.
//!
//! Each subject's pipeline (window, normalize, reconcile, compare and
//! summarize) is independent of every other subject's, so the batch fans
//! subjects out over a rayon pool where one worker owns one subject
//! end-to-end. Completed summaries flow back to a single accumulating
//! owner of the [`GroupAggregator`]; no worker ever touches shared mutable
//! state. One failing subject is logged, reported and excluded without
//! aborting the rest of the batch.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use crate::aggregate::{
    GroupAggregator, GroupSummary, MethodRunTime, MethodVariableStats, ResidualPeak,
    SubjectSummary, VariableComparison,
};
use crate::channel::{Channel, GaitCycle, MethodId, ResidualAxis, VariableClass};
use crate::compare::{ComparisonMatrix, CurveStats, MeanComparisonMatrix};
use crate::config::AnalysisConfig;
use crate::curve::NormalizedCurve;
use crate::error::{AnalysisError, Result};
use crate::normalize::normalize_channel;
use crate::residuals::ResidualThreshold;
use crate::runtime::{normalize_run_time, RawDurations};
use crate::stats;
use crate::units::UnitTable;

/// A kinematic variable under comparison, with its unit family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    pub name: String,
    pub class: VariableClass,
}

impl VariableDef {
    /// Convenience constructor.
    #[must_use]
    pub fn new(name: impl Into<String>, class: VariableClass) -> Self {
        Self {
            name: name.into(),
            class,
        }
    }
}

/// One method's raw outputs for a subject/trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MethodChannels {
    /// Kinematic channels keyed by variable name. A variable absent here
    /// is partial coverage, not an error.
    pub kinematics: BTreeMap<String, Channel>,
    /// Residual force/moment channels.
    pub residuals: BTreeMap<ResidualAxis, Channel>,
    /// Model mass for per-mass residual reporting, if known.
    pub model_mass_kg: Option<f64>,
    /// Raw processing-duration measurements, if captured.
    pub run_time: Option<RawDurations>,
}

/// Everything external collaborators provide for one subject/trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectInput {
    pub subject: String,
    pub trial: String,
    /// Gait cycles from event detection, usually three per trial.
    pub cycles: Vec<GaitCycle>,
    /// The variables to compare across methods.
    pub variables: Vec<VariableDef>,
    /// Per-method raw outputs.
    pub methods: BTreeMap<MethodId, MethodChannels>,
    /// Left vertical ground-reaction force for the trial.
    pub left_vgrf: Channel,
    /// Right vertical ground-reaction force for the trial.
    pub right_vgrf: Channel,
    /// Model center-of-mass height at the static reference pose, meters.
    pub com_height_m: f64,
}

/// Pipeline stage identifiers for failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Normalization,
    UnitReconciliation,
    Residuals,
    RunTime,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normalization => "normalization",
            Self::UnitReconciliation => "unit reconciliation",
            Self::Residuals => "residuals",
            Self::RunTime => "run time",
        };
        f.write_str(name)
    }
}

/// Why a subject was excluded from the group statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectFailure {
    pub subject: String,
    pub stage: PipelineStage,
    pub reason: String,
}

/// One normalized, unit-reconciled curve, keyed the way it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRecord {
    pub method: MethodId,
    pub variable: String,
    pub cycle_index: usize,
    pub curve: NormalizedCurve,
}

/// A subject's full pipeline output: the summary plus every curve behind
/// it, kept for reuse without recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub summary: SubjectSummary,
    pub curves: Vec<CurveRecord>,
}

/// Outcome of a whole batch: successful subjects, group statistics, and
/// the roster of exclusions with reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<SubjectResult>,
    pub group: GroupSummary,
    pub failures: Vec<SubjectFailure>,
}

impl BatchReport {
    /// Subjects that completed the pipeline.
    #[must_use]
    pub fn succeeded(&self) -> Vec<&str> {
        self.results
            .iter()
            .map(|r| r.summary.subject.as_str())
            .collect()
    }

    /// Subjects excluded from group statistics.
    #[must_use]
    pub fn excluded(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.subject.as_str()).collect()
    }
}

/// Run one subject's pipeline.
///
/// # Errors
///
/// Returns the first stage error; callers that need the failing stage use
/// [`process_batch`], which records it per subject.
pub fn process_subject(input: &SubjectInput, config: &AnalysisConfig) -> Result<SubjectResult> {
    run_pipeline(input, config).map_err(|(_, e)| e)
}

/// Run a batch of subjects over the worker pool and aggregate the group.
///
/// # Errors
///
/// Only configuration defects fail the call ([`AnalysisConfig::validate`]
/// runs before any subject is touched). Per-subject failures land in
/// [`BatchReport::failures`].
pub fn process_batch(inputs: &[SubjectInput], config: &AnalysisConfig) -> Result<BatchReport> {
    config.validate()?;

    let outcomes: Vec<(String, std::result::Result<SubjectResult, (PipelineStage, AnalysisError)>)> =
        inputs
            .par_iter()
            .map(|input| (input.subject.clone(), run_pipeline(input, config)))
            .collect();

    let mut aggregator = GroupAggregator::new();
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (subject, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                info!(subject = %subject, "subject pipeline complete");
                aggregator.accumulate(result.summary.clone());
                results.push(result);
            }
            Err((stage, error)) => {
                warn!(subject = %subject, stage = %stage, error = %error, "subject excluded");
                failures.push(SubjectFailure {
                    subject,
                    stage,
                    reason: error.to_string(),
                });
            }
        }
    }

    let group = aggregator.finalize();
    info!(
        succeeded = results.len(),
        excluded = failures.len(),
        "batch complete"
    );

    Ok(BatchReport {
        results,
        group,
        failures,
    })
}

type StageResult<T> = std::result::Result<T, (PipelineStage, AnalysisError)>;

fn run_pipeline(input: &SubjectInput, config: &AnalysisConfig) -> StageResult<SubjectResult> {
    let threshold = ResidualThreshold::from_trial(
        &input.left_vgrf,
        &input.right_vgrf,
        input.com_height_m,
        config,
    );

    let mut curves = Vec::new();
    let mut comparisons = Vec::new();
    let mut curve_stats = Vec::new();

    for variable in &input.variables {
        let (comparison, stats_rows) = compare_variable(
            input,
            variable,
            &config.methods,
            &config.unit_table,
            &mut curves,
        )?;
        comparisons.push(comparison);
        curve_stats.extend(stats_rows);
    }

    let residual_peaks =
        summarize_residuals(input, &config.methods, threshold, &mut curves)
            .map_err(|e| (PipelineStage::Residuals, e))?;

    let mut run_times = Vec::new();
    for (&method, channels) in &input.methods {
        if !config.methods.contains(&method) {
            continue;
        }
        if let Some(raw) = &channels.run_time {
            let seconds = normalize_run_time(method, raw, &input.cycles)
                .map_err(|e| (PipelineStage::RunTime, e))?;
            run_times.push(MethodRunTime { method, seconds });
        }
    }

    let summary = SubjectSummary {
        subject: input.subject.clone(),
        trial: input.trial.clone(),
        comparisons,
        curve_stats,
        residuals: residual_peaks,
        threshold,
        run_times,
    };

    Ok(SubjectResult { summary, curves })
}

/// Normalize, reconcile and compare one variable across methods and
/// cycles. Comparison always uses the curves of the cycle actually being
/// processed, keyed by cycle index.
fn compare_variable(
    input: &SubjectInput,
    variable: &VariableDef,
    methods: &[MethodId],
    unit_table: &UnitTable,
    curves: &mut Vec<CurveRecord>,
) -> StageResult<(VariableComparison, Vec<MethodVariableStats>)> {
    let mut matrices = Vec::with_capacity(input.cycles.len());
    let mut per_method_stats: BTreeMap<MethodId, Vec<CurveStats>> = BTreeMap::new();

    for cycle in &input.cycles {
        let mut cycle_curves: BTreeMap<MethodId, NormalizedCurve> = BTreeMap::new();
        for &method in methods {
            let Some(channel) = input
                .methods
                .get(&method)
                .and_then(|m| m.kinematics.get(&variable.name))
            else {
                continue;
            };
            let raw = normalize_channel(channel, cycle)
                .map_err(|e| (PipelineStage::Normalization, e))?;
            let curve = unit_table
                .reconcile(method, variable.class, &raw)
                .map_err(|e| (PipelineStage::UnitReconciliation, e))?;

            per_method_stats
                .entry(method)
                .or_default()
                .push(CurveStats::of(&curve));
            curves.push(CurveRecord {
                method,
                variable: variable.name.clone(),
                cycle_index: cycle.cycle_index,
                curve: curve.clone(),
            });
            cycle_curves.insert(method, curve);
        }
        matrices.push(ComparisonMatrix::compare(methods, &cycle_curves));
    }

    let comparison = VariableComparison {
        variable: variable.name.clone(),
        class: variable.class,
        matrix: MeanComparisonMatrix::from_cycles(&matrices),
    };

    let stats_rows = per_method_stats
        .into_iter()
        .filter_map(|(method, stats)| {
            CurveStats::mean_of(&stats).map(|mean| MethodVariableStats {
                method,
                variable: variable.name.clone(),
                stats: mean,
                cycles: stats.len(),
            })
        })
        .collect();

    Ok((comparison, stats_rows))
}

/// Per-cycle peak residuals averaged across cycles, per method and axis.
///
/// The threshold check runs on the raw newton values; the reported mean
/// peak is mass-normalized when the method's model mass is known.
fn summarize_residuals(
    input: &SubjectInput,
    methods: &[MethodId],
    threshold: ResidualThreshold,
    curves: &mut Vec<CurveRecord>,
) -> Result<Vec<ResidualPeak>> {
    let mut peaks = Vec::new();
    for &method in methods {
        let Some(channels) = input.methods.get(&method) else {
            continue;
        };
        let scale = channels.model_mass_kg.map_or(1.0, |mass| 1.0 / mass);
        for (&axis, channel) in &channels.residuals {
            let mut cycle_peaks = Vec::with_capacity(input.cycles.len());
            for cycle in &input.cycles {
                let curve = normalize_channel(channel, cycle)?;
                cycle_peaks.push(CurveStats::of(&curve).peak_abs);
                curves.push(CurveRecord {
                    method,
                    variable: axis.as_str().to_string(),
                    cycle_index: cycle.cycle_index,
                    curve: curve.map(|v| v * scale),
                });
            }
            if let Some(mean_peak_n) = stats::mean(&cycle_peaks) {
                peaks.push(ResidualPeak {
                    method,
                    axis,
                    mean_peak: mean_peak_n * scale,
                    within_threshold: threshold.allows(axis, mean_peak_n),
                    cycles: cycle_peaks.len(),
                });
            }
        }
    }
    Ok(peaks)
}
