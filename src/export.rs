//! Exporting batch results: flat delimited rows and nested JSON.
//!
//! The CSV export is a long-format table, one row per
//! `scope x subject x method x variable/axis x metric`, convenient for
//! spreadsheet pivoting and statistics packages. The JSON export
//! serializes the whole [`BatchReport`] so later analyses can reload it
//! without recomputation.

use serde::Serialize;
use std::io::Write;

use crate::aggregate::SubjectSummary;
use crate::pipeline::BatchReport;

/// One long-format export row.
///
/// `std_dev` and `n` are populated where they apply: group cells carry a
/// standard deviation and a subject count, subject cells carry a cycle
/// count, ratio rows carry neither.
#[derive(Debug, Clone, Serialize)]
struct ExportRow<'a> {
    scope: &'static str,
    subject: &'a str,
    method: &'a str,
    other: &'a str,
    key: &'a str,
    metric: &'static str,
    value: f64,
    std_dev: Option<f64>,
    n: Option<u64>,
}

impl<'a> ExportRow<'a> {
    fn subject_row(subject: &'a str, method: &'a str, key: &'a str, metric: &'static str) -> Self {
        Self {
            scope: "subject",
            subject,
            method,
            other: "",
            key,
            metric,
            value: 0.0,
            std_dev: None,
            n: None,
        }
    }

    fn group_row(method: &'a str, key: &'a str, metric: &'static str) -> Self {
        Self {
            scope: "group",
            subject: "",
            method,
            other: "",
            key,
            metric,
            value: 0.0,
            std_dev: None,
            n: None,
        }
    }
}

/// Write the long-format CSV for a whole batch.
///
/// # Errors
///
/// Returns the underlying `csv` error on serialization or I/O failure.
pub fn write_flat_csv<W: Write>(report: &BatchReport, writer: W) -> csv::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for result in &report.results {
        write_subject_rows(&result.summary, &mut csv_writer)?;
    }
    write_group_rows(report, &mut csv_writer)?;

    csv_writer.flush()?;
    Ok(())
}

fn write_subject_rows<W: Write>(
    summary: &SubjectSummary,
    writer: &mut csv::Writer<W>,
) -> csv::Result<()> {
    let subject = summary.subject.as_str();

    for comparison in &summary.comparisons {
        for entry in comparison.matrix.entries() {
            writer.serialize(ExportRow {
                other: entry.b.as_str(),
                value: entry.mean_rmse,
                n: Some(entry.cycles as u64),
                ..ExportRow::subject_row(subject, entry.a.as_str(), &comparison.variable, "mean_rmse")
            })?;
        }
    }

    for cell in &summary.curve_stats {
        writer.serialize(ExportRow {
            value: cell.stats.peak_abs,
            n: Some(cell.cycles as u64),
            ..ExportRow::subject_row(subject, cell.method.as_str(), &cell.variable, "peak_abs")
        })?;
        writer.serialize(ExportRow {
            value: cell.stats.mean_abs,
            n: Some(cell.cycles as u64),
            ..ExportRow::subject_row(subject, cell.method.as_str(), &cell.variable, "mean_abs")
        })?;
    }

    for residual in &summary.residuals {
        writer.serialize(ExportRow {
            value: residual.mean_peak,
            n: Some(residual.cycles as u64),
            ..ExportRow::subject_row(
                subject,
                residual.method.as_str(),
                residual.axis.as_str(),
                "mean_peak_residual",
            )
        })?;
        writer.serialize(ExportRow {
            value: f64::from(u8::from(residual.within_threshold)),
            ..ExportRow::subject_row(
                subject,
                residual.method.as_str(),
                residual.axis.as_str(),
                "within_threshold",
            )
        })?;
    }

    writer.serialize(ExportRow {
        value: summary.threshold.force_threshold_n,
        ..ExportRow::subject_row(subject, "", "", "force_threshold_n")
    })?;
    writer.serialize(ExportRow {
        value: summary.threshold.moment_threshold_nm,
        ..ExportRow::subject_row(subject, "", "", "moment_threshold_nm")
    })?;

    for run_time in &summary.run_times {
        writer.serialize(ExportRow {
            value: run_time.seconds,
            ..ExportRow::subject_row(subject, run_time.method.as_str(), "", "run_time_s")
        })?;
    }

    Ok(())
}

fn write_group_rows<W: Write>(
    report: &BatchReport,
    writer: &mut csv::Writer<W>,
) -> csv::Result<()> {
    let group = &report.group;

    for cell in &group.rmse {
        writer.serialize(ExportRow {
            other: cell.b.as_str(),
            value: cell.stat.mean,
            std_dev: Some(cell.stat.std_dev),
            n: Some(cell.stat.n as u64),
            ..ExportRow::group_row(cell.a.as_str(), &cell.variable, "mean_rmse")
        })?;
    }

    for cell in &group.curve_stats {
        writer.serialize(ExportRow {
            value: cell.peak_abs.mean,
            std_dev: Some(cell.peak_abs.std_dev),
            n: Some(cell.peak_abs.n as u64),
            ..ExportRow::group_row(cell.method.as_str(), &cell.variable, "peak_abs")
        })?;
        writer.serialize(ExportRow {
            value: cell.mean_abs.mean,
            std_dev: Some(cell.mean_abs.std_dev),
            n: Some(cell.mean_abs.n as u64),
            ..ExportRow::group_row(cell.method.as_str(), &cell.variable, "mean_abs")
        })?;
    }

    for cell in &group.residuals {
        writer.serialize(ExportRow {
            value: cell.stat.mean,
            std_dev: Some(cell.stat.std_dev),
            n: Some(cell.stat.n as u64),
            ..ExportRow::group_row(cell.method.as_str(), cell.axis.as_str(), "mean_peak_residual")
        })?;
    }

    for cell in &group.run_times {
        writer.serialize(ExportRow {
            value: cell.stat.mean,
            std_dev: Some(cell.stat.std_dev),
            n: Some(cell.stat.n as u64),
            ..ExportRow::group_row(cell.method.as_str(), "", "run_time_s")
        })?;
    }

    for ratio in &group.run_time_ratios {
        writer.serialize(ExportRow {
            other: ratio.b.as_str(),
            value: ratio.ratio,
            ..ExportRow::group_row(ratio.a.as_str(), "", "run_time_ratio")
        })?;
    }

    for ratio in &group.residual_ratios {
        writer.serialize(ExportRow {
            other: ratio.b.as_str(),
            value: ratio.ratio,
            ..ExportRow::group_row(ratio.a.as_str(), ratio.axis.as_str(), "peak_residual_ratio")
        })?;
    }

    Ok(())
}

/// Serialize a batch report to pretty-printed JSON.
///
/// # Errors
///
/// Returns the underlying `serde_json` error.
pub fn to_json(report: &BatchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Reload a batch report serialized with [`to_json`].
///
/// # Errors
///
/// Returns the underlying `serde_json` error.
pub fn from_json(json: &str) -> serde_json::Result<BatchReport> {
    serde_json::from_str(json)
}
