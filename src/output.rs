//! CSV and JSON export of analysis series for downstream plotting.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use csv::Writer;
use serde::Serialize;

use crate::analysis::{AnalysisReport, AnalysisSummary};
use crate::error::Stage;
use crate::monte_carlo::{LifeHistogram, MonteCarloResult, TrialOutcome};

pub const BLOCKS_FILE: &str = "blocks.csv";
pub const CURVE_FILE: &str = "weibull_curve.csv";
pub const SAMPLES_FILE: &str = "life_samples.csv";
pub const HISTOGRAM_FILE: &str = "life_histogram.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const CONVERGENCE_FILE: &str = "convergence.csv";

/// Approximate number of rows in the convergence trace.
pub const CONVERGENCE_POINTS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct LifeSampleRow {
    pub trial: usize,
    pub life: f64,
    pub damage: Option<f64>,
    pub rejected: bool,
    pub stage: Option<Stage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramRow {
    pub bin: usize,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceRow {
    pub trial: usize,
    pub mean_life: f64,
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub output_dir: PathBuf,
    pub blocks: PathBuf,
    pub curve: PathBuf,
    pub samples: PathBuf,
    pub histogram: Option<PathBuf>,
    pub convergence: PathBuf,
    pub summary: PathBuf,
}

pub fn ensure_outdir(outdir: &Path) -> Result<()> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("failed to create output directory: {}", outdir.display()))
}

/// Creates `<root>/<UTC timestamp>`, suffixing a counter when the name is taken.
pub fn create_timestamped_output_dir(root: &Path) -> Result<PathBuf> {
    ensure_outdir(root)?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let mut output_dir = root.join(&timestamp);
    let mut counter = 1_u32;
    while output_dir.exists() {
        output_dir = root.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    ensure_outdir(&output_dir)?;
    Ok(output_dir)
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

pub fn life_sample_rows(result: &MonteCarloResult) -> Vec<LifeSampleRow> {
    result
        .outcomes()
        .iter()
        .zip(result.life_samples())
        .enumerate()
        .map(|(trial, (outcome, &life))| match outcome {
            TrialOutcome::Completed { damage, .. } => LifeSampleRow {
                trial,
                life,
                damage: Some(*damage),
                rejected: false,
                stage: None,
            },
            TrialOutcome::Rejected { error } => LifeSampleRow {
                trial,
                life,
                damage: None,
                rejected: true,
                stage: Some(error.stage()),
            },
        })
        .collect()
}

pub fn histogram_rows(histogram: &LifeHistogram) -> Vec<HistogramRow> {
    histogram
        .counts
        .iter()
        .enumerate()
        .map(|(bin, &count)| HistogramRow {
            bin,
            lower: histogram.edges[bin],
            upper: histogram.edges[bin + 1],
            count,
        })
        .collect()
}

pub fn convergence_rows(result: &MonteCarloResult) -> Vec<ConvergenceRow> {
    let stride = (result.trial_count() / CONVERGENCE_POINTS).max(1);
    result
        .convergence_trace(stride)
        .into_iter()
        .map(|(trial, mean_life)| ConvergenceRow { trial, mean_life })
        .collect()
}

pub fn write_summary_json(path: &Path, summary: &AnalysisSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Writes every series of `report` into `output_dir`.
pub fn write_report(output_dir: &Path, report: &AnalysisReport) -> Result<ReportPaths> {
    ensure_outdir(output_dir)?;

    let blocks = output_dir.join(BLOCKS_FILE);
    write_csv(&blocks, &report.blocks)?;

    let curve = output_dir.join(CURVE_FILE);
    write_csv(&curve, &report.curve)?;

    let samples = output_dir.join(SAMPLES_FILE);
    write_csv(&samples, &life_sample_rows(&report.monte_carlo))?;

    let histogram = match &report.histogram {
        Some(hist) => {
            let path = output_dir.join(HISTOGRAM_FILE);
            write_csv(&path, &histogram_rows(hist))?;
            Some(path)
        }
        None => None,
    };

    let convergence = output_dir.join(CONVERGENCE_FILE);
    write_csv(&convergence, &convergence_rows(&report.monte_carlo))?;

    let summary = output_dir.join(SUMMARY_FILE);
    write_summary_json(&summary, &report.summary())?;

    Ok(ReportPaths {
        output_dir: output_dir.to_path_buf(),
        blocks,
        curve,
        samples,
        histogram,
        convergence,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::LoadCycle;
    use crate::material::MaterialProperties;
    use crate::monte_carlo::{run_monte_carlo, PerturbationSpec};

    #[test]
    fn histogram_rows_pair_edges() {
        let hist = LifeHistogram {
            bin_width: 1.0,
            edges: vec![0.0, 1.0, 2.0],
            counts: vec![3, 4],
        };
        let rows = histogram_rows(&hist);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[1].lower, rows[1].upper, rows[1].count), (1.0, 2.0, 4));
    }

    #[test]
    fn convergence_rows_are_thinned_to_the_last_trial() {
        let result = run_monte_carlo(
            1000,
            &MaterialProperties::aisi_1045(),
            &LoadCycle::new(320.0, 40.0, 1),
            PerturbationSpec::strength_scatter(0.05),
            Some(8),
        )
        .expect("valid config");
        let rows = convergence_rows(&result);
        assert_eq!(rows.len(), 200);
        assert_eq!(rows[0].trial, 5);
        let last = rows.last().expect("non-empty");
        assert_eq!(last.trial, 1000);
        assert!((last.mean_life - result.mean_life()).abs() < 1e-6 * result.mean_life());
    }

    #[test]
    fn timestamped_dirs_do_not_collide() {
        let root = tempfile::tempdir().expect("temp dir");
        let a = create_timestamped_output_dir(root.path()).expect("first dir");
        let b = create_timestamped_output_dir(root.path()).expect("second dir");
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
    }

    #[test]
    fn rejected_trials_carry_their_stage() {
        let result = run_monte_carlo(
            1,
            &MaterialProperties::aisi_1045(),
            &LoadCycle::new(800.0, 700.0, 1),
            PerturbationSpec::none(),
            Some(1),
        )
        .expect("valid config");
        let rows = life_sample_rows(&result);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].rejected);
        assert_eq!(rows[0].life, 0.0);
        assert_eq!(rows[0].damage, None);
        assert_eq!(rows[0].stage, Some(Stage::Correction));
    }
}
