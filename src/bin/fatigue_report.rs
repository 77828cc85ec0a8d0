use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fatigue_reliability::analysis::{run_analysis, AnalysisConfig, AnalysisReport};
use fatigue_reliability::output::{create_timestamped_output_dir, write_report};

#[derive(Debug, Parser)]
#[command(author, version, about = "Fatigue damage, reliability and Monte Carlo life report")]
struct Cli {
    /// Analysis configuration (.toml or .json); the built-in AISI 1045 scenario when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory; each run writes into a timestamped subdirectory
    #[arg(long, default_value = "output-fatigue-report")]
    output: PathBuf,

    /// Monte Carlo trial count
    #[arg(long)]
    trials: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Weibull shape parameter
    #[arg(long)]
    beta: Option<f64>,

    /// Print the report without writing CSV/JSON files
    #[arg(long, default_value_t = false)]
    no_export: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fatigue_reliability={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(v) = cli.trials {
        config.monte_carlo.trial_count = v;
    }
    if let Some(v) = cli.seed {
        config.monte_carlo.seed = Some(v);
    }
    if let Some(v) = cli.beta {
        config.reliability.shape = v;
    }

    let report = run_analysis(&config).context("analysis failed")?;
    print_report(&report);

    if !cli.no_export {
        let output_dir = create_timestamped_output_dir(&cli.output)?;
        let paths = write_report(&output_dir, &report)?;
        println!();
        println!("Run directory: {}", paths.output_dir.display());
        println!("Summary: {}", paths.summary.display());
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config: AnalysisConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&raw)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))?,
        Some("json") => serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON config: {}", path.display()))?,
        _ => bail!(
            "unsupported config extension (expected .toml or .json): {}",
            path.display()
        ),
    };
    Ok(config)
}

fn print_report(report: &AnalysisReport) {
    println!("=== FATIGUE DAMAGE REPORT ===");
    println!("Material: {}", report.material.name);
    for block in &report.blocks {
        println!(
            "Block {}: sigma_eq = {:.1} MPa | Nf = {:.0} | Damage = {:.4}",
            block.block + 1,
            block.equivalent_stress,
            block.cycles_to_failure,
            block.damage
        );
    }
    println!();
    println!("Total cumulative damage D = {:.6}", report.total_damage());
    println!("Status: {:?}", report.damage.status());

    println!();
    println!("=== RELIABILITY MODEL ===");
    println!("Weibull beta = {}", report.weibull.shape);
    println!("Weibull eta  = {:.0} cycles", report.weibull.scale);
    println!("MTBF         = {:.0} cycles", report.mtbf);
    println!(
        "B{:.0} life     = {:.0} cycles",
        report.b_life_fraction * 100.0,
        report.b_life
    );

    let mc = &report.monte_carlo;
    println!();
    println!("=== MONTE CARLO LIFE ===");
    println!(
        "Trials = {} | rejected = {} ({:.2}%) | seed = {}",
        mc.trial_count(),
        mc.rejected_trials(),
        100.0 * mc.failed_trial_rate(),
        mc.seed()
    );
    println!("Mean life = {:.0} cycles", mc.mean_life());
    println!("Std dev   = {:.0} cycles", mc.std_life());
    if let (Some(p5), Some(p95)) = (mc.percentile(5.0), mc.percentile(95.0)) {
        println!("5% life   = {p5:.0} cycles");
        println!("95% life  = {p95:.0} cycles");
    }
}
