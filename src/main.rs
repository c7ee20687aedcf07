use anyhow::{bail, Context, Result};
use clap::Parser;
use exam_bayes::{
    binarize::ThresholdPolicy,
    data::StudentTable,
    pipeline,
    report::{self, PolicyReport},
};
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

#[derive(Parser, Debug)]
#[clap(
    name = "exam_bayes",
    version,
    about = "Naive Bayes estimate of high exam scores from binarized student records."
)]
struct Args {
    /// Student records csv with a header row.
    input: PathBuf,

    /// Threshold policy to run. Repeat to run several; runs all four when omitted.
    #[clap(long, value_enum)]
    policy: Vec<ThresholdPolicy>,

    /// Write the reports to this file instead of stdout.
    #[clap(long)]
    output: Option<PathBuf>,

    /// Also save each binarized table as `binarized_<policy>.csv` in this directory.
    #[clap(long)]
    binarized_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Args::parse(), &mut io::stdout().lock())
}

/// Requested policies in order of first mention, or all four when none were given.
fn resolve_policies(requested: &[ThresholdPolicy]) -> Vec<ThresholdPolicy> {
    if requested.is_empty() {
        return ThresholdPolicy::ALL.to_vec();
    }
    let mut policies = Vec::with_capacity(requested.len());
    for &policy in requested {
        if !policies.contains(&policy) {
            policies.push(policy);
        }
    }
    policies
}

/// Runs every requested policy and writes the successful reports, to `--output`
/// or to `stdout`. Fails afterwards if any run or binarized table write failed.
fn run<W: Write>(args: Args, stdout: &mut W) -> Result<()> {
    let table = StudentTable::from_path(&args.input)
        .with_context(|| format!("failed to load student records from {}", args.input.display()))?;
    let policies = resolve_policies(&args.policy);

    if let Some(dir) = &args.binarized_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let mut reports: Vec<PolicyReport> = Vec::with_capacity(policies.len());
    let mut failures = 0;
    for (policy, result) in pipeline::run_sweep(&table, &policies) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("The {} threshold policy run failed: {}", policy, err);
                failures += 1;
                continue;
            }
        };

        if let Some(dir) = &args.binarized_dir {
            let path = dir.join(format!("binarized_{}.csv", policy));
            match outcome.binary.write_csv(&path) {
                Ok(()) => log::info!("Saved binarized table to {}", path.display()),
                Err(err) => {
                    log::error!("Failed to write {}: {}", path.display(), err);
                    failures += 1;
                }
            }
        }
        reports.push(outcome.report);
    }

    // Now we can write the result:
    match &args.output {
        Some(path) => {
            report::write_reports(path, &reports)
                .with_context(|| format!("failed to write reports to {}", path.display()))?;
            log::info!("Wrote {} report(s) to {}", reports.len(), path.display());
        }
        None => report::render_reports(stdout, &reports)?,
    }

    if failures > 0 {
        bail!("{} of {} threshold policy run(s) failed", failures, policies.len());
    }

    Ok(())
}
