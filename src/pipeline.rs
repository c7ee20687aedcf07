//! One full pass per threshold policy: binarize, estimate, query, report.
//!
//! Each pass owns its binary table and shares nothing mutable with the others,
//! so a sweep runs the policies in parallel.

use crate::bayes::{self, BayesError, Class, Evidence};
use crate::binarize::{self, BinaryTable, ThresholdPolicy};
use crate::data::StudentTable;
use crate::report::{JointPosterior, PolicyReport};
use rayon::prelude::*;

/// The queries answered for every policy: each class against the all-one and all-zero evidence.
const JOINT_QUERIES: [(Class, Evidence); 4] = [
    (Class::High, Evidence::ALL_ONE),
    (Class::Low, Evidence::ALL_ONE),
    (Class::High, Evidence::ALL_ZERO),
    (Class::Low, Evidence::ALL_ZERO),
];

/// What a successful pass produced.
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    pub binary: BinaryTable,
    pub report: PolicyReport,
}

/// Binarizes `table` under `policy`, estimates the parameters and answers the report queries.
///
/// Any undefined posterior fails the whole run. A predictor column that never
/// binarizes to 1 (a constant column, for instance) leaves both class terms of the
/// all-one query at zero, so such a table fails under every policy.
pub fn run_policy(
    table: &StudentTable,
    policy: ThresholdPolicy,
) -> Result<PolicyOutcome, BayesError> {
    log::info!("Running pipeline with the {} threshold policy.", policy);

    let binary = binarize::binarize(table, policy);
    let parameters = bayes::estimate(&binary)?;

    let joint = JOINT_QUERIES
        .iter()
        .map(|&(target, evidence)| {
            bayes::joint_posterior(&parameters, target, &evidence).map(|probability| {
                JointPosterior {
                    target,
                    evidence,
                    probability,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let factors = bayes::rank_predictors(&parameters)?;

    let report = PolicyReport {
        policy,
        rows: binary.len(),
        thresholds: *binary.thresholds(),
        parameters,
        joint,
        factors,
    };
    Ok(PolicyOutcome { binary, report })
}

/// Runs every policy in `policies` independently. Results keep the order of `policies`;
/// a failed run does not affect the others.
pub fn run_sweep(
    table: &StudentTable,
    policies: &[ThresholdPolicy],
) -> Vec<(ThresholdPolicy, Result<PolicyOutcome, BayesError>)> {
    policies
        .par_iter()
        .map(|&policy| (policy, run_policy(table, policy)))
        .collect()
}
