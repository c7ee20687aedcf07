//! Naive Bayes estimate of how likely a student is to get a high exam score,
//! from binarized study habits and prior results.
//!
//! The raw table is binarized under a threshold policy, parameters are
//! estimated from frequency counts, and posteriors are combined from them.
//! `pipeline` runs that once per policy.

pub mod bayes;
pub mod binarize;
pub mod data;
pub mod pipeline;
pub mod report;
