//! Per-policy report: everything one pipeline pass produced, and its text rendering.

use crate::bayes::{Class, Evidence, ParameterSet, Predictor};
use crate::binarize::{ColumnThresholds, ThresholdPolicy};
use crate::data::Column;
use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// One answered joint posterior query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPosterior {
    pub target: Class,
    pub evidence: Evidence,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyReport {
    pub policy: ThresholdPolicy,
    pub rows: usize,
    pub thresholds: ColumnThresholds,
    pub parameters: ParameterSet,
    pub joint: Vec<JointPosterior>,
    /// Single-factor posteriors, strongest first.
    pub factors: Vec<(Predictor, f64)>,
}

impl PolicyReport {
    pub fn strongest(&self) -> Option<(Predictor, f64)> {
        self.factors.first().copied()
    }

    pub fn weakest(&self) -> Option<(Predictor, f64)> {
        self.factors.last().copied()
    }
}

struct Fraction(f64);

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} ({:.2}%)", self.0, self.0 * 100.0)
    }
}

impl fmt::Display for PolicyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Threshold policy: {} ({}) ===",
            self.policy,
            self.policy.description()
        )?;
        writeln!(f, "Rows: {}", self.rows)?;

        writeln!(f, "Thresholds:")?;
        for column in Column::ALL {
            writeln!(f, "  {}: {:.4}", column, self.thresholds.get(column))?;
        }

        writeln!(f, "Parameters:")?;
        for (name, value) in self.parameters.entries() {
            writeln!(f, "  {}: {:.4}", name, value)?;
        }

        writeln!(f, "Joint posteriors:")?;
        for query in &self.joint {
            writeln!(
                f,
                "  P(E={} | {}) = {}",
                query.target.bit(),
                query.evidence,
                Fraction(query.probability)
            )?;
        }

        writeln!(f, "Single-factor posteriors:")?;
        for (predictor, posterior) in &self.factors {
            writeln!(
                f,
                "  P(E=1 | {}=1) [{}] = {}",
                predictor.symbol().to_uppercase(),
                predictor.label(),
                Fraction(*posterior)
            )?;
        }

        if let (Some((best, best_p)), Some((worst, worst_p))) = (self.strongest(), self.weakest()) {
            writeln!(
                f,
                "Insights: strongest predictor is {} at {}, weakest is {} at {}",
                best.label(),
                Fraction(best_p),
                worst.label(),
                Fraction(worst_p)
            )?;
        }

        Ok(())
    }
}

/// Renders every report into `out`, separated by blank lines.
pub fn render_reports<W: Write>(out: &mut W, reports: &[PolicyReport]) -> io::Result<()> {
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write!(out, "{}", report)?;
    }
    out.flush()
}

/// Writes all reports to `path` in one go, replacing whatever was there.
pub fn write_reports<P: AsRef<Path>>(path: P, reports: &[PolicyReport]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    render_reports(&mut out, reports)
}
