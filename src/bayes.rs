//! Naive Bayes over the binarized table: parameter estimation from frequency
//! counts and the posteriors built from them.

use crate::binarize::BinaryTable;
use crate::data::Column;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BayesError {
    #[error("degenerate class: no rows with exam_score={} among {rows} binarized row(s)", .class.bit())]
    DegenerateClass { class: Class, rows: usize },
    #[error("invalid factor '{0}', expected one of p, s, a, h or a predictor column name")]
    InvalidFactor(String),
    #[error("posterior {query} is undefined: both class terms are zero")]
    UndefinedPosterior { query: String },
}

/// Value of the binarized `exam_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    /// E=0
    Low,
    /// E=1
    High,
}

impl Class {
    pub fn bit(self) -> u8 {
        match self {
            Class::Low => 0,
            Class::High => 1,
        }
    }

    pub fn complement(self) -> Class {
        match self {
            Class::Low => Class::High,
            Class::High => Class::Low,
        }
    }
}

/// One of the four binarized predictor variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predictor {
    PreviousScores,
    SleepHours,
    AttendancePercent,
    HoursStudied,
}

impl Predictor {
    pub const ALL: [Predictor; 4] = [
        Predictor::PreviousScores,
        Predictor::SleepHours,
        Predictor::AttendancePercent,
        Predictor::HoursStudied,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Predictor::PreviousScores => "p",
            Predictor::SleepHours => "s",
            Predictor::AttendancePercent => "a",
            Predictor::HoursStudied => "h",
        }
    }

    pub fn column(self) -> Column {
        match self {
            Predictor::PreviousScores => Column::PreviousScores,
            Predictor::SleepHours => Column::SleepHours,
            Predictor::AttendancePercent => Column::AttendancePercent,
            Predictor::HoursStudied => Column::HoursStudied,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Predictor::PreviousScores => "Previous Scores",
            Predictor::SleepHours => "Sleep Hours",
            Predictor::AttendancePercent => "Attendance",
            Predictor::HoursStudied => "Hours Studied",
        }
    }
}

impl FromStr for Predictor {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predictor::ALL
            .into_iter()
            .find(|p| s == p.symbol() || s == p.column().name())
            .ok_or_else(|| BayesError::InvalidFactor(s.to_string()))
    }
}

/// An assignment of 0/1 to each predictor, conditioning a posterior query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Evidence {
    pub previous_scores: bool,
    pub sleep_hours: bool,
    pub attendance_percent: bool,
    pub hours_studied: bool,
}

impl Evidence {
    pub const ALL_ONE: Evidence = Evidence::uniform(true);
    pub const ALL_ZERO: Evidence = Evidence::uniform(false);

    pub const fn uniform(value: bool) -> Self {
        Evidence {
            previous_scores: value,
            sleep_hours: value,
            attendance_percent: value,
            hours_studied: value,
        }
    }

    pub fn get(&self, predictor: Predictor) -> bool {
        match predictor {
            Predictor::PreviousScores => self.previous_scores,
            Predictor::SleepHours => self.sleep_hours,
            Predictor::AttendancePercent => self.attendance_percent,
            Predictor::HoursStudied => self.hours_studied,
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H={}, S={}, A={}, P={}",
            u8::from(self.hours_studied),
            u8::from(self.sleep_hours),
            u8::from(self.attendance_percent),
            u8::from(self.previous_scores)
        )
    }
}

/// P(X=v | E=c) for one predictor X, all four (v, c) combinations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Likelihoods {
    pub one_given_high: f64,
    pub one_given_low: f64,
    pub zero_given_high: f64,
    pub zero_given_low: f64,
}

impl Likelihoods {
    pub fn get(&self, value: bool, class: Class) -> f64 {
        match (value, class) {
            (true, Class::High) => self.one_given_high,
            (true, Class::Low) => self.one_given_low,
            (false, Class::High) => self.zero_given_high,
            (false, Class::Low) => self.zero_given_low,
        }
    }
}

/// Estimated Naive Bayes parameters for one binarized table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    /// P(E=1)
    pub high: f64,
    /// P(E=0)
    pub low: f64,
    pub previous_scores: Likelihoods,
    pub sleep_hours: Likelihoods,
    pub attendance_percent: Likelihoods,
    pub hours_studied: Likelihoods,
}

impl ParameterSet {
    pub fn prior(&self, class: Class) -> f64 {
        match class {
            Class::High => self.high,
            Class::Low => self.low,
        }
    }

    pub fn likelihoods(&self, predictor: Predictor) -> &Likelihoods {
        match predictor {
            Predictor::PreviousScores => &self.previous_scores,
            Predictor::SleepHours => &self.sleep_hours,
            Predictor::AttendancePercent => &self.attendance_percent,
            Predictor::HoursStudied => &self.hours_studied,
        }
    }

    /// P(`predictor`=`value` | E=`class`)
    pub fn likelihood(&self, predictor: Predictor, value: bool, class: Class) -> f64 {
        self.likelihoods(predictor).get(value, class)
    }

    /// Every parameter under its conventional short name (`e_1`, `p_1_given_e_0`, ...).
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut entries = vec![("e_1".to_string(), self.high), ("e_0".to_string(), self.low)];
        for predictor in Predictor::ALL {
            for (value, class) in [
                (true, Class::High),
                (true, Class::Low),
                (false, Class::High),
                (false, Class::Low),
            ] {
                let name = format!(
                    "{}_{}_given_e_{}",
                    predictor.symbol(),
                    u8::from(value),
                    class.bit()
                );
                entries.push((name, self.likelihood(predictor, value, class)));
            }
        }
        entries
    }

    /// Prior times every likelihood of `evidence`, for one class.
    fn class_term(&self, class: Class, evidence: &Evidence) -> f64 {
        Predictor::ALL.iter().fold(self.prior(class), |acc, &p| {
            acc * self.likelihood(p, evidence.get(p), class)
        })
    }

    /// P(E=1 | `predictor`=1) from that single predictor alone.
    pub fn factor_posterior(&self, predictor: Predictor) -> Result<f64, BayesError> {
        let high = self.likelihood(predictor, true, Class::High) * self.high;
        let low = self.likelihood(predictor, true, Class::Low) * self.low;

        if high + low == 0.0 {
            return Err(BayesError::UndefinedPosterior {
                query: format!("P(E=1 | {}=1)", predictor.symbol().to_uppercase()),
            });
        }
        Ok(high / (high + low))
    }
}

/// Estimates priors and class-conditional likelihoods from frequency counts.
///
/// Fails with `DegenerateClass` if either class has no rows, before any division.
pub fn estimate(table: &BinaryTable) -> Result<ParameterSet, BayesError> {
    let exam = table.column(Column::ExamScore);
    let rows = exam.len();
    let num_high = exam.iter().filter(|&&e| e == 1).count();
    let num_low = rows - num_high;

    // Validate both classes before dividing by their counts:
    for (class, count) in [(Class::High, num_high), (Class::Low, num_low)] {
        if count == 0 {
            return Err(BayesError::DegenerateClass { class, rows });
        }
    }

    let likelihoods = |predictor: Predictor| {
        let (mut one_high, mut one_low) = (0usize, 0usize);
        for (&x, &e) in table.column(predictor.column()).iter().zip(exam) {
            match (x, e) {
                (1, 1) => one_high += 1,
                (1, _) => one_low += 1,
                _ => {}
            }
        }
        log::debug!(
            "[{}] {}: {} of {} high and {} of {} low rows are 1",
            table.policy(),
            predictor.column(),
            one_high,
            num_high,
            one_low,
            num_low
        );

        Likelihoods {
            one_given_high: one_high as f64 / num_high as f64,
            one_given_low: one_low as f64 / num_low as f64,
            zero_given_high: (num_high - one_high) as f64 / num_high as f64,
            zero_given_low: (num_low - one_low) as f64 / num_low as f64,
        }
    };

    Ok(ParameterSet {
        high: num_high as f64 / rows as f64,
        low: num_low as f64 / rows as f64,
        previous_scores: likelihoods(Predictor::PreviousScores),
        sleep_hours: likelihoods(Predictor::SleepHours),
        attendance_percent: likelihoods(Predictor::AttendancePercent),
        hours_studied: likelihoods(Predictor::HoursStudied),
    })
}

/// P(E=`target` | `evidence`) under the conditional independence assumption,
/// normalised over both classes.
///
/// If both class terms are zero the posterior is undefined and an error is returned.
pub fn joint_posterior(
    params: &ParameterSet,
    target: Class,
    evidence: &Evidence,
) -> Result<f64, BayesError> {
    let numerator = params.class_term(target, evidence);
    let denominator = numerator + params.class_term(target.complement(), evidence);

    if denominator == 0.0 {
        return Err(BayesError::UndefinedPosterior {
            query: format!("P(E={} | {})", target.bit(), evidence),
        });
    }
    Ok(numerator / denominator)
}

/// P(E=1 | `factor`=1) for a predictor named by symbol (`p`, `s`, `a`, `h`) or column name.
pub fn single_factor_posterior(params: &ParameterSet, factor: &str) -> Result<f64, BayesError> {
    let predictor: Predictor = factor.parse()?;
    params.factor_posterior(predictor)
}

/// Predictors ordered from the strongest single-factor posterior to the weakest.
pub fn rank_predictors(params: &ParameterSet) -> Result<Vec<(Predictor, f64)>, BayesError> {
    let mut ranked = Predictor::ALL
        .into_iter()
        .map(|p| params.factor_posterior(p).map(|posterior| (p, posterior)))
        .collect::<Result<Vec<_>, _>>()?;
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(ranked)
}
