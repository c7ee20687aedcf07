//! Binarization of the measured columns under a threshold policy.

use crate::data::{Column, StudentTable, ID_COLUMN};
use std::{fmt, path::Path};

/// How the cut point of a column is chosen. One policy applies to every column of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ThresholdPolicy {
    /// 75th percentile.
    TopQuartile,
    /// Arithmetic mean.
    Mean,
    /// 90th percentile.
    TopDecile,
    /// Mean plus one sample standard deviation.
    MeanPlusStd,
}

impl ThresholdPolicy {
    pub const ALL: [ThresholdPolicy; 4] = [
        ThresholdPolicy::TopQuartile,
        ThresholdPolicy::Mean,
        ThresholdPolicy::TopDecile,
        ThresholdPolicy::MeanPlusStd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ThresholdPolicy::TopQuartile => "top-quartile",
            ThresholdPolicy::Mean => "mean",
            ThresholdPolicy::TopDecile => "top-decile",
            ThresholdPolicy::MeanPlusStd => "mean-plus-std",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ThresholdPolicy::TopQuartile => "top 25% (75th percentile)",
            ThresholdPolicy::Mean => "above the mean",
            ThresholdPolicy::TopDecile => "top 10% (90th percentile)",
            ThresholdPolicy::MeanPlusStd => "above mean + 1 standard deviation",
        }
    }

    /// Cut point for a column. `None` only for an empty column.
    ///
    /// A constant column always yields its own value, so it binarizes to all zeros.
    pub fn threshold(self, values: &[f64]) -> Option<f64> {
        let (&first, rest) = values.split_first()?;
        if rest.iter().all(|&v| v == first) {
            return Some(first);
        }

        let t = match self {
            ThresholdPolicy::TopQuartile => percentile(values, 0.75),
            ThresholdPolicy::Mean => mean(values),
            ThresholdPolicy::TopDecile => percentile(values, 0.90),
            ThresholdPolicy::MeanPlusStd => mean(values) + sample_std(values),
        };
        Some(t)
    }
}

impl fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divisor n - 1). Zero for fewer than two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let squares = values.iter().fold(0.0, |acc, &v| acc + (v - m) * (v - m));
    (squares / (values.len() - 1) as f64).sqrt()
}

/// Percentile with linear interpolation between the closest ranks.
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Cut points used for one binarization, per column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnThresholds {
    pub hours_studied: f64,
    pub attendance_percent: f64,
    pub sleep_hours: f64,
    pub previous_scores: f64,
    pub exam_score: f64,
}

impl ColumnThresholds {
    pub fn get(&self, column: Column) -> f64 {
        match column {
            Column::HoursStudied => self.hours_studied,
            Column::AttendancePercent => self.attendance_percent,
            Column::SleepHours => self.sleep_hours,
            Column::PreviousScores => self.previous_scores,
            Column::ExamScore => self.exam_score,
        }
    }

    fn set(&mut self, column: Column, value: f64) {
        let slot = match column {
            Column::HoursStudied => &mut self.hours_studied,
            Column::AttendancePercent => &mut self.attendance_percent,
            Column::SleepHours => &mut self.sleep_hours,
            Column::PreviousScores => &mut self.previous_scores,
            Column::ExamScore => &mut self.exam_score,
        };
        *slot = value;
    }
}

/// The student table with every measured value replaced by a 0/1 indicator.
#[derive(Debug, Clone)]
pub struct BinaryTable {
    policy: ThresholdPolicy,
    student_ids: Vec<String>,
    columns: [Vec<u8>; 5],
    thresholds: ColumnThresholds,
}

/// Binarizes every measured column of `table`: 1 if the value is strictly above
/// the column's threshold, 0 otherwise. The input table is left untouched.
pub fn binarize(table: &StudentTable, policy: ThresholdPolicy) -> BinaryTable {
    let mut columns: [Vec<u8>; 5] = Default::default();
    let mut thresholds = ColumnThresholds {
        hours_studied: 0.0,
        attendance_percent: 0.0,
        sleep_hours: 0.0,
        previous_scores: 0.0,
        exam_score: 0.0,
    };

    for (slot, column) in columns.iter_mut().zip(Column::ALL) {
        let values = table.column(column);
        // A `StudentTable` is never empty, so this always has a value:
        let t = policy.threshold(values).unwrap_or_default();
        *slot = values.iter().map(|&x| u8::from(x > t)).collect();
        thresholds.set(column, t);

        log::debug!(
            "[{}] {} threshold {:.4}, {} of {} above",
            policy,
            column,
            t,
            slot.iter().filter(|&&b| b == 1).count(),
            values.len()
        );
    }

    BinaryTable {
        policy,
        student_ids: table.student_ids().to_vec(),
        columns,
        thresholds,
    }
}

impl BinaryTable {
    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    pub fn thresholds(&self) -> &ColumnThresholds {
        &self.thresholds
    }

    pub fn len(&self) -> usize {
        self.student_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty()
    }

    pub fn column(&self, column: Column) -> &[u8] {
        &self.columns[column.index()]
    }

    /// Builds a table from already binarized columns, in `Column::ALL` order.
    #[cfg(test)]
    pub(crate) fn from_parts(
        policy: ThresholdPolicy,
        student_ids: Vec<String>,
        columns: [Vec<u8>; 5],
    ) -> Self {
        BinaryTable {
            policy,
            student_ids,
            columns,
            thresholds: ColumnThresholds {
                hours_studied: 0.5,
                attendance_percent: 0.5,
                sleep_hours: 0.5,
                previous_scores: 0.5,
                exam_score: 0.5,
            },
        }
    }

    /// Writes the table back out with the same header as the raw input.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec![ID_COLUMN];
        header.extend(Column::ALL.iter().map(|c| c.name()));
        writer.write_record(&header)?;

        for (row, id) in self.student_ids.iter().enumerate() {
            let mut record = vec![id.clone()];
            record.extend(self.columns.iter().map(|c| c[row].to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use approx::assert_abs_diff_eq;

    fn record(id: &str, h: f64, a: f64, s: f64, p: f64, e: f64) -> Record {
        Record {
            student_id: id.to_string(),
            hours_studied: h,
            attendance_percent: a,
            sleep_hours: s,
            previous_scores: p,
            exam_score: e,
        }
    }

    fn scenario_table() -> StudentTable {
        StudentTable::from_records(vec![
            record("S1", 10.0, 90.0, 7.0, 85.0, 1.0),
            record("S2", 2.0, 40.0, 4.0, 30.0, 0.0),
            record("S3", 8.0, 85.0, 6.0, 80.0, 1.0),
            record("S4", 1.0, 30.0, 3.0, 20.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn thresholds_per_policy() {
        let values = [1.0, 2.0, 8.0, 10.0];

        assert_abs_diff_eq!(
            ThresholdPolicy::Mean.threshold(&values).unwrap(),
            5.25,
            epsilon = 1e-12
        );
        // position 2.25 between 8 and 10
        assert_abs_diff_eq!(
            ThresholdPolicy::TopQuartile.threshold(&values).unwrap(),
            8.5,
            epsilon = 1e-12
        );
        // position 2.7 between 8 and 10
        assert_abs_diff_eq!(
            ThresholdPolicy::TopDecile.threshold(&values).unwrap(),
            9.4,
            epsilon = 1e-12
        );
        // sample variance = 58.75 / 3
        assert_abs_diff_eq!(
            ThresholdPolicy::MeanPlusStd.threshold(&values).unwrap(),
            5.25 + (58.75f64 / 3.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn percentile_ignores_input_order() {
        let values = [10.0, 1.0, 8.0, 2.0];
        assert_abs_diff_eq!(
            ThresholdPolicy::TopQuartile.threshold(&values).unwrap(),
            8.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn empty_column_has_no_threshold() {
        for policy in ThresholdPolicy::ALL {
            assert_eq!(policy.threshold(&[]), None);
        }
    }

    #[test]
    fn single_value_std_is_zero() {
        assert_eq!(sample_std(&[4.0]), 0.0);
    }

    #[test]
    fn mean_policy_scenario() {
        let binary = binarize(&scenario_table(), ThresholdPolicy::Mean);

        assert_eq!(binary.column(Column::HoursStudied), [1, 0, 1, 0]);
        assert_eq!(binary.column(Column::ExamScore), [1, 0, 1, 0]);
        assert_abs_diff_eq!(binary.thresholds().hours_studied, 5.25, epsilon = 1e-12);
        assert_eq!(binary.policy(), ThresholdPolicy::Mean);
        assert_eq!(binary.len(), 4);
    }

    #[test]
    fn values_equal_to_the_threshold_map_to_zero() {
        // mean of 1, 2, 3 is exactly 2
        let table = StudentTable::from_records(vec![
            record("a", 1.0, 1.0, 1.0, 1.0, 1.0),
            record("b", 2.0, 2.0, 2.0, 2.0, 2.0),
            record("c", 3.0, 3.0, 3.0, 3.0, 3.0),
        ])
        .unwrap();
        let binary = binarize(&table, ThresholdPolicy::Mean);

        assert_eq!(binary.column(Column::SleepHours), [0, 0, 1]);
    }

    #[test]
    fn constant_column_binarizes_to_zeros() {
        let table = StudentTable::from_records(
            (0..7)
                .map(|i| record(&i.to_string(), 0.1, i as f64, 7.3, 0.7, i as f64))
                .collect(),
        )
        .unwrap();

        for policy in ThresholdPolicy::ALL {
            let binary = binarize(&table, policy);
            assert!(binary.column(Column::HoursStudied).iter().all(|&b| b == 0));
            assert!(binary.column(Column::SleepHours).iter().all(|&b| b == 0));
            assert!(binary.column(Column::PreviousScores).iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn every_binarized_value_is_zero_or_one() {
        let table = scenario_table();
        for policy in ThresholdPolicy::ALL {
            let binary = binarize(&table, policy);
            for column in Column::ALL {
                assert_eq!(binary.column(column).len(), table.len());
                assert!(binary.column(column).iter().all(|&b| b <= 1));
            }
        }
    }

    #[test]
    fn raw_table_is_not_mutated() {
        let table = scenario_table();
        let before = table.column(Column::HoursStudied).to_vec();
        let _ = binarize(&table, ThresholdPolicy::TopQuartile);
        let _ = binarize(&table, ThresholdPolicy::Mean);

        assert_eq!(table.column(Column::HoursStudied), before.as_slice());
    }

    #[test]
    fn writes_binarized_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binarized_mean.csv");
        binarize(&scenario_table(), ThresholdPolicy::Mean)
            .write_csv(&path)
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("student_id,hours_studied,attendance_percent,sleep_hours,previous_scores,exam_score")
        );
        assert_eq!(lines.next(), Some("S1,1,1,1,1,1"));
        assert_eq!(lines.next(), Some("S2,0,0,0,0,0"));
        assert_eq!(lines.count(), 2);
    }
}
