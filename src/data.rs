//! Loading of the student table.
//!
//! Rows with a missing value in any column, including columns the model does
//! not use, are dropped as a whole. Anything else in a measured column that
//! cannot be read as a number is treated as malformed input.

use csv::StringRecord;
use std::{fmt, path::Path};
use thiserror::Error;

/// Name of the identifier column. Never binarized.
pub const ID_COLUMN: &str = "student_id";

/// Markers the usual dataframe tooling reads as "not available", besides the empty field.
const NA_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read csv input: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("the required column '{0}' was not found in the input header")]
    MissingColumn(String),
    #[error("column '{column}' on line {line} holds '{value}', which is not a finite number")]
    NonNumeric {
        column: &'static str,
        line: u64,
        value: String,
    },
    #[error("the input table has no complete rows")]
    EmptyTable,
}

/// One of the measured, numeric columns of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    HoursStudied,
    AttendancePercent,
    SleepHours,
    PreviousScores,
    ExamScore,
}

impl Column {
    /// Input order of the measured columns.
    pub const ALL: [Column; 5] = [
        Column::HoursStudied,
        Column::AttendancePercent,
        Column::SleepHours,
        Column::PreviousScores,
        Column::ExamScore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::HoursStudied => "hours_studied",
            Column::AttendancePercent => "attendance_percent",
            Column::SleepHours => "sleep_hours",
            Column::PreviousScores => "previous_scores",
            Column::ExamScore => "exam_score",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single complete row of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub student_id: String,
    pub hours_studied: f64,
    pub attendance_percent: f64,
    pub sleep_hours: f64,
    pub previous_scores: f64,
    pub exam_score: f64,
}

impl Record {
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::HoursStudied => self.hours_studied,
            Column::AttendancePercent => self.attendance_percent,
            Column::SleepHours => self.sleep_hours,
            Column::PreviousScores => self.previous_scores,
            Column::ExamScore => self.exam_score,
        }
    }
}

/// The cleaned input table, stored column by column.
///
/// Never empty. Shared read-only between every threshold policy run.
#[derive(Debug, Clone)]
pub struct StudentTable {
    student_ids: Vec<String>,
    columns: [Vec<f64>; 5],
}

impl StudentTable {
    pub fn from_records(records: Vec<Record>) -> Result<Self, DataError> {
        if records.is_empty() {
            return Err(DataError::EmptyTable);
        }

        let mut columns: [Vec<f64>; 5] = Default::default();
        for column in Column::ALL {
            columns[column.index()] = records.iter().map(|r| r.value(column)).collect();
        }
        let student_ids = records.into_iter().map(|r| r.student_id).collect();

        Ok(StudentTable {
            student_ids,
            columns,
        })
    }

    /// Reads a headed csv file, dropping every row that has a missing value.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, DataError> {
        let headers = reader.headers()?.clone();
        let id_index = find_column(&headers, ID_COLUMN)?;
        let mut indices = [0usize; 5];
        for column in Column::ALL {
            indices[column.index()] = find_column(&headers, column.name())?;
        }

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());

            // Row-wise deletion, no imputation:
            if record.iter().any(|f| is_missing(f.trim())) {
                dropped += 1;
                continue;
            }
            let id = record.get(id_index).map(str::trim).unwrap_or("");
            let mut values = [0.0; 5];
            for column in Column::ALL {
                values[column.index()] = parse_field(&record, indices[column.index()], column, line)?;
            }

            records.push(Record {
                student_id: id.to_string(),
                hours_studied: values[Column::HoursStudied.index()],
                attendance_percent: values[Column::AttendancePercent.index()],
                sleep_hours: values[Column::SleepHours.index()],
                previous_scores: values[Column::PreviousScores.index()],
                exam_score: values[Column::ExamScore.index()],
            });
        }

        if dropped > 0 {
            log::warn!("Dropped {} row(s) with missing values.", dropped);
        }
        log::info!("Loaded {} complete student record(s).", records.len());

        Self::from_records(records)
    }

    pub fn len(&self) -> usize {
        self.student_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty()
    }

    pub fn student_ids(&self) -> &[String] {
        &self.student_ids
    }

    pub fn column(&self, column: Column) -> &[f64] {
        &self.columns[column.index()]
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

fn is_missing(field: &str) -> bool {
    field.is_empty() || NA_MARKERS.contains(&field)
}

fn parse_field(
    record: &StringRecord,
    index: usize,
    column: Column,
    line: u64,
) -> Result<f64, DataError> {
    let field = record.get(index).map(str::trim).unwrap_or("");
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DataError::NonNumeric {
            column: column.name(),
            line,
            value: field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::{self, Write};
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "student_id,hours_studied,attendance_percent,sleep_hours,previous_scores,exam_score";

    fn create_test_csv(content: &str) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{}", content)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn loads_complete_rows_column_major() {
        let file = create_test_csv(&format!(
            "{HEADER}\nS1,10,90,7,85,80\nS2,2.5,40,4,30,35"
        ))
        .unwrap();
        let table = StudentTable::from_path(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.student_ids(), ["S1", "S2"]);
        assert_abs_diff_eq!(table.column(Column::HoursStudied)[1], 2.5);
        assert_eq!(table.column(Column::ExamScore), [80.0, 35.0]);
    }

    #[test]
    fn column_order_follows_the_header_not_the_position() {
        let file = create_test_csv(
            "exam_score,previous_scores,student_id,sleep_hours,attendance_percent,hours_studied,notes\n\
             50,60,S1,7,80,3,ok",
        )
        .unwrap();
        let table = StudentTable::from_path(file.path()).unwrap();

        assert_eq!(table.column(Column::HoursStudied), [3.0]);
        assert_eq!(table.column(Column::PreviousScores), [60.0]);
        assert_eq!(table.column(Column::ExamScore), [50.0]);
    }

    #[test]
    fn rows_with_missing_values_are_dropped() {
        let file = create_test_csv(&format!(
            "{HEADER}\nS1,10,90,7,85,80\nS2,,40,4,30,35\nS3,1,NA,4,30,35\n,1,40,4,30,35\nS5,3,50,6,40,NaN\nS6,n/a,50,6,40,60\nS7,3,None,6,40,60\nS8,3,50,<NA>,40,60"
        ))
        .unwrap();
        let table = StudentTable::from_path(file.path()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.student_ids(), ["S1"]);
    }

    #[test]
    fn every_dataframe_na_marker_drops_the_row() {
        for marker in NA_MARKERS {
            let file = create_test_csv(&format!(
                "{HEADER}\nS1,10,90,7,85,80\nS2,2,40,4,30,35\nS3,{marker},40,4,30,0"
            ))
            .unwrap();
            let table = StudentTable::from_path(file.path())
                .unwrap_or_else(|e| panic!("marker '{marker}' was not treated as missing: {e}"));

            assert_eq!(table.len(), 2, "marker '{marker}'");
        }
    }

    #[test]
    fn missing_value_in_an_unused_column_drops_the_row() {
        let file = create_test_csv(&format!(
            "{HEADER},notes\nS1,10,90,7,85,80,ok\nS2,2,40,4,30,35,\nS3,1,30,3,20,25,None"
        ))
        .unwrap();
        let table = StudentTable::from_path(file.path()).unwrap();

        assert_eq!(table.student_ids(), ["S1"]);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let file = create_test_csv("student_id,hours_studied,attendance_percent,sleep_hours,exam_score\nS1,1,2,3,4").unwrap();
        let err = StudentTable::from_path(file.path()).unwrap_err();

        assert!(matches!(err, DataError::MissingColumn(ref c) if c == "previous_scores"));
    }

    #[test]
    fn non_numeric_value_is_malformed() {
        let file = create_test_csv(&format!("{HEADER}\nS1,10,90,7,85,80\nS2,lots,40,4,30,35")).unwrap();
        let err = StudentTable::from_path(file.path()).unwrap_err();

        match err {
            DataError::NonNumeric {
                column,
                line,
                value,
            } => {
                assert_eq!(column, "hours_studied");
                assert_eq!(line, 3);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn infinite_values_are_malformed() {
        let file = create_test_csv(&format!("{HEADER}\nS1,inf,90,7,85,80")).unwrap();
        let err = StudentTable::from_path(file.path()).unwrap_err();

        assert!(matches!(err, DataError::NonNumeric { .. }));
    }

    #[test]
    fn table_without_complete_rows_is_rejected() {
        let file = create_test_csv(&format!("{HEADER}\nS1,,90,7,85,80")).unwrap();
        let err = StudentTable::from_path(file.path()).unwrap_err();
        assert!(matches!(err, DataError::EmptyTable));

        assert!(matches!(
            StudentTable::from_records(Vec::new()),
            Err(DataError::EmptyTable)
        ));
    }
}
