//! Assignment sinks and CSV writers.
//!
//! The classifier produces an ordered sequence of records; a sink decides what
//! happens to them. The CSV export is meant to be easy to consume in
//! spreadsheets or downstream scripts.
//!
//! CSV columns: `x,y,status,accepted,candidate,nearest,candidate_y,deviation`.
//! `candidate` is the assigned candidate and is empty unless `accepted`;
//! `nearest`, `candidate_y` and `deviation` describe the nearest chosen
//! candidate whenever one matched the grid.

use std::fs::File;
use std::path::Path;

use crate::domain::{AssignmentRecord, CurveSet, TestPoint};
use crate::error::AppError;

/// Destination for classified records.
pub trait AssignmentSink {
    /// Accept the next batch of records, in order.
    fn accept(&mut self, records: &[AssignmentRecord]) -> Result<(), AppError>;

    /// Flush any buffered output.
    fn finish(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<AssignmentRecord>,
}

impl AssignmentSink for VecSink {
    fn accept(&mut self, records: &[AssignmentRecord]) -> Result<(), AppError> {
        self.records.extend_from_slice(records);
        Ok(())
    }
}

/// Writes records as CSV rows.
pub struct CsvSink<W: std::io::Write> {
    writer: csv::Writer<W>,
}

const HEADER: [&str; 8] = [
    "x",
    "y",
    "status",
    "accepted",
    "candidate",
    "nearest",
    "candidate_y",
    "deviation",
];

impl CsvSink<File> {
    /// Create (or truncate) a CSV file and write the header.
    pub fn create(path: &Path) -> Result<Self, AppError> {
        let file = File::create(path).map_err(|e| {
            AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display()))
        })?;
        Self::new(file)
    }
}

impl<W: std::io::Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self, AppError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer
            .write_record(HEADER)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;
        Ok(Self { writer })
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, AppError> {
        self.writer
            .into_inner()
            .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
    }
}

impl<W: std::io::Write> AssignmentSink for CsvSink<W> {
    fn accept(&mut self, records: &[AssignmentRecord]) -> Result<(), AppError> {
        for r in records {
            let nearest = r.nearest.as_ref();
            let row = [
                r.point.x.to_string(),
                r.point.y.to_string(),
                r.status.label().to_string(),
                r.accepted().to_string(),
                r.assigned_candidate().unwrap_or_default().to_string(),
                nearest.map(|n| n.candidate_id.clone()).unwrap_or_default(),
                nearest.map(|n| n.candidate_y.to_string()).unwrap_or_default(),
                nearest.map(|n| n.deviation.to_string()).unwrap_or_default(),
            ];
            self.writer
                .write_record(&row)
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AppError> {
        self.writer
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))
    }
}

/// Write all records to a CSV file.
pub fn write_results_csv(path: &Path, records: &[AssignmentRecord]) -> Result<(), AppError> {
    let mut sink = CsvSink::create(path)?;
    sink.accept(records)?;
    sink.finish()?;
    log::info!("wrote {} assignment rows to {}", records.len(), path.display());
    Ok(())
}

/// Write a curve set in the wide `x,<id>...` layout read by `ingest`.
pub fn write_curve_table_csv(path: &Path, curves: &CurveSet) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    let mut header = vec!["x".to_string()];
    header.extend(curves.ids().iter().cloned());
    write_row(&mut writer, &header)?;

    for (row, x) in curves.grid().iter().enumerate() {
        let mut fields = Vec::with_capacity(curves.len() + 1);
        fields.push(x.to_string());
        fields.extend((0..curves.len()).map(|idx| curves.value(row, idx).to_string()));
        write_row(&mut writer, &fields)?;
    }
    flush(&mut writer)
}

/// Write test points as `x,y`.
pub fn write_test_points_csv(path: &Path, points: &[TestPoint]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, &["x".to_string(), "y".to_string()])?;
    for p in points {
        write_row(&mut writer, &[p.x.to_string(), p.y.to_string()])?;
    }
    flush(&mut writer)
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))
}

fn write_row(writer: &mut csv::Writer<File>, fields: &[String]) -> Result<(), AppError> {
    writer
        .write_record(fields)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))
}

fn flush(writer: &mut csv::Writer<File>) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssignmentStatus, NearestCandidate, TestPoint};

    fn records() -> Vec<AssignmentRecord> {
        vec![
            AssignmentRecord {
                point: TestPoint::new(1.0, 1.25),
                status: AssignmentStatus::Assigned,
                nearest: Some(NearestCandidate {
                    candidate_id: "y42".into(),
                    candidate_y: 1.0,
                    deviation: 0.25,
                }),
            },
            AssignmentRecord {
                point: TestPoint::new(2.0, 9.0),
                status: AssignmentStatus::ToleranceExceeded,
                nearest: Some(NearestCandidate {
                    candidate_id: "y11".into(),
                    candidate_y: 4.0,
                    deviation: 5.0,
                }),
            },
            AssignmentRecord {
                point: TestPoint::new(0.5, 0.0),
                status: AssignmentStatus::NoGridMatch,
                nearest: None,
            },
        ]
    }

    #[test]
    fn csv_sink_writes_nullable_columns() {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        sink.accept(&records()).unwrap();
        sink.finish().unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x,y,status,accepted,candidate,nearest,candidate_y,deviation");
        assert_eq!(lines[1], "1,1.25,assigned,true,y42,y42,1,0.25");
        assert_eq!(lines[2], "2,9,tolerance_exceeded,false,,y11,4,5");
        assert_eq!(lines[3], "0.5,0,no_grid_match,false,,,,");
    }

    #[test]
    fn vec_sink_keeps_batches_in_order() {
        let mut sink = VecSink::default();
        let all = records();
        sink.accept(&all[..1]).unwrap();
        sink.accept(&all[1..]).unwrap();
        assert_eq!(sink.records, all);
    }

    #[test]
    fn results_file_round_trips_through_csv_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_results_csv(&path, &records()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][2], "tolerance_exceeded");
    }

    #[test]
    fn written_tables_load_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let grid = vec![-0.3, 0.1, 0.7];
        let curves = CurveSet::new(
            grid.clone(),
            vec![
                ("y1".into(), vec![1.0 / 3.0, 2.0, -5.5]),
                ("y2".into(), vec![0.1 + 0.2, 0.0, 1e-9]),
            ],
        )
        .unwrap();

        let path = dir.path().join("ideal.csv");
        write_curve_table_csv(&path, &curves).unwrap();
        let loaded = crate::io::load_curve_table(&path).unwrap().curves;
        assert_eq!(loaded.grid(), curves.grid());
        assert_eq!(loaded.ids(), curves.ids());
        assert_eq!(loaded.column(0), curves.column(0));
        assert_eq!(loaded.column(1), curves.column(1));

        let points = vec![TestPoint::new(0.1, 2.5), TestPoint::new(9.0, -1.0 / 7.0)];
        let path = dir.path().join("test.csv");
        write_test_points_csv(&path, &points).unwrap();
        assert_eq!(crate::io::load_test_points(&path).unwrap().points, points);
    }
}
