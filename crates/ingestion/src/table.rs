//! Delimited table readers
//!
//! Every table starts with a timestamp column. Sensor tables carry `D` value
//! columns after it; any further columns (e.g. the pose quaternion) are ignored.

use std::path::Path;

use contracts::{FrameStream, SensorStream, StreamKind};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::{IngestionError, Result};

/// Options shared by every comma-separated table of a session
#[derive(Debug, Clone, Copy, Default)]
pub struct TableReader {
    has_headers: bool,
}

impl TableReader {
    pub fn new(has_headers: bool) -> Self {
        Self { has_headers }
    }

    /// Read a `(timestamp, v_0 .. v_{D-1}, ...)` table
    pub fn read_sensor<const D: usize>(
        &self,
        path: &Path,
        kind: StreamKind,
    ) -> Result<SensorStream<D>> {
        let mut rows = Vec::new();
        self.for_each_record(path, 1 + D, |line, record| {
            let timestamp = parse_field(path, line, record, 0)?;
            let mut value = [0.0; D];
            for (c, slot) in value.iter_mut().enumerate() {
                *slot = parse_field(path, line, record, c + 1)?;
            }
            rows.push((timestamp, value));
            Ok(())
        })?;

        debug!(table = %kind, path = %path.display(), rows = rows.len(), "table loaded");
        metrics::counter!("advio_sync_rows_read_total", "stream" => kind.as_str())
            .increment(rows.len() as u64);
        Ok(SensorStream::from_rows(rows))
    }

    /// Read a `(timestamp, frame_id)` table; the identifier is kept verbatim
    pub fn read_frames(&self, path: &Path) -> Result<FrameStream> {
        let mut rows = Vec::new();
        self.for_each_record(path, 2, |line, record| {
            let timestamp = parse_field(path, line, record, 0)?;
            let frame_id = record.get(1).unwrap_or_default();
            if frame_id.is_empty() {
                return Err(IngestionError::parse_failed(path, line, "empty frame id"));
            }
            rows.push((timestamp, frame_id.to_string()));
            Ok(())
        })?;

        let kind = StreamKind::Frames;
        debug!(table = %kind, path = %path.display(), rows = rows.len(), "table loaded");
        metrics::counter!("advio_sync_rows_read_total", "stream" => kind.as_str())
            .increment(rows.len() as u64);
        Ok(FrameStream::from_rows(rows))
    }

    fn for_each_record<F>(&self, path: &Path, min_columns: usize, mut on_record: F) -> Result<()>
    where
        F: FnMut(u64, &StringRecord) -> Result<()>,
    {
        let mut reader = ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|source| IngestionError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut count = 0usize;
        let mut record = StringRecord::new();
        loop {
            let line = reader.position().line();
            match reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => return Err(IngestionError::parse_failed(path, line, e.to_string())),
            }
            let line = record.position().map_or(line, |p| p.line());

            // Blank lines are skipped by the csv reader, a lone empty field is not
            if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
                continue;
            }
            if record.len() < min_columns {
                return Err(IngestionError::MissingColumns {
                    path: path.to_path_buf(),
                    line,
                    expected: min_columns,
                    found: record.len(),
                });
            }
            on_record(line, &record)?;
            count += 1;
        }

        if count == 0 {
            return Err(IngestionError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

fn parse_field(path: &Path, line: u64, record: &StringRecord, column: usize) -> Result<f64> {
    let raw = record.get(column).unwrap_or_default();
    raw.parse::<f64>().map_err(|e| {
        IngestionError::parse_failed(path, line, format!("column {column} '{raw}': {e}"))
    })
}
