// DataLog - fixed-width counter-delta records
//
// Every interval of counter time, the sampler emits one record holding the
// per-field growth of the counter since the previous record plus the
// current timestamp. Records are six little-endian u32 values, 24 bytes in
// total:
//
//   sleep | sit | walk | jog | steps | timestamp
//
// Before a daily reset the logger is flushed, so the partial interval up to
// the boundary still gets a record, then rebased so the next record holds
// the deltas of the new day only.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::tracking::Counter;

/// One data-log record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLogRecord {
    pub sleep_delta: u32,
    pub sit_delta: u32,
    pub walk_delta: u32,
    pub jog_delta: u32,
    pub steps_delta: u32,
    pub timestamp: u32,
}

impl DataLogRecord {
    /// Encoded size in bytes
    pub const SIZE: usize = 24;

    /// Growth of every counter field from `last` to `current`
    pub fn between(last: &Counter, current: &Counter) -> Self {
        Self {
            sleep_delta: current.sleep_time.saturating_sub(last.sleep_time),
            sit_delta: current.sit_time.saturating_sub(last.sit_time),
            walk_delta: current.walk_time.saturating_sub(last.walk_time),
            jog_delta: current.jog_time.saturating_sub(last.jog_time),
            steps_delta: current.steps.saturating_sub(last.steps),
            timestamp: current.timestamp,
        }
    }

    /// No counter field grew
    pub fn is_empty(&self) -> bool {
        self.fields()[..5].iter().all(|&delta| delta == 0)
    }

    fn fields(&self) -> [u32; 6] {
        [
            self.sleep_delta,
            self.sit_delta,
            self.walk_delta,
            self.jog_delta,
            self.steps_delta,
            self.timestamp,
        ]
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        for (chunk, field) in bytes.chunks_exact_mut(4).zip(self.fields()) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    /// Decode one record; `None` unless exactly [`Self::SIZE`] bytes are given
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        let mut fields = [0u32; 6];
        for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(4)) {
            *field = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let [sleep_delta, sit_delta, walk_delta, jog_delta, steps_delta, timestamp] = fields;
        Some(Self {
            sleep_delta,
            sit_delta,
            walk_delta,
            jog_delta,
            steps_delta,
            timestamp,
        })
    }
}

/// Decides when a record is due and computes it
#[derive(Debug, Clone)]
pub struct DataLogger {
    interval_secs: u32,
    last: Counter,
}

impl DataLogger {
    /// # Arguments
    /// * `interval_secs` - Counter time between records
    /// * `start` - Counter the first record's deltas are measured from
    pub fn new(interval_secs: u32, start: Counter) -> Self {
        Self {
            interval_secs: interval_secs.max(1),
            last: start,
        }
    }

    /// Counter the next record will be measured from
    pub fn baseline(&self) -> &Counter {
        &self.last
    }

    /// Emit a record once the counter has advanced a full interval
    pub fn observe(&mut self, counter: &Counter) -> Option<DataLogRecord> {
        let advanced = counter.timestamp.saturating_sub(self.last.timestamp);
        if advanced < self.interval_secs {
            return None;
        }
        let record = DataLogRecord::between(&self.last, counter);
        self.last = *counter;
        Some(record)
    }

    /// Emit whatever has accumulated since the last record, regardless of
    /// the interval
    ///
    /// Returns `None` when no counter field has grown. Called before a reset
    /// so the last partial interval of the day is not lost.
    pub fn flush(&mut self, counter: &Counter) -> Option<DataLogRecord> {
        let record = DataLogRecord::between(&self.last, counter);
        self.last = *counter;
        if record.is_empty() {
            return None;
        }
        Some(record)
    }

    /// Measure future deltas from `counter`, typically right after a reset
    pub fn rebase(&mut self, counter: &Counter) {
        self.last = *counter;
    }
}

/// Destination for data-log records
pub trait DataLogSink: Send {
    fn append(&mut self, record: &DataLogRecord) -> Result<(), StorageError>;
}

impl DataLogSink for Vec<DataLogRecord> {
    fn append(&mut self, record: &DataLogRecord) -> Result<(), StorageError> {
        self.push(*record);
        Ok(())
    }
}

/// Append-only binary file of encoded records
#[derive(Debug)]
pub struct FileDataLog {
    path: PathBuf,
    file: File,
}

impl FileDataLog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| StorageError::Io {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataLogSink for FileDataLog {
    fn append(&mut self, record: &DataLogRecord) -> Result<(), StorageError> {
        self.file
            .write_all(&record.to_bytes())
            .map_err(|err| StorageError::DataLog {
                reason: format!("{}: {}", self.path.display(), err),
            })
    }
}

/// Decode every complete record in a data-log file
///
/// A trailing partial record (an interrupted write) is skipped with a
/// warning.
pub fn read_data_log<P: AsRef<Path>>(path: P) -> Result<Vec<DataLogRecord>, StorageError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| StorageError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    let chunks = bytes.chunks_exact(DataLogRecord::SIZE);
    let trailing = chunks.remainder().len();
    if trailing > 0 {
        log::warn!(
            "[DataLog] Ignoring {} trailing bytes in {:?}",
            trailing,
            path
        );
    }
    Ok(chunks.filter_map(DataLogRecord::from_bytes).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(sleep: u32, walk: u32, steps: u32, timestamp: u32) -> Counter {
        Counter {
            sleep_time: sleep,
            walk_time: walk,
            steps,
            timestamp,
            ..Counter::default()
        }
    }

    #[test]
    fn test_record_layout_is_little_endian() {
        let record = DataLogRecord {
            sleep_delta: 1,
            sit_delta: 2,
            walk_delta: 0x0102_0304,
            jog_delta: 0,
            steps_delta: 300,
            timestamp: 0xAABB_CCDD,
        };
        let bytes = record.to_bytes();

        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[4, 3, 2, 1]);
        assert_eq!(&bytes[16..20], &[44, 1, 0, 0]);
        assert_eq!(&bytes[20..24], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(DataLogRecord::from_bytes(&bytes), Some(record));
        assert_eq!(DataLogRecord::from_bytes(&bytes[..23]), None);
    }

    #[test]
    fn test_logger_waits_for_full_interval() {
        let mut logger = DataLogger::new(60, counter(0, 0, 0, 1000));

        assert_eq!(logger.observe(&counter(8, 0, 0, 1008)), None);
        assert_eq!(logger.observe(&counter(50, 0, 0, 1059)), None);

        let record = logger.observe(&counter(54, 6, 9, 1063)).unwrap();
        assert_eq!(record.sleep_delta, 54);
        assert_eq!(record.walk_delta, 6);
        assert_eq!(record.steps_delta, 9);
        assert_eq!(record.timestamp, 1063);
        assert_eq!(logger.baseline().timestamp, 1063);

        assert_eq!(logger.observe(&counter(60, 6, 9, 1071)), None);
    }

    #[test]
    fn test_rebase_after_reset() {
        let mut logger = DataLogger::new(60, counter(500, 0, 40, 1000));
        logger.rebase(&Counter::starting_at(1030));

        let record = logger.observe(&counter(60, 0, 0, 1090)).unwrap();
        assert_eq!(record.sleep_delta, 60);
        assert_eq!(record.steps_delta, 0);
    }

    #[test]
    fn test_flush_emits_partial_interval() {
        let mut logger = DataLogger::new(60, counter(0, 0, 0, 1000));
        assert_eq!(logger.observe(&counter(0, 20, 14, 1020)), None);

        let record = logger.flush(&counter(0, 20, 14, 1020)).unwrap();
        assert_eq!(record.walk_delta, 20);
        assert_eq!(record.steps_delta, 14);
        assert_eq!(record.timestamp, 1020);
        assert_eq!(logger.baseline().timestamp, 1020);

        // Nothing grew since, so there is nothing to flush
        assert_eq!(logger.flush(&counter(0, 20, 14, 1030)), None);
        assert_eq!(logger.baseline().timestamp, 1030);
    }

    #[test]
    fn test_deltas_never_underflow() {
        let record = DataLogRecord::between(&counter(100, 100, 100, 0), &counter(0, 0, 0, 60));
        assert_eq!(record, DataLogRecord { timestamp: 60, ..DataLogRecord::default() });
    }

    #[test]
    fn test_file_log_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "activity_recognizer_datalog_{}.bin",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let records = [
            DataLogRecord::between(&counter(0, 0, 0, 0), &counter(60, 0, 0, 60)),
            DataLogRecord::between(&counter(60, 0, 0, 60), &counter(60, 60, 90, 120)),
        ];
        {
            let mut log = FileDataLog::open(&path).unwrap();
            for record in &records {
                log.append(record).unwrap();
            }
        }
        // Simulate an interrupted write
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(&[1, 2, 3])
            .unwrap();

        assert_eq!(read_data_log(&path).unwrap(), records.to_vec());
        let _ = fs::remove_file(&path);
    }
}
