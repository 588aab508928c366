// Storage module - key-value persistence and the data log
//
// Durable state lives in a small integer-keyed store: one key per counter
// field and per setting. A missing key always means "use the default".
// Writes happen at controlled points (shutdown, settings changes), never
// on the sampling path.
//
// Module organization:
// - mod.rs: KeyValueStore trait, keys, in-memory/JSON-file/shared stores
// - data_log: fixed-width counter-delta records

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{log_storage_error, StorageError};
use crate::tracking::{Counter, TrackerSettings, DEFAULT_SENSITIVITY};

pub mod data_log;

pub use data_log::{read_data_log, DataLogRecord, DataLogSink, DataLogger, FileDataLog};

/// Persisted keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PersistKey {
    SleepTime = 0,
    SitTime = 1,
    WalkTime = 2,
    JogTime = 3,
    Steps = 4,
    Timestamp = 5,
    ResetTime = 7,
    SpeedThreshold = 8,
    Driving = 9,
    Sensitivity = 11,
    StepGoal = 12,
    ActiveTimeGoal = 13,
}

impl PersistKey {
    pub fn id(self) -> u32 {
        self as u32
    }
}

/// One stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Bool(bool),
    Int(i32),
}

/// Integer-keyed persistence store
pub trait KeyValueStore: Send {
    fn read(&self, key: u32) -> Result<Option<StoredValue>, StorageError>;

    fn write(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError>;

    /// Make previous writes durable
    fn flush(&mut self) -> Result<(), StorageError>;

    fn read_int(&self, key: PersistKey) -> Result<Option<i32>, StorageError> {
        match self.read(key.id())? {
            None => Ok(None),
            Some(StoredValue::Int(value)) => Ok(Some(value)),
            Some(StoredValue::Bool(_)) => Err(StorageError::TypeMismatch {
                key: key.id(),
                expected: "int",
            }),
        }
    }

    fn read_bool(&self, key: PersistKey) -> Result<Option<bool>, StorageError> {
        match self.read(key.id())? {
            None => Ok(None),
            Some(StoredValue::Bool(value)) => Ok(Some(value)),
            Some(StoredValue::Int(_)) => Err(StorageError::TypeMismatch {
                key: key.id(),
                expected: "bool",
            }),
        }
    }

    fn write_int(&mut self, key: PersistKey, value: i32) -> Result<(), StorageError> {
        self.write(key.id(), StoredValue::Int(value))
    }

    fn write_bool(&mut self, key: PersistKey, value: bool) -> Result<(), StorageError> {
        self.write(key.id(), StoredValue::Bool(value))
    }
}

/// Volatile store, used by tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<u32, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: u32) -> Result<Option<StoredValue>, StorageError> {
        Ok(self.values.get(&key).copied())
    }

    fn write(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError> {
        self.values.insert(key, value);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Store backed by a JSON document
///
/// Values are held in memory and the whole document is rewritten on
/// `flush`, through a temporary file renamed over the original.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<u32, StoredValue>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the document at `path`; a missing file is an empty store
    ///
    /// # Returns
    /// * `Ok(JsonFileStore)` - Store holding the persisted values
    /// * `Err(StorageError)` - If the file exists but cannot be read or parsed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|err| StorageError::Corrupt {
                    reason: format!("{}: {}", path.display(), err),
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("[Store] No state at {:?}, starting empty", path);
                BTreeMap::new()
            }
            Err(err) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                })
            }
        };

        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Open the document, falling back to an empty store on any error
    pub fn open_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::open(&path) {
            Ok(store) => store,
            Err(err) => {
                crate::error::log_storage_error(&err, "JsonFileStore::open_or_empty");
                log::warn!(
                    "[Store] Using empty state; {:?} will be overwritten on flush",
                    path.as_ref()
                );
                Self {
                    path: path.as_ref().to_path_buf(),
                    values: BTreeMap::new(),
                    dirty: false,
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored values, for inspection tools
    pub fn entries(&self) -> &BTreeMap<u32, StoredValue> {
        &self.values
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: u32) -> Result<Option<StoredValue>, StorageError> {
        Ok(self.values.get(&key).copied())
    }

    fn write(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError> {
        if self.values.insert(key, value) != Some(value) {
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }
        let io_error = |err: std::io::Error| StorageError::Io {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        };

        let json = serde_json::to_string_pretty(&self.values).map_err(|err| {
            StorageError::Corrupt {
                reason: err.to_string(),
            }
        })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(io_error)?;
        fs::rename(&tmp, &self.path).map_err(io_error)?;

        log::debug!("[Store] Flushed {} keys to {:?}", self.values.len(), self.path);
        self.dirty = false;
        Ok(())
    }
}

/// Clonable handle to one store shared by the sampling and display loops
pub struct SharedStore<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SharedStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` with exclusive access to the underlying store
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, StorageError> {
        let mut guard = self.inner.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(f(&mut guard))
    }
}

impl<S: KeyValueStore> KeyValueStore for SharedStore<S> {
    fn read(&self, key: u32) -> Result<Option<StoredValue>, StorageError> {
        self.with(|store| store.read(key))?
    }

    fn write(&mut self, key: u32, value: StoredValue) -> Result<(), StorageError> {
        self.with(|store| store.write(key, value))?
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.with(|store| store.flush())?
    }
}

fn read_u32(store: &dyn KeyValueStore, key: PersistKey) -> Result<Option<u32>, StorageError> {
    Ok(store.read_int(key)?.map(|value| value as u32))
}

/// Unwrap one key read, falling back to `default` when the key is absent
///
/// A key holding the wrong kind of value is logged and treated as absent so
/// the remaining keys still load. Failures of the store itself propagate.
pub fn value_or_default<T>(
    read: Result<Option<T>, StorageError>,
    default: T,
) -> Result<T, StorageError> {
    match read {
        Ok(value) => Ok(value.unwrap_or(default)),
        Err(err @ StorageError::TypeMismatch { .. }) => {
            log_storage_error(&err, "storage::value_or_default");
            Ok(default)
        }
        Err(err) => Err(err),
    }
}

/// Load the durable counter
///
/// Missing or unreadable fields are zero; a missing timestamp means `now`.
pub fn load_counter(store: &dyn KeyValueStore, now: u32) -> Result<Counter, StorageError> {
    let field = |key| value_or_default(read_u32(store, key), 0);
    Ok(Counter {
        sleep_time: field(PersistKey::SleepTime)?,
        sit_time: field(PersistKey::SitTime)?,
        walk_time: field(PersistKey::WalkTime)?,
        jog_time: field(PersistKey::JogTime)?,
        steps: field(PersistKey::Steps)?,
        timestamp: value_or_default(read_u32(store, PersistKey::Timestamp), now)?,
    })
}

/// Write every counter field; values round-trip through i32 bit-exactly
pub fn save_counter(store: &mut dyn KeyValueStore, counter: &Counter) -> Result<(), StorageError> {
    store.write_int(PersistKey::SleepTime, counter.sleep_time as i32)?;
    store.write_int(PersistKey::SitTime, counter.sit_time as i32)?;
    store.write_int(PersistKey::WalkTime, counter.walk_time as i32)?;
    store.write_int(PersistKey::JogTime, counter.jog_time as i32)?;
    store.write_int(PersistKey::Steps, counter.steps as i32)?;
    store.write_int(PersistKey::Timestamp, counter.timestamp as i32)
}

/// Load tracker settings, clamping out-of-range stored values
pub fn load_settings(store: &dyn KeyValueStore) -> Result<TrackerSettings, StorageError> {
    let sensitivity = value_or_default(
        store.read_int(PersistKey::Sensitivity),
        DEFAULT_SENSITIVITY as i32,
    )?
    .clamp(0, crate::tracking::MAX_SENSITIVITY as i32);
    let reset_minutes = value_or_default(store.read_int(PersistKey::ResetTime), 0)?
        .clamp(0, crate::tracking::MAX_RESET_MINUTES as i32);

    Ok(TrackerSettings {
        sensitivity: sensitivity as u8,
        reset_minutes: reset_minutes as u16,
        driving: value_or_default(store.read_bool(PersistKey::Driving), false)?,
    })
}

pub fn save_settings(
    store: &mut dyn KeyValueStore,
    settings: &TrackerSettings,
) -> Result<(), StorageError> {
    store.write_int(PersistKey::Sensitivity, settings.sensitivity as i32)?;
    store.write_int(PersistKey::ResetTime, settings.reset_minutes as i32)?;
    store.write_bool(PersistKey::Driving, settings.driving)
}
