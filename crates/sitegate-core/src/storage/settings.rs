//! User settings: the block list and the daily window.
//!
//! Settings live in a key-value [`SettingsStore`] and are written only by the
//! settings form. [`load_settings`] reads them for each reconciliation and
//! substitutes defaults per missing key, so a partially written store never
//! resets unrelated fields.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{SettingsError, ValidationError};
use crate::window::BlockWindow;

pub const KEY_BLOCKED_SITES: &str = "blocked_sites";
pub const KEY_START_HOUR: &str = "start_hour";
pub const KEY_END_HOUR: &str = "end_hour";
pub const SETTINGS_KEYS: [&str; 3] = [KEY_BLOCKED_SITES, KEY_START_HOUR, KEY_END_HOUR];

pub const DEFAULT_START_HOUR: i64 = 9;
pub const DEFAULT_END_HOUR: i64 = 17;

/// Upper bound on a single store read.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Raw key-value view of the store.
pub type SettingsMap = serde_json::Map<String, Value>;

/// Settings as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub blocked_sites: Vec<String>,
    /// Unchecked; validated when the window is built.
    pub start_hour: i64,
    pub end_hour: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocked_sites: Vec::new(),
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }
}

impl Settings {
    /// The configured window, failing on hours outside 0-23.
    pub fn window(&self) -> Result<BlockWindow, ValidationError> {
        BlockWindow::from_raw(self.start_hour, self.end_hour)
    }

    /// Build settings from raw store values, defaulting each key independently.
    pub fn from_map(map: &SettingsMap) -> Self {
        let defaults = Self::default();
        Self {
            blocked_sites: map
                .get(KEY_BLOCKED_SITES)
                .and_then(sites_from_value)
                .unwrap_or(defaults.blocked_sites),
            start_hour: map
                .get(KEY_START_HOUR)
                .and_then(|v| hour_from_value(KEY_START_HOUR, v))
                .unwrap_or(defaults.start_hour),
            end_hour: map
                .get(KEY_END_HOUR)
                .and_then(|v| hour_from_value(KEY_END_HOUR, v))
                .unwrap_or(defaults.end_hour),
        }
    }

    /// Store representation of these settings.
    pub fn to_map(&self) -> SettingsMap {
        let mut map = SettingsMap::new();
        map.insert(KEY_BLOCKED_SITES.into(), Value::from(self.blocked_sites.clone()));
        map.insert(KEY_START_HOUR.into(), Value::from(self.start_hour));
        map.insert(KEY_END_HOUR.into(), Value::from(self.end_hour));
        map
    }
}

fn sites_from_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => {
                        warn!(value = %other, "Ignoring non-string entry in blocked_sites");
                        None
                    }
                })
                .collect(),
        ),
        Value::Null => None,
        other => {
            warn!(value = %other, "Stored blocked_sites is not a list, using default");
            None
        }
    }
}

fn hour_from_value(key: &str, value: &Value) -> Option<i64> {
    match value.as_i64() {
        Some(hour) => Some(hour),
        None => {
            if !value.is_null() {
                warn!(key, value = %value, "Stored hour is not an integer, using default");
            }
            None
        }
    }
}

/// Notification that the store was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChange {
    /// Keys named by the write; empty when the writer is unknown.
    pub keys: Vec<String>,
}

/// Asynchronous key-value settings storage.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the given keys. Absent keys are simply missing from the map.
    async fn get(&self, keys: &[&str]) -> Result<SettingsMap, SettingsError>;

    /// Merge `values` into the store and notify subscribers.
    async fn set(&self, values: SettingsMap) -> Result<(), SettingsError>;

    /// Subscribe to write notifications.
    fn subscribe(&self) -> broadcast::Receiver<SettingsChange>;
}

/// Read the current settings.
///
/// Missing keys get their defaults; a failing or stalled store is an error.
pub async fn load_settings(store: &dyn SettingsStore) -> Result<Settings, SettingsError> {
    let map = tokio::time::timeout(READ_TIMEOUT, store.get(&SETTINGS_KEYS)).await??;
    let settings = Settings::from_map(&map);
    debug!(
        sites = settings.blocked_sites.len(),
        start_hour = settings.start_hour,
        end_hour = settings.end_hour,
        "Loaded settings"
    );
    Ok(settings)
}

fn pick(map: &SettingsMap, keys: &[&str]) -> SettingsMap {
    keys.iter()
        .filter_map(|k| map.get(*k).map(|v| ((*k).to_string(), v.clone())))
        .collect()
}

/// In-process store.
pub struct MemorySettingsStore {
    values: Mutex<SettingsMap>,
    changes: broadcast::Sender<SettingsChange>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::with_values(SettingsMap::new())
    }

    pub fn with_values(values: SettingsMap) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: Mutex::new(values),
            changes,
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<SettingsMap, SettingsError> {
        Ok(pick(&*self.values.lock().await, keys))
    }

    async fn set(&self, values: SettingsMap) -> Result<(), SettingsError> {
        let keys = values.keys().cloned().collect();
        self.values.lock().await.extend(values);
        let _ = self.changes.send(SettingsChange { keys });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.changes.subscribe()
    }
}

/// TOML file store at `<data_dir>/settings.toml`.
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<SettingsChange>,
    /// Modification time of our own last write, so the watcher skips it.
    last_written: Arc<std::sync::Mutex<Option<SystemTime>>>,
}

impl FileSettingsStore {
    pub fn open(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join("settings.toml"))
    }

    pub fn with_path(path: PathBuf) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path,
            write_lock: Mutex::new(()),
            changes,
            last_written: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_failed(&self, message: impl ToString) -> SettingsError {
        SettingsError::ReadFailed {
            location: self.path.display().to_string(),
            message: message.to_string(),
        }
    }

    fn write_failed(&self, message: impl ToString) -> SettingsError {
        SettingsError::WriteFailed {
            location: self.path.display().to_string(),
            message: message.to_string(),
        }
    }

    async fn read_all(&self) -> Result<SettingsMap, SettingsError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SettingsMap::new()),
            Err(e) => return Err(self.read_failed(e)),
        };
        let table: toml::Table =
            toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?;
        match serde_json::to_value(table).map_err(|e| SettingsError::Parse(e.to_string()))? {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::Parse("settings file is not a table".into())),
        }
    }

    /// Poll the file's modification time and notify subscribers when another
    /// process rewrites it.
    pub fn spawn_watcher(&self, poll: Duration) -> JoinHandle<()> {
        let path = self.path.clone();
        let changes = self.changes.clone();
        let last_written = Arc::clone(&self.last_written);

        tokio::spawn(async move {
            let mut seen = modified(&path).await;
            let mut interval = tokio::time::interval(poll);
            interval.tick().await;
            loop {
                interval.tick().await;
                let current = modified(&path).await;
                if current == seen {
                    continue;
                }
                seen = current;

                let ours = last_written.lock().map(|g| *g == current).unwrap_or(false);
                if ours {
                    continue;
                }
                debug!(path = %path.display(), "Settings file changed on disk");
                let _ = changes.send(SettingsChange { keys: Vec::new() });
            }
        })
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<SettingsMap, SettingsError> {
        Ok(pick(&self.read_all().await?, keys))
    }

    async fn set(&self, values: SettingsMap) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;
        let keys: Vec<String> = values.keys().cloned().collect();

        let mut merged = self.read_all().await?;
        merged.extend(values);
        let table = toml::Value::try_from(&merged).map_err(|e| self.write_failed(e))?;
        let content = toml::to_string_pretty(&table).map_err(|e| self.write_failed(e))?;
        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| self.write_failed(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.write_failed(e))?;

        let written_at = modified(&self.path).await;
        if let Ok(mut last) = self.last_written.lock() {
            *last = written_at;
        }
        let _ = self.changes.send(SettingsChange { keys });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn map(value: Value) -> SettingsMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    struct StalledStore;

    #[async_trait]
    impl SettingsStore for StalledStore {
        async fn get(&self, _keys: &[&str]) -> Result<SettingsMap, SettingsError> {
            std::future::pending().await
        }

        async fn set(&self, _values: SettingsMap) -> Result<(), SettingsError> {
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
            broadcast::channel(1).1
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SettingsStore for FailingStore {
        async fn get(&self, _keys: &[&str]) -> Result<SettingsMap, SettingsError> {
            Err(SettingsError::ReadFailed {
                location: "test".into(),
                message: "unavailable".into(),
            })
        }

        async fn set(&self, _values: SettingsMap) -> Result<(), SettingsError> {
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
            broadcast::channel(1).1
        }
    }

    #[tokio::test]
    async fn test_empty_store_yields_defaults() {
        let store = MemorySettingsStore::new();
        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.start_hour, 9);
        assert_eq!(settings.end_hour, 17);
        assert!(settings.blocked_sites.is_empty());
    }

    #[tokio::test]
    async fn test_defaults_are_per_key() {
        let store = MemorySettingsStore::with_values(map(json!({
            "blocked_sites": ["example.com"],
            "end_hour": 6,
        })));
        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings.blocked_sites, vec!["example.com".to_string()]);
        assert_eq!(settings.start_hour, 9);
        assert_eq!(settings.end_hour, 6);
    }

    #[tokio::test]
    async fn test_wrong_types_fall_back_per_key() {
        let store = MemorySettingsStore::with_values(map(json!({
            "blocked_sites": "example.com",
            "start_hour": "22",
            "end_hour": 6.5,
        })));
        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_out_of_range_hours_survive_loading() {
        let store = MemorySettingsStore::with_values(map(json!({ "start_hour": 30 })));
        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings.start_hour, 30);
        assert!(settings.window().is_err());
    }

    #[tokio::test]
    async fn test_read_failure_is_not_defaulted() {
        let err = load_settings(&FailingStore).await.unwrap_err();
        assert!(matches!(err, SettingsError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn test_memory_store_notifies_on_write() {
        let store = MemorySettingsStore::new();
        let mut rx = store.subscribe();
        store.set(map(json!({ "start_hour": 1 }))).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.keys, vec!["start_hour".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_and_merge() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::open(dir.path());

        assert!(store.get(&SETTINGS_KEYS).await.unwrap().is_empty());

        store
            .set(map(json!({ "blocked_sites": ["a.com", "b.com"], "start_hour": 22 })))
            .await
            .unwrap();
        store.set(map(json!({ "end_hour": 6 }))).await.unwrap();

        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings.blocked_sites, vec!["a.com".to_string(), "b.com".to_string()]);
        assert_eq!(settings.start_hour, 22);
        assert_eq!(settings.end_hour, 6);
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::open(dir.path());
        std::fs::write(store.path(), "blocked_sites = [").unwrap();
        assert!(matches!(
            load_settings(&store).await,
            Err(SettingsError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_file_store_notifies_subscribers() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::open(dir.path());
        let mut rx = store.subscribe();
        store.set(Settings::default().to_map()).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.keys.len(), 3);
    }

    #[tokio::test]
    async fn test_watcher_sees_external_write() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::open(dir.path());
        let mut rx = store.subscribe();
        let watcher = store.spawn_watcher(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::write(store.path(), "start_hour = 3\n").unwrap();

        let change = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher did not fire")
            .unwrap();
        assert!(change.keys.is_empty());
        watcher.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_times_out() {
        let err = load_settings(&StalledStore).await.unwrap_err();
        assert!(matches!(err, SettingsError::Timeout { timeout_ms: 5000 }));
    }

    #[tokio::test]
    async fn test_file_set_replaces_file_atomically() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::open(dir.path());
        store
            .set(map(json!({ "blocked_sites": ["a.com"], "start_hour": 9 })))
            .await
            .unwrap();
        store.set(map(json!({ "end_hour": 18 }))).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["settings.toml".to_string()]);

        let content = std::fs::read_to_string(store.path()).unwrap();
        let table: toml::Table = toml::from_str(&content).unwrap();
        assert_eq!(table["end_hour"].as_integer(), Some(18));
        assert_eq!(table["start_hour"].as_integer(), Some(9));
    }
}
