use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::models::{Settings, StreakRecord, TaskRecord, Theme};

pub const TASKS_KEY: &str = "tasks";
pub const STREAK_KEY: &str = "streak";
pub const REWARDS_KEY: &str = "rewards";
pub const THEME_KEY: &str = "theme";
pub const SETTINGS_KEY: &str = "settings";

/// The boundary the task store loads from and saves to.
pub trait TaskPersistence: Send {
    fn load_tasks(&self) -> Result<Vec<TaskRecord>, StorageError>;
    fn save_tasks(&self, tasks: &[TaskRecord]) -> Result<(), StorageError>;
}

/// Key-value store with one JSON document per key under `root`.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T, StorageError> {
        let mut file = File::open(self.path_for(key))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// Missing documents are expected on first run; anything else is logged.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(value) => value,
            Err(error) if error.is_missing() => T::default(),
            Err(error) => {
                log::warn!("falling back to default key={key} error={error}");
                T::default()
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        self.write_atomic(self.path_for(key), data)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }

    pub fn load_streak(&self) -> StreakRecord {
        self.load_or_default(STREAK_KEY)
    }

    pub fn save_streak(&self, streak: &StreakRecord) -> Result<(), StorageError> {
        self.save(STREAK_KEY, streak)
    }

    pub fn load_rewards(&self) -> Vec<String> {
        self.load_or_default(REWARDS_KEY)
    }

    pub fn save_rewards(&self, rewards: &[String]) -> Result<(), StorageError> {
        self.save(REWARDS_KEY, &rewards)
    }

    pub fn load_theme(&self) -> Theme {
        self.load_or_default(THEME_KEY)
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.save(THEME_KEY, &theme)
    }

    pub fn load_settings(&self) -> Settings {
        self.load_or_default(SETTINGS_KEY)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.save(SETTINGS_KEY, settings)
    }
}

impl TaskPersistence for Storage {
    /// Entries that cannot be read as a task record are skipped, not fatal.
    fn load_tasks(&self) -> Result<Vec<TaskRecord>, StorageError> {
        let raw: Vec<serde_json::Value> = self.load(TASKS_KEY)?;
        let mut records = Vec::with_capacity(raw.len());
        for (index, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<TaskRecord>(value) {
                Ok(record) => records.push(record),
                Err(error) => {
                    log::warn!("skipping unreadable task record index={index} error={error}")
                }
            }
        }
        Ok(records)
    }

    fn save_tasks(&self, tasks: &[TaskRecord]) -> Result<(), StorageError> {
        self.save(TASKS_KEY, &tasks)
    }
}
