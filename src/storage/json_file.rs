//! JSON array files
//!
//! Writes go to a sibling `.tmp` file that is renamed over the target, so a
//! crash mid-write leaves the previous collection intact.

use super::{KeyedRecordStore, Record};
use crate::errors::{BotError, BotResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct JsonFileStore<R: Record> {
    name: String,
    path: PathBuf,
    /// Returned (and persisted, if the file is missing) when the file cannot be used
    fallback: Vec<R>,
}

impl<R: Record> JsonFileStore<R> {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            fallback: Vec::new(),
        }
    }

    /// Records to start from when the file does not exist or cannot be parsed
    pub fn with_fallback(mut self, fallback: Vec<R>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl<R: Record> KeyedRecordStore<R> for JsonFileStore<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Vec<R> {
        let started = Instant::now();

        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger::warning(
                    LogTag::Storage,
                    &format!(
                        "{} file {} not found, creating it with {} record(s)",
                        self.name,
                        self.path.display(),
                        self.fallback.len()
                    ),
                );
                if let Err(e) = self.save(&self.fallback).await {
                    logger::error(
                        LogTag::Storage,
                        &format!("Failed to create {}: {}", self.name, e),
                    );
                }
                return self.fallback.clone();
            }
            Err(e) => {
                logger::error(
                    LogTag::Storage,
                    &format!("Failed to read {} from {}: {}", self.name, self.path.display(), e),
                );
                return self.fallback.clone();
            }
        };

        // An empty file is an empty collection
        if contents.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<R>>(&contents) {
            Ok(records) => {
                logger::debug(
                    LogTag::Storage,
                    &format!(
                        "Loaded {} ({} records) in {:.4}s",
                        self.name,
                        records.len(),
                        started.elapsed().as_secs_f64()
                    ),
                );
                records
            }
            Err(e) => {
                logger::error(
                    LogTag::Storage,
                    &format!(
                        "Failed to parse {} from {}: {}. Using {} fallback record(s)",
                        self.name,
                        self.path.display(),
                        e,
                        self.fallback.len()
                    ),
                );
                self.fallback.clone()
            }
        }
    }

    async fn save(&self, records: &[R]) -> BotResult<()> {
        let started = Instant::now();
        let text = serde_json::to_string_pretty(records)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, text).await?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            BotError::Storage(format!(
                "rename {} -> {} failed: {}",
                temp.display(),
                self.path.display(),
                e
            ))
        })?;

        logger::debug(
            LogTag::Storage,
            &format!(
                "Saved {} ({} records) in {:.4}s",
                self.name,
                records.len(),
                started.elapsed().as_secs_f64()
            ),
        );
        Ok(())
    }
}
