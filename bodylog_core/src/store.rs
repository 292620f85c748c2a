//! Record store for workout days and templates.
//!
//! The file-backed store keeps one JSON document per data directory. Every
//! mutation is a locked read-modify-write: an exclusive `fs2` lock on a
//! sidecar lock file serializes writers across processes, and the document
//! is replaced atomically through a temp file in the same directory.

use crate::{
    Error, NewTemplate, NewWorkoutDay, Result, Template, WorkoutDay, WorkoutDayUpdate,
};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistence operations consumed by the command surface and analytics
pub trait RecordStore {
    fn create_day(&self, day: NewWorkoutDay) -> Result<WorkoutDay>;

    fn get_day(&self, id: u64) -> Result<Option<WorkoutDay>>;

    /// Returns `None` when no day has this id
    fn update_day(&self, id: u64, update: WorkoutDayUpdate) -> Result<Option<WorkoutDay>>;

    /// Returns whether a day was removed
    fn delete_day(&self, id: u64) -> Result<bool>;

    /// Most recent days first (date descending, then id descending)
    fn list_days(&self, limit: usize) -> Result<Vec<WorkoutDay>>;

    /// Days whose serialized blocks contain `query`, case-insensitively
    fn search_days(&self, query: &str, limit: usize) -> Result<Vec<WorkoutDay>>;

    /// All days with `start <= date <= end`. No ordering guarantee.
    fn fetch_records_in_range(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<WorkoutDay>>;

    fn create_template(&self, template: NewTemplate) -> Result<Template>;

    fn get_template(&self, id: u64) -> Result<Option<Template>>;

    /// Newest templates first
    fn list_templates(&self) -> Result<Vec<Template>>;
}

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    last_day_id: u64,
    #[serde(default)]
    last_template_id: u64,
    #[serde(default)]
    days: Vec<WorkoutDay>,
    #[serde(default)]
    templates: Vec<Template>,
}

impl StoreDocument {
    // Ids are never reused, even after deletes or hand edits of the file
    fn allocate_day_id(&mut self) -> u64 {
        let max_existing = self.days.iter().map(|d| d.id).max().unwrap_or(0);
        self.last_day_id = self.last_day_id.max(max_existing) + 1;
        self.last_day_id
    }

    fn allocate_template_id(&mut self) -> u64 {
        let max_existing = self.templates.iter().map(|t| t.id).max().unwrap_or(0);
        self.last_template_id = self.last_template_id.max(max_existing) + 1;
        self.last_template_id
    }
}

/// JSON document store with file locking
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    /// Document file name used by [`JsonFileStore::in_dir`]
    pub const FILE_NAME: &'static str = "bodylog.json";

    /// Create a store backed by the given document path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    /// Create a store using the standard file name inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> Result<&Path> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Ok(parent),
            Some(_) => Ok(Path::new(".")),
            None => Err(Error::Store(format!(
                "store path {:?} has no parent directory",
                self.path
            ))),
        }
    }

    /// Open the sidecar lock file, creating the data directory if needed
    fn open_lock(&self) -> Result<File> {
        std::fs::create_dir_all(self.parent_dir()?)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        Ok(file)
    }

    /// Read the document. Callers must hold the lock.
    fn read_document(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            tracing::debug!("No store document at {:?}, starting empty", self.path);
            return Ok(StoreDocument::default());
        }

        let mut contents = String::new();
        BufReader::new(File::open(&self.path)?).read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(StoreDocument::default());
        }

        serde_json::from_str(&contents).map_err(|e| {
            Error::Store(format!(
                "{:?} is not a valid store document: {}",
                self.path, e
            ))
        })
    }

    /// Atomically replace the document. Callers must hold the exclusive lock.
    fn write_document(&self, document: &StoreDocument) -> Result<()> {
        let temp = NamedTempFile::new_in(self.parent_dir()?)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(document)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(
            "Saved store with {} days and {} templates to {:?}",
            document.days.len(),
            document.templates.len(),
            self.path
        );
        Ok(())
    }

    /// Run `f` against a snapshot taken under a shared lock
    fn read<T>(&self, f: impl FnOnce(StoreDocument) -> T) -> Result<T> {
        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let document = self.read_document();
        lock.unlock()?;
        Ok(f(document?))
    }

    /// Load, modify and save the document under an exclusive lock
    ///
    /// Nothing is written when `f` fails.
    fn update<T>(&self, f: impl FnOnce(&mut StoreDocument) -> Result<T>) -> Result<T> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = self.read_document().and_then(|mut document| {
            let value = f(&mut document)?;
            self.write_document(&document)?;
            Ok(value)
        });

        lock.unlock()?;
        result
    }
}

fn sort_newest_first(days: &mut [WorkoutDay]) {
    days.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

fn blocks_contain(day: &WorkoutDay, needle: &str) -> Result<bool> {
    let haystack = serde_json::to_string(&day.blocks)?;
    Ok(haystack.to_lowercase().contains(needle))
}

impl RecordStore for JsonFileStore {
    fn create_day(&self, day: NewWorkoutDay) -> Result<WorkoutDay> {
        let created = self.update(|document| {
            let id = document.allocate_day_id();
            let day = day.into_day(id);
            document.days.push(day.clone());
            Ok(day)
        })?;
        tracing::info!("Created workout day {} for {}", created.id, created.date);
        Ok(created)
    }

    fn get_day(&self, id: u64) -> Result<Option<WorkoutDay>> {
        self.read(|document| document.days.into_iter().find(|d| d.id == id))
    }

    fn update_day(&self, id: u64, update: WorkoutDayUpdate) -> Result<Option<WorkoutDay>> {
        let updated = self.update(|document| {
            Ok(document.days.iter_mut().find(|d| d.id == id).map(|day| {
                update.apply_to(day);
                day.clone()
            }))
        })?;
        if updated.is_some() {
            tracing::info!("Updated workout day {}", id);
        }
        Ok(updated)
    }

    fn delete_day(&self, id: u64) -> Result<bool> {
        let removed = self.update(|document| {
            let before = document.days.len();
            document.days.retain(|d| d.id != id);
            Ok(document.days.len() != before)
        })?;
        if removed {
            tracing::info!("Deleted workout day {}", id);
        }
        Ok(removed)
    }

    fn list_days(&self, limit: usize) -> Result<Vec<WorkoutDay>> {
        self.read(|document| {
            let mut days = document.days;
            sort_newest_first(&mut days);
            days.truncate(limit);
            days
        })
    }

    fn search_days(&self, query: &str, limit: usize) -> Result<Vec<WorkoutDay>> {
        let needle = query.to_lowercase();
        let days = self.read(|document| document.days)?;

        let mut matches = Vec::new();
        for day in days {
            if blocks_contain(&day, &needle)? {
                matches.push(day);
            }
        }
        sort_newest_first(&mut matches);
        matches.truncate(limit);

        tracing::debug!("Search {:?} matched {} days", query, matches.len());
        Ok(matches)
    }

    fn fetch_records_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutDay>> {
        self.read(|document| {
            document
                .days
                .into_iter()
                .filter(|d| d.date >= start && d.date <= end)
                .collect()
        })
    }

    fn create_template(&self, template: NewTemplate) -> Result<Template> {
        let created = self.update(|document| {
            let id = document.allocate_template_id();
            let template = template.into_template(id);
            document.templates.push(template.clone());
            Ok(template)
        })?;
        tracing::info!("Created template {} ({})", created.id, created.name);
        Ok(created)
    }

    fn get_template(&self, id: u64) -> Result<Option<Template>> {
        self.read(|document| document.templates.into_iter().find(|t| t.id == id))
    }

    fn list_templates(&self) -> Result<Vec<Template>> {
        self.read(|document| {
            let mut templates = document.templates;
            templates.sort_by(|a, b| b.id.cmp(&a.id));
            templates
        })
    }
}
