use crate::ingest::lowercase_extension;
use crate::prelude::{WddError, WddResult};
use crate::records::DetectionRecord;
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Where WDD metadata for a recording day lives.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionSource {
    /// One archive, directory or JSON file used for every day.
    Fixed(PathBuf),
    /// WDD output tree with one zip archive per day.
    DayArchives(PathBuf),
}

impl DetectionSource {
    /// `DayArchives` resolves to `<root>/wdd_output_<Y>/cam0/<Y>/<M>/<Y-M-D>.zip`.
    pub fn path_for_day(&self, day: NaiveDate) -> PathBuf {
        match self {
            DetectionSource::Fixed(path) => path.clone(),
            DetectionSource::DayArchives(root) => root
                .join(format!("wdd_output_{}", day.year()))
                .join("cam0")
                .join(day.year().to_string())
                .join(day.month().to_string())
                .join(format!("{}.zip", day.format("%Y-%m-%d"))),
        }
    }
}

/// Loads detections on demand and keeps them for later runs of the same day.
pub struct DetectionStore {
    source: DetectionSource,
    cache: HashMap<PathBuf, Vec<DetectionRecord>>,
}

impl DetectionStore {
    pub fn new(source: DetectionSource) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    pub fn for_day(&mut self, day: NaiveDate) -> WddResult<&[DetectionRecord]> {
        let path = self.source.path_for_day(day);
        if !self.cache.contains_key(&path) {
            let records = load_detections(&path)?;
            self.cache.insert(path.clone(), records);
        }
        Ok(self.cache.get(&path).map(Vec::as_slice).unwrap_or_default())
    }
}

/// Reads detections from a zip archive, a directory of `.json` files or a
/// single JSON file, sorted by `timestamp_begin`.
pub fn load_detections(path: &Path) -> WddResult<Vec<DetectionRecord>> {
    let mut records = if path.is_dir() {
        load_directory(path)?
    } else if lowercase_extension(path).as_deref() == Some("zip") {
        load_archive(path)?
    } else {
        let text = fs::read_to_string(path).map_err(|err| WddError::io(path, err))?;
        parse_documents(&text, &path.display().to_string())?
    };
    records.sort_by(|a, b| a.timestamp_begin.cmp(&b.timestamp_begin));
    info!("loaded {} detections from {}", records.len(), path.display());
    Ok(records)
}

fn load_archive(path: &Path) -> WddResult<Vec<DetectionRecord>> {
    let archive_error = |source| WddError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|err| WddError::io(path, err))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(archive_error)?;

    let mut records = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        if entry.is_dir() || !entry.name().ends_with(".json") {
            continue;
        }
        let origin = format!("{}:{}", path.display(), entry.name());
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|err| WddError::io(path, err))?;
        records.extend(parse_documents(&text, &origin)?);
    }
    debug!("{} metadata documents in {}", records.len(), path.display());
    Ok(records)
}

fn load_directory(path: &Path) -> WddResult<Vec<DetectionRecord>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| WddError::io(path, err))? {
        let entry_path = entry.map_err(|err| WddError::io(path, err))?.path();
        if entry_path.is_file() && lowercase_extension(&entry_path).as_deref() == Some("json") {
            files.push(entry_path);
        }
    }
    files.sort();

    let mut records = Vec::new();
    for file in files {
        let text = fs::read_to_string(&file).map_err(|err| WddError::io(&file, err))?;
        records.extend(parse_documents(&text, &file.display().to_string())?);
    }
    Ok(records)
}

/// A document is either one metadata object or an array of them.
fn parse_documents(text: &str, origin: &str) -> WddResult<Vec<DetectionRecord>> {
    let json_error = |source| WddError::Json {
        origin: origin.to_string(),
        source,
    };
    match serde_json::from_str(text).map_err(json_error)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(json_error))
            .collect(),
        other => Ok(vec![serde_json::from_value(other).map_err(json_error)?]),
    }
}
