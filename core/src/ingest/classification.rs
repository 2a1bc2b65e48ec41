use crate::prelude::{WddError, WddResult};
use crate::records::ClassificationRecord;
use chrono::NaiveDate;
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Classification rows of one day, keyed by waggle id.
#[derive(Debug, Clone, Default)]
pub struct ClassificationIndex {
    by_waggle_id: HashMap<String, ClassificationRecord>,
}

impl ClassificationIndex {
    pub fn load(path: &Path) -> WddResult<Self> {
        let mut reader = csv::Reader::from_path(path).map_err(|err| WddError::csv(path, err))?;
        let mut index = Self::default();
        for row in reader.deserialize::<ClassificationRecord>() {
            let record = row.map_err(|err| WddError::csv(path, err))?;
            index.insert(record);
        }
        info!(
            "loaded {} classification rows from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    pub fn insert(&mut self, record: ClassificationRecord) {
        self.by_waggle_id
            .insert(record.waggle_id.trim().to_string(), record);
    }

    pub fn get(&self, waggle_id: &str) -> Option<&ClassificationRecord> {
        self.by_waggle_id.get(waggle_id.trim())
    }

    pub fn len(&self) -> usize {
        self.by_waggle_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_waggle_id.is_empty()
    }
}

impl FromIterator<ClassificationRecord> for ClassificationIndex {
    fn from_iter<I: IntoIterator<Item = ClassificationRecord>>(iter: I) -> Self {
        let mut index = Self::default();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// Per-day classification tables under `<root>/<YYYY-MM-DD>/data.csv`.
pub struct ClassificationStore {
    root: PathBuf,
    cache: HashMap<NaiveDate, ClassificationIndex>,
}

impl ClassificationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn path_for_day(&self, day: NaiveDate) -> PathBuf {
        self.root
            .join(day.format("%Y-%m-%d").to_string())
            .join("data.csv")
    }

    pub fn for_day(&mut self, day: NaiveDate) -> WddResult<&ClassificationIndex> {
        if !self.cache.contains_key(&day) {
            let index = ClassificationIndex::load(&self.path_for_day(day))?;
            self.cache.insert(day, index);
        }
        self.cache
            .get(&day)
            .ok_or_else(|| WddError::InvalidConfig(format!("no classification data for {}", day)))
    }
}
