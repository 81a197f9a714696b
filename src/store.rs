use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::suggest::Source;

const HISTORY_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedKeyword {
    pub text: String,
    pub source: Source,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Display label of the search; bulk runs record an annotated label.
    pub query: String,
    /// Source name, or `"all"` for an all-sources search.
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    saved_keywords: Vec<SavedKeyword>,
    #[serde(default)]
    search_history: Vec<HistoryEntry>,
}

/// Saved keywords and recent searches, persisted to a pretty-printed JSON
/// file on every mutation.
pub struct KeywordStore {
    path: PathBuf,
    data: StoreData,
}

impl KeywordStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    /// An unreadable or unparseable file is an error, never silently reset.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, data })
    }

    /// Resolve the store location: `$LONGTAIL_STORE`, else the platform data
    /// directory, else the working directory.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("LONGTAIL_STORE") {
            return PathBuf::from(path);
        }
        match dirs::data_dir() {
            Some(dir) => dir.join("longtail").join("store.json"),
            None => PathBuf::from("longtail-store.json"),
        }
    }

    pub fn saved(&self) -> &[SavedKeyword] {
        &self.data.saved_keywords
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.data.search_history
    }

    /// Save suggestions ahead of the existing entries, skipping `(text,
    /// source)` pairs already stored (or repeated within the batch).
    /// Returns how many were added.
    pub fn save_all<'a, I>(&mut self, items: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = (&'a str, Source)>,
    {
        let now = OffsetDateTime::now_utc();
        let mut fresh: Vec<SavedKeyword> = Vec::new();
        for (text, source) in items {
            let exists = self
                .data
                .saved_keywords
                .iter()
                .chain(fresh.iter())
                .any(|k| k.text == text && k.source == source);
            if !exists {
                fresh.push(SavedKeyword {
                    text: text.to_string(),
                    source,
                    saved_at: now,
                });
            }
        }

        if fresh.is_empty() {
            return Ok(0);
        }
        let added = fresh.len();
        fresh.append(&mut self.data.saved_keywords);
        self.data.saved_keywords = fresh;
        self.persist()?;
        Ok(added)
    }

    /// Remove saved keywords matching `text` (and `source`, when given).
    /// Returns how many were removed.
    pub fn remove(&mut self, text: &str, source: Option<Source>) -> Result<usize, StoreError> {
        let before = self.data.saved_keywords.len();
        self.data
            .saved_keywords
            .retain(|k| !(k.text == text && source.is_none_or(|s| k.source == s)));

        let removed = before - self.data.saved_keywords.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn clear_saved(&mut self) -> Result<usize, StoreError> {
        let removed = self.data.saved_keywords.len();
        self.data.saved_keywords.clear();
        self.persist()?;
        Ok(removed)
    }

    /// Record a search, replacing any entry with the same query and source
    /// label and keeping the newest `HISTORY_LIMIT` entries.
    pub fn record_search(&mut self, query: &str, source: &str) -> Result<(), StoreError> {
        self.data
            .search_history
            .retain(|item| !(item.query == query && item.source == source));
        self.push_history(query.to_string(), source)
    }

    /// Record a bulk run under its annotated label. Prior history entries
    /// whose query contains the base query are replaced for that source.
    pub fn record_bulk_search(&mut self, base_query: &str, source: &str) -> Result<(), StoreError> {
        self.data
            .search_history
            .retain(|item| !(item.query.contains(base_query) && item.source == source));
        self.push_history(format!("{base_query} (bulk a-z, 0-9)"), source)
    }

    fn push_history(&mut self, query: String, source: &str) -> Result<(), StoreError> {
        self.data.search_history.insert(
            0,
            HistoryEntry {
                query,
                source: source.to_string(),
                timestamp: OffsetDateTime::now_utc(),
            },
        );
        self.data.search_history.truncate(HISTORY_LIMIT);
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.data)?)?;
        Ok(())
    }
}
