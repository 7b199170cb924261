//! Session-scoped storage and the external chapter context record

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utils::Result;

/// Short-lived key/value storage scoped to the browsing session
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
}

/// In-memory storage for native hosts and tests
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStorage {
    items: HashMap<String, String>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Companion fields for an external chapter
///
/// The aggregator's page endpoint returns images only, so the page that links
/// into the reader stashes these fields in session storage beforehand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalChapterContext {
    pub manga_id: String,
    pub manga_title: String,
    pub chapter_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl ExternalChapterContext {
    /// Storage key for a chapter: `<prefix>-<chapter id>`
    pub fn storage_key(prefix: &str, chapter_id: &str) -> String {
        format!("{}-{}", prefix, chapter_id)
    }

    /// Write the context for the reader to pick up
    pub fn store(
        &self,
        storage: &mut dyn SessionStorage,
        prefix: &str,
        chapter_id: &str,
    ) -> Result<()> {
        let value = serde_json::to_string(self)?;
        storage.set_item(&Self::storage_key(prefix, chapter_id), value);
        Ok(())
    }

    /// Best-effort read; absence and malformed records both yield `None`
    pub fn load(storage: &dyn SessionStorage, prefix: &str, chapter_id: &str) -> Option<Self> {
        let key = Self::storage_key(prefix, chapter_id);
        let raw = storage.get_item(&key)?;
        match serde_json::from_str(&raw) {
            Ok(context) => Some(context),
            Err(e) => {
                log::warn!("Ignoring malformed chapter context under '{}': {}", key, e);
                None
            }
        }
    }
}
