use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::SetStore;

/// In-process [`SetStore`]. Clones share the same sets.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sets: Arc<Mutex<HashMap<String, HashSet<String>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys that currently hold at least one member.
    pub async fn keys(&self) -> Vec<String> {
        let sets = self.sets.lock().await;
        sets.keys().cloned().collect()
    }
}

#[async_trait]
impl SetStore for MemoryStore {
    async fn add_member(&self, key: &str, value: &str) -> Result<()> {
        let mut sets = self.sets.lock().await;
        sets.entry(key.to_string())
            .or_default()
            .insert(value.to_string());
        Ok(())
    }

    async fn members(&self, key: &str) -> Result<Vec<String>> {
        let sets = self.sets.lock().await;
        Ok(sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn move_member(&self, source: &str, dest: &str, value: &str) -> Result<bool> {
        let mut sets = self.sets.lock().await;
        let Some(source_set) = sets.get_mut(source) else {
            return Ok(false);
        };
        if !source_set.remove(value) {
            return Ok(false);
        }
        if source_set.is_empty() {
            sets.remove(source);
        }
        sets.entry(dest.to_string())
            .or_default()
            .insert(value.to_string());
        Ok(true)
    }

    async fn union_into(&self, dest: &str, sources: &[String]) -> Result<()> {
        let mut sets = self.sets.lock().await;
        let merged: HashSet<String> = sources
            .iter()
            .filter_map(|source| sets.get(source))
            .flatten()
            .cloned()
            .collect();
        if merged.is_empty() {
            return Ok(());
        }
        sets.entry(dest.to_string()).or_default().extend(merged);
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        let mut sets = self.sets.lock().await;
        sets.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
