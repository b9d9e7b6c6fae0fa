use dashmap::DashMap;

use super::DocumentStore;

/// The default store: a process-wide concurrent map. Entries are
/// content-addressed, so a key either misses or serves the one document it
/// fingerprints; readers racing a reload at worst observe a mix of old and
/// new entries, never a torn value.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
  entries: DashMap<String, String>,
}

impl InMemoryDocumentStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
  async fn get(&self, hash: &str) -> Option<String> {
    self.entries.get(hash).map(|entry| entry.value().clone())
  }

  async fn set(&self, hash: String, document: String) {
    self.entries.insert(hash, document);
  }
}
