use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::StoreReloadConfig;
use crate::error::StoreError;
use crate::store::DocumentStore;

/// Keeps a [`DocumentStore`] populated from a JSON file mapping content
/// fingerprints to document text. The file is read whole on every (re)load
/// and each entry is published through `set`; keys missing from a later load
/// stay in the store, since a given hash never changes the document it names.
#[derive(Debug)]
pub struct StoreLoader {
  path: PathBuf,
  store: Arc<dyn DocumentStore>,
  reload: StoreReloadConfig,
  last_published: Mutex<Vec<u8>>,
}

#[derive(Debug, PartialEq)]
pub enum LoadOutcome {
  /// The mapping was read, parsed and published; carries the entry count.
  Published(usize),
  /// The file content is identical to the last published load.
  Unchanged,
}

impl StoreLoader {
  /// Creates the loader and performs the initial load. An unreadable or
  /// malformed file at startup is a hard error: there is no previously
  /// published mapping to keep serving.
  pub async fn new(
    path: PathBuf,
    store: Arc<dyn DocumentStore>,
    reload: StoreReloadConfig,
  ) -> Result<Self, StoreError> {
    let loader = Self {
      path,
      store,
      reload,
      last_published: Mutex::new(Vec::new()),
    };

    match loader.load_once().await? {
      LoadOutcome::Published(count) => {
        info!(
          "loaded persisted documents store from {:?}, total records: {}",
          loader.path, count
        );
      }
      LoadOutcome::Unchanged => {}
    }

    Ok(loader)
  }

  /// Reads, parses and publishes the backing file once. Publishing is
  /// skipped when the raw bytes match the last successful load, which
  /// debounces the duplicate events file watchers like to deliver.
  pub async fn load_once(&self) -> Result<LoadOutcome, StoreError> {
    let raw = std::fs::read(&self.path).map_err(|source| StoreError::ReadFailure {
      path: self.path.clone(),
      source,
    })?;

    let mapping: HashMap<String, String> =
      serde_json::from_slice(&raw).map_err(|source| StoreError::ParseFailure {
        path: self.path.clone(),
        source,
      })?;

    let mut last_published = self.last_published.lock().await;
    if !last_published.is_empty() && *last_published == raw {
      debug!("persisted documents file content unchanged, skipping republish");
      return Ok(LoadOutcome::Unchanged);
    }

    let count = mapping.len();
    for (hash, document) in mapping {
      self.store.set(hash, document).await;
    }
    *last_published = raw;

    Ok(LoadOutcome::Published(count))
  }

  /// Starts watching the backing file and republishing it on change.
  /// Returns the watcher handle; dropping it stops the event feed. The
  /// reload loop runs on its own task and never touches request paths.
  pub fn watch(self: Arc<Self>) -> Result<RecommendedWatcher, StoreError> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
      move |result: notify::Result<Event>| match result {
        Ok(event) => {
          if event.kind.is_modify() || event.kind.is_create() {
            let _ = tx.send(());
          }
        }
        Err(e) => error!("persisted documents watch error: {:?}", e),
      },
      Config::default(),
    )?;

    watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

    let loader = Arc::clone(&self);
    tokio::spawn(async move {
      while rx.recv().await.is_some() {
        loader.reload_with_retry().await;
      }
    });

    info!(path = ?self.path, "persisted documents watcher started");
    Ok(watcher)
  }

  /// A change notification can race the write that triggered it, so a
  /// failed read or parse is retried a bounded number of times before the
  /// previous mapping is declared authoritative again.
  async fn reload_with_retry(&self) {
    let mut attempt: u32 = 0;

    loop {
      match self.load_once().await {
        Ok(LoadOutcome::Published(count)) => {
          info!("republished persisted documents store, total records: {}", count);
          return;
        }
        Ok(LoadOutcome::Unchanged) => return,
        Err(e) => {
          attempt += 1;
          if attempt > self.reload.max_retries {
            error!(
              "failed to reload persisted documents after {} retries, keeping previous mapping: {}",
              self.reload.max_retries, e
            );
            return;
          }

          warn!("persisted documents reload attempt {} failed: {}", attempt, e);
          tokio::time::sleep(Duration::from_millis(self.reload.retry_delay_ms)).await;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::InMemoryDocumentStore;

  fn write_store_file(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("persisted_documents.json");
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[tokio::test]
  async fn initial_load_populates_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_store_file(
      &dir,
      "{\"63c9ed95224a0135c9cfa856779ba4f5\": \"query test { __typename }\"}",
    );

    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    StoreLoader::new(path, store.clone(), StoreReloadConfig::default())
      .await
      .unwrap();

    assert_eq!(
      store.get("63c9ed95224a0135c9cfa856779ba4f5").await.as_deref(),
      Some("query test { __typename }")
    );
  }

  #[tokio::test]
  async fn startup_fails_on_missing_or_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());

    let missing = StoreLoader::new(
      dir.path().join("nope.json"),
      store.clone(),
      StoreReloadConfig::default(),
    )
    .await;
    assert!(matches!(missing, Err(StoreError::ReadFailure { .. })));

    let path = write_store_file(&dir, "{");
    let malformed = StoreLoader::new(path, store, StoreReloadConfig::default()).await;
    assert!(matches!(malformed, Err(StoreError::ParseFailure { .. })));
  }

  #[tokio::test]
  async fn failed_reload_keeps_previous_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_store_file(&dir, "{\"0123456789abcdef0123456789abcdef\": \"{ a }\"}");

    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let loader = StoreLoader::new(path.clone(), store.clone(), StoreReloadConfig::default())
      .await
      .unwrap();

    std::fs::write(&path, "{ not json").unwrap();
    assert!(loader.load_once().await.is_err());
    assert_eq!(
      store.get("0123456789abcdef0123456789abcdef").await.as_deref(),
      Some("{ a }")
    );

    // a later valid rewrite is picked up again
    std::fs::write(&path, "{\"0123456789abcdef0123456789abcdef\": \"{ b }\"}").unwrap();
    assert_eq!(loader.load_once().await.unwrap(), LoadOutcome::Published(1));
    assert_eq!(
      store.get("0123456789abcdef0123456789abcdef").await.as_deref(),
      Some("{ b }")
    );
  }

  #[tokio::test]
  async fn reload_does_not_evict_absent_keys_and_skips_identical_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_store_file(&dir, "{\"0123456789abcdef0123456789abcdef\": \"{ a }\"}");

    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let loader = StoreLoader::new(path.clone(), store.clone(), StoreReloadConfig::default())
      .await
      .unwrap();

    assert_eq!(loader.load_once().await.unwrap(), LoadOutcome::Unchanged);

    std::fs::write(
      &path,
      "{\"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\": \"{ b }\"}",
    )
    .unwrap();
    assert_eq!(loader.load_once().await.unwrap(), LoadOutcome::Published(1));

    // the old key survives the reload that did not mention it
    assert_eq!(
      store.get("0123456789abcdef0123456789abcdef").await.as_deref(),
      Some("{ a }")
    );
    assert_eq!(
      store.get("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").await.as_deref(),
      Some("{ b }")
    );
  }
}
