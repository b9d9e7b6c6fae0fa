pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod hash;
pub mod loader;
pub mod multipart;
pub mod normalize;
pub mod resolve;
pub mod store;

use std::sync::Arc;

use notify::RecommendedWatcher;

use crate::config::PersistedDocumentsConfig;
use crate::error::StoreError;
use crate::loader::StoreLoader;
use crate::normalize::Normalizer;
use crate::store::{DocumentStore, InMemoryDocumentStore};

/// Wires the layer together at startup: one store instance shared by the
/// loader and the normalizer, an initial load of the backing file, and,
/// when reloading is enabled, the change watcher. The returned watcher must
/// be kept alive by the host for reloads to keep flowing.
pub async fn build_normalizer(
  config: PersistedDocumentsConfig,
) -> Result<(Normalizer, Option<RecommendedWatcher>), StoreError> {
  let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());

  let loader = Arc::new(
    StoreLoader::new(
      config.store_file.clone(),
      Arc::clone(&store),
      config.reload.clone(),
    )
    .await?,
  );

  let watcher = match config.reload.enabled {
    true => Some(loader.watch()?),
    false => None,
  };

  Ok((Normalizer::new(config, store), watcher))
}
