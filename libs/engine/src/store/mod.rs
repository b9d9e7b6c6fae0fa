use std::fmt::Debug;

pub mod memory;

pub use memory::InMemoryDocumentStore;

/// The hash -> document text key/value store the resolver reads and the
/// loader writes. The loader is the only writer; request-handling paths read
/// concurrently, so implementations must make `set` effectively atomic per
/// key (last-writer-wins).
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + Debug {
  /// Returns the stored document text for `hash`, or `None` on a miss.
  /// A miss is a resolvable condition for callers, never a store failure.
  async fn get(&self, hash: &str) -> Option<String>;

  /// Inserts or overwrites the entry for `hash`.
  async fn set(&self, hash: String, document: String);
}
