use tracing::debug;

use crate::error::NormalizeError;
use crate::hash::is_document_hash;
use crate::store::DocumentStore;

/// Applies the one resolution rule every transport shares: text shaped like
/// a content fingerprint is swapped for the document it names, anything else
/// already is the document. A store miss is a typed failure carrying the
/// offending hash, so a stale or unknown ID surfaces as a clear protocol
/// error instead of an empty operation drifting downstream.
pub async fn resolve_document(
  store: &dyn DocumentStore,
  text: &str,
) -> Result<String, NormalizeError> {
  if !is_document_hash(text) {
    return Ok(text.to_string());
  }

  debug!("resolving persisted document reference {}", text);

  match store.get(text).await {
    Some(document) => Ok(document),
    None => Err(NormalizeError::DocumentNotFound {
      hash: text.to_string(),
    }),
  }
}
