use std::path::PathBuf;

use porter_common::serde_utils::{JsonSchemaExample, JsonSchemaExampleMetadata};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configuration for the persisted documents normalization layer.
///
/// The store file is a flat JSON map of 32-hex content fingerprints to
/// operation documents:
///
/// `{"63c9ed95224a0135c9cfa856779ba4f5": "query test { __typename }"}`
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[schemars(example = "persisted_documents_example")]
pub struct PersistedDocumentsConfig {
  /// The path prefix the protocol is intercepted on. Requests outside this
  /// prefix, unless they are protocol-upgrade requests, are forwarded to the
  /// host pipeline untouched.
  #[serde(default = "endpoint_default")]
  pub endpoint: String,
  /// Path to the JSON file mapping content fingerprints to document text.
  /// Loaded fully on startup and republished on every detected change.
  pub store_file: PathBuf,
  /// Reload behavior of the store file watcher.
  #[serde(default)]
  pub reload: StoreReloadConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct StoreReloadConfig {
  /// Watch the store file and republish its entries when it changes.
  #[serde(default = "reload_enabled_default")]
  pub enabled: bool,
  /// Delay between retries when a changed file cannot be read or parsed,
  /// typically because the change notification raced the write.
  #[serde(default = "retry_delay_default")]
  pub retry_delay_ms: u64,
  /// How many times a failing reload is retried before it is abandoned and
  /// the previously loaded mapping is kept.
  #[serde(default = "max_retries_default")]
  pub max_retries: u32,
}

impl Default for StoreReloadConfig {
  fn default() -> Self {
    Self {
      enabled: reload_enabled_default(),
      retry_delay_ms: retry_delay_default(),
      max_retries: max_retries_default(),
    }
  }
}

fn endpoint_default() -> String {
  "/graphql".to_string()
}

fn reload_enabled_default() -> bool {
  true
}

fn retry_delay_default() -> u64 {
  250
}

fn max_retries_default() -> u32 {
  3
}

fn persisted_documents_example() -> JsonSchemaExample<PersistedDocumentsConfig> {
  JsonSchemaExample {
    metadata: JsonSchemaExampleMetadata::new(
      "Local file store",
      Some(
        "Intercepts requests under `/graphql` and resolves document IDs against `persisted_documents.json`, reloading it on change.",
      ),
    ),
    example: PersistedDocumentsConfig {
      endpoint: endpoint_default(),
      store_file: PathBuf::from("persisted_documents.json"),
      reload: StoreReloadConfig::default(),
    },
  }
}
