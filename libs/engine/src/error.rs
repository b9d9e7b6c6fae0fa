use std::path::PathBuf;

use porter_common::graphql::GraphQLResponse;
use porter_common::http::{HttpResponse, StatusCode};

/// A failure inside the decode -> resolve -> encode pipeline. Converted into
/// a protocol-level error response exactly once, at the normalizer boundary.
#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
  #[error("invalid body json format")]
  InvalidBodyJsonFormat(#[source] serde_json::Error),
  #[error("invalid variables json format")]
  InvalidVariablesJsonFormat(#[source] serde_json::Error),
  #[error("request body is not valid utf-8")]
  InvalidBodyUtf8(#[source] std::str::Utf8Error),
  #[error("invalid multipart payload: {0}")]
  InvalidMultipartFormat(String),
  #[error("request carries neither an operation document nor a document id")]
  MissingDocument,
  #[error("persisted document not found: {hash}")]
  DocumentNotFound { hash: String },
  #[error("failed to serialize rewritten request")]
  SerializationError(#[source] serde_json::Error),
}

impl NormalizeError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      NormalizeError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn into_response(&self) -> HttpResponse {
    GraphQLResponse::new_error(&self.to_string()).into_with_status_code(self.status_code())
  }
}

/// A failure while populating the document store from its backing file.
/// After the initial load these are logged and swallowed: the previous
/// mapping stays authoritative until a later reload succeeds.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
  #[error("failed to read persisted documents file {path:?}")]
  ReadFailure {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse persisted documents file {path:?}")]
  ParseFailure {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("failed to watch persisted documents file")]
  WatchFailure(#[from] notify::Error),
}
