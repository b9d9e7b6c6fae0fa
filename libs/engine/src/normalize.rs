use std::sync::Arc;

use porter_common::http::{HttpRequest, HttpResponse, UPGRADE};
use tracing::{debug, warn};

use crate::config::PersistedDocumentsConfig;
use crate::decode::{decode, TransportEncoding};
use crate::encode::{encode, RewrittenRequest};
use crate::error::NormalizeError;
use crate::resolve::resolve_document;
use crate::store::DocumentStore;

/// The terminal outcome of normalizing one request.
#[derive(Debug)]
pub enum NormalizeOutcome {
  /// Not a recognized protocol request; the host forwards it untouched.
  Unmodified,
  /// The request carried an operation; the rewrite replaces the original
  /// body or query string before the host pipeline continues.
  Rewritten(RewrittenRequest),
  /// The pipeline failed. The response is what the client should see; the
  /// error is handed back alongside it so the host's own fault reporting
  /// still observes the failure.
  Fail {
    response: HttpResponse,
    error: NormalizeError,
  },
}

/// Sequences decode -> resolve -> encode per request, dispatching on the
/// transport encoding. Holds no request-scoped state: the store it reads is
/// the only shared resource, and it is handed in at construction together
/// with the loader's copy.
#[derive(Debug)]
pub struct Normalizer {
  config: PersistedDocumentsConfig,
  store: Arc<dyn DocumentStore>,
}

impl Normalizer {
  pub fn new(config: PersistedDocumentsConfig, store: Arc<dyn DocumentStore>) -> Self {
    Self { config, store }
  }

  pub async fn normalize(&self, request: &HttpRequest) -> NormalizeOutcome {
    if !self.matches_endpoint(request) {
      return NormalizeOutcome::Unmodified;
    }

    let Some(encoding) = TransportEncoding::classify(request) else {
      debug!("unrecognized method/content-type combination, forwarding untouched");
      return NormalizeOutcome::Unmodified;
    };

    debug!(?encoding, "normalizing operation request");

    match self.run_pipeline(&encoding, request).await {
      Ok(Some(rewritten)) => NormalizeOutcome::Rewritten(rewritten),
      Ok(None) => NormalizeOutcome::Unmodified,
      Err(error) => {
        warn!("failed to normalize operation request: {}", error);
        NormalizeOutcome::Fail {
          response: error.into_response(),
          error,
        }
      }
    }
  }

  async fn run_pipeline(
    &self,
    encoding: &TransportEncoding,
    request: &HttpRequest,
  ) -> Result<Option<RewrittenRequest>, NormalizeError> {
    let decoded = decode(encoding, request)?;

    let Some(effective) = decoded.effective_document().map(str::to_string) else {
      // A GET without operation parameters is not an operation request at
      // all (upgrade handshakes, playground page loads); a body that
      // carries neither field is malformed.
      return match encoding {
        TransportEncoding::QueryString => Ok(None),
        _ => Err(NormalizeError::MissingDocument),
      };
    };

    let resolved = resolve_document(self.store.as_ref(), &effective).await?;

    encode(encoding, request, decoded, resolved).map(Some)
  }

  fn matches_endpoint(&self, request: &HttpRequest) -> bool {
    is_upgrade_request(request) || request_path(&request.uri).starts_with(&self.config.endpoint)
  }
}

fn is_upgrade_request(request: &HttpRequest) -> bool {
  request
    .headers
    .get(UPGRADE)
    .and_then(|value| value.to_str().ok())
    .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}

fn request_path(uri: &str) -> &str {
  uri.split('?').next().unwrap_or(uri)
}
