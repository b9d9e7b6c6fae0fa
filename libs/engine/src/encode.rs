use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use porter_common::graphql::{GraphQLRequest, APPLICATION_GRAPHQL};
use porter_common::http::{
  encode_query_pairs, parse_query_pairs, HeaderValue, HttpRequest, CONTENT_TYPE,
};
use serde_json::{Map, Value};

use crate::decode::{
  DecodedRequest, FileAttachment, TransportEncoding, DOCUMENT_ID_KEY, FILES_VARIABLE_KEY,
  QUERY_KEY,
};
use crate::error::NormalizeError;

/// The rewrite handed back to the host: whichever fields are set replace
/// their counterparts on the original request before the pipeline continues.
/// Downstream consumers never observe the hash form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewrittenRequest {
  pub body: Option<Bytes>,
  pub content_type: Option<&'static str>,
  pub query_string: Option<String>,
}

impl RewrittenRequest {
  pub fn apply(self, request: &mut HttpRequest) {
    if let Some(body) = self.body {
      request.body = body;
    }
    if let Some(content_type) = self.content_type {
      request
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    if let Some(query_string) = self.query_string {
      request.query_string = query_string;
    }
  }
}

/// Reassembles the resolved request into the canonical wire form of its
/// original encoding. JSON and multipart collapse to the canonical JSON
/// payload; the query-string, form and raw encodings are rewritten in place.
pub fn encode(
  encoding: &TransportEncoding,
  request: &HttpRequest,
  decoded: DecodedRequest,
  resolved_document: String,
) -> Result<RewrittenRequest, NormalizeError> {
  match encoding {
    TransportEncoding::QueryString => Ok(encode_query_string(
      &request.query_string,
      &resolved_document,
    )),
    TransportEncoding::Json | TransportEncoding::Multipart { .. } => {
      encode_canonical_json(decoded, resolved_document)
    }
    TransportEncoding::RawDocument => Ok(RewrittenRequest {
      body: Some(Bytes::from(resolved_document)),
      content_type: Some(APPLICATION_GRAPHQL),
      query_string: None,
    }),
    TransportEncoding::FormUrlEncoded => Ok(encode_form(&request.body, &resolved_document)),
  }
}

fn encode_query_string(original: &str, resolved_document: &str) -> RewrittenRequest {
  // `query` takes the resolved text, the reference it came from is dropped,
  // everything else is preserved
  let mut pairs: Vec<(String, String)> = parse_query_pairs(original)
    .into_iter()
    .filter(|(key, _)| key != QUERY_KEY && key != DOCUMENT_ID_KEY)
    .collect();
  pairs.insert(0, (QUERY_KEY.to_string(), resolved_document.to_string()));

  RewrittenRequest {
    query_string: Some(encode_query_pairs(&pairs)),
    ..Default::default()
  }
}

fn encode_form(body: &Bytes, resolved_document: &str) -> RewrittenRequest {
  let mut pairs: Vec<(String, String)> = Vec::new();
  let mut replaced = false;

  for (key, value) in parse_query_pairs(&String::from_utf8_lossy(body)) {
    if key == QUERY_KEY {
      pairs.push((key, resolved_document.to_string()));
      replaced = true;
    } else if key == DOCUMENT_ID_KEY {
      continue;
    } else {
      pairs.push((key, value));
    }
  }

  if !replaced {
    pairs.insert(0, (QUERY_KEY.to_string(), resolved_document.to_string()));
  }

  RewrittenRequest {
    body: Some(encode_query_pairs(&pairs).into()),
    content_type: Some("application/x-www-form-urlencoded"),
    query_string: None,
  }
}

fn encode_canonical_json(
  decoded: DecodedRequest,
  resolved_document: String,
) -> Result<RewrittenRequest, NormalizeError> {
  let variables = merge_file_attachments(decoded.variables, &decoded.files);

  let canonical = GraphQLRequest {
    operation: resolved_document,
    operation_name: decoded.operation_name,
    variables,
  };

  let body = serde_json::to_vec(&canonical).map_err(NormalizeError::SerializationError)?;

  Ok(RewrittenRequest {
    body: Some(body.into()),
    content_type: Some("application/json"),
    query_string: None,
  })
}

/// Folds uploaded files into the variables mapping under the reserved
/// `files` key, as `{"fileName": .., "file": <base64>}` objects in
/// submission order. An existing `files` array is appended to, anything
/// else under that key is replaced.
fn merge_file_attachments(
  variables: Option<Map<String, Value>>,
  files: &[FileAttachment],
) -> Option<Map<String, Value>> {
  if files.is_empty() {
    return variables;
  }

  let mut variables = variables.unwrap_or_default();
  let encoded: Vec<Value> = files
    .iter()
    .map(|attachment| {
      serde_json::json!({
        "fileName": attachment.file_name,
        "file": BASE64.encode(&attachment.content),
      })
    })
    .collect();

  match variables.get_mut(FILES_VARIABLE_KEY) {
    Some(Value::Array(existing)) => existing.extend(encoded),
    _ => {
      variables.insert(FILES_VARIABLE_KEY.to_string(), Value::Array(encoded));
    }
  }

  Some(variables)
}
