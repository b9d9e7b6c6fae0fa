use bytes::Bytes;
use porter_common::http::{
  extract_content_type, parse_query_string, HttpRequest, Method, Mime,
};
use porter_common::json::parse_and_extract_json_map_value;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::multipart;

pub const QUERY_KEY: &str = "query";
pub const DOCUMENT_ID_KEY: &str = "documentId";
pub const OPERATION_NAME_KEY: &str = "operationName";
pub const FILES_VARIABLE_KEY: &str = "files";

const MULTIPART_QUERY_FIELD: &str = "Query";
const MULTIPART_VARIABLES_FIELD: &str = "Variables";
const MULTIPART_OPERATION_NAME_FIELD: &str = "OperationName";
const MULTIPART_FILE_FIELD: &str = "file";

/// The wire encodings the normalizer recognizes. Anything else is forwarded
/// to the host pipeline untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEncoding {
  /// `GET`, or `POST` carrying a `query` query-string parameter: the
  /// operation lives in the query string, and so does the rewrite.
  QueryString,
  /// `POST` with `application/json`.
  Json,
  /// `POST` with `application/graphql`: the whole body is the document.
  RawDocument,
  /// `POST` with `application/x-www-form-urlencoded`.
  FormUrlEncoded,
  /// `POST` with `multipart/form-data` and a declared boundary.
  Multipart { boundary: String },
}

impl TransportEncoding {
  /// Classifies a request from its method and declared content type.
  /// `None` means the combination is unrecognized, including an
  /// unparseable content-type header and multipart without a boundary
  /// parameter; those requests pass through unmodified.
  pub fn classify(request: &HttpRequest) -> Option<Self> {
    if request.method == Method::GET {
      return Some(TransportEncoding::QueryString);
    }

    if request.method != Method::POST {
      return None;
    }

    if parse_query_string(&request.query_string).contains_key(QUERY_KEY) {
      return Some(TransportEncoding::QueryString);
    }

    Self::from_content_type(&extract_content_type(&request.headers)?)
  }

  fn from_content_type(content_type: &Mime) -> Option<Self> {
    if content_type.type_() == mime::APPLICATION {
      if content_type.subtype() == mime::JSON {
        return Some(TransportEncoding::Json);
      }
      if content_type.subtype() == "graphql" {
        return Some(TransportEncoding::RawDocument);
      }
      if content_type.subtype() == mime::WWW_FORM_URLENCODED {
        return Some(TransportEncoding::FormUrlEncoded);
      }
    }

    if content_type.type_() == mime::MULTIPART && content_type.subtype() == mime::FORM_DATA {
      return content_type
        .get_param(mime::BOUNDARY)
        .map(|boundary| TransportEncoding::Multipart {
          boundary: boundary.as_str().to_string(),
        });
    }

    None
  }
}

/// An uploaded file captured from a multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
  pub field_name: String,
  pub file_name: String,
  pub content: Bytes,
}

/// The transport-independent view of an incoming operation request, before
/// hash resolution. At most one of `document` / `document_id` ends up
/// driving resolution; [`DecodedRequest::effective_document`] applies the
/// fallback rule shared by every encoding.
#[derive(Debug, Clone, Default)]
pub struct DecodedRequest {
  pub document: Option<String>,
  pub document_id: Option<String>,
  pub operation_name: Option<String>,
  pub variables: Option<Map<String, Value>>,
  pub files: Vec<FileAttachment>,
}

impl DecodedRequest {
  /// The literal document wins over a document ID; blank text counts as
  /// absent. This is the one place the literal-vs-reference precedence
  /// lives.
  pub fn effective_document(&self) -> Option<&str> {
    match &self.document {
      Some(document) if !document.trim().is_empty() => Some(document),
      _ => self
        .document_id
        .as_deref()
        .filter(|id| !id.trim().is_empty()),
    }
  }
}

/// The recognized fields of a JSON operation body. Unknown fields are
/// dropped: the downstream engine only ever sees the canonical shape.
#[derive(Deserialize, Debug)]
struct JsonOperationPayload {
  #[serde(default)]
  query: Option<String>,
  #[serde(rename = "documentId", default)]
  document_id: Option<String>,
  #[serde(rename = "operationName", default)]
  operation_name: Option<String>,
  #[serde(default)]
  variables: Option<Map<String, Value>>,
}

pub fn decode(
  encoding: &TransportEncoding,
  request: &HttpRequest,
) -> Result<DecodedRequest, NormalizeError> {
  match encoding {
    TransportEncoding::QueryString => Ok(decode_query_string(&request.query_string)),
    TransportEncoding::Json => decode_json(request),
    TransportEncoding::RawDocument => decode_raw_document(request),
    TransportEncoding::FormUrlEncoded => Ok(decode_form(request)),
    TransportEncoding::Multipart { boundary } => decode_multipart(request, boundary),
  }
}

fn decode_query_string(query_string: &str) -> DecodedRequest {
  let params = parse_query_string(query_string);

  DecodedRequest {
    document: params.get(QUERY_KEY).cloned(),
    document_id: params.get(DOCUMENT_ID_KEY).cloned(),
    ..Default::default()
  }
}

fn decode_json(request: &HttpRequest) -> Result<DecodedRequest, NormalizeError> {
  let payload = request
    .json_body::<JsonOperationPayload>()
    .map_err(NormalizeError::InvalidBodyJsonFormat)?;

  Ok(DecodedRequest {
    document: payload.query,
    document_id: payload.document_id,
    operation_name: payload.operation_name,
    variables: payload.variables,
    files: Vec::new(),
  })
}

fn decode_raw_document(request: &HttpRequest) -> Result<DecodedRequest, NormalizeError> {
  let text = std::str::from_utf8(&request.body).map_err(NormalizeError::InvalidBodyUtf8)?;

  Ok(DecodedRequest {
    document: Some(text.to_string()),
    ..Default::default()
  })
}

fn decode_form(request: &HttpRequest) -> DecodedRequest {
  let params = parse_query_string(&String::from_utf8_lossy(&request.body));

  DecodedRequest {
    document: params.get(QUERY_KEY).cloned(),
    document_id: params.get(DOCUMENT_ID_KEY).cloned(),
    operation_name: params.get(OPERATION_NAME_KEY).cloned(),
    ..Default::default()
  }
}

fn decode_multipart(
  request: &HttpRequest,
  boundary: &str,
) -> Result<DecodedRequest, NormalizeError> {
  let parts = multipart::parse(&request.body, boundary)?;
  let mut decoded = DecodedRequest::default();

  for part in parts {
    match part.name.as_str() {
      MULTIPART_QUERY_FIELD => decoded.document = Some(part.text()?),
      MULTIPART_VARIABLES_FIELD => {
        decoded.variables = Some(
          parse_and_extract_json_map_value(&part.text()?)
            .map_err(NormalizeError::InvalidVariablesJsonFormat)?,
        )
      }
      MULTIPART_OPERATION_NAME_FIELD => decoded.operation_name = Some(part.text()?),
      DOCUMENT_ID_KEY => decoded.document_id = Some(part.text()?),
      MULTIPART_FILE_FIELD => decoded.files.push(FileAttachment {
        field_name: part.name.clone(),
        file_name: part.file_name.clone().unwrap_or_default(),
        content: part.content,
      }),
      _ => {}
    }
  }

  Ok(decoded)
}

#[cfg(test)]
mod tests {
  use super::*;
  use porter_common::http::ToHeadersMap;

  fn post_request(content_type: &str, body: &[u8]) -> HttpRequest {
    HttpRequest {
      headers: vec![("content-type", content_type)].to_headers_map().unwrap(),
      body: Bytes::copy_from_slice(body),
      ..Default::default()
    }
  }

  #[test]
  fn classifies_recognized_post_content_types() {
    assert_eq!(
      TransportEncoding::classify(&post_request("application/json", b"{}")),
      Some(TransportEncoding::Json)
    );
    assert_eq!(
      TransportEncoding::classify(&post_request("application/graphql", b"")),
      Some(TransportEncoding::RawDocument)
    );
    assert_eq!(
      TransportEncoding::classify(&post_request("application/x-www-form-urlencoded", b"")),
      Some(TransportEncoding::FormUrlEncoded)
    );
    assert_eq!(
      TransportEncoding::classify(&post_request(
        "multipart/form-data; boundary=xyz",
        b""
      )),
      Some(TransportEncoding::Multipart {
        boundary: "xyz".to_string()
      })
    );
  }

  #[test]
  fn unrecognized_and_malformed_content_types_fall_through() {
    assert_eq!(
      TransportEncoding::classify(&post_request("text/plain", b"hello")),
      None
    );
    assert_eq!(
      TransportEncoding::classify(&post_request("definitely not a mime", b"")),
      None
    );
    // multipart without a boundary cannot be framed
    assert_eq!(
      TransportEncoding::classify(&post_request("multipart/form-data", b"")),
      None
    );

    let mut no_content_type = HttpRequest::default();
    no_content_type.headers.clear();
    assert_eq!(TransportEncoding::classify(&no_content_type), None);
  }

  #[test]
  fn post_with_query_parameter_in_query_string_uses_the_query_string() {
    let mut request = post_request("application/json", b"{}");
    request.query_string = "query=%7B%20a%20%7D".to_string();

    assert_eq!(
      TransportEncoding::classify(&request),
      Some(TransportEncoding::QueryString)
    );
  }

  #[test]
  fn literal_document_wins_over_document_id() {
    let decoded = DecodedRequest {
      document: Some("{ a }".to_string()),
      document_id: Some("63c9ed95224a0135c9cfa856779ba4f5".to_string()),
      ..Default::default()
    };
    assert_eq!(decoded.effective_document(), Some("{ a }"));
  }

  #[test]
  fn blank_document_falls_back_to_the_reference() {
    let decoded = DecodedRequest {
      document: Some("   ".to_string()),
      document_id: Some("63c9ed95224a0135c9cfa856779ba4f5".to_string()),
      ..Default::default()
    };
    assert_eq!(
      decoded.effective_document(),
      Some("63c9ed95224a0135c9cfa856779ba4f5")
    );

    let empty = DecodedRequest::default();
    assert_eq!(empty.effective_document(), None);
  }

  #[test]
  fn decodes_json_bodies() {
    let request = post_request(
      "application/json",
      b"{\"documentId\": \"63c9ed95224a0135c9cfa856779ba4f5\", \"operationName\": \"test\", \"variables\": {\"x\": 1}}",
    );
    let decoded = decode(&TransportEncoding::Json, &request).unwrap();

    assert_eq!(decoded.document, None);
    assert_eq!(
      decoded.document_id.as_deref(),
      Some("63c9ed95224a0135c9cfa856779ba4f5")
    );
    assert_eq!(decoded.operation_name.as_deref(), Some("test"));
    assert_eq!(decoded.variables.unwrap()["x"], 1);

    let invalid = post_request("application/json", b"{ nope");
    assert!(matches!(
      decode(&TransportEncoding::Json, &invalid),
      Err(NormalizeError::InvalidBodyJsonFormat(_))
    ));
  }

  #[test]
  fn decodes_form_bodies_with_urlencoding() {
    let request = post_request(
      "application/x-www-form-urlencoded",
      b"query=query%20%7B%20a%20%7D&operationName=test",
    );
    let decoded = decode(&TransportEncoding::FormUrlEncoded, &request).unwrap();

    assert_eq!(decoded.document.as_deref(), Some("query { a }"));
    assert_eq!(decoded.operation_name.as_deref(), Some("test"));
  }

  #[test]
  fn raw_document_body_is_the_document() {
    let request = post_request("application/graphql", b"query test { __typename }");
    let decoded = decode(&TransportEncoding::RawDocument, &request).unwrap();
    assert_eq!(
      decoded.effective_document(),
      Some("query test { __typename }")
    );
  }
}
