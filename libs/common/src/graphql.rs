use std::fmt::{Display, Formatter};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::{HttpResponse, StatusCode};

pub const APPLICATION_GRAPHQL: &str = "application/graphql";

/// The canonical GraphQL operation payload, as forwarded to the downstream
/// engine. A document ID never survives into this shape: by the time a
/// request is serialized here, the `query` field holds the full document.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GraphQLRequest {
  // The GraphQL operation, as string
  #[serde(rename = "query")]
  pub operation: String,
  // The operation name, if specified
  #[serde(rename = "operationName")]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub operation_name: Option<String>,
  // GraphQL operation variables, in JSON format
  #[serde(skip_serializing_if = "Option::is_none")]
  pub variables: Option<Map<String, Value>>,
}

#[cfg(feature = "test_utils")]
impl Default for GraphQLRequest {
  fn default() -> Self {
    GraphQLRequest {
      operation: "query { __typename }".to_string(),
      operation_name: None,
      variables: None,
    }
  }
}

impl Display for GraphQLRequest {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}",
      serde_json::to_string(self).unwrap_or_else(|e| e.to_string())
    )
  }
}

impl From<&GraphQLRequest> for Bytes {
  fn from(request: &GraphQLRequest) -> Self {
    serde_json::to_vec(&request)
      .unwrap_or_else(|e| e.to_string().into_bytes())
      .into()
  }
}

impl From<GraphQLRequest> for Bytes {
  fn from(value: GraphQLRequest) -> Self {
    Bytes::from(&value)
  }
}

/// An error with a message and optional extensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphQLError {
  /// The error message.
  pub message: String,
  /// Extensions to the error.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Map<String, Value>>,
}

impl std::fmt::Display for GraphQLError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)
  }
}

impl GraphQLError {
  pub fn new(message: &str) -> Self {
    GraphQLError {
      message: message.to_string(),
      extensions: None,
    }
  }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GraphQLResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub errors: Option<Vec<GraphQLError>>,

  #[serde(skip)]
  downstream_http_code: Option<StatusCode>,
}

impl GraphQLResponse {
  pub fn new_error(error: &str) -> Self {
    GraphQLResponse {
      data: None,
      errors: Some(vec![GraphQLError::new(error)]),
      downstream_http_code: None,
    }
  }

  pub fn new_error_with_code(error: &str, status_code: StatusCode) -> Self {
    GraphQLResponse {
      data: None,
      errors: Some(vec![GraphQLError::new(error)]),
      downstream_http_code: Some(status_code),
    }
  }

  pub fn into_with_status_code(self, code: StatusCode) -> HttpResponse {
    HttpResponse {
      body: self.into(),
      status: code,
      headers: Default::default(),
    }
  }
}

impl From<GraphQLResponse> for Bytes {
  fn from(response: GraphQLResponse) -> Self {
    serde_json::to_vec(&response)
      .unwrap_or_else(|e| e.to_string().into_bytes())
      .into()
  }
}

impl From<GraphQLResponse> for HttpResponse {
  fn from(response: GraphQLResponse) -> Self {
    let status = response.downstream_http_code.unwrap_or(StatusCode::OK);

    HttpResponse {
      body: response.into(),
      status,
      headers: Default::default(),
    }
  }
}
