use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{anyhow, Result as AnyhowResult};
pub use bytes::Bytes;
pub use http::Uri;
use http::{HeaderMap, StatusCode as RawStatusCode};
use serde::{Deserialize, Serialize};
pub use url::Url;

pub use http::header;
pub use http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, UPGRADE};
pub use http::Method;
pub use mime::{Mime, APPLICATION_JSON, APPLICATION_WWW_FORM_URLENCODED, MULTIPART_FORM_DATA};
use serde::de::DeserializeOwned;
use serde_json::from_slice;
pub type StatusCode = RawStatusCode;
pub type HttpHeadersMap = HeaderMap<HeaderValue>;

pub trait ToHeadersMap {
  fn to_headers_map(&self) -> AnyhowResult<HttpHeadersMap>;
}

impl ToHeadersMap for HashMap<String, String> {
  fn to_headers_map(&self) -> Result<HttpHeadersMap, anyhow::Error> {
    let mut headers_map = HeaderMap::new();

    for (key, value) in self {
      let header_name = HeaderName::from_str(key)
        .map_err(|e| anyhow!("Couldn't parse key into a header name: {}", e))?;
      let header_value = HeaderValue::from_str(value)
        .map_err(|e| anyhow!("Couldn't parse value into a header value: {}", e))?;

      headers_map.insert(header_name, header_value);
    }

    Ok(headers_map)
  }
}

impl ToHeadersMap for Vec<(&str, &str)> {
  fn to_headers_map(&self) -> Result<HttpHeadersMap, anyhow::Error> {
    let mut headers_map = HeaderMap::new();

    for (key, value) in self {
      let header_name = HeaderName::from_str(key)
        .map_err(|e| anyhow!("Couldn't parse key into a header name: {}", e))?;
      let header_value = HeaderValue::from_str(value)
        .map_err(|e| anyhow!("Couldn't parse value into a header value: {}", e))?;

      headers_map.insert(header_name, header_value);
    }

    Ok(headers_map)
  }
}

/// An incoming HTTP request, as seen by the host pipeline.
/// The body is held as [`Bytes`], so inspecting it never consumes the
/// original payload: pass-through requests are forwarded byte-identical.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub headers: HeaderMap<HeaderValue>,
  pub method: Method,
  pub uri: String,
  pub query_string: String,
  pub body: Bytes,
}

#[cfg(feature = "test_utils")]
impl Default for HttpRequest {
  fn default() -> Self {
    Self {
      headers: HeaderMap::new(),
      method: Method::POST,
      uri: "/graphql".to_string(),
      query_string: "".to_string(),
      body: serde_json::json!({
          "query": "query { __typename }",
      })
      .to_string()
      .into(),
    }
  }
}

impl HttpRequest {
  pub fn json_body<T>(&self) -> Result<T, serde_json::Error>
  where
    T: DeserializeOwned,
  {
    from_slice::<T>(&self.body)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
  pub body: Bytes,
  #[serde(with = "http_serde::status_code")]
  pub status: StatusCode,
  #[serde(with = "http_serde::header_map")]
  pub headers: HeaderMap,
}

pub fn extract_content_type(headers_map: &HttpHeadersMap) -> Option<Mime> {
  let content_type = headers_map
    .get(CONTENT_TYPE)
    .and_then(|value| value.to_str().ok())
    .map(ToString::to_string);

  content_type.and_then(|content_type| content_type.parse().ok())
}

pub fn extract_accept(headers_map: &HeaderMap) -> Option<Mime> {
  let content_type = headers_map
    .get(ACCEPT)
    .and_then(|value| value.to_str().ok())
    .map(ToString::to_string);

  content_type.and_then(|content_type| content_type.parse().ok())
}

/// Parses a query string or urlencoded form body into a map.
/// Percent-encoding and `+`-as-space are decoded. Later duplicates win.
pub fn parse_query_string(input: &str) -> HashMap<String, String> {
  url::form_urlencoded::parse(input.as_bytes())
    .map(|(k, v)| (k.into_owned(), v.into_owned()))
    .collect()
}

/// Same as [`parse_query_string`], but keeps pair order and duplicates.
pub fn parse_query_pairs(input: &str) -> Vec<(String, String)> {
  url::form_urlencoded::parse(input.as_bytes())
    .map(|(k, v)| (k.into_owned(), v.into_owned()))
    .collect()
}

/// Re-encodes pairs produced by [`parse_query_pairs`] into a query string.
pub fn encode_query_pairs(pairs: &[(String, String)]) -> String {
  let mut serializer = url::form_urlencoded::Serializer::new(String::new());

  for (key, value) in pairs {
    serializer.append_pair(key, value);
  }

  serializer.finish()
}
