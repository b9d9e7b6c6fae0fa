use bytes::Bytes;

use crate::error::NormalizeError;

/// A single `multipart/form-data` part, with the field name and optional
/// filename taken from its Content-Disposition header.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
  pub name: String,
  pub file_name: Option<String>,
  pub content: Bytes,
}

impl MultipartPart {
  pub fn text(&self) -> Result<String, NormalizeError> {
    std::str::from_utf8(&self.content)
      .map(ToString::to_string)
      .map_err(NormalizeError::InvalidBodyUtf8)
  }
}

/// Parses standard multipart framing: parts are introduced by a
/// `--<boundary>` delimiter line and the stream is closed by
/// `--<boundary>--`. Parts without a Content-Disposition field name are
/// skipped. The body is borrowed, never consumed; the caller keeps the
/// original request intact.
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<MultipartPart>, NormalizeError> {
  let delimiter = format!("--{}", boundary).into_bytes();
  let mut parts = Vec::new();

  let mut cursor = find(body, &delimiter, 0)
    .ok_or_else(|| NormalizeError::InvalidMultipartFormat("missing opening boundary".to_string()))?
    + delimiter.len();

  loop {
    if body[cursor..].starts_with(b"--") {
      return Ok(parts);
    }

    cursor = skip_line_break(body, cursor)?;

    let headers_end = find(body, b"\r\n\r\n", cursor).ok_or_else(|| {
      NormalizeError::InvalidMultipartFormat("part headers not terminated".to_string())
    })?;
    let headers = &body[cursor..headers_end];
    let content_start = headers_end + 4;

    let next_delimiter = find(body, &delimiter, content_start).ok_or_else(|| {
      NormalizeError::InvalidMultipartFormat("missing closing boundary".to_string())
    })?;

    // the CRLF before the delimiter belongs to the framing, not the content
    let mut content_end = next_delimiter;
    if content_end >= content_start + 2 && &body[content_end - 2..content_end] == b"\r\n" {
      content_end -= 2;
    }

    if let Some((name, file_name)) = parse_content_disposition(headers) {
      parts.push(MultipartPart {
        name,
        file_name,
        content: Bytes::copy_from_slice(&body[content_start..content_end]),
      });
    }

    cursor = next_delimiter + delimiter.len();
  }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
  if from > haystack.len() {
    return None;
  }

  haystack[from..]
    .windows(needle.len())
    .position(|window| window == needle)
    .map(|i| i + from)
}

fn skip_line_break(body: &[u8], cursor: usize) -> Result<usize, NormalizeError> {
  if body[cursor..].starts_with(b"\r\n") {
    Ok(cursor + 2)
  } else if body[cursor..].starts_with(b"\n") {
    Ok(cursor + 1)
  } else {
    Err(NormalizeError::InvalidMultipartFormat(
      "malformed boundary line".to_string(),
    ))
  }
}

fn parse_content_disposition(headers: &[u8]) -> Option<(String, Option<String>)> {
  let headers = String::from_utf8_lossy(headers);

  for line in headers.split("\r\n") {
    let Some((header_name, value)) = line.split_once(':') else {
      continue;
    };
    if !header_name.trim().eq_ignore_ascii_case("content-disposition") {
      continue;
    }

    let mut name = None;
    let mut file_name = None;

    for attribute in value.split(';').skip(1) {
      let Some((key, raw_value)) = attribute.split_once('=') else {
        continue;
      };
      let unquoted = raw_value.trim().trim_matches('"').to_string();

      match key.trim() {
        "name" => name = Some(unquoted),
        "filename" => file_name = Some(unquoted),
        _ => {}
      }
    }

    return name.map(|name| (name, file_name));
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;

  const BOUNDARY: &str = "----formdata123";

  fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, file_name, content) in parts {
      body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
      match file_name {
        Some(file_name) => body.extend_from_slice(
          format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\r\n",
            name, file_name
          )
          .as_bytes(),
        ),
        None => body.extend_from_slice(
          format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        ),
      }
      body.extend_from_slice(content);
      body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
  }

  #[test]
  fn parses_named_parts_in_order() {
    let body = multipart_body(&[
      ("Query", None, b"query test { __typename }"),
      ("file", Some("a.png"), b"\x00\x01binary"),
      ("file", Some("b.png"), b"more"),
    ]);

    let parts = parse(&body, BOUNDARY).unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].name, "Query");
    assert_eq!(parts[0].text().unwrap(), "query test { __typename }");
    assert_eq!(parts[1].file_name.as_deref(), Some("a.png"));
    assert_eq!(parts[1].content.as_ref(), b"\x00\x01binary");
    assert_eq!(parts[2].file_name.as_deref(), Some("b.png"));
  }

  #[test]
  fn rejects_unterminated_framing() {
    let body = format!(
      "--{}\r\nContent-Disposition: form-data; name=\"Query\"\r\n\r\ndangling",
      BOUNDARY
    );
    assert!(matches!(
      parse(body.as_bytes(), BOUNDARY),
      Err(NormalizeError::InvalidMultipartFormat(_))
    ));

    assert!(matches!(
      parse(b"no boundaries here", BOUNDARY),
      Err(NormalizeError::InvalidMultipartFormat(_))
    ));
  }

  #[test]
  fn skips_parts_without_a_field_name() {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: text/plain\r\n\r\nanonymous\r\n");
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    assert_eq!(parse(&body, BOUNDARY).unwrap(), Vec::new());
  }
}
