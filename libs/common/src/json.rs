use serde::de::Error as DeError;
use serde_json::{from_str, Error as SerdeError, Map, Value};

/// Parses `value` and requires the result to be a JSON object.
/// GraphQL variables are always carried as an object, so anything else
/// (arrays, scalars) is rejected up front.
pub fn parse_and_extract_json_map_value(value: &str) -> Result<Map<String, Value>, SerdeError> {
  match from_str::<Value>(value)? {
    Value::Object(v) => Ok(v),
    _ => Err(DeError::custom("expected object")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_objects_only() {
    assert!(parse_and_extract_json_map_value("{\"x\": 1}").is_ok());
    assert!(parse_and_extract_json_map_value("[1, 2]").is_err());
    assert!(parse_and_extract_json_map_value("42").is_err());
    assert!(parse_and_extract_json_map_value("{").is_err());
  }
}
