/// Returns true iff `input` looks like a content fingerprint of a persisted
/// document: exactly 32 hexadecimal characters, case-insensitive, nothing
/// else around them. Anything that fails this check is treated as a literal
/// operation document.
pub fn is_document_hash(input: &str) -> bool {
  input.len() == 32 && input.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_32_hex_in_any_case() {
    assert!(is_document_hash("63c9ed95224a0135c9cfa856779ba4f5"));
    assert!(is_document_hash("63C9ED95224A0135C9CFA856779BA4F5"));
    assert!(is_document_hash("63c9ED95224a0135C9cfa856779bA4f5"));
  }

  #[test]
  fn rejects_wrong_lengths() {
    assert!(!is_document_hash(""));
    assert!(!is_document_hash("63c9ed95224a0135c9cfa856779ba4f"));
    assert!(!is_document_hash("63c9ed95224a0135c9cfa856779ba4f55"));
  }

  #[test]
  fn rejects_non_hex_and_surrounding_noise() {
    assert!(!is_document_hash("63c9ed95224a0135c9cfa856779ba4fg"));
    assert!(!is_document_hash(" 63c9ed95224a0135c9cfa856779ba4f5"));
    assert!(!is_document_hash("63c9ed95224a0135c9cfa856779ba4f5 "));
    assert!(!is_document_hash("query { __typename }"));
  }

  #[test]
  fn rejects_multibyte_input() {
    // 32 bytes, but the trailing character is not an ascii hex digit
    assert!(!is_document_hash("63c9ed95224a0135c9cfa856779ba4é"));
  }
}
