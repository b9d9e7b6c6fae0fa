use serde::Serialize;

/// A documentation example attached to a config struct through
/// `#[schemars(example = "...")]`. The rendered JSON schema embeds these so
/// generated docs can show ready-to-paste config snippets.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaExample<T: Serialize> {
  #[serde(rename = "$metadata")]
  pub metadata: Option<JsonSchemaExampleMetadata>,
  #[serde(flatten)]
  pub example: T,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct JsonSchemaExampleMetadata {
  pub title: Option<String>,
  pub description: Option<String>,
}

impl JsonSchemaExampleMetadata {
  pub fn new(title: &str, description: Option<&str>) -> Option<Self> {
    Some(Self {
      title: Some(title.to_string()),
      description: description.map(|s| s.to_string()),
    })
  }
}
