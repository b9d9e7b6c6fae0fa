use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logging configuration for the embedding host.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct LoggerConfig {
  /// The output format for log lines.
  #[serde(default)]
  pub format: LoggerConfigFormat,
  /// A `tracing` env-filter directive, e.g. `info` or `porter_engine=debug`.
  #[serde(default = "default_filter")]
  pub filter: String,
  /// Emit span-close events with timing information.
  #[serde(default)]
  pub print_performance_info: bool,
}

impl Default for LoggerConfig {
  fn default() -> Self {
    Self {
      format: LoggerConfigFormat::default(),
      filter: default_filter(),
      print_performance_info: false,
    }
  }
}

fn default_filter() -> String {
  "info".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq)]
pub enum LoggerConfigFormat {
  /// Minimal, single-line output. The right choice for production, where
  /// log volume matters more than per-line context.
  #[serde(rename = "compact")]
  #[schemars(title = "compact")]
  Compact,

  /// Verbose, multi-line output with full field formatting. Meant for
  /// development and debugging sessions.
  #[serde(rename = "pretty")]
  #[schemars(title = "pretty")]
  Pretty,

  /// Structured JSON lines, for log aggregators and processing pipelines.
  #[serde(rename = "json")]
  #[schemars(title = "json")]
  Json,
}

impl Default for LoggerConfigFormat {
  // In development, we wish to see some more details and code locations.
  #[cfg(debug_assertions)]
  fn default() -> Self {
    LoggerConfigFormat::Pretty
  }

  #[cfg(not(debug_assertions))]
  fn default() -> Self {
    if atty::is(atty::Stream::Stdout) {
      LoggerConfigFormat::Compact
    } else {
      LoggerConfigFormat::Json
    }
  }
}
