use std::{
  path::Path,
  str::from_utf8,
};

use eyre::{
  Result,
  WrapErr,
};
use serde::Deserialize;
use the_lib::{
  CompletionOrder,
  data_type::DataTypes,
  description::DescriptionView,
  prefix::WordChars,
};

/// Completion settings, the built-in defaults merged with the user's file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  /// Data source, a file path or a runtime resource name.
  pub data:             String,
  pub order:            CompletionOrder,
  /// Chars besides alphanumerics and `_` that may appear in an identifier.
  pub extra_word_chars: String,
  pub data_types:       DataTypesConfig,
  pub description:      DescriptionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DataTypesConfig {
  pub names:           Vec<String>,
  pub color:           Option<String>,
  /// Whether hosts should highlight data types in description headers.
  pub colorize_header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DescriptionConfig {
  pub placeholder: String,
}

impl Config {
  /// The built-in configuration without any user overrides.
  pub fn builtin() -> Result<Self> {
    Self::from_value(default_config()?)
  }

  /// Built-in configuration with `path` merged on top, or the user config
  /// file when `path` is `None`.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let user = match path {
      Some(path) => Some(read_toml(path)?),
      None => user_config_value(),
    };
    let merged = match user {
      Some(user) => crate::merge_toml_values(default_config()?, user, 3),
      None => default_config()?,
    };
    Self::from_value(merged)
  }

  fn from_value(value: toml::Value) -> Result<Self> {
    value
      .try_into()
      .wrap_err("invalid completion configuration")
  }

  pub fn word_chars(&self) -> WordChars {
    WordChars::new(self.extra_word_chars.chars())
  }

  pub fn data_types(&self) -> DataTypes {
    DataTypes::new(self.data_types.names.as_slice(), self.data_types.color.clone())
  }

  pub fn description_view(&self) -> DescriptionView {
    DescriptionView::new(self.description.placeholder.as_str())
  }
}

/// Default built-in completion.toml.
pub fn default_config() -> Result<toml::Value> {
  let default_config = include_bytes!("completion.toml");
  let config_str =
    from_utf8(default_config).wrap_err("built-in completion.toml contains invalid UTF-8")?;
  toml::from_str(config_str).wrap_err("failed to parse built-in completion.toml")
}

fn read_toml(path: &Path) -> Result<toml::Value> {
  let contents = std::fs::read_to_string(path)
    .wrap_err_with(|| format!("failed to read config file '{}'", path.display()))?;
  toml::from_str(&contents).wrap_err_with(|| format!("failed to parse '{}'", path.display()))
}

/// The user's completion.toml, if there is a readable one. A broken file is
/// logged and skipped.
fn user_config_value() -> Option<toml::Value> {
  let file = crate::config_file()?;
  if !file.is_file() {
    return None;
  }
  match read_toml(&file) {
    Ok(value) => Some(value),
    Err(err) => {
      tracing::warn!("ignoring user config: {err:#}");
      None
    },
  }
}
