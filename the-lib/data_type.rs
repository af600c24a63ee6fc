use crate::completion::compare_ignore_case;

/// Decides which identifiers in a description header are data types.
///
/// Names are kept sorted ignoring case so a lookup is a binary search. A
/// classifier without names or without a color never highlights anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTypes {
  names: Vec<String>,
  color: Option<String>,
}

impl DataTypes {
  pub fn new<S: AsRef<str>>(names: &[S], color: Option<String>) -> Self {
    let mut types = Self::default();
    types.set_types(Some(names));
    types.color = color;
    types
  }

  /// Replaces the recognized names. `None` disables highlighting.
  pub fn set_types<S: AsRef<str>>(&mut self, names: Option<&[S]>) {
    self.names = names
      .map(|names| names.iter().map(|name| name.as_ref().to_owned()).collect())
      .unwrap_or_default();
    self.names.sort_by(|a, b| compare_ignore_case(a, b));
  }

  pub fn set_color(&mut self, color: Option<String>) {
    self.color = color;
  }

  pub fn color(&self) -> Option<&str> {
    self.color.as_deref()
  }

  /// Returns the highlight color for `token`, or `None` when it should be
  /// left alone.
  pub fn classify(&self, token: &str) -> Option<&str> {
    let color = self.color.as_deref()?;
    self
      .names
      .binary_search_by(|name| compare_ignore_case(name, token))
      .ok()
      .map(|_| color)
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

/// Formats an RGB triple the way HTML expects it, e.g. `#0a1b2c`.
pub fn hex_color(r: u8, g: u8, b: u8) -> String {
  format!("#{r:02x}{g:02x}{b:02x}")
}
