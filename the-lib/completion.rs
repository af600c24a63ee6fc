//! Completion records for procedural languages.
//!
//! A [`Completion`] describes one function, constant or variable that can be
//! offered while typing. Records are plain data: they are built once by the
//! loader and never mutated after the catalog is sorted.

use std::{
  cmp::Ordering,
  fmt,
};

use serde::{
  Deserialize,
  Serialize,
};

/// A single parameter of a function completion.
///
/// Parameter names are optional, the data source may describe a prototype
/// such as `int abs(int)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
  pub ty:   String,
  pub name: Option<String>,
}

impl Parameter {
  pub fn new(ty: impl Into<String>, name: Option<String>) -> Self {
    Self {
      ty: ty.into(),
      name,
    }
  }
}

impl fmt::Display for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{} {}", self.ty, name),
      None => f.write_str(&self.ty),
    }
  }
}

/// What a completion stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionKind {
  Function {
    return_type: String,
    params:      Vec<Parameter>,
  },
  /// A constant such as a `#define`. `value_type` is the declared type.
  Constant { value_type: String },
  /// A global variable.
  Variable { value_type: String },
}

impl CompletionKind {
  /// The tag used for this kind in the data source.
  pub const fn tag(&self) -> &'static str {
    match self {
      Self::Function { .. } => "function",
      Self::Constant { .. } => "constant",
      Self::Variable { .. } => "variable",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
  pub name:       String,
  /// Description shown to the user. HTML, may link to other records by name.
  pub summary:    Option<String>,
  /// Grouping label, usually the header that declares the item.
  pub defined_in: Option<String>,
  pub kind:       CompletionKind,
}

impl Completion {
  pub fn function(
    name: impl Into<String>,
    return_type: impl Into<String>,
    params: Vec<Parameter>,
  ) -> Self {
    Self::with_kind(name, CompletionKind::Function {
      return_type: return_type.into(),
      params,
    })
  }

  pub fn constant(name: impl Into<String>, value_type: impl Into<String>) -> Self {
    Self::with_kind(name, CompletionKind::Constant {
      value_type: value_type.into(),
    })
  }

  pub fn variable(name: impl Into<String>, value_type: impl Into<String>) -> Self {
    Self::with_kind(name, CompletionKind::Variable {
      value_type: value_type.into(),
    })
  }

  fn with_kind(name: impl Into<String>, kind: CompletionKind) -> Self {
    Self {
      name: name.into(),
      summary: None,
      defined_in: None,
      kind,
    }
  }

  pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
    self.summary = Some(summary.into());
    self
  }

  pub fn with_defined_in(mut self, defined_in: impl Into<String>) -> Self {
    self.defined_in = Some(defined_in.into());
    self
  }

  /// Return type for functions, declared type for constants and variables.
  pub fn ty(&self) -> &str {
    match &self.kind {
      CompletionKind::Function { return_type, .. } => return_type,
      CompletionKind::Constant { value_type } | CompletionKind::Variable { value_type } => {
        value_type
      },
    }
  }

  /// Parameters of a function, empty for anything else.
  pub fn params(&self) -> &[Parameter] {
    match &self.kind {
      CompletionKind::Function { params, .. } => params,
      _ => &[],
    }
  }

  #[inline]
  pub fn is_function(&self) -> bool {
    matches!(self.kind, CompletionKind::Function { .. })
  }

  /// Plain-text header for the description area, e.g.
  /// `int printf(const char* format, ...)`.
  pub fn signature(&self) -> String {
    let mut header = format!("{} {}", self.ty(), self.name);
    if let CompletionKind::Function { params, .. } = &self.kind {
      header.push('(');
      for (i, param) in params.iter().enumerate() {
        if i > 0 {
          header.push_str(", ");
        }
        header.push_str(&param.to_string());
      }
      header.push(')');
    }
    header
  }
}

/// Stock orderings for sorting a catalog.
///
/// The loader takes any comparator; these cover the settings exposed by the
/// configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionOrder {
  CaseSensitive,
  #[default]
  CaseInsensitive,
}

impl CompletionOrder {
  pub fn compare(self, a: &Completion, b: &Completion) -> Ordering {
    match self {
      Self::CaseSensitive => a.name.cmp(&b.name),
      Self::CaseInsensitive => {
        compare_ignore_case(&a.name, &b.name).then_with(|| a.name.cmp(&b.name))
      },
    }
  }

  /// Comparator closure suitable for passing to the loader.
  pub fn comparator(self) -> impl Fn(&Completion, &Completion) -> Ordering + Copy {
    move |a, b| self.compare(a, b)
  }
}

/// Compares two strings ignoring case, folding each char to lowercase so
/// `ÉTAT` and `état` compare equal.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
  a.chars()
    .flat_map(char::to_lowercase)
    .cmp(b.chars().flat_map(char::to_lowercase))
}
