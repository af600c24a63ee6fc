use std::{
  collections::HashMap,
  ops::Index,
  slice,
};

use crate::completion::Completion;

/// The sorted, immutable set of completions produced by one load.
///
/// Sorting is the loader's job; the catalog only preserves the order it was
/// handed. Lookups by exact name return the first record in that order when
/// a name occurs more than once.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  completions: Vec<Completion>,
}

impl Catalog {
  pub fn new(completions: Vec<Completion>) -> Self {
    Self { completions }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.completions.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.completions.is_empty()
  }

  pub fn iter(&self) -> slice::Iter<'_, Completion> {
    self.completions.iter()
  }

  pub fn as_slice(&self) -> &[Completion] {
    &self.completions
  }

  /// Resolves a link target or an accepted completion by exact name.
  pub fn get(&self, name: &str) -> Option<&Completion> {
    self.completions.iter().find(|c| c.name == name)
  }

  /// Completions whose name starts with `prefix`, ignoring ASCII case, in
  /// catalog order. An empty prefix matches everything.
  pub fn matching<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Completion> + 'a {
    self
      .completions
      .iter()
      .filter(move |c| starts_with_ignore_case(&c.name, prefix))
  }

  /// Names that occur more than once, in catalog order.
  pub fn duplicate_names(&self) -> Vec<&str> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(self.completions.len());
    for completion in &self.completions {
      *seen.entry(completion.name.as_str()).or_default() += 1;
    }
    let mut duplicates = Vec::new();
    for completion in &self.completions {
      let name = completion.name.as_str();
      if seen.get(name).is_some_and(|&n| n > 1) && !duplicates.contains(&name) {
        duplicates.push(name);
      }
    }
    duplicates
  }

  pub fn into_inner(self) -> Vec<Completion> {
    self.completions
  }
}

impl Index<usize> for Catalog {
  type Output = Completion;

  fn index(&self, index: usize) -> &Completion {
    &self.completions[index]
  }
}

impl<'a> IntoIterator for &'a Catalog {
  type Item = &'a Completion;
  type IntoIter = slice::Iter<'a, Completion>;

  fn into_iter(self) -> Self::IntoIter {
    self.completions.iter()
  }
}

impl From<Vec<Completion>> for Catalog {
  fn from(completions: Vec<Completion>) -> Self {
    Self::new(completions)
  }
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
  name.len() >= prefix.len()
    && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
