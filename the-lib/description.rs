//! The non-visual half of a description window.
//!
//! A [`DescriptionView`] decides which page a description window shows and
//! keeps its [`History`]. Selecting a completion starts a fresh history;
//! following a link inside a description appends to it.

use url::Url;

use crate::{
  catalog::Catalog,
  completion::Completion,
  history::{
    History,
    NavState,
  },
};

pub const DEFAULT_PLACEHOLDER: &str = "<html><em>No description available</em>";

/// What the host should do after a link was activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
  /// The link named a completion, its page is now displayed.
  Shown(NavState),
  /// The link is an absolute URL. History is untouched; opening it is up to
  /// the host.
  External(Url),
}

#[derive(Debug, Clone)]
pub struct DescriptionView {
  history:     History,
  placeholder: String,
}

impl Default for DescriptionView {
  fn default() -> Self {
    Self::new(DEFAULT_PLACEHOLDER)
  }
}

impl DescriptionView {
  pub fn new(placeholder: impl Into<String>) -> Self {
    Self {
      history:     History::new(),
      placeholder: placeholder.into(),
    }
  }

  /// Shows `completion` as the only page in the history.
  pub fn show(&mut self, completion: Option<&Completion>) -> NavState {
    self.history.reset();
    let page = self.page_for(completion);
    self.history.push(page)
  }

  /// Handles an activated link. `target` is either the name of another
  /// completion in `catalog` or an absolute URL.
  ///
  /// Names win over URLs, so `std::abs` or `initWithFrame:` resolve to their
  /// records. Only hierarchical URLs such as `https://..` or `file:///..` are
  /// external.
  pub fn follow_link(&mut self, catalog: &Catalog, target: &str) -> LinkAction {
    let completion = catalog.get(target);
    if completion.is_none()
      && let Ok(url) = Url::parse(target)
      && !url.cannot_be_a_base()
    {
      return LinkAction::External(url);
    }

    if completion.is_none() {
      tracing::debug!("link target {target:?} is not in the catalog");
    }
    let page = self.page_for(completion);
    LinkAction::Shown(self.history.push(page))
  }

  pub fn back(&mut self) -> Option<&str> {
    self.history.back()
  }

  pub fn forward(&mut self) -> Option<&str> {
    self.history.forward()
  }

  /// Called when the window is hidden.
  pub fn hide(&mut self) {
    self.history.reset();
  }

  pub fn current(&self) -> Option<&str> {
    self.history.current()
  }

  pub fn nav_state(&self) -> NavState {
    self.history.nav_state()
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  fn page_for(&self, completion: Option<&Completion>) -> String {
    completion
      .and_then(|completion| completion.summary.clone())
      .unwrap_or_else(|| self.placeholder.clone())
  }
}
