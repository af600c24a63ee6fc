//! Back/forward history of the description pages shown to the user.

/// Which navigation affordances the host should enable.
///
/// Recomputed after every change to a [`History`]; it is the only signal a
/// host needs to drive its back and forward controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavState {
  pub back:    bool,
  pub forward: bool,
}

/// Stores the pages displayed in a description window.
///
/// The history is a vector of pages plus a cursor pointing at the page
/// currently displayed. Pushing a page while the cursor is not at the end
/// discards the abandoned forward branch, the way a web browser does.
///
/// The cursor is `None` exactly when there are no pages.
#[derive(Debug, Clone, Default)]
pub struct History {
  pages:   Vec<String>,
  current: Option<usize>,
}

impl History {
  pub fn new() -> Self {
    Self::default()
  }

  /// Displays `page` right after the current page.
  pub fn push(&mut self, page: impl Into<String>) -> NavState {
    let next = self.current.map_or(0, |current| current + 1);
    self.pages.truncate(next);
    self.pages.push(page.into());
    self.current = Some(next);
    self.nav_state()
  }

  /// Moves to the previous page and returns it, if there is one.
  pub fn back(&mut self) -> Option<&str> {
    match self.current {
      Some(current) if current > 0 => {
        self.current = Some(current - 1);
        Some(&self.pages[current - 1])
      },
      _ => None,
    }
  }

  /// Moves to the next page and returns it, if there is one.
  pub fn forward(&mut self) -> Option<&str> {
    match self.current {
      Some(current) if current + 1 < self.pages.len() => {
        self.current = Some(current + 1);
        Some(&self.pages[current + 1])
      },
      _ => None,
    }
  }

  /// Forgets every page.
  pub fn reset(&mut self) {
    self.pages.clear();
    self.current = None;
  }

  #[inline]
  pub fn can_go_back(&self) -> bool {
    self.current.is_some_and(|current| current > 0)
  }

  #[inline]
  pub fn can_go_forward(&self) -> bool {
    self
      .current
      .is_some_and(|current| current + 1 < self.pages.len())
  }

  pub fn nav_state(&self) -> NavState {
    NavState {
      back:    self.can_go_back(),
      forward: self.can_go_forward(),
    }
  }

  /// The page currently displayed.
  pub fn current(&self) -> Option<&str> {
    self.current.map(|current| self.pages[current].as_str())
  }

  #[inline]
  pub fn position(&self) -> Option<usize> {
    self.current
  }

  pub fn pages(&self) -> &[String] {
    &self.pages
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.pages.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.pages.is_empty()
  }
}
