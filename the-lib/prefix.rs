//! Finding the partial identifier in front of the caret.
//!
//! The scan only looks at the line the caret is on and walks backward one
//! char at a time while the previous char is part of an identifier. What
//! counts as an identifier char is language specific: [`char_is_word`] is the
//! default for C-like languages and [`WordChars`] extends it from config.

use ropey::RopeSlice;
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
  #[error("caret offset {offset} is out of bounds (len: {len})")]
  InvalidOffset { offset: usize, len: usize },
}

/// Default identifier chars: alphanumerics and underscore.
#[inline]
pub fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// [`char_is_word`] plus a language specific set of extra chars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordChars {
  extra: SmallVec<[char; 4]>,
}

impl WordChars {
  pub fn new(extra: impl IntoIterator<Item = char>) -> Self {
    Self {
      extra: extra.into_iter().collect(),
    }
  }

  #[inline]
  pub fn contains(&self, ch: char) -> bool {
    char_is_word(ch) || self.extra.contains(&ch)
  }
}

/// Returns the text between the start of the identifier being typed and the
/// caret. `caret` is a char index into `text`.
///
/// An out-of-range caret is reported rather than treated as an empty prefix
/// so callers notice stale offsets.
pub fn prefix_at(
  text: RopeSlice,
  caret: usize,
  is_valid: impl Fn(char) -> bool,
) -> Result<String, PrefixError> {
  let len = text.len_chars();
  if caret > len {
    return Err(PrefixError::InvalidOffset { offset: caret, len });
  }

  let line_start = text.line_to_char(text.char_to_line(caret));
  let mut start = caret;
  let mut chars = text.chars_at(caret);
  while start > line_start {
    match chars.prev() {
      Some(ch) if is_valid(ch) => start -= 1,
      _ => break,
    }
  }

  Ok(text.slice(start..caret).to_string())
}

/// [`prefix_at`] with [`char_is_word`].
pub fn word_prefix_at(text: RopeSlice, caret: usize) -> Result<String, PrefixError> {
  prefix_at(text, caret, char_is_word)
}

#[cfg(test)]
mod test {
  use ropey::Rope;

  use super::*;

  fn prefix(text: &str, caret: usize) -> String {
    word_prefix_at(Rope::from(text).slice(..), caret).unwrap()
  }

  #[test]
  fn whole_identifier() {
    assert_eq!(prefix("foo_bar", 7), "foo_bar");
  }

  #[test]
  fn stops_at_punctuation() {
    assert_eq!(prefix("a.foo_bar", 9), "foo_bar");
    assert_eq!(prefix("printf(buf", 10), "buf");
    assert_eq!(prefix("x = y", 5), "y");
  }

  #[test]
  fn caret_in_middle() {
    assert_eq!(prefix("fopen_max", 5), "fopen");
  }

  #[test]
  fn empty_results() {
    assert_eq!(prefix("", 0), "");
    assert_eq!(prefix("foo ", 4), "");
    assert_eq!(prefix("foo", 0), "");
  }

  #[test]
  fn stays_on_caret_line() {
    assert_eq!(prefix("abc\ndef", 7), "def");
    assert_eq!(prefix("abc\n", 4), "");
    assert_eq!(prefix("abc\r\nde", 7), "de");
    // Caret right before the line break still belongs to the first line.
    assert_eq!(prefix("abc\ndef", 3), "abc");
  }

  #[test]
  fn unicode_identifiers() {
    assert_eq!(prefix("x = größe", 9), "größe");
  }

  #[test]
  fn out_of_range_caret() {
    let text = Rope::from("abc");
    assert_eq!(
      word_prefix_at(text.slice(..), 4),
      Err(PrefixError::InvalidOffset { offset: 4, len: 3 })
    );
  }

  #[test]
  fn custom_predicate() {
    let text = Rope::from("echo $HOME");
    let shell = WordChars::new(['$']);
    assert_eq!(
      prefix_at(text.slice(..), 10, |ch| shell.contains(ch)).unwrap(),
      "$HOME"
    );
    assert_eq!(word_prefix_at(text.slice(..), 10).unwrap(), "HOME");
    assert_eq!(prefix_at(text.slice(..), 10, |_| true).unwrap(), "echo $HOME");
  }

  quickcheck::quickcheck! {
    fn prefix_is_idempotent_suffix(text: String, caret: usize) -> bool {
      let rope = Rope::from(text.as_str());
      let caret = caret % (rope.len_chars() + 1);
      let first = word_prefix_at(rope.slice(..), caret).unwrap();
      let second = word_prefix_at(rope.slice(..), caret).unwrap();
      let before: String = rope.slice(..caret).to_string();
      first == second && before.ends_with(&first) && first.chars().all(char_is_word)
    }
  }
}
