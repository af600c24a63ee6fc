//! Completion data and the state machines behind an editor's completion
//! popup and description window.

pub mod catalog;
pub mod completion;
pub mod data_type;
pub mod description;
pub mod history;
pub mod prefix;

pub use catalog::Catalog;
pub use completion::{
  Completion,
  CompletionKind,
  CompletionOrder,
  Parameter,
};
