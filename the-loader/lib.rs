pub mod catalog;
pub mod config;

use std::{
  borrow::Cow,
  path::{
    Path,
    PathBuf,
  },
  sync::LazyLock,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};

pub use crate::catalog::{
  FormatError,
  LoadError,
  load,
  load_catalog,
  parse,
};

static RUNTIME_DIRS: LazyLock<Vec<PathBuf>> = LazyLock::new(prioritize_runtime_dirs);

/// A list of runtime directories from highest to lowest priority
///
/// The priority is:
///
/// 1. sibling directory to `CARGO_MANIFEST_DIR` (if environment variable is
///    set)
/// 2. subdirectory of user config directory (always included)
/// 3. `THE_COMPLETION_RUNTIME` (if environment variable is set)
/// 4. `THE_COMPLETION_DEFAULT_RUNTIME` (if environment variable is set *at
///    build time*)
/// 5. subdirectory of path to the executable (if determinable)
///
/// Postcondition: returns at least one path (it might not exist).
fn prioritize_runtime_dirs() -> Vec<PathBuf> {
  const RT_DIR: &str = "runtime";
  let mut rt_dirs = Vec::new();
  if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR") {
    // CARGO_MANIFEST_DIR points at a member crate, the runtime lives next to
    // the workspace members.
    if let Some(path) = PathBuf::from(dir).parent().map(|p| p.join(RT_DIR)) {
      tracing::debug!("runtime dir: {}", path.to_string_lossy());
      rt_dirs.push(path);
    }
  }

  if let Some(dir) = config_dir() {
    rt_dirs.push(dir.join(RT_DIR));
  }

  if let Ok(dir) = std::env::var("THE_COMPLETION_RUNTIME") {
    rt_dirs.push(expand_tilde(Path::new(&dir)).into_owned());
  }

  if let Some(dir) = std::option_env!("THE_COMPLETION_DEFAULT_RUNTIME") {
    rt_dirs.push(dir.into());
  }

  // canonicalize in case the executable is symlinked
  if let Some(exe_rt_dir) = std::env::current_exe()
    .ok()
    .and_then(|path| std::fs::canonicalize(path).ok())
    .and_then(|path| path.parent().map(|p| p.join(RT_DIR)))
  {
    rt_dirs.push(exe_rt_dir);
  }

  rt_dirs
}

/// Runtime directories ordered from highest to lowest priority
pub fn runtime_dirs() -> &'static [PathBuf] {
  &RUNTIME_DIRS
}

/// Find file with path relative to a runtime directory
///
/// The runtime directories are searched in priority order and the first file
/// found to exist is returned.
pub fn find_runtime_file(rel_path: impl AsRef<Path>) -> Option<PathBuf> {
  find_file_in(runtime_dirs(), rel_path.as_ref())
}

fn find_file_in(dirs: &[PathBuf], rel_path: &Path) -> Option<PathBuf> {
  dirs.iter().find_map(|dir| {
    let path = dir.join(rel_path);
    if path.is_file() { Some(path) } else { None }
  })
}

/// Resolves the name of a completion data source.
///
/// A name that points at an existing file is used as is, anything else is
/// looked up as a bundled resource relative to the runtime directories.
pub fn resolve_source(name: impl AsRef<Path>) -> Option<PathBuf> {
  resolve_source_in(runtime_dirs(), name.as_ref())
}

pub(crate) fn resolve_source_in(dirs: &[PathBuf], name: &Path) -> Option<PathBuf> {
  let direct = expand_tilde(name);
  if direct.is_file() {
    return Some(direct.into_owned());
  }
  find_file_in(dirs, name)
}

/// The user configuration directory, `None` if the platform has none.
pub fn config_dir() -> Option<PathBuf> {
  if let Ok(dir) = std::env::var("THE_COMPLETION_CONFIG_DIR") {
    return Some(expand_tilde(Path::new(&dir)).into_owned());
  }
  let strategy = choose_base_strategy().ok()?;
  let mut path = strategy.config_dir();
  path.push("the-completion");
  Some(path)
}

pub fn config_file() -> Option<PathBuf> {
  config_dir().map(|dir| dir.join("completion.toml"))
}

pub fn cache_dir() -> Option<PathBuf> {
  let strategy = choose_base_strategy().ok()?;
  let mut path = strategy.cache_dir();
  path.push("the-completion");
  Some(path)
}

pub fn default_log_file() -> Option<PathBuf> {
  cache_dir().map(|dir| dir.join("the-completion.log"))
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> Cow<'_, Path> {
  let Ok(rest) = path.strip_prefix("~") else {
    return Cow::Borrowed(path);
  };
  match etcetera::home_dir() {
    Ok(home) => Cow::Owned(home.join(rest)),
    Err(_) => Cow::Borrowed(path),
  }
}

/// Merge two TOML documents, merging values from `right` onto `left`
///
/// `merge_depth` sets the nesting depth up to which tables are merged instead
/// of overridden. Arrays are always replaced: a user list of data types
/// replaces the built-in one.
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  match (left, right) {
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (rname, rvalue) in right_map {
        let merged = match left_map.remove(&rname) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(rname, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}
