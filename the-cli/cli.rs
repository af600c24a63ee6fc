use std::path::PathBuf;

use anyhow::Result;
use clap::{
  ArgAction,
  Parser,
  Subcommand,
};

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
  pub data:        Option<String>,
  pub command:     Command,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  /// Complete the identifier in front of `caret` in `file`.
  Complete { file: PathBuf, caret: Caret },
  /// Show a description page, then follow `links` in order.
  Describe { name: String, links: Vec<String> },
  /// Print the whole catalog.
  List,
}

/// Where the caret is in the buffer being completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Caret {
  End,
  /// Zero-based line and column, in chars.
  At { row: usize, col: usize },
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(name = "the-complete", about, long_about = None, version)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", global = true)]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
  config_file: Option<PathBuf>,

  /// Completion data source, overrides the configured one
  #[arg(short = 'd', long = "data", value_name = "SOURCE", global = true)]
  data: Option<String>,

  #[command(subcommand)]
  command: RawCommand,
}

#[derive(Subcommand, Debug)]
enum RawCommand {
  /// Print completions for the identifier before the caret
  Complete {
    /// File to complete in, optionally with a :row[:col] suffix
    #[arg(value_name = "FILE[:ROW[:COL]]")]
    input: String,
  },
  /// Print the description of a completion
  Describe {
    name: String,

    /// Follow a link in the displayed description (repeatable)
    #[arg(short = 'f', long = "follow", value_name = "TARGET")]
    follow: Vec<String>,
  },
  /// Print every completion in catalog order
  List,
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let command = match raw.command {
      RawCommand::Complete { input } => {
        let (file, caret) = parse_file(&input);
        Command::Complete { file, caret }
      },
      RawCommand::Describe { name, follow } => Command::Describe {
        name,
        links: follow,
      },
      RawCommand::List => Command::List,
    };

    Ok(Self {
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
      data: raw.data,
      command,
    })
  }
}

/// Parse arg into [`PathBuf`] and caret position.
///
/// Rows and columns are one-based on the command line.
fn parse_file(s: &str) -> (PathBuf, Caret) {
  let def = || (PathBuf::from(s), Caret::End);
  if PathBuf::from(s).exists() {
    return def();
  }
  split_path_row_col(s)
    .or_else(|| split_path_row(s))
    .unwrap_or_else(def)
}

/// Split file.rs:10:2 into [`PathBuf`], row and col.
fn split_path_row_col(s: &str) -> Option<(PathBuf, Caret)> {
  let mut s = s.trim_end_matches(':').rsplitn(3, ':');
  let col: usize = s.next()?.parse().ok()?;
  let row: usize = s.next()?.parse().ok()?;
  let path = s.next()?.into();
  Some((path, Caret::At {
    row: row.saturating_sub(1),
    col: col.saturating_sub(1),
  }))
}

/// Split file.rs:10 into [`PathBuf`] and row, the caret goes to the end of
/// that row.
fn split_path_row(s: &str) -> Option<(PathBuf, Caret)> {
  let (path, row) = s.trim_end_matches(':').rsplit_once(':')?;
  let row: usize = row.parse().ok()?;
  Some((path.into(), Caret::At {
    row: row.saturating_sub(1),
    col: usize::MAX,
  }))
}
