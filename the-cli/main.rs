mod cli;

use std::{
  io::{
    self,
    Write,
  },
  path::PathBuf,
};

use anyhow::{
  Context,
  Result,
  anyhow,
};
use ropey::Rope;
use the_lib::{
  Catalog,
  Completion,
  description::LinkAction,
  history::NavState,
  prefix::prefix_at,
};
use the_loader::{
  config::Config,
  load_catalog,
};

use crate::cli::{
  Caret,
  CliOptions,
  Command,
};

fn main() -> Result<()> {
  let options = CliOptions::parse()?;
  setup_logging(options.verbosity, options.log_file.clone())?;

  let mut config = Config::load(options.config_file.as_deref())
    .map_err(|err| anyhow!("failed to load config: {err:#}"))?;
  if let Some(data) = options.data {
    config.data = data;
  }

  let catalog = load_catalog(&config.data, config.order.comparator())?;
  log::info!("{} completions in catalog", catalog.len());

  let stdout = io::stdout();
  let mut out = stdout.lock();
  match options.command {
    Command::Complete { file, caret } => complete(&mut out, &config, &catalog, file, caret),
    Command::Describe { name, links } => describe(&mut out, &config, &catalog, &name, &links),
    Command::List => {
      for completion in &catalog {
        print_completion(&mut out, completion)?;
      }
      Ok(())
    },
  }
}

fn complete(
  out: &mut impl Write,
  config: &Config,
  catalog: &Catalog,
  file: PathBuf,
  caret: Caret,
) -> Result<()> {
  let text = std::fs::read_to_string(&file)
    .with_context(|| format!("failed to read '{}'", file.display()))?;
  let text = Rope::from(text);
  let offset = caret_offset(&text, caret);

  let word_chars = config.word_chars();
  let prefix = prefix_at(text.slice(..), offset, |ch| word_chars.contains(ch))?;
  writeln!(out, "prefix: {prefix:?}")?;
  for completion in catalog.matching(&prefix) {
    print_completion(out, completion)?;
  }
  Ok(())
}

/// Char offset for `caret`, clamped to the buffer and to the caret's line.
fn caret_offset(text: &Rope, caret: Caret) -> usize {
  match caret {
    Caret::End => text.len_chars(),
    Caret::At { row, col } => {
      let row = row.min(text.len_lines().saturating_sub(1));
      let line = text.line(row);
      let line_end = line.len_chars() - line_ending_len(line);
      text.line_to_char(row) + col.min(line_end)
    },
  }
}

/// Length of the line break ending `line`, covering every break ropey splits
/// lines on.
fn line_ending_len(line: ropey::RopeSlice) -> usize {
  let mut chars = line.chars_at(line.len_chars());
  match (chars.prev(), chars.prev()) {
    (Some('\n'), Some('\r')) => 2,
    (
      Some('\n' | '\u{000B}' | '\u{000C}' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}'),
      _,
    ) => 1,
    _ => 0,
  }
}

fn describe(
  out: &mut impl Write,
  config: &Config,
  catalog: &Catalog,
  name: &str,
  links: &[String],
) -> Result<()> {
  let completion = catalog.get(name);
  if completion.is_none() {
    log::warn!("'{name}' is not in the catalog");
  }

  let data_types = config.data_types();
  let word_chars = config.word_chars();
  if let Some(completion) = completion {
    let header = completion.signature();
    if config.data_types.colorize_header {
      let types: Vec<_> = header
        .split(|ch: char| !word_chars.contains(ch))
        .filter(|token| data_types.classify(token).is_some())
        .collect();
      writeln!(out, "{header}  [types: {}]", types.join(", "))?;
    } else {
      writeln!(out, "{header}")?;
    }
  }

  let mut view = config.description_view();
  let mut state = view.show(completion);
  for link in links {
    match view.follow_link(catalog, link) {
      LinkAction::Shown(next) => state = next,
      LinkAction::External(url) => writeln!(out, "external link: {url}")?,
    }
  }

  writeln!(out, "{}", view.current().unwrap_or_default())?;
  print_nav_state(out, state)
}

fn print_nav_state(out: &mut impl Write, state: NavState) -> Result<()> {
  writeln!(
    out,
    "[back: {}] [forward: {}]",
    if state.back { "on" } else { "off" },
    if state.forward { "on" } else { "off" }
  )?;
  Ok(())
}

fn print_completion(out: &mut impl Write, completion: &Completion) -> Result<()> {
  match &completion.defined_in {
    Some(defined_in) => {
      writeln!(
        out,
        "{:<10} {}  ({defined_in})",
        completion.kind.tag(),
        completion.signature()
      )?
    },
    None => writeln!(out, "{:<10} {}", completion.kind.tag(), completion.signature())?,
  }
  Ok(())
}

fn setup_logging(verbosity: u8, log_file: Option<PathBuf>) -> Result<()> {
  let level = match verbosity {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };

  let mut dispatch = fern::Dispatch::new()
    .level(level)
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.target(),
        record.level(),
        message
      ))
    })
    .chain(io::stderr());

  if let Some(path) = log_file.or_else(the_loader::default_log_file) {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).ok();
    }
    match fern::log_file(&path) {
      Ok(file) => dispatch = dispatch.chain(file),
      Err(err) => eprintln!("cannot open log file '{}': {err}", path.display()),
    }
  }

  dispatch.apply().context("failed to install logger")
}
