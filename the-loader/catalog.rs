//! Loading completion catalogs from XML.
//!
//! The data source lists the functions and constants of an API:
//!
//! ```xml
//! <keywords>
//!   <keyword name="fopen" type="function" returnType="FILE*" definedIn="stdio.h">
//!     <params>
//!       <param type="const char*" name="filename"/>
//!       <param type="const char*" name="mode"/>
//!     </params>
//!     <desc><![CDATA[Opens a file. See <a href="fclose">fclose</a>.]]></desc>
//!   </keyword>
//!   <keyword name="EOF" type="constant" returnType="int" definedIn="stdio.h"/>
//! </keywords>
//! ```
//!
//! Attribute and element names are fixed; existing data files depend on them.

use std::{
  cmp::Ordering,
  fs,
  io,
  path::{
    Path,
    PathBuf,
  },
  time::Instant,
};

use quick_xml::{
  Reader,
  escape::{
    EscapeError,
    resolve_predefined_entity,
    unescape,
  },
  events::{
    BytesStart,
    Event,
    attributes::AttrError,
  },
};
use the_lib::{
  Catalog,
  Completion,
  CompletionKind,
  Parameter,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("completion source '{}' not found as a file or runtime resource", .name.display())]
  NotFound { name: PathBuf },
  #[error("failed to read completion source '{}'", .path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("malformed completion source '{}': {source}", .path.display())]
  Format {
    path:   PathBuf,
    #[source]
    source: FormatError,
  },
}

#[derive(Debug, Error)]
pub enum FormatError {
  #[error("source is not valid UTF-8")]
  Encoding(#[from] std::string::FromUtf8Error),
  #[error("xml error at byte {position}: {source}")]
  Xml {
    position: u64,
    #[source]
    source:   quick_xml::Error,
  },
  #[error("invalid attribute: {0}")]
  Attribute(#[from] AttrError),
  #[error("invalid escape sequence: {0}")]
  Escape(#[from] EscapeError),
  #[error("unknown entity reference '&{0};'")]
  UnknownEntity(String),
  #[error("<{element}> is missing the '{attribute}' attribute")]
  MissingAttribute {
    element:   &'static str,
    attribute: &'static str,
  },
  #[error("keyword '{name}' has unexpected type '{ty}'")]
  UnknownType { name: String, ty: String },
  #[error("unexpected end of input inside <keywords>")]
  UnexpectedEof,
  #[error("no <keywords> element found")]
  MissingRoot,
  #[error("<keyword> '{0}' contains another <keyword>")]
  NestedKeyword(String),
}

/// Loads and sorts the completions described by `name`.
///
/// `name` is opened directly when it is a file, otherwise it is looked up in
/// the runtime directories. The whole source is rejected on the first error;
/// no partial result is returned.
pub fn load(
  name: impl AsRef<Path>,
  order: impl FnMut(&Completion, &Completion) -> Ordering,
) -> Result<Vec<Completion>, LoadError> {
  let name = name.as_ref();
  let start = tracing::enabled!(tracing::Level::DEBUG).then(Instant::now);
  let path = crate::resolve_source(name).ok_or_else(|| {
    LoadError::NotFound {
      name: name.to_owned(),
    }
  })?;

  // The file handle is closed as soon as the bytes are in memory.
  let bytes = fs::read(&path).map_err(|source| {
    LoadError::Io {
      path: path.clone(),
      source,
    }
  })?;
  let completions = String::from_utf8(bytes)
    .map_err(FormatError::from)
    .and_then(|xml| parse(&xml, order))
    .map_err(|source| LoadError::Format {
      path: path.clone(),
      source,
    })?;

  if let Some(start) = start {
    tracing::debug!(
      "loaded {} completions from {} in {}s",
      completions.len(),
      path.display(),
      Instant::now().duration_since(start).as_secs_f64()
    );
  }
  Ok(completions)
}

/// [`load`] into a [`Catalog`], warning about names that occur more than once.
///
/// Lookups by name resolve duplicates to the first record in catalog order.
pub fn load_catalog(
  name: impl AsRef<Path>,
  order: impl FnMut(&Completion, &Completion) -> Ordering,
) -> Result<Catalog, LoadError> {
  let catalog = Catalog::new(load(name.as_ref(), order)?);
  for duplicate in catalog.duplicate_names() {
    tracing::warn!(
      "completion '{duplicate}' is defined more than once in {}",
      name.as_ref().display()
    );
  }
  Ok(catalog)
}

/// Parses an XML completion source and sorts the result with `order`.
pub fn parse(
  xml: &str,
  mut order: impl FnMut(&Completion, &Completion) -> Ordering,
) -> Result<Vec<Completion>, FormatError> {
  let mut reader = Reader::from_str(xml);
  let mut parser = Parser::default();

  loop {
    let event = reader.read_event().map_err(|source| {
      FormatError::Xml {
        position: reader.error_position() as u64,
        source,
      }
    })?;
    match event {
      Event::Start(ref e) => parser.start(e)?,
      Event::Empty(ref e) => {
        parser.start(e)?;
        parser.end(e.name().as_ref())?;
      },
      Event::End(ref e) => parser.end(e.name().as_ref())?,
      Event::Text(ref e) => parser.text(&String::from_utf8_lossy(e)),
      Event::CData(ref e) => parser.text(&String::from_utf8_lossy(e)),
      Event::GeneralRef(ref e) => {
        let name = String::from_utf8_lossy(e);
        parser.text(&resolve_reference(&name)?);
      },
      Event::Eof => break,
      _ => {},
    }
  }

  let mut completions = parser.finish()?;
  completions.sort_by(|a, b| order(a, b));
  Ok(completions)
}

/// Resolves `&name;` found in text content.
fn resolve_reference(name: &str) -> Result<String, FormatError> {
  let unknown = || FormatError::UnknownEntity(name.to_owned());
  if let Some(code) = name.strip_prefix('#') {
    let code = match code.strip_prefix('x') {
      Some(hex) => u32::from_str_radix(hex, 16),
      None => code.parse(),
    }
    .map_err(|_| unknown())?;
    return char::from_u32(code).map(String::from).ok_or_else(unknown);
  }
  resolve_predefined_entity(name)
    .map(str::to_owned)
    .ok_or_else(unknown)
}

/// Attributes of the `<keyword>` being read.
#[derive(Debug)]
struct Keyword {
  name:        String,
  ty:          String,
  return_type: String,
  defined_in:  Option<String>,
  params:      Vec<Parameter>,
  desc:        Option<String>,
}

impl Keyword {
  fn build(self) -> Result<Completion, FormatError> {
    let Keyword {
      name,
      ty,
      return_type,
      defined_in,
      params,
      desc,
    } = self;
    let kind = match ty.as_str() {
      "function" => {
        CompletionKind::Function {
          return_type,
          params,
        }
      },
      "constant" => {
        CompletionKind::Constant {
          value_type: return_type,
        }
      },
      "variable" => {
        CompletionKind::Variable {
          value_type: return_type,
        }
      },
      other => {
        return Err(FormatError::UnknownType {
          name,
          ty: other.to_owned(),
        });
      },
    };
    Ok(Completion {
      name,
      summary: desc.map(|desc| desc.trim().to_owned()),
      defined_in,
      kind,
    })
  }
}

#[derive(Debug, Default)]
struct Parser {
  completions: Vec<Completion>,
  seen_root:   bool,
  in_keywords: bool,
  keyword:     Option<Keyword>,
  in_params:   bool,
  in_desc:     bool,
}

impl Parser {
  fn start(&mut self, e: &BytesStart) -> Result<(), FormatError> {
    let name = e.name();
    match name.as_ref() {
      // Markup inside a description is not structure.
      _ if self.in_desc => {},
      b"keywords" => {
        self.seen_root = true;
        self.in_keywords = true;
      },
      b"keyword" if self.in_keywords => {
        if let Some(outer) = &self.keyword {
          return Err(FormatError::NestedKeyword(outer.name.clone()));
        }
        let mut attrs = Attrs::read(e)?;
        self.keyword = Some(Keyword {
          name:        attrs.require("keyword", "name")?,
          ty:          attrs.require("keyword", "type")?,
          return_type: attrs.require("keyword", "returnType")?,
          defined_in:  attrs.take("definedIn"),
          params:      Vec::new(),
          desc:        None,
        });
      },
      b"desc" if self.keyword.is_some() => {
        self.in_desc = true;
        if let Some(keyword) = &mut self.keyword {
          keyword.desc = Some(String::new());
        }
      },
      b"params" if self.keyword.is_some() => self.in_params = true,
      b"param" if self.in_params => {
        let mut attrs = Attrs::read(e)?;
        let ty = attrs.require("param", "type")?;
        let name = attrs.take("name").filter(|name| !name.is_empty());
        if let Some(keyword) = &mut self.keyword {
          keyword.params.push(Parameter::new(ty, name));
        }
      },
      _ => {},
    }
    Ok(())
  }

  fn end(&mut self, name: &[u8]) -> Result<(), FormatError> {
    match name {
      b"desc" if self.in_desc => self.in_desc = false,
      _ if self.in_desc => {},
      b"params" => self.in_params = false,
      b"keyword" => {
        if let Some(keyword) = self.keyword.take() {
          self.completions.push(keyword.build()?);
        }
      },
      b"keywords" => self.in_keywords = false,
      _ => {},
    }
    Ok(())
  }

  fn text(&mut self, text: &str) {
    if !self.in_desc {
      return;
    }
    if let Some(desc) = self.keyword.as_mut().and_then(|k| k.desc.as_mut()) {
      desc.push_str(text);
    }
  }

  fn finish(self) -> Result<Vec<Completion>, FormatError> {
    if self.in_keywords {
      return Err(FormatError::UnexpectedEof);
    }
    if !self.seen_root {
      return Err(FormatError::MissingRoot);
    }
    Ok(self.completions)
  }
}

/// Unescaped attributes of one element.
struct Attrs(Vec<(Vec<u8>, String)>);

impl Attrs {
  fn read(e: &BytesStart) -> Result<Self, FormatError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
      let attr = attr?;
      let raw = String::from_utf8_lossy(&attr.value);
      let value = unescape(&raw)?.into_owned();
      attrs.push((attr.key.as_ref().to_vec(), value));
    }
    Ok(Self(attrs))
  }

  fn take(&mut self, key: &str) -> Option<String> {
    let index = self.0.iter().position(|(k, _)| k == key.as_bytes())?;
    Some(self.0.swap_remove(index).1)
  }

  fn require(
    &mut self,
    element: &'static str,
    attribute: &'static str,
  ) -> Result<String, FormatError> {
    self
      .take(attribute)
      .filter(|value| !value.is_empty())
      .ok_or(FormatError::MissingAttribute { element, attribute })
  }
}

#[cfg(test)]
mod test {
  use the_lib::CompletionOrder;

  use super::*;

  fn parse_sorted(xml: &str) -> Result<Vec<Completion>, FormatError> {
    parse(xml, CompletionOrder::CaseInsensitive.comparator())
  }

  const STDIO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE api SYSTEM "CompletionXml.dtd">
<api language="C">
  <keywords>
    <keyword name="printf" type="function" returnType="int" definedIn="stdio.h">
      <params>
        <param type="const char*" name="format"/>
        <param type="..."/>
      </params>
      <desc><![CDATA[Prints <b>formatted</b> output. See <a href="fprintf">fprintf</a>.]]></desc>
    </keyword>
    <keyword name="EOF" type="constant" returnType="int" definedIn="stdio.h"/>
    <keyword name="abs" type="function" returnType="int" definedIn="stdlib.h">
      <params><param type="int" name="n"/></params>
      <desc>Absolute value of &lt;n&gt; &amp; nothing else&#33;</desc>
    </keyword>
  </keywords>
</api>
"#;

  #[test]
  fn parses_functions_and_constants() {
    let completions = parse_sorted(STDIO).unwrap();
    let names: Vec<_> = completions.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["abs", "EOF", "printf"]);

    let printf = &completions[2];
    assert_eq!(printf.defined_in.as_deref(), Some("stdio.h"));
    assert_eq!(printf.params(), [
      Parameter::new("const char*", Some("format".into())),
      Parameter::new("...", None),
    ]);
    assert_eq!(
      printf.summary.as_deref(),
      Some(r#"Prints <b>formatted</b> output. See <a href="fprintf">fprintf</a>."#)
    );

    let eof = &completions[1];
    assert_eq!(eof.kind, CompletionKind::Constant {
      value_type: "int".into(),
    });
    assert_eq!(eof.summary, None);
  }

  #[test]
  fn resolves_entities_in_descriptions() {
    let completions = parse_sorted(STDIO).unwrap();
    assert_eq!(
      completions[0].summary.as_deref(),
      Some("Absolute value of <n> & nothing else!")
    );
  }

  #[test]
  fn keeps_parameter_order() {
    let xml = r#"<keywords>
      <keyword name="f" type="function" returnType="void">
        <params>
          <param type="int" name="d"/>
          <param type="int" name="c"/>
          <param type="int" name="b"/>
          <param type="int" name="a"/>
        </params>
      </keyword>
    </keywords>"#;
    let completions = parse_sorted(xml).unwrap();
    let names: Vec<_> = completions[0]
      .params()
      .iter()
      .map(|p| p.name.as_deref().unwrap())
      .collect();
    assert_eq!(names, ["d", "c", "b", "a"]);
  }

  #[test]
  fn params_do_not_leak_between_keywords() {
    let xml = r#"<keywords>
      <keyword name="f" type="function" returnType="void">
        <params><param type="int"/></params>
      </keyword>
      <keyword name="g" type="function" returnType="void"/>
    </keywords>"#;
    let completions = parse_sorted(xml).unwrap();
    assert_eq!(completions[0].params().len(), 1);
    assert!(completions[1].params().is_empty());
  }

  #[test]
  fn accepts_variables() {
    let xml = r#"<keywords><keyword name="errno" type="variable" returnType="int"/></keywords>"#;
    let completions = parse_sorted(xml).unwrap();
    assert_eq!(completions[0].kind, CompletionKind::Variable {
      value_type: "int".into(),
    });
  }

  #[test]
  fn empty_catalog() {
    assert!(parse_sorted("<keywords/>").unwrap().is_empty());
    assert!(parse_sorted("<keywords></keywords>").unwrap().is_empty());
  }

  #[test]
  fn uses_injected_order() {
    let xml = r#"<keywords>
      <keyword name="b" type="constant" returnType="int"/>
      <keyword name="C" type="constant" returnType="int"/>
      <keyword name="a" type="constant" returnType="int"/>
    </keywords>"#;
    let names = |completions: Vec<Completion>| -> Vec<String> {
      completions.into_iter().map(|c| c.name).collect()
    };
    assert_eq!(names(parse_sorted(xml).unwrap()), ["a", "b", "C"]);
    assert_eq!(
      names(parse(xml, CompletionOrder::CaseSensitive.comparator()).unwrap()),
      ["C", "a", "b"]
    );
    assert_eq!(
      names(parse(xml, |a, b| b.name.cmp(&a.name)).unwrap()),
      ["b", "a", "C"]
    );
  }

  #[test]
  fn rejects_unknown_type() {
    let xml = r#"<keywords>
      <keyword name="ok" type="constant" returnType="int"/>
      <keyword name="struct" type="macro" returnType="int"/>
    </keywords>"#;
    match parse_sorted(xml) {
      Err(FormatError::UnknownType { name, ty }) => {
        assert_eq!(name, "struct");
        assert_eq!(ty, "macro");
      },
      other => panic!("expected an unknown type error, got {other:?}"),
    }
  }

  #[test]
  fn rejects_missing_attributes() {
    let missing_type = r#"<keywords><keyword name="x" returnType="int"/></keywords>"#;
    assert!(matches!(
      parse_sorted(missing_type),
      Err(FormatError::MissingAttribute {
        element:   "keyword",
        attribute: "type",
      })
    ));

    let empty_name = r#"<keywords><keyword name="" type="constant" returnType="int"/></keywords>"#;
    assert!(matches!(
      parse_sorted(empty_name),
      Err(FormatError::MissingAttribute {
        attribute: "name",
        ..
      })
    ));

    let param = r#"<keywords>
      <keyword name="f" type="function" returnType="int"><params><param name="x"/></params></keyword>
    </keywords>"#;
    assert!(matches!(
      parse_sorted(param),
      Err(FormatError::MissingAttribute {
        element: "param",
        ..
      })
    ));
  }

  #[test]
  fn rejects_malformed_xml() {
    let mismatched = r#"<keywords><keyword name="a" type="constant" returnType="int"></keywords>"#;
    assert!(matches!(parse_sorted(mismatched), Err(FormatError::Xml { .. })));
    assert!(matches!(
      parse_sorted("<keywords>"),
      Err(FormatError::UnexpectedEof | FormatError::Xml { .. })
    ));
    assert!(matches!(parse_sorted(""), Err(FormatError::MissingRoot)));

    let bogus = r#"<keywords>
      <keyword name="a" type="constant" returnType="int"><desc>&bogus;</desc></keyword>
    </keywords>"#;
    assert!(matches!(
      parse_sorted(bogus),
      Err(FormatError::UnknownEntity(_) | FormatError::Xml { .. })
    ));
  }

  #[test]
  fn rejects_nested_keywords() {
    let nested = r#"<keywords>
      <keyword name="outer" type="function" returnType="int">
        <keyword name="inner" type="constant" returnType="int"/>
      </keyword>
    </keywords>"#;
    match parse_sorted(nested) {
      Err(FormatError::NestedKeyword(outer)) => assert_eq!(outer, "outer"),
      other => panic!("expected a nested keyword error, got {other:?}"),
    }
  }

  quickcheck::quickcheck! {
    fn parsed_catalog_is_sorted(names: Vec<String>) -> bool {
      let mut xml = String::from("<keywords>");
      for (i, name) in names.iter().enumerate() {
        let name: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
        xml.push_str(&format!(
          r#"<keyword name="{name}k{i}" type="constant" returnType="int"/>"#
        ));
      }
      xml.push_str("</keywords>");

      [CompletionOrder::CaseInsensitive, CompletionOrder::CaseSensitive]
        .into_iter()
        .all(|order| {
          let completions = parse(&xml, order.comparator()).unwrap();
          completions.len() == names.len()
            && completions
              .windows(2)
              .all(|pair| order.compare(&pair[0], &pair[1]).is_le())
        })
    }
  }

  #[test]
  fn load_reports_missing_source() {
    let err = load(
      "definitely/not/a/completion/source.xml",
      CompletionOrder::default().comparator(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
  }

  #[test]
  fn load_discards_partial_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xml");
    fs::write(
      &path,
      r#"<keywords>
        <keyword name="fine" type="constant" returnType="int"/>
        <keyword name="broken" type="typedef" returnType="int"/>
      </keywords>"#,
    )
    .unwrap();

    let err = load(&path, CompletionOrder::default().comparator()).unwrap_err();
    match err {
      LoadError::Format { path: reported, source } => {
        assert_eq!(reported, path);
        assert!(matches!(source, FormatError::UnknownType { .. }));
      },
      other => panic!("expected a format error, got {other:?}"),
    }
  }

  #[test]
  fn load_rejects_invalid_utf8() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.xml");
    fs::write(&path, b"<keywords>\xff</keywords>").unwrap();
    assert!(matches!(
      load(&path, CompletionOrder::default().comparator()),
      Err(LoadError::Format {
        source: FormatError::Encoding(_),
        ..
      })
    ));
  }
}
