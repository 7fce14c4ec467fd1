use std::{fmt::Display, str::FromStr, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;

static ARGUMENT_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Strips argument parentheses and the alias prefix from a selection key.
///
/// `t1:token(where: {...})` becomes `token`. Applying this twice yields the same result as
/// applying it once.
pub fn purify_key(key: &str) -> String {
  let stripped = ARGUMENT_GROUP.replace_all(key, "");
  let unaliased = match stripped.rfind(':') {
    Some(i) => &stripped[i + 1..],
    None => &stripped[..],
  };
  unaliased.trim().to_string()
}

/// `... on Type` keys do not introduce a nesting level in the response.
pub fn is_inline_fragment(key: &str) -> bool {
  key.trim_start().starts_with("...")
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SegmentKind {
  /// Descent into a sub-selection.
  Field,

  /// Descent into an argument bag or an input object.
  Argument,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PathSegment {
  pub name: Arc<str>,
  pub kind: SegmentKind,
}

impl PathSegment {
  pub fn field(name: &str) -> Self {
    Self {
      name: Arc::from(name),
      kind: SegmentKind::Field,
    }
  }

  pub fn argument(name: &str) -> Self {
    Self {
      name: Arc::from(name),
      kind: SegmentKind::Argument,
    }
  }

  pub fn is_argument(&self) -> bool {
    self.kind == SegmentKind::Argument
  }
}

/// A position in the schema as seen by the compiler: a run of field segments (the selection
/// nesting) optionally followed by argument segments (the argument bag of the innermost field and
/// the input objects below it).
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SchemaPath {
  segments: Vec<PathSegment>,
}

impl SchemaPath {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.segments
  }

  pub fn field(&self, key: &str) -> Self {
    self.with(PathSegment::field(&purify_key(key)))
  }

  pub fn argument(&self, key: &str) -> Self {
    self.with(PathSegment::argument(&purify_key(key)))
  }

  fn with(&self, segment: PathSegment) -> Self {
    let mut segments = Vec::with_capacity(self.segments.len() + 1);
    segments.extend(self.segments.iter().cloned());
    segments.push(segment);
    Self { segments }
  }
}

/// Renders as `query.user|tokens.where`: field segments joined by `.`, then `|` and the argument
/// segments joined by `.`.
impl Display for SchemaPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut previous: Option<SegmentKind> = None;
    for seg in &self.segments {
      match (previous, seg.kind) {
        (None, _) => {}
        (Some(SegmentKind::Field), SegmentKind::Argument) => write!(f, "|")?,
        _ => write!(f, ".")?,
      }
      write!(f, "{}", seg.name)?;
      previous = Some(seg.kind);
    }
    Ok(())
  }
}

impl FromStr for SchemaPath {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (fields, arguments) = match s.find('|') {
      Some(i) => (&s[..i], &s[i + 1..]),
      None => (s, ""),
    };
    let segments = fields
      .split('.')
      .filter(|x| !x.is_empty())
      .map(PathSegment::field)
      .chain(
        arguments
          .split('.')
          .filter(|x| !x.is_empty())
          .map(PathSegment::argument),
      )
      .collect();
    Ok(Self { segments })
  }
}

/// A position in the response body, relative to its `data` member.
///
/// Built from purified keys, so aliases appear under their alias name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ResponsePath(Vec<String>);

impl ResponsePath {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn child(&self, key: &str) -> Self {
    let mut segments = self.0.clone();
    segments.push(purify_key(key));
    Self(segments)
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl Display for ResponsePath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0.join("."))
  }
}

impl From<&str> for ResponsePath {
  fn from(x: &str) -> Self {
    Self(
      x.split('.')
        .filter(|x| !x.is_empty())
        .map(|x| x.to_string())
        .collect(),
    )
  }
}
