use std::fmt::Display;

use super::{PropsField, SchemaTables, TypeShape, ENUM_MARKER, SCALAR_MARKER_PREFIX};
use crate::selection::path::PathSegment;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Classification {
  Enum,
  Scalar(String),

  /// No scalar or enum behavior applies; use generic handling.
  Not,
}

impl Classification {
  pub fn scalar_name(&self) -> Option<&str> {
    match self {
      Self::Scalar(x) => Some(x),
      _ => None,
    }
  }
}

impl Display for Classification {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Enum => write!(f, "{}", ENUM_MARKER),
      Self::Scalar(x) => write!(f, "{}{}", SCALAR_MARKER_PREFIX, x),
      Self::Not => write!(f, "not"),
    }
  }
}

/// Classifies positions in a selection by walking the schema tables.
///
/// Two strategies are tried at every type, in a fixed order:
///
/// 1. the argument-shape walk over `props`;
/// 2. the return-shape walk over `returns`.
///
/// A strategy that can take the next step commits: its outcome is final, even when that outcome
/// is `Not`. The next strategy is only consulted when the previous one has no entry to follow.
#[derive(Copy, Clone)]
pub struct Resolver<'a> {
  tables: &'a SchemaTables,
}

impl<'a> Resolver<'a> {
  pub fn new(tables: &'a SchemaTables) -> Self {
    Self { tables }
  }

  /// The first segment names an operation (looked up in `ops`) or a type.
  pub fn resolve(&self, path: &[PathSegment]) -> Classification {
    let (first, rest) = match path.split_first() {
      Some(x) => x,
      None => return Classification::Not,
    };
    let root = self.tables.root_type(&first.name).unwrap_or(&*first.name);
    self.resolve_type(root, rest)
  }

  pub fn resolve_type(&self, ty: &str, rest: &[PathSegment]) -> Classification {
    if let Some(x) = self.argument_shape(ty, rest) {
      return x;
    }
    if let Some(x) = self.return_shape(ty, rest) {
      return x;
    }
    log::debug!("resolve_type: no classification for `{}` at depth {}", ty, rest.len());
    Classification::Not
  }

  fn argument_shape(&self, ty: &str, rest: &[PathSegment]) -> Option<Classification> {
    match self.tables.props.get(ty)? {
      TypeShape::Enum if rest.is_empty() => Some(Classification::Enum),
      TypeShape::Scalar(name) if rest.is_empty() => Some(Classification::Scalar(name.clone())),
      TypeShape::Fields(fields) => {
        let (next, rest) = match rest.split_first() {
          Some(x) => x,
          None => return Some(Classification::Not),
        };

        // Field segments describe selection nesting, which only `returns` knows about.
        if !next.is_argument() {
          return None;
        }

        match fields.get(&*next.name)? {
          PropsField::Type(x) => Some(self.resolve_type(x, rest)),
          PropsField::Arguments(args) => {
            // `next` is the field itself; the argument name follows.
            let (arg, rest) = match rest.split_first() {
              Some(x) => x,
              None => return Some(Classification::Not),
            };
            if !arg.is_argument() {
              return None;
            }
            let arg_ty = args.get(&*arg.name)?;
            Some(self.resolve_type(arg_ty, rest))
          }
        }
      }
      _ => None,
    }
  }

  fn return_shape(&self, ty: &str, rest: &[PathSegment]) -> Option<Classification> {
    match self.tables.returns.get(ty)? {
      TypeShape::Enum if rest.is_empty() => Some(Classification::Enum),
      TypeShape::Scalar(name) if rest.is_empty() => Some(Classification::Scalar(name.clone())),
      TypeShape::Fields(fields) => {
        let (next, rest) = rest.split_first()?;
        let field_ty = fields.get(&*next.name)?;
        Some(self.resolve_type(field_ty, rest))
      }
      _ => None,
    }
  }

  /// Return-shape lookup keyed by plain field names, starting at `ty`.
  ///
  /// Used for response decoding, where only the selection nesting matters.
  pub fn return_type_of<S: AsRef<str>>(&self, ty: &str, keys: &[S]) -> Classification {
    match (self.tables.returns.get(ty), keys.split_first()) {
      (Some(TypeShape::Fields(fields)), Some((key, rest))) => match fields.get(key.as_ref()) {
        Some(field_ty) => self.return_type_of(field_ty, rest),
        None => Classification::Not,
      },
      (Some(TypeShape::Scalar(name)), None) => Classification::Scalar(name.clone()),
      (Some(TypeShape::Enum), None) => Classification::Enum,
      _ => Classification::Not,
    }
  }
}
