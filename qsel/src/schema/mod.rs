//! Generated schema metadata tables.
//!
//! The tables are produced by an external introspection step and are read-only here. Three
//! lookups are exposed: argument shapes (`props`), return shapes (`returns`) and the root type of
//! each operation (`ops`).

pub mod resolve;


use std::{fmt::Display, path::Path};

use anyhow::Result;
use indexmap::IndexMap;
use serde::{
  de::Error as _, ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer,
};
use thiserror::Error;

use self::resolve::Resolver;

pub const ENUM_MARKER: &str = "enum";
pub const SCALAR_MARKER_PREFIX: &str = "scalar.";

#[derive(Error, Debug)]
pub enum SchemaError {
  #[error("invalid type marker `{0}`: expecting `enum` or `scalar.<name>`")]
  InvalidMarker(String),

  #[error("unsupported schema artifact: `{0}`")]
  UnsupportedFormat(String),
}

/// The shape of a named type in one of the lookup tables.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeShape<F> {
  Enum,
  Scalar(String),
  Fields(IndexMap<String, F>),
}

/// A field entry of the argument-shape table.
///
/// Fields of input types map directly to a type name. Fields of output types that take arguments
/// map to their argument bag instead.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropsField {
  Type(String),
  Arguments(IndexMap<String, String>),
}

pub type PropsEntry = TypeShape<PropsField>;
pub type ReturnsEntry = TypeShape<String>;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SchemaTables {
  #[serde(default)]
  pub ops: IndexMap<String, String>,

  #[serde(default)]
  pub props: IndexMap<String, PropsEntry>,

  #[serde(default)]
  pub returns: IndexMap<String, ReturnsEntry>,
}

impl SchemaTables {
  pub fn from_json(input: &str) -> Result<Self> {
    Ok(serde_json::from_str(input)?)
  }

  pub fn from_yaml(input: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(input)?)
  }

  /// Loads a schema artifact, picking the format from the file extension.
  pub fn load(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path)?;
    let tables = match path.extension().and_then(|x| x.to_str()) {
      Some("json") => Self::from_json(&text)?,
      Some("yaml") | Some("yml") => Self::from_yaml(&text)?,
      _ => {
        return Err(SchemaError::UnsupportedFormat(path.display().to_string()).into());
      }
    };
    log::debug!(
      "loaded schema tables from {}: {} props, {} returns, {} ops",
      path.display(),
      tables.props.len(),
      tables.returns.len(),
      tables.ops.len()
    );
    Ok(tables)
  }

  /// Root type of an operation. Falls back to `None` for unknown operations.
  pub fn root_type(&self, operation: &str) -> Option<&str> {
    self.ops.get(operation).map(|x| x.as_str())
  }

  pub fn resolver(&self) -> Resolver<'_> {
    Resolver::new(self)
  }
}

enum Marker {
  Enum,
  Scalar(String),
}

fn parse_marker(x: &str) -> Result<Marker, SchemaError> {
  if x == ENUM_MARKER {
    Ok(Marker::Enum)
  } else if let Some(name) = x.strip_prefix(SCALAR_MARKER_PREFIX) {
    if name.is_empty() {
      Err(SchemaError::InvalidMarker(x.to_string()))
    } else {
      Ok(Marker::Scalar(name.to_string()))
    }
  } else {
    Err(SchemaError::InvalidMarker(x.to_string()))
  }
}

impl<F> Display for TypeShape<F> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Enum => write!(f, "{}", ENUM_MARKER),
      Self::Scalar(name) => write!(f, "{}{}", SCALAR_MARKER_PREFIX, name),
      Self::Fields(fields) => write!(f, "{{{} fields}}", fields.len()),
    }
  }
}

impl<'de, F: Deserialize<'de>> Deserialize<'de> for TypeShape<F> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
      Marker(String),
      Fields(IndexMap<String, T>),
    }

    match Raw::<F>::deserialize(deserializer)? {
      Raw::Marker(x) => match parse_marker(&x).map_err(D::Error::custom)? {
        Marker::Enum => Ok(Self::Enum),
        Marker::Scalar(name) => Ok(Self::Scalar(name)),
      },
      Raw::Fields(fields) => Ok(Self::Fields(fields)),
    }
  }
}

impl<F: Serialize> Serialize for TypeShape<F> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Fields(fields) => {
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (k, v) in fields {
          map.serialize_entry(k, v)?;
        }
        map.end()
      }
      _ => serializer.serialize_str(&self.to_string()),
    }
  }
}
