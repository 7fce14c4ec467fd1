//! Custom scalar codecs and the response decoding pass.

pub mod decode;
pub mod extract;


use std::{collections::HashMap, fmt::Debug, str::FromStr, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;

use crate::{schema::SchemaTables, selection::SelectionSet};

use self::{decode::ResponseDecoder, extract::ScalarPathExtractor};

pub type EncodeFn = Arc<dyn Fn(&Value) -> Result<String> + Send + Sync>;
pub type DecodeFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

#[derive(Error, Debug)]
pub enum ScalarError {
  #[error("unknown stock scalar codec `{0}`")]
  UnknownStockCodec(String),

  #[error("expecting `<scalar>=<codec>`, got `{0}`")]
  BadCodecBinding(String),

  #[error("value `{0}` is not valid for this scalar")]
  InvalidValue(String),
}

/// Encode and decode functions for one scalar. A missing function means passthrough.
#[derive(Clone, Default)]
pub struct ScalarCoder {
  pub encode: Option<EncodeFn>,
  pub decode: Option<DecodeFn>,
}

#[derive(Clone, Default)]
pub struct ScalarCoders {
  coders: HashMap<String, ScalarCoder>,
}

impl Debug for ScalarCoders {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut names: Vec<&str> = self.coders.keys().map(|x| x.as_str()).collect();
    names.sort_unstable();
    f.debug_struct("ScalarCoders").field("scalars", &names).finish()
  }
}

impl ScalarCoders {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_encoder(
    mut self,
    name: &str,
    f: impl Fn(&Value) -> Result<String> + Send + Sync + 'static,
  ) -> Self {
    self.coders.entry(name.to_string()).or_default().encode = Some(Arc::new(f));
    self
  }

  pub fn with_decoder(
    mut self,
    name: &str,
    f: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static,
  ) -> Self {
    self.coders.entry(name.to_string()).or_default().decode = Some(Arc::new(f));
    self
  }

  pub fn with_coder(mut self, name: &str, coder: ScalarCoder) -> Self {
    self.coders.insert(name.to_string(), coder);
    self
  }

  pub fn get(&self, name: &str) -> Option<&ScalarCoder> {
    self.coders.get(name)
  }

  pub fn is_empty(&self) -> bool {
    self.coders.is_empty()
  }

  /// Returns `None` when the scalar has no encoder.
  pub fn encode(&self, name: &str, value: &Value) -> Result<Option<String>> {
    match self.get(name).and_then(|x| x.encode.as_ref()) {
      Some(f) => f(value).map(Some),
      None => Ok(None),
    }
  }

  pub fn decoder(&self, name: &str) -> Option<&DecodeFn> {
    self.get(name).and_then(|x| x.decode.as_ref())
  }
}

/// Codecs usable without writing code, e.g. from the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StockCodec {
  /// Numbers travel as string literals (`numeric`, `bigint` and friends).
  NumericString,

  /// Arbitrary JSON travels as a string holding its serialized form.
  JsonString,
}

impl FromStr for StockCodec {
  type Err = ScalarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "numeric-string" => Ok(Self::NumericString),
      "json-string" => Ok(Self::JsonString),
      _ => Err(ScalarError::UnknownStockCodec(s.to_string())),
    }
  }
}

impl StockCodec {
  pub fn coder(self) -> ScalarCoder {
    match self {
      Self::NumericString => ScalarCoder {
        encode: Some(Arc::new(encode_numeric_string)),
        decode: Some(Arc::new(decode_numeric_string)),
      },
      Self::JsonString => ScalarCoder {
        encode: Some(Arc::new(encode_json_string)),
        decode: Some(Arc::new(decode_json_string)),
      },
    }
  }

  /// Parses `<scalar>=<codec>`.
  pub fn parse_binding(binding: &str) -> Result<(String, StockCodec)> {
    let i = binding
      .find('=')
      .ok_or_else(|| ScalarError::BadCodecBinding(binding.to_string()))?;
    let codec = binding[i + 1..].parse()?;
    Ok((binding[..i].to_string(), codec))
  }
}

fn encode_numeric_string(v: &Value) -> Result<String> {
  match v {
    Value::Number(x) => Ok(format!("\"{}\"", x)),
    Value::String(x) => Ok(serde_json::to_string(x)?),
    Value::Array(items) => {
      let items = items
        .iter()
        .map(encode_numeric_string)
        .collect::<Result<Vec<_>>>()?;
      Ok(format!("[{}]", items.join(", ")))
    }
    Value::Null => Ok("null".into()),
    _ => Err(ScalarError::InvalidValue(v.to_string()).into()),
  }
}

fn decode_numeric_string(v: &Value) -> Result<Value> {
  match v {
    Value::String(x) => {
      let number: serde_json::Number = x
        .parse()
        .map_err(|_| ScalarError::InvalidValue(x.clone()))?;
      Ok(Value::Number(number))
    }
    _ => Ok(v.clone()),
  }
}

fn encode_json_string(v: &Value) -> Result<String> {
  Ok(serde_json::to_string(&serde_json::to_string(v)?)?)
}

fn decode_json_string(v: &Value) -> Result<Value> {
  match v {
    Value::String(x) => Ok(serde_json::from_str(x)?),
    _ => Ok(v.clone()),
  }
}

/// Runs the scalar decoding pass over the `data` member of a response.
///
/// The scalar path map is rebuilt on every call. When `coders` has no entries, or nothing in the
/// selection resolves to a scalar, `data` is returned unchanged.
pub fn decode_response(
  tables: &SchemaTables,
  coders: &ScalarCoders,
  operation: &str,
  selection: &SelectionSet,
  data: Value,
) -> Result<Value> {
  if coders.is_empty() {
    return Ok(data);
  }
  let root_type = tables.root_type(operation).unwrap_or(operation);
  let paths = ScalarPathExtractor::new(tables).extract(root_type, selection);
  if paths.is_empty() {
    return Ok(data);
  }
  ResponseDecoder::new(&paths, coders).decode(&data)
}
