use anyhow::{Context, Result};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{extract::ScalarPathMap, ScalarCoders};
use crate::selection::path::ResponsePath;

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("failed to decode scalar `{scalar}` at `{path}`")]
  ScalarDecodeFailed { scalar: String, path: String },
}

/// Walks a response in lockstep with a scalar path map and replaces scalar values with what
/// their decoders return.
///
/// Arrays are transparent for path purposes. A failing decoder fails the whole pass; no
/// partially decoded value is returned.
pub struct ResponseDecoder<'a> {
  paths: &'a ScalarPathMap,
  coders: &'a ScalarCoders,
}

impl<'a> ResponseDecoder<'a> {
  pub fn new(paths: &'a ScalarPathMap, coders: &'a ScalarCoders) -> Self {
    Self { paths, coders }
  }

  pub fn decode(&self, value: &Value) -> Result<Value> {
    self.decode_at(value, &ResponsePath::new())
  }

  fn decode_at(&self, value: &Value, path: &ResponsePath) -> Result<Value> {
    if let Value::Array(items) = value {
      return Ok(Value::Array(
        items
          .iter()
          .map(|x| self.decode_at(x, path))
          .collect::<Result<_>>()?,
      ));
    }

    if let Some(scalar) = self.paths.get(path) {
      if let Some(decoder) = self.coders.decoder(scalar) {
        let decoded = decoder(value).with_context(|| DecodeError::ScalarDecodeFailed {
          scalar: scalar.clone(),
          path: path.to_string(),
        })?;
        log::debug!("decoded `{}` at `{}`", scalar, path);
        return Ok(decoded);
      }
    }

    match value {
      Value::Object(map) => {
        let mut out = Map::with_capacity(map.len());
        for (k, v) in map {
          out.insert(k.clone(), self.decode_at(v, &path.child(k))?);
        }
        Ok(Value::Object(out))
      }
      _ => Ok(value.clone()),
    }
  }
}
