use anyhow::Result;
use serde_json::Value;

use super::{VariableRef, VariableTable};
use crate::{
  scalar::ScalarCoders,
  schema::resolve::{Classification, Resolver},
  selection::path::SchemaPath,
};

/// Turns argument values into wire literals.
///
/// Every non-variable value is classified against the schema first, composites included, since
/// a scalar may sit at any depth of an input object.
pub struct ArgumentSerializer<'a, 'b> {
  resolver: Resolver<'a>,
  scalars: &'a ScalarCoders,
  variables: &'b mut VariableTable,
}

impl<'a, 'b> ArgumentSerializer<'a, 'b> {
  pub fn new(
    resolver: Resolver<'a>,
    scalars: &'a ScalarCoders,
    variables: &'b mut VariableTable,
  ) -> Self {
    Self {
      resolver,
      scalars,
      variables,
    }
  }

  /// Serializes the argument bag of a field. The surrounding parentheses are the caller's.
  pub fn serialize_root(&mut self, args: &Value, path: &SchemaPath) -> Result<String> {
    self.serialize(args, path, true)
  }

  pub fn serialize(&mut self, value: &Value, path: &SchemaPath, is_root: bool) -> Result<String> {
    if let Value::String(x) = value {
      if let Some(var) = VariableRef::parse(x)? {
        self.variables.declare(&var)?;
        return Ok(format!("${}", var.name));
      }
    }

    // A scalar without an encoder is written like any other value.
    let class = self.resolver.resolve(path.segments());
    if let Classification::Scalar(name) = &class {
      if let Some(encoded) = self.scalars.encode(name, value)? {
        return Ok(encoded);
      }
    }

    match value {
      Value::Array(items) => {
        let items = items
          .iter()
          .map(|x| self.serialize(x, path, false))
          .collect::<Result<Vec<_>>>()?;
        Ok(format!("[{}]", items.join(", ")))
      }
      Value::Null => Ok("null".into()),
      Value::String(x) => {
        if class == Classification::Enum {
          Ok(x.clone())
        } else {
          Ok(serde_json::to_string(x)?)
        }
      }
      Value::Object(map) => {
        let mut fields = Vec::with_capacity(map.len());
        for (k, v) in map {
          fields.push(format!("{}: {}", k, self.serialize(v, &path.argument(k), false)?));
        }
        let fields = fields.join(", ");
        if is_root {
          Ok(fields)
        } else {
          Ok(format!("{{{}}}", fields))
        }
      }
      Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
    }
  }
}
