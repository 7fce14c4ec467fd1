//! Selection-to-query-text compilation.

pub mod args;
pub mod compiler;


use std::{fmt::Display, str::FromStr};

use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{scalar::ScalarCoders, schema::SchemaTables, selection::SelectionSet};

use self::compiler::QueryCompiler;

/// Marks a string argument as a variable reference: `<prefix><name><separator><type>`.
pub const VARIABLE_PREFIX: &str = "$qsel:";
pub const TYPE_SEPARATOR: &str = "::$type::";

#[derive(Error, Debug)]
pub enum CompileError {
  #[error("variable `${name}` declared with two different types: `{first}` and `{second}`")]
  VariableTypeConflict {
    name: String,
    first: String,
    second: String,
  },

  #[error("malformed variable placeholder `{0}`")]
  MalformedVariable(String),

  #[error("unknown operation type `{0}`")]
  UnknownOperationType(String),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
  Query,
  Mutation,
  Subscription,
}

impl OperationType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Query => "query",
      Self::Mutation => "mutation",
      Self::Subscription => "subscription",
    }
  }
}

impl Display for OperationType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for OperationType {
  type Err = CompileError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "query" => Ok(Self::Query),
      "mutation" => Ok(Self::Mutation),
      "subscription" => Ok(Self::Subscription),
      _ => Err(CompileError::UnknownOperationType(s.to_string())),
    }
  }
}

#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
  /// Emitted right after the operation keyword.
  pub operation_name: Option<String>,
}

/// Builds a variable placeholder to be used as an argument value.
///
/// ```
/// use qsel::query::variable;
/// assert_eq!(variable("id", "Int!"), "$qsel:id::$type::Int!");
/// ```
pub fn variable(name: &str, wire_type: &str) -> Value {
  Value::String(format!(
    "{}{}{}{}",
    VARIABLE_PREFIX, name, TYPE_SEPARATOR, wire_type
  ))
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct VariableRef {
  pub name: String,
  pub wire_type: String,
}

impl VariableRef {
  /// `Ok(None)` if the string is not a placeholder at all.
  pub fn parse(x: &str) -> Result<Option<Self>, CompileError> {
    let body = match x.strip_prefix(VARIABLE_PREFIX) {
      Some(x) => x,
      None => return Ok(None),
    };
    let i = body
      .find(TYPE_SEPARATOR)
      .ok_or_else(|| CompileError::MalformedVariable(x.to_string()))?;
    let name = &body[..i];
    let wire_type = &body[i + TYPE_SEPARATOR.len()..];
    if name.is_empty() || wire_type.is_empty() {
      return Err(CompileError::MalformedVariable(x.to_string()));
    }
    Ok(Some(Self {
      name: name.to_string(),
      wire_type: wire_type.to_string(),
    }))
  }
}

/// Variables declared by one compilation, in order of first use.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VariableTable {
  vars: IndexMap<String, String>,
}

impl VariableTable {
  /// The first declaration wins; a later one must repeat the same type.
  pub fn declare(&mut self, var: &VariableRef) -> Result<(), CompileError> {
    match self.vars.get(&var.name) {
      Some(existing) if existing != &var.wire_type => Err(CompileError::VariableTypeConflict {
        name: var.name.clone(),
        first: existing.clone(),
        second: var.wire_type.clone(),
      }),
      Some(_) => Ok(()),
      None => {
        self.vars.insert(var.name.clone(), var.wire_type.clone());
        Ok(())
      }
    }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(|x| x.as_str())
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// `$a: Int!, $b: String`
  pub fn declarations(&self) -> String {
    self
      .iter()
      .map(|(name, ty)| format!("${}: {}", name, ty))
      .collect::<Vec<_>>()
      .join(", ")
  }
}

#[derive(Clone, Debug)]
pub struct CompiledQuery {
  pub text: String,
  pub variables: VariableTable,
}

pub fn compile(
  tables: &SchemaTables,
  scalars: &ScalarCoders,
  options: &CompileOptions,
  operation: &str,
  selection: &SelectionSet,
) -> Result<CompiledQuery> {
  QueryCompiler::new(tables, scalars, options).compile(operation, selection)
}
