//! Selection trees: which fields, arguments and sub-objects to fetch.

pub mod path;


use std::convert::TryFrom;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const ALIAS_KEY: &str = "__alias";
pub const DIRECTIVES_KEY: &str = "__directives";

#[derive(Error, Debug)]
pub enum SelectionError {
  #[error("selection must be an object")]
  RootNotObject,

  #[error("field `{0}`: an argument pair must have exactly 2 elements, got {1}")]
  BadPairLength(String, usize),

  #[error("field `{0}`: arguments must be an object")]
  ArgumentsNotObject(String),

  #[error("field `{0}`: argument pairs cannot be nested")]
  NestedPair(String),

  #[error("invalid alias `{0}`: expecting __alias: {{ ALIAS_NAME: {{ FIELD_NAME: {{ ...selectors }} }} }}")]
  InvalidAlias(String),

  #[error("`__alias` must be an object mapping alias names to aliased fields")]
  InvalidAliasBlock,

  #[error("`__directives` must be a string")]
  BadDirectives,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
  /// Fetch the field with no sub-selection.
  Include,

  /// Spliced verbatim after the key, e.g. an enum literal or a raw fragment.
  Raw(String),

  Object(SelectionSet),

  /// Field invoked with arguments. `args` is a JSON object; `body` is what gets selected.
  Call { args: Value, body: Box<Selection> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Member {
  Field {
    key: String,
    selection: Selection,
  },

  /// `alias:field`. The response carries the value under `alias`.
  Alias {
    alias: String,
    field: String,
    selection: Selection,
  },
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct SelectionSet {
  pub members: Vec<Member>,

  /// Raw text emitted after the key of the node that owns this set.
  pub directives: Option<String>,
}

impl SelectionSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn field(self, key: &str) -> Self {
    self.member(key, Selection::Include)
  }

  pub fn raw(self, key: &str, text: &str) -> Self {
    self.member(key, Selection::Raw(text.to_string()))
  }

  pub fn object(self, key: &str, set: SelectionSet) -> Self {
    self.member(key, Selection::Object(set))
  }

  pub fn call(self, key: &str, args: Value, body: Selection) -> Self {
    self.member(
      key,
      Selection::Call {
        args,
        body: Box::new(body),
      },
    )
  }

  pub fn alias(mut self, alias: &str, field: &str, selection: Selection) -> Self {
    self.members.push(Member::Alias {
      alias: alias.to_string(),
      field: field.to_string(),
      selection,
    });
    self
  }

  pub fn directives(mut self, text: &str) -> Self {
    self.directives = Some(text.to_string());
    self
  }

  pub fn member(mut self, key: &str, selection: Selection) -> Self {
    self.members.push(Member::Field {
      key: key.to_string(),
      selection,
    });
    self
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }
}

impl From<SelectionSet> for Selection {
  fn from(x: SelectionSet) -> Self {
    Selection::Object(x)
  }
}

impl TryFrom<&Value> for SelectionSet {
  type Error = SelectionError;

  fn try_from(value: &Value) -> Result<Self, Self::Error> {
    let map = value.as_object().ok_or(SelectionError::RootNotObject)?;
    let mut set = SelectionSet::default();
    for (key, value) in map {
      if key == DIRECTIVES_KEY {
        let text = value.as_str().ok_or(SelectionError::BadDirectives)?;
        set.directives = Some(text.to_string());
      } else if key == ALIAS_KEY {
        parse_alias_block(value, &mut set.members)?;
      } else if let Some(selection) = parse_selection(key, value)? {
        set.members.push(Member::Field {
          key: key.clone(),
          selection,
        });
      }
    }
    Ok(set)
  }
}

impl TryFrom<Value> for SelectionSet {
  type Error = SelectionError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    Self::try_from(&value)
  }
}

/// `None` means the field is excluded (`false`, `0` or `null`).
fn parse_selection(key: &str, value: &Value) -> Result<Option<Selection>, SelectionError> {
  match value {
    Value::Null => Ok(None),
    Value::Bool(x) => Ok(if *x { Some(Selection::Include) } else { None }),
    Value::Number(x) => Ok(if x.as_f64() == Some(0.0) {
      None
    } else {
      Some(Selection::Include)
    }),
    Value::String(x) => Ok(Some(Selection::Raw(x.clone()))),
    Value::Object(_) => Ok(Some(Selection::Object(SelectionSet::try_from(value)?))),
    Value::Array(pair) => {
      if pair.len() != 2 {
        return Err(SelectionError::BadPairLength(key.to_string(), pair.len()));
      }
      if !pair[0].is_object() {
        return Err(SelectionError::ArgumentsNotObject(key.to_string()));
      }
      if pair[1].is_array() {
        return Err(SelectionError::NestedPair(key.to_string()));
      }
      Ok(parse_selection(key, &pair[1])?.map(|body| Selection::Call {
        args: pair[0].clone(),
        body: Box::new(body),
      }))
    }
  }
}

fn parse_alias_block(value: &Value, out: &mut Vec<Member>) -> Result<(), SelectionError> {
  let block = value.as_object().ok_or(SelectionError::InvalidAliasBlock)?;
  for (alias, aliased) in block {
    let (field, inner) = aliased
      .as_object()
      .filter(|x| x.len() == 1)
      .and_then(|x| x.iter().next())
      .ok_or_else(|| SelectionError::InvalidAlias(alias.clone()))?;
    if let Some(selection) = parse_selection(field, inner)? {
      out.push(Member::Alias {
        alias: alias.clone(),
        field: field.clone(),
        selection,
      });
    }
  }
  Ok(())
}
