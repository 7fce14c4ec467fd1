use std::collections::HashMap;

use crate::{
  schema::{
    resolve::{Classification, Resolver},
    SchemaTables,
  },
  selection::{
    path::{is_inline_fragment, purify_key, ResponsePath},
    Member, Selection, SelectionSet,
  },
};

/// Response path -> name of the scalar found there.
pub type ScalarPathMap = HashMap<ResponsePath, String>;

/// Shadow walk of a selection that records where scalar leaves will show up in the response.
///
/// Two histories are kept per branch. The response path follows what the server sends back, so
/// aliases contribute their alias name. The type history follows the schema, so aliases
/// contribute the real field name. Arguments are ignored entirely.
pub struct ScalarPathExtractor<'a> {
  resolver: Resolver<'a>,
}

struct Walk<'a> {
  root_type: &'a str,
  out: ScalarPathMap,
}

impl<'a> ScalarPathExtractor<'a> {
  pub fn new(tables: &'a SchemaTables) -> Self {
    Self {
      resolver: tables.resolver(),
    }
  }

  pub fn extract(&self, root_type: &str, selection: &SelectionSet) -> ScalarPathMap {
    let mut walk = Walk {
      root_type,
      out: HashMap::new(),
    };
    self.walk_set(&mut walk, selection, &ResponsePath::new(), &[]);
    log::debug!(
      "extracted {} scalar path(s) below `{}`",
      walk.out.len(),
      root_type
    );
    walk.out
  }

  fn walk_set(
    &self,
    walk: &mut Walk<'_>,
    set: &SelectionSet,
    response: &ResponsePath,
    originals: &[String],
  ) {
    for member in &set.members {
      match member {
        Member::Field { key, selection } => {
          self.walk_member(walk, key, key, selection, response, originals)
        }
        Member::Alias {
          alias,
          field,
          selection,
        } => self.walk_member(walk, alias, field, selection, response, originals),
      }
    }
  }

  fn walk_member(
    &self,
    walk: &mut Walk<'_>,
    key: &str,
    original_key: &str,
    selection: &Selection,
    response: &ResponsePath,
    originals: &[String],
  ) {
    match selection {
      Selection::Include | Selection::Raw(_) => {
        let mut history = originals.to_vec();
        history.push(purify_key(original_key));
        if let Classification::Scalar(name) = self.resolver.return_type_of(walk.root_type, &history)
        {
          walk.out.insert(response.child(key), name);
        }
      }
      Selection::Call { body, .. } => {
        self.walk_member(walk, key, original_key, body, response, originals)
      }
      Selection::Object(set) => {
        if is_inline_fragment(original_key) {
          self.walk_set(walk, set, response, originals);
        } else {
          let mut history = originals.to_vec();
          history.push(purify_key(original_key));
          self.walk_set(walk, set, &response.child(key), &history);
        }
      }
    }
  }
}
