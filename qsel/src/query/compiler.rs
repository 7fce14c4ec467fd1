use anyhow::Result;

use super::{args::ArgumentSerializer, CompileOptions, CompiledQuery, VariableTable};
use crate::{
  scalar::ScalarCoders,
  schema::{resolve::Resolver, SchemaTables},
  selection::{
    path::{is_inline_fragment, SchemaPath},
    Member, Selection, SelectionSet,
  },
};

pub struct QueryCompiler<'a> {
  resolver: Resolver<'a>,
  scalars: &'a ScalarCoders,
  options: &'a CompileOptions,
}

impl<'a> QueryCompiler<'a> {
  pub fn new(
    tables: &'a SchemaTables,
    scalars: &'a ScalarCoders,
    options: &'a CompileOptions,
  ) -> Self {
    Self {
      resolver: tables.resolver(),
      scalars,
      options,
    }
  }

  /// Compiles `selection` as the body of `operation` (`query`, `mutation`, ...).
  ///
  /// Variables are collected while the body is compiled and declared on the root node.
  pub fn compile(&self, operation: &str, selection: &SelectionSet) -> Result<CompiledQuery> {
    let mut variables = VariableTable::default();
    let body = self.compile_set(selection, &SchemaPath::new().field(operation), &mut variables)?;

    let mut text = operation.to_string();
    if let Some(name) = &self.options.operation_name {
      text.push(' ');
      text.push_str(name);
    }
    if !variables.is_empty() {
      text.push('(');
      text.push_str(&variables.declarations());
      text.push(')');
    }
    if let Some(directives) = &selection.directives {
      text.push(' ');
      text.push_str(directives);
    }
    text.push(' ');
    text.push_str(&body);

    log::debug!("compiled {}: {}", operation, text);
    Ok(CompiledQuery { text, variables })
  }

  fn compile_set(
    &self,
    set: &SelectionSet,
    path: &SchemaPath,
    variables: &mut VariableTable,
  ) -> Result<String> {
    let mut children = Vec::with_capacity(set.members.len());
    for member in &set.members {
      let child = match member {
        Member::Field { key, selection } => {
          self.compile_member(key, key, selection, path, variables)?
        }
        Member::Alias {
          alias,
          field,
          selection,
        } => self.compile_member(
          &format!("{}:{}", alias, field),
          field,
          selection,
          path,
          variables,
        )?,
      };
      children.push(child);
    }
    if children.is_empty() {
      Ok("{}".into())
    } else {
      Ok(format!("{{ {} }}", children.join(" ")))
    }
  }

  /// `key` is the text emitted for the member and `field` the selection key it came from. Output
  /// paths are built from `field` only; `key` may carry serialized arguments.
  ///
  /// `path` is the output path of the set containing the member.
  fn compile_member(
    &self,
    key: &str,
    field: &str,
    selection: &Selection,
    path: &SchemaPath,
    variables: &mut VariableTable,
  ) -> Result<String> {
    match selection {
      Selection::Include => Ok(key.to_string()),
      Selection::Raw(x) => Ok(format!("{} {}", key, x)),
      Selection::Object(set) => {
        // Inline fragments add no nesting level.
        let child = if is_inline_fragment(field) {
          path.clone()
        } else {
          path.field(field)
        };
        let body = self.compile_set(set, &child, variables)?;
        match &set.directives {
          Some(directives) => Ok(format!("{} {} {}", key, directives, body)),
          None => Ok(format!("{} {}", key, body)),
        }
      }
      Selection::Call { args, body } => {
        let args = ArgumentSerializer::new(self.resolver, self.scalars, variables)
          .serialize_root(args, &path.argument(field))?;
        let key = if args.is_empty() {
          key.to_string()
        } else {
          format!("{}({})", key, args)
        };
        self.compile_member(&key, field, body, path, variables)
      }
    }
  }
}
