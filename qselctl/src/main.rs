use std::{convert::TryFrom, path::Path, sync::Arc};

use anyhow::Result;
use console::style;
use qsel::{
  query::{compile, CompileOptions, OperationType},
  scalar::{extract::ScalarPathExtractor, ScalarCoders, StockCodec},
  schema::SchemaTables,
  selection::{path::SchemaPath, SelectionSet},
};
use qsel_client::{client::Client, config::ClientConfig};
use serde_json::{Map, Value};
use structopt::StructOpt;
use thiserror::Error;
use tokio::sync::Notify;

use crate::opt::{Command, Opt, SelectionOpt};

mod opt;

#[derive(Error, Debug)]
enum CliError {
  #[error("`{0}` operations are sent with `subscribe`")]
  UseSubscribe(OperationType),

  #[error("variables must be a JSON object")]
  VariablesNotObject,
}

#[tokio::main]
async fn main() -> Result<()> {
  if std::env::var("RUST_LOG").is_err() {
    std::env::set_var("RUST_LOG", "info");
  }
  pretty_env_logger::init_timed();
  let opt = Opt::from_args();
  let tables = Arc::new(SchemaTables::load(&opt.schema)?);

  match &opt.cmd {
    Command::Compile(x) => {
      let selection = load_selection(&x.selection)?;
      let options = CompileOptions {
        operation_name: x.operation_name.clone(),
      };
      let compiled = compile(
        &tables,
        &load_scalars(&x.scalars)?,
        &options,
        &x.operation,
        &selection,
      )?;
      println!("{}", compiled.text);
      for (name, ty) in compiled.variables.iter() {
        log::info!("variable ${}: {}", name, ty);
      }
    }
    Command::Resolve { path } => {
      let path: SchemaPath = path.parse()?;
      let class = tables.resolver().resolve(path.segments());
      println!("{} {}", style(&path).bold(), class);
    }
    Command::Scalars(x) => {
      let selection = load_selection(&x.selection)?;
      let root_type = tables.root_type(&x.operation).unwrap_or(&x.operation);
      let mut paths: Vec<_> = ScalarPathExtractor::new(&tables)
        .extract(root_type, &selection)
        .into_iter()
        .collect();
      paths.sort();
      for (path, scalar) in paths {
        println!("{} {}", style(path).bold(), style(scalar).cyan());
      }
    }
    Command::Query {
      config,
      variables,
      selection,
    } => {
      let operation: OperationType = selection.operation.parse()?;
      if operation == OperationType::Subscription {
        return Err(CliError::UseSubscribe(operation).into());
      }
      let client = build_client(tables, config, selection)?;
      let variables = match variables {
        Some(x) => load_variables(x)?,
        None => Map::new(),
      };
      let set = load_selection(&selection.selection)?;
      let data = client.execute(operation, &set, &variables).await?;
      println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Command::Subscribe { config, selection } => {
      let client = build_client(tables, config, selection)?;
      let set = load_selection(&selection.selection)?;
      let handle = client.subscribe(&set)?;
      let closed = Arc::new(Notify::new());
      {
        let closed = closed.clone();
        handle
          .open(|| log::info!("subscription started"))
          .on(|x| println!("{}", x))
          .error(|e| log::error!("{:?}", e))
          .off(move || {
            log::info!("subscription ended");
            closed.notify_one();
          });
      }
      tokio::select! {
        _ = tokio::signal::ctrl_c() => {
          handle.close();
          closed.notified().await;
        }
        _ = closed.notified() => {}
      }
    }
  }
  Ok(())
}

fn build_client(tables: Arc<SchemaTables>, config: &Path, opt: &SelectionOpt) -> Result<Client> {
  let config = ClientConfig::load(config)?;
  let mut client = Client::from_config(tables, &config)?.with_scalars(load_scalars(&opt.scalars)?);
  if let Some(name) = &opt.operation_name {
    client = client.with_operation_name(name);
  }
  Ok(client)
}

fn load_scalars(bindings: &[String]) -> Result<ScalarCoders> {
  let mut coders = ScalarCoders::new();
  for binding in bindings {
    let (name, codec) = StockCodec::parse_binding(binding)?;
    coders = coders.with_coder(&name, codec.coder());
  }
  Ok(coders)
}

fn load_document(path: &Path) -> Result<Value> {
  let text = std::fs::read_to_string(path)?;
  match path.extension().and_then(|x| x.to_str()) {
    Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&text)?),
    _ => Ok(serde_json::from_str(&text)?),
  }
}

fn load_selection(path: &Path) -> Result<SelectionSet> {
  Ok(SelectionSet::try_from(load_document(path)?)?)
}

fn load_variables(path: &Path) -> Result<Map<String, Value>> {
  match load_document(path)? {
    Value::Object(x) => Ok(x),
    _ => Err(CliError::VariablesNotObject.into()),
  }
}
