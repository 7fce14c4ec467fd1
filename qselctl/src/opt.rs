use std::path::PathBuf;

use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "qselctl", about = "Compile and run schema-aware selections.")]
pub struct Opt {
  /// Schema tables (`.json`, `.yaml` or `.yml`).
  #[structopt(long, parse(from_os_str))]
  pub schema: PathBuf,

  #[structopt(subcommand)]
  pub cmd: Command,
}

#[derive(Debug, StructOpt)]
pub struct SelectionOpt {
  /// Selection document (`.json`, `.yaml` or `.yml`).
  #[structopt(long, parse(from_os_str))]
  pub selection: PathBuf,

  /// Operation type.
  #[structopt(long, default_value = "query")]
  pub operation: String,

  /// Operation name emitted in the query text.
  #[structopt(long)]
  pub operation_name: Option<String>,

  /// Stock scalar codec binding, e.g. `numeric=numeric-string`. Repeatable.
  #[structopt(long = "scalar")]
  pub scalars: Vec<String>,
}

#[derive(Debug, StructOpt)]
pub enum Command {
  /// Print the query text and variable declarations for a selection.
  Compile(SelectionOpt),

  /// Classify a schema path such as `query|token.where.max_supply._gt`.
  Resolve {
    path: String,
  },

  /// List the response paths that hold custom scalars.
  Scalars(SelectionOpt),

  /// Run a query or mutation and print the decoded data.
  Query {
    /// Client configuration (YAML).
    #[structopt(long, parse(from_os_str))]
    config: PathBuf,

    /// Variables (JSON object).
    #[structopt(long, parse(from_os_str))]
    variables: Option<PathBuf>,

    #[structopt(flatten)]
    selection: SelectionOpt,
  },

  /// Subscribe and print decoded messages until interrupted.
  Subscribe {
    /// Client configuration (YAML).
    #[structopt(long, parse(from_os_str))]
    config: PathBuf,

    #[structopt(flatten)]
    selection: SelectionOpt,
  },
}
